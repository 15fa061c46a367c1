//! Progress bar for import runs.

use indicatif::{ProgressBar, ProgressStyle};
use zotero_import::{ProgressObserver, RunSummary};

/// Draws an `indicatif` bar fed by the importer, or nothing when hidden.
pub(crate) struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    pub(crate) fn new(visible: bool) -> Self {
        let bar = if visible {
            let bar = ProgressBar::new(0);
            bar.set_style(
                ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar
        } else {
            ProgressBar::hidden()
        };
        Self { bar }
    }
}

impl ProgressObserver for ProgressReporter {
    fn started(&self, total: usize) {
        self.bar.set_length(u64::try_from(total).unwrap_or(u64::MAX));
    }

    fn item(&self, index: usize, key: &str) {
        self.bar
            .set_position(u64::try_from(index.saturating_sub(1)).unwrap_or(u64::MAX));
        self.bar.set_message(key.to_string());
    }

    fn finished(&self, _summary: &RunSummary) {
        self.bar.finish_and_clear();
    }
}
