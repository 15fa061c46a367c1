//! Per-item outcomes and run summaries shared by the importers.

use std::fmt;
use std::path::PathBuf;

use crate::library::DocumentData;

/// What happened to one source item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemStatus {
    /// The destination accepted the document.
    Added { folder: PathBuf },
    /// Reading or adding the item failed; the run went on.
    Failed { reason: String },
}

/// Outcome of one item in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemReport {
    /// Source identifier: the Zotero key or the BibTeX citation key.
    pub key: String,
    /// Document data handed to the destination; `None` if it could not be built.
    pub data: Option<DocumentData>,
    pub status: ItemStatus,
}

/// Ordered outcomes of one import run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    items: Vec<ItemReport>,
}

impl ImportReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: ItemReport) {
        self.items.push(item);
    }

    #[must_use]
    pub fn items(&self) -> &[ItemReport] {
        &self.items
    }

    /// Number of items attempted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn added(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item.status, ItemStatus::Added { .. }))
            .count()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.total() - self.added()
    }

    #[must_use]
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            total: self.total(),
            added: self.added(),
            failed: self.failed(),
        }
    }
}

/// Aggregate counts printed at the end of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub added: usize,
    pub failed: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} item(s) processed: {} added, {} failed",
            self.total, self.added, self.failed
        )
    }
}

/// Receives progress while a run walks its items.
///
/// Calls arrive in item order from the importing task.
pub trait ProgressObserver: Send + Sync {
    /// Called once with the number of items about to be processed.
    fn started(&self, total: usize);

    /// Called before item `index` (1-based) is processed.
    fn item(&self, index: usize, key: &str);

    /// Called once after the last item.
    fn finished(&self, summary: &RunSummary);
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn started(&self, _total: usize) {}
    fn item(&self, _index: usize, _key: &str) {}
    fn finished(&self, _summary: &RunSummary) {}
}
