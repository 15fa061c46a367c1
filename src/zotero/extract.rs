//! Library extraction driver.
//!
//! Walks every non-excluded item in `itemID` order, runs the resolvers, and
//! hands each record to a [`DocumentLibrary`]. Items are processed strictly
//! one after another; a failure for one item is recorded and the run moves on.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use chrono::format::{Item, StrftimeItems};
use tracing::{debug, error, info, instrument, warn};

use super::attachments::{AttachmentRoots, load_attachments};
use super::collections::{CollectionTree, CollectionWalk, load_collection_path};
use super::creators::{DEFAULT_AUTHOR_SEPARATOR, load_creators};
use super::error::ExtractError;
use super::fields::load_fields;
use super::items::{RawItem, count_items, list_items};
use super::record::NormalizedRecord;
use super::tables::ZoteroMappings;
use super::tags::load_tags;
use crate::db::{ZOTERO_DATABASE_FILE, ZoteroDatabase};
use crate::library::naming::subfolder_from_collections;
use crate::library::{AddRequest, DocumentLibrary};
use crate::report::{ImportReport, ItemReport, ItemStatus, ProgressObserver};

/// Format Zotero writes into `items.dateAdded`.
pub const ZOTERO_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Default format of the `time-added` key.
pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%d-%H:%M:%S";

/// Folder for items that belong to no collection.
pub const DEFAULT_SUBFOLDER: &str = "Misc";

/// Settings for one extraction run.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Zotero data directory holding `zotero.sqlite` and `storage/`.
    pub library_root: PathBuf,
    /// Existing destination library directory.
    pub destination: PathBuf,
    /// Base for `attachments:` paths; the library root when `None`.
    pub attachments_dir: Option<PathBuf>,
    pub link: bool,
    /// chrono format for `time-added`.
    pub time_format: String,
    pub default_subfolder: String,
    pub author_separator: String,
}

impl ExtractOptions {
    /// Options with every optional setting at its default.
    #[must_use]
    pub fn new(library_root: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            library_root: library_root.into(),
            destination: destination.into(),
            attachments_dir: None,
            link: false,
            time_format: DEFAULT_TIME_FORMAT.to_string(),
            default_subfolder: DEFAULT_SUBFOLDER.to_string(),
            author_separator: DEFAULT_AUTHOR_SEPARATOR.to_string(),
        }
    }

    #[must_use]
    pub fn attachments_dir(&self) -> &Path {
        self.attachments_dir
            .as_deref()
            .unwrap_or(&self.library_root)
    }

    fn roots(&self) -> AttachmentRoots<'_> {
        AttachmentRoots {
            library_root: &self.library_root,
            attachments_dir: self.attachments_dir(),
        }
    }
}

/// Returns the database path inside `library_root`.
///
/// # Errors
///
/// Returns [`ExtractError::LibraryRootNotFound`] or
/// [`ExtractError::DatabaseNotFound`].
pub fn locate_database(library_root: &Path) -> Result<PathBuf, ExtractError> {
    if !library_root.is_dir() {
        return Err(ExtractError::LibraryRootNotFound(library_root.to_path_buf()));
    }
    let db_path = library_root.join(ZOTERO_DATABASE_FILE);
    if !db_path.is_file() {
        return Err(ExtractError::DatabaseNotFound(db_path));
    }
    Ok(db_path)
}

/// Read side of an extraction: turns database items into records.
#[derive(Debug)]
pub struct ZoteroReader {
    db: ZoteroDatabase,
    tables: &'static ZoteroMappings,
    tree: CollectionTree,
    options: ExtractOptions,
}

impl ZoteroReader {
    /// Opens the library named by `options` read-only.
    ///
    /// # Errors
    ///
    /// Returns a pre-flight error if the library or its database is missing,
    /// or the database error if opening or loading collections fails.
    pub async fn open(options: ExtractOptions) -> Result<Self, ExtractError> {
        let db_path = locate_database(&options.library_root)?;
        let db = ZoteroDatabase::open(&db_path).await?;
        Self::with_database(db, options)
            .await
            .map_err(ExtractError::from)
    }

    /// Wraps an already open database.
    ///
    /// # Errors
    ///
    /// Returns the driver error if collections cannot be loaded.
    pub async fn with_database(
        db: ZoteroDatabase,
        options: ExtractOptions,
    ) -> Result<Self, sqlx::Error> {
        let tree = CollectionTree::load(&db).await?;
        debug!(collections = tree.len(), "Collection tree loaded");
        Ok(Self {
            db,
            tables: ZoteroMappings::standard(),
            tree,
            options,
        })
    }

    #[must_use]
    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Number of items an extraction will visit.
    ///
    /// # Errors
    ///
    /// Returns the driver error if the query fails.
    pub async fn count(&self) -> Result<usize, sqlx::Error> {
        let count = count_items(&self.db, self.tables).await?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Items to extract, by ascending `itemID`.
    ///
    /// # Errors
    ///
    /// Returns the driver error if the query fails.
    pub async fn items(&self) -> Result<Vec<RawItem>, sqlx::Error> {
        list_items(&self.db, self.tables).await
    }

    /// Runs every resolver for one item.
    ///
    /// # Errors
    ///
    /// Returns the driver error of the first resolver query that fails.
    #[instrument(skip(self, item), fields(item_id = item.id, key = %item.key))]
    pub async fn read_item(&self, item: &RawItem) -> Result<NormalizedRecord, sqlx::Error> {
        let time_added = convert_time_added(&item.date_added, &self.options.time_format);
        let item_type = self.tables.item_type(&item.type_name).to_string();

        let files = load_attachments(&self.db, self.tables, item.id, self.options.roots()).await?;
        let fields = load_fields(&self.db, self.tables, item.id).await?;
        let creators = load_creators(&self.db, item.id, &self.options.author_separator).await?;
        let tags = load_tags(&self.db, item.id).await?;
        let collections = match load_collection_path(&self.db, &self.tree, item.id).await? {
            CollectionWalk::Cycle { collection_id } => {
                warn!(
                    item_id = item.id,
                    collection_id, "Collection parents form a cycle, using default folder"
                );
                None
            }
            walk => walk.into_path(),
        };

        Ok(NormalizedRecord {
            key: item.key.clone(),
            item_type,
            time_added,
            files,
            fields,
            creators,
            tags: (!tags.is_empty()).then_some(tags),
            collections,
        })
    }

    /// Releases the database connection.
    pub async fn close(self) {
        self.db.close().await;
    }
}

/// Extracts every item of a Zotero library into `library`.
///
/// # Errors
///
/// Returns an [`ExtractError`] only for pre-flight failures and when items
/// cannot be counted or listed. Per-item problems end up in the report.
pub async fn extract(
    options: ExtractOptions,
    library: &dyn DocumentLibrary,
    progress: &dyn ProgressObserver,
) -> Result<ImportReport, ExtractError> {
    locate_database(&options.library_root)?;
    if !options.destination.is_dir() {
        return Err(ExtractError::DestinationNotFound(options.destination.clone()));
    }

    let reader = ZoteroReader::open(options).await?;
    let report = run(&reader, library, progress).await;
    reader.close().await;
    report
}

async fn run(
    reader: &ZoteroReader,
    library: &dyn DocumentLibrary,
    progress: &dyn ProgressObserver,
) -> Result<ImportReport, ExtractError> {
    let options = reader.options();
    let total = reader.count().await?;
    let items = reader.items().await?;
    info!(
        total,
        library = %options.library_root.display(),
        destination = %options.destination.display(),
        "Starting Zotero extraction"
    );
    progress.started(total);

    let mut report = ImportReport::new();
    for (position, item) in items.iter().enumerate() {
        let index = position + 1;
        progress.item(index, &item.key);
        info!(
            "[{index:>4}/{total:<4}] Exporting item '{}' to library '{}'",
            item.key,
            options.destination.display()
        );

        let record = match reader.read_item(item).await {
            Ok(record) => record,
            Err(err) => {
                error!(item_id = item.id, key = %item.key, error = %err, "Failed to read item");
                report.push(ItemReport {
                    key: item.key.clone(),
                    data: None,
                    status: ItemStatus::Failed {
                        reason: err.to_string(),
                    },
                });
                continue;
            }
        };

        let data = record.to_data();
        let subfolder =
            subfolder_from_collections(record.collections.as_deref(), &options.default_subfolder);
        let request = AddRequest {
            files: &record.files,
            data: &data,
            link: options.link,
            folder_name: None,
            subfolder: Some(&subfolder),
        };

        let status = match library.add(request).await {
            Ok(added) => ItemStatus::Added {
                folder: added.folder,
            },
            Err(err) => {
                error!(item_id = item.id, key = %item.key, error = %err, "Failed to add item");
                ItemStatus::Failed {
                    reason: err.to_string(),
                }
            }
        };
        report.push(ItemReport {
            key: record.key,
            data: Some(data),
            status,
        });
    }

    let summary = report.summary();
    info!(
        total = summary.total,
        added = summary.added,
        failed = summary.failed,
        destination = %options.destination.display(),
        "Zotero extraction finished"
    );
    progress.finished(&summary);
    Ok(report)
}

/// Rewrites a Zotero `dateAdded` value in `format`.
///
/// Values that do not parse, or a format chrono cannot render, keep the raw
/// text.
#[must_use]
pub fn convert_time_added(raw: &str, format: &str) -> String {
    let parsed = match NaiveDateTime::parse_from_str(raw, ZOTERO_TIME_FORMAT) {
        Ok(parsed) => parsed,
        Err(err) => {
            warn!(value = raw, error = %err, "Unexpected dateAdded format, keeping raw value");
            return raw.to_string();
        }
    };

    let mut out = String::new();
    if write!(out, "{}", parsed.format(format)).is_err() {
        warn!(format, "Time format cannot be rendered, keeping raw dateAdded");
        return raw.to_string();
    }
    out
}

/// Returns true when chrono accepts every specifier in `format`.
#[must_use]
pub fn is_valid_time_format(format: &str) -> bool {
    !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}
