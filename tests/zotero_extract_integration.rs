//! Integration tests for Zotero extraction against a real `zotero.sqlite` file.

mod support;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;
use support::zotero_fixture::ZoteroFixture;
use tempfile::TempDir;
use zotero_import::library::INFO_FILE_NAME;
use zotero_import::{
    AddRequest, AddedDocument, DocumentData, DocumentLibrary, ExtractError, ExtractOptions,
    FolderLibrary, ItemStatus, LibraryError, NoProgress, ZOTERO_DATABASE_FILE, extract,
};

#[derive(Debug, Clone, PartialEq)]
struct Recorded {
    data: DocumentData,
    files: Vec<PathBuf>,
    subfolder: Option<PathBuf>,
    link: bool,
}

/// Destination that remembers every request and can refuse chosen keys.
#[derive(Default)]
struct RecordingLibrary {
    calls: Mutex<Vec<Recorded>>,
    reject: HashSet<String>,
}

impl RecordingLibrary {
    fn rejecting(keys: &[&str]) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            reject: keys.iter().map(|k| (*k).to_string()).collect(),
        }
    }

    fn calls(&self) -> Vec<Recorded> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentLibrary for RecordingLibrary {
    async fn add(&self, request: AddRequest<'_>) -> Result<AddedDocument, LibraryError> {
        let key = request
            .data
            .get("zotero-key")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        self.calls.lock().unwrap().push(Recorded {
            data: request.data.clone(),
            files: request.files.to_vec(),
            subfolder: request.subfolder.map(Path::to_path_buf),
            link: request.link,
        });
        if self.reject.contains(&key) {
            return Err(LibraryError::Rejected(format!("refusing {key}")));
        }
        Ok(AddedDocument {
            folder: PathBuf::from(key),
        })
    }
}

/// A Zotero data directory plus an empty destination.
struct Workspace {
    _dir: TempDir,
    library_root: PathBuf,
    destination: PathBuf,
}

impl Workspace {
    async fn create() -> (Self, ZoteroFixture) {
        let dir = TempDir::new().unwrap();
        let library_root = dir.path().join("Zotero");
        let destination = dir.path().join("papers");
        fs::create_dir_all(library_root.join("storage")).unwrap();
        fs::create_dir_all(&destination).unwrap();
        let fixture = ZoteroFixture::create_file(&library_root.join(ZOTERO_DATABASE_FILE)).await;
        (
            Self {
                _dir: dir,
                library_root,
                destination,
            },
            fixture,
        )
    }

    fn options(&self) -> ExtractOptions {
        ExtractOptions::new(&self.library_root, &self.destination)
    }

    fn storage_file(&self, key: &str, name: &str) -> PathBuf {
        let dir = self.library_root.join("storage").join(key);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, b"%PDF-1.4").unwrap();
        path
    }
}

fn data_for<'a>(calls: &'a [Recorded], key: &str) -> &'a DocumentData {
    &calls
        .iter()
        .find(|c| c.data["zotero-key"] == key)
        .unwrap()
        .data
}

#[tokio::test]
async fn test_dates_split_into_year_and_month() {
    let (ws, fx) = Workspace::create().await;
    fx.add_item(1, "book", "YEARONLY", "2020-01-01 10:00:00").await;
    fx.set_field(1, "date", "1999").await;
    fx.add_item(2, "book", "YEARMONT", "2020-01-01 10:00:00").await;
    fx.set_field(2, "date", "2004-11").await;
    fx.add_item(3, "book", "FULLDATE", "2020-01-01 10:00:00").await;
    fx.set_field(3, "date", "2010-03-27").await;
    fx.add_item(4, "book", "FREEFORM", "2020-01-01 10:00:00").await;
    fx.set_field(4, "date", "Spring 2020").await;
    fx.close().await;

    let library = RecordingLibrary::default();
    let report = extract(ws.options(), &library, &NoProgress).await.unwrap();
    assert_eq!(report.added(), 4);

    let calls = library.calls();
    let year_only = data_for(&calls, "YEARONLY");
    assert_eq!(year_only["year"], 1999);
    assert!(!year_only.contains_key("month"));
    assert!(!year_only.contains_key("date"));

    let year_month = data_for(&calls, "YEARMONT");
    assert_eq!(year_month["year"], 2004);
    assert_eq!(year_month["month"], 11);

    let full = data_for(&calls, "FULLDATE");
    assert_eq!(full["year"], 2010);
    assert_eq!(full["month"], 3);
    assert!(!full.contains_key("date"));

    let free = data_for(&calls, "FREEFORM");
    assert_eq!(free["date"], "Spring 2020");
    assert!(!free.contains_key("year"));
    assert!(!free.contains_key("month"));
}

#[tokio::test]
async fn test_record_carries_base_keys_and_translations() {
    let (ws, fx) = Workspace::create().await;
    fx.add_item(1, "conferencePaper", "CONF0001", "2021-02-03 04:05:06")
        .await;
    fx.set_field(1, "title", "Fast Things").await;
    fx.set_field(1, "publicationTitle", "Proc. Things").await;
    fx.set_field(1, "accessDate", "2021-01-01").await;
    fx.set_field(1, "shortTitle", "Fast").await;
    fx.add_tag(1, "speed").await;
    fx.add_tag(1, "systems").await;
    fx.close().await;

    let library = RecordingLibrary::default();
    extract(ws.options(), &library, &NoProgress).await.unwrap();

    let calls = library.calls();
    let data = &calls[0].data;
    assert_eq!(data["type"], "inproceedings");
    assert_eq!(data["time-added"], "2021-02-03-04:05:06");
    assert_eq!(data["journal"], "Proc. Things");
    assert_eq!(data["title"], "Fast Things");
    assert_eq!(data["tags"], json!(["speed", "systems"]));
    assert!(!data.contains_key("accessDate"));
    assert!(!data.contains_key("shortTitle"));
    assert!(!data.contains_key("publicationTitle"));
    assert!(!calls[0].link);
}

#[tokio::test]
async fn test_authors_keep_order() {
    let (ws, fx) = Workspace::create().await;
    fx.add_item(1, "journalArticle", "AUTHORS1", "2020-01-01 10:00:00")
        .await;
    fx.add_creator(1, "author", "C", "D", 1).await;
    fx.add_creator(1, "author", "A", "B", 0).await;
    fx.add_creator(1, "editor", "E", "F", 0).await;
    fx.close().await;

    let library = RecordingLibrary::default();
    extract(ws.options(), &library, &NoProgress).await.unwrap();

    let calls = library.calls();
    let data = &calls[0].data;
    assert_eq!(
        data["author_list"],
        json!([{"given": "A", "family": "B"}, {"given": "C", "family": "D"}])
    );
    assert_eq!(data["author"], "B, A; D, C");
    assert_eq!(data["editor_list"], json!([{"given": "E", "family": "F"}]));
}

#[tokio::test]
async fn test_storage_attachment_resolution() {
    let (ws, fx) = Workspace::create().await;
    let present = ws.storage_file("ATTKEY01", "present.pdf");
    fx.add_item(1, "book", "ITEMWITH", "2020-01-01 10:00:00").await;
    fx.add_attachment(1, 2, "ATTKEY01", "application/pdf", Some("storage:present.pdf"))
        .await;
    fx.add_attachment(1, 3, "ATTKEY02", "application/pdf", Some("storage:missing.pdf"))
        .await;
    fx.add_attachment(1, 4, "ATTKEY03", "text/html", Some("storage:page.html"))
        .await;
    fx.add_attachment(1, 5, "ATTKEY04", "application/pdf", None)
        .await;
    fx.close().await;

    let library = RecordingLibrary::default();
    let report = extract(ws.options(), &library, &NoProgress).await.unwrap();

    assert_eq!(report.total(), 1, "attachment items are not extracted");
    assert_eq!(report.added(), 1);
    let calls = library.calls();
    assert_eq!(calls[0].files, vec![present.clone()]);
    assert_eq!(
        calls[0].data["files"],
        json!([present.to_string_lossy()])
    );
}

#[tokio::test]
async fn test_attachments_dir_and_linked_paths() {
    let (ws, fx) = Workspace::create().await;
    let linked_dir = TempDir::new().unwrap();
    fs::write(linked_dir.path().join("rel.pdf"), b"x").unwrap();
    let absolute = linked_dir.path().join("abs.epub");
    fs::write(&absolute, b"x").unwrap();

    fx.add_item(1, "book", "LINKED01", "2020-01-01 10:00:00").await;
    fx.add_attachment(1, 2, "ATT1", "application/pdf", Some("attachments:rel.pdf"))
        .await;
    fx.add_attachment(
        1,
        3,
        "ATT2",
        "application/epub+zip",
        absolute.to_str(),
    )
    .await;
    fx.add_attachment(1, 4, "ATT3", "application/pdf", Some("/definitely/not/here.pdf"))
        .await;
    fx.close().await;

    let mut options = ws.options();
    options.attachments_dir = Some(linked_dir.path().to_path_buf());
    let library = RecordingLibrary::default();
    extract(options, &library, &NoProgress).await.unwrap();

    assert_eq!(
        library.calls()[0].files,
        vec![linked_dir.path().join("rel.pdf"), absolute]
    );
}

#[tokio::test]
async fn test_collection_chain_becomes_subfolder() {
    let (ws, fx) = Workspace::create().await;
    fx.add_item(1, "book", "INCHAIN1", "2020-01-01 10:00:00").await;
    fx.add_item(2, "book", "NOCOLL01", "2020-01-01 10:00:00").await;
    fx.add_collection(1, "Root", None).await;
    fx.add_collection(2, "Mid", Some(1)).await;
    fx.add_collection(3, "Leaf", Some(2)).await;
    fx.add_to_collection(3, 1).await;
    fx.close().await;

    let library = RecordingLibrary::default();
    extract(ws.options(), &library, &NoProgress).await.unwrap();

    let calls = library.calls();
    assert_eq!(calls[0].data["collections"], json!(["Root", "Mid", "Leaf"]));
    assert_eq!(
        calls[0].subfolder,
        Some(PathBuf::from("Root").join("Mid").join("Leaf"))
    );
    assert!(!calls[1].data.contains_key("collections"));
    assert_eq!(calls[1].subfolder, Some(PathBuf::from("Misc")));
}

#[tokio::test]
async fn test_collection_cycle_uses_default_folder() {
    let (ws, fx) = Workspace::create().await;
    fx.add_item(1, "book", "CYCLIC01", "2020-01-01 10:00:00").await;
    fx.add_collection(1, "A", None).await;
    fx.add_collection(2, "B", Some(1)).await;
    fx.set_collection_parent(1, Some(2)).await;
    fx.add_to_collection(2, 1).await;
    fx.close().await;

    let library = RecordingLibrary::default();
    let report = extract(ws.options(), &library, &NoProgress).await.unwrap();

    assert_eq!(report.added(), 1);
    let calls = library.calls();
    assert!(!calls[0].data.contains_key("collections"));
    assert_eq!(calls[0].subfolder, Some(PathBuf::from("Misc")));
}

#[tokio::test]
async fn test_excluded_types_never_enumerated() {
    let (ws, fx) = Workspace::create().await;
    fx.add_item(1, "book", "BOOK0001", "2020-01-01 10:00:00").await;
    fx.add_item(2, "note", "NOTE0001", "2020-01-01 10:00:00").await;
    fx.add_item(3, "annotation", "ANNO0001", "2020-01-01 10:00:00")
        .await;
    fx.add_attachment(1, 4, "ATTA0001", "application/pdf", None)
        .await;
    fx.close().await;

    let library = RecordingLibrary::default();
    let report = extract(ws.options(), &library, &NoProgress).await.unwrap();

    let keys: Vec<&str> = report.items().iter().map(|i| i.key.as_str()).collect();
    assert_eq!(keys, vec!["BOOK0001"]);
}

#[tokio::test]
async fn test_add_failure_does_not_stop_the_run() {
    let (ws, fx) = Workspace::create().await;
    fx.add_item(1, "book", "FIRST001", "2020-01-01 10:00:00").await;
    fx.add_item(2, "book", "SECOND01", "2020-01-01 10:00:00").await;
    fx.add_item(3, "book", "THIRD001", "2020-01-01 10:00:00").await;
    fx.close().await;

    let library = RecordingLibrary::rejecting(&["FIRST001"]);
    let report = extract(ws.options(), &library, &NoProgress).await.unwrap();

    assert_eq!(library.calls().len(), 3);
    assert_eq!(report.total(), 3);
    assert_eq!(report.added(), 2);
    assert_eq!(report.failed(), 1);
    assert!(matches!(
        &report.items()[0].status,
        ItemStatus::Failed { reason } if reason.contains("FIRST001")
    ));
    assert_eq!(
        report.items()[1].status,
        ItemStatus::Added {
            folder: PathBuf::from("SECOND01")
        }
    );
}

#[tokio::test]
async fn test_unreadable_item_does_not_stop_the_run() {
    let (ws, fx) = Workspace::create().await;
    fx.add_item(1, "book", "BROKEN01", "2020-01-01 10:00:00").await;
    fx.add_creator(1, "contributor", "Ada", "Lovelace", 0).await;
    fx.corrupt_creator_type("contributor").await;
    fx.add_item(2, "book", "HEALTHY1", "2020-01-01 10:00:00").await;
    fx.add_creator(2, "author", "Grace", "Hopper", 0).await;
    fx.close().await;

    let library = RecordingLibrary::default();
    let report = extract(ws.options(), &library, &NoProgress).await.unwrap();

    assert_eq!(report.total(), 2);
    assert_eq!(report.failed(), 1);
    assert_eq!(report.added(), 1);

    let broken = &report.items()[0];
    assert_eq!(broken.key, "BROKEN01");
    assert!(broken.data.is_none());
    assert!(matches!(broken.status, ItemStatus::Failed { .. }));
    assert_eq!(
        report.items()[1].status,
        ItemStatus::Added {
            folder: PathBuf::from("HEALTHY1")
        }
    );

    let calls = library.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].data["author"], "Hopper, Grace");
}

#[tokio::test]
async fn test_rerun_produces_identical_records() {
    let (ws, fx) = Workspace::create().await;
    ws.storage_file("ATTKEY01", "a.pdf");
    fx.add_item(1, "book", "STABLE01", "2020-05-06 07:08:09").await;
    fx.set_field(1, "title", "Same Every Time").await;
    fx.set_field(1, "date", "2001-02-03").await;
    fx.add_creator(1, "author", "Ann", "Lee", 0).await;
    fx.add_attachment(1, 2, "ATTKEY01", "application/pdf", Some("storage:a.pdf"))
        .await;
    fx.add_tag(1, "t").await;
    fx.add_collection(1, "C", None).await;
    fx.add_to_collection(1, 1).await;
    fx.add_item(3, "report", "STABLE02", "2020-05-06 07:08:09").await;
    fx.close().await;

    let first = RecordingLibrary::default();
    let second = RecordingLibrary::default();
    let report_one = extract(ws.options(), &first, &NoProgress).await.unwrap();
    let report_two = extract(ws.options(), &second, &NoProgress).await.unwrap();

    assert_eq!(first.calls(), second.calls());
    assert_eq!(report_one, report_two);
}

#[tokio::test]
async fn test_preflight_failures_process_nothing() {
    let dir = TempDir::new().unwrap();
    let library = RecordingLibrary::default();

    let missing_root = ExtractOptions::new(dir.path().join("nope"), dir.path());
    assert!(matches!(
        extract(missing_root, &library, &NoProgress).await,
        Err(ExtractError::LibraryRootNotFound(_))
    ));

    let no_database = ExtractOptions::new(dir.path(), dir.path());
    assert!(matches!(
        extract(no_database, &library, &NoProgress).await,
        Err(ExtractError::DatabaseNotFound(_))
    ));

    let (ws, fx) = Workspace::create().await;
    fx.add_item(1, "book", "NEVERSEE", "2020-01-01 10:00:00").await;
    fx.close().await;
    let no_destination = ExtractOptions::new(&ws.library_root, ws.destination.join("missing"));
    assert!(matches!(
        extract(no_destination, &library, &NoProgress).await,
        Err(ExtractError::DestinationNotFound(_))
    ));

    assert!(library.calls().is_empty());
}

#[tokio::test]
async fn test_database_is_not_modified() {
    let (ws, fx) = Workspace::create().await;
    fx.add_item(1, "book", "READONLY", "2020-01-01 10:00:00").await;
    fx.close().await;
    let db_path = ws.library_root.join(ZOTERO_DATABASE_FILE);
    let before = fs::read(&db_path).unwrap();

    extract(ws.options(), &RecordingLibrary::default(), &NoProgress)
        .await
        .unwrap();

    assert_eq!(fs::read(&db_path).unwrap(), before);
}

#[tokio::test]
async fn test_folder_library_end_to_end() {
    let (ws, fx) = Workspace::create().await;
    ws.storage_file("ATTKEY01", "paper.pdf");
    fx.add_item(1, "journalArticle", "E2EITEM1", "2020-01-01 10:00:00")
        .await;
    fx.set_field(1, "title", "An Article").await;
    fx.set_field(1, "date", "2018").await;
    fx.add_creator(1, "author", "Grace", "Hopper", 0).await;
    fx.add_attachment(1, 2, "ATTKEY01", "application/pdf", Some("storage:paper.pdf"))
        .await;
    fx.add_collection(1, "Computing", None).await;
    fx.add_to_collection(1, 1).await;
    fx.add_item(3, "book", "E2EITEM2", "2020-01-01 10:00:00").await;
    fx.close().await;

    let library = FolderLibrary::new(&ws.destination);
    let report = extract(ws.options(), &library, &NoProgress).await.unwrap();
    assert_eq!(report.added(), 2);

    let article = ws
        .destination
        .join("Computing")
        .join("Hopper_2018_An_Article");
    assert!(article.join("paper.pdf").is_file());
    let info: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(article.join(INFO_FILE_NAME)).unwrap()).unwrap();
    assert_eq!(info["files"], json!(["paper.pdf"]));
    assert_eq!(info["zotero-key"], "E2EITEM1");
    assert_eq!(info["type"], "article");

    let book = ws.destination.join("Misc").join("E2EITEM2");
    assert!(book.join(INFO_FILE_NAME).is_file());
}
