mod common;

use common::{work_id, TestLibrary};
use doujin_archive_core::normalize::normalize_for_filename;
use doujin_archive_core::persistence::{self, Namespace};
use doujin_archive_core::{Error, WorkStatus};
use std::fs;

const FULL_NAME: &str = "｛CG集｝[サークル (作者)] タイトル (ソース)";
const CIRCLE_ONLY: &str = "[サークル] タイトル1";

#[test]
fn test_scan_load_extract_merge() {
    let library = TestLibrary::new();
    library.add_folder(FULL_NAME, 3);
    library.add_folder(CIRCLE_ONLY, 1);
    let mut archive = library.open();

    let records = archive.scan().unwrap();
    assert_eq!(records.len(), 2);
    let load = archive.load(&records).unwrap();
    assert_eq!(load.inserted, 2);

    let extract = archive.extract_drafts().unwrap();
    assert_eq!(extract.drafted, 2);
    let merge = archive.merge_drafts().unwrap();
    assert_eq!(merge.merged, 2);
    assert_eq!(merge.complete, 1);

    let conn = archive.catalog().conn();
    let full = persistence::get_work(conn, work_id(archive.catalog(), FULL_NAME))
        .unwrap()
        .unwrap();
    let partial = persistence::get_work(conn, work_id(archive.catalog(), CIRCLE_ONLY))
        .unwrap()
        .unwrap();

    // One circle entry shared by both works
    assert_eq!(full.circle_id, partial.circle_id);
    assert_eq!(
        persistence::dictionary_entries(conn, Namespace::Circle).unwrap().len(),
        1
    );
    assert_eq!(partial.title.as_deref(), Some("タイトル"));
    assert_eq!(partial.source_id, None);

    // Merging never advances the status
    assert_eq!(full.status, WorkStatus::Pending);

    let state = persistence::get_completion_state(conn, partial.id)
        .unwrap()
        .unwrap();
    assert!(state.circle && state.title);
    assert!(!state.author && !state.source && !state.work_type);
}

#[test]
fn test_pipeline_is_idempotent() {
    let library = TestLibrary::new();
    library.add_folder(FULL_NAME, 3);
    library.add_folder(CIRCLE_ONLY, 1);
    let mut archive = library.open();

    let records = archive.scan().unwrap();
    archive.load(&records).unwrap();
    archive.extract_drafts().unwrap();
    archive.merge_drafts().unwrap();
    let first = persistence::all_works(archive.catalog().conn()).unwrap();

    // Loading the same scan again registers nothing
    assert_eq!(archive.load(&records).unwrap().skipped, 2);
    archive.extract_drafts().unwrap();
    archive.merge_drafts().unwrap();
    let second = persistence::all_works(archive.catalog().conn()).unwrap();

    assert_eq!(first, second);
    for namespace in Namespace::ALL {
        let entries = persistence::dictionary_entries(archive.catalog().conn(), namespace).unwrap();
        assert!(entries.len() <= 1, "{:?} grew on the second pass", namespace);
    }
}

#[test]
fn test_curate_preview_and_rename() {
    let library = TestLibrary::new();
    let folder = library.add_folder(FULL_NAME, 3);
    let mut archive = library.open();

    let records = archive.scan().unwrap();
    archive.load(&records).unwrap();
    archive.extract_drafts().unwrap();
    archive.merge_drafts().unwrap();

    // Merge already linked the parsed credits; relinking by another spelling is a no-op
    let id = work_id(archive.catalog(), FULL_NAME);
    assert!(!archive.link_circle(id, "ｻｰｸﾙ", Some("作者")).unwrap());
    assert!(!archive.link_source(id, "ソース").unwrap());
    assert!(archive.link_source(id, "別ソース").unwrap());

    let expected = normalize_for_filename(&format!(
        "｛CG集｝[サークル (作者)] タイトル （ソース、別ソース） #id{}",
        id
    ));
    assert_eq!(archive.compose_name(id).unwrap(), expected);

    // Only confirmed works are renamed
    let report = archive.rename_all_confirmed().unwrap();
    assert_eq!(report.renamed, 0);
    assert!(folder.exists());

    assert!(archive.set_status(&[id], WorkStatus::Confirmed).unwrap().is_empty());
    let report = archive.rename_all_confirmed().unwrap();
    assert_eq!(report.renamed, 1);

    let renamed = library.base.join(&expected);
    assert!(!folder.exists());
    assert!(renamed.join("001.jpg").exists());

    let work = persistence::get_work(archive.catalog().conn(), id)
        .unwrap()
        .unwrap();
    assert_eq!(work.folder_path, renamed);
    assert_eq!(work.status, WorkStatus::Renamed);

    let audit = fs::read_to_string(&report.audit_log).unwrap();
    assert_eq!(audit.lines().count(), 2);
    assert!(audit.contains(",renamed,"));

    // Catalog and disk agree afterwards
    assert!(archive.diff().unwrap().is_consistent());
}

#[test]
fn test_scan_targets_extend_the_base_dirs() {
    let mut library = TestLibrary::new();
    library.add_folder(FULL_NAME, 1);
    library.config.base_dirs.clear();
    let mut archive = library.open();

    assert!(matches!(archive.scan(), Err(Error::Configuration(_))));

    assert!(archive.add_scan_target(&library.base, Some("library")).unwrap());
    assert!(!archive.add_scan_target(&library.base, None).unwrap());
    assert_eq!(archive.base_dirs().unwrap(), vec![library.base.clone()]);

    let records = archive.scan().unwrap();
    assert_eq!(records.len(), 1);
    let targets = archive.scan_targets().unwrap();
    assert_eq!(targets.len(), 1);
    assert!(targets[0].last_scanned_at.is_some());

    assert!(archive.set_scan_target_active(targets[0].id, false).unwrap());
    assert!(matches!(archive.diff(), Err(Error::Configuration(_))));
}

#[test]
fn test_configured_dir_and_target_are_not_scanned_twice() {
    let library = TestLibrary::new();
    library.add_folder(CIRCLE_ONLY, 1);
    let mut archive = library.open();
    archive.add_scan_target(&library.base, None).unwrap();

    assert_eq!(archive.base_dirs().unwrap().len(), 1);
    assert_eq!(archive.scan().unwrap().len(), 1);
}

#[test]
fn test_classify_exports_category_folders() {
    let mut library = TestLibrary::new();
    library.config.threshold = 2;
    let category = library.add_folder("【画像2枚以上】", 0);
    common::make_folder(&category, FULL_NAME, 3);
    common::make_folder(&category, CIRCLE_ONLY, 1);
    library.add_folder("loose", 5);
    let archive = library.open();

    let exports = archive.classify().unwrap();
    assert_eq!(exports.len(), 1);
    assert_eq!(exports[0].records, 2);
    assert!(exports[0].json_path.starts_with(&library.base));

    let name = exports[0].csv_path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("classification_result_thresh2_"));

    let csv = fs::read_to_string(&exports[0].csv_path).unwrap();
    assert_eq!(csv.lines().count(), 3);
    assert!(csv.contains(",3,【画像2枚以上】,true"));
    assert!(csv.contains(",1,【画像2枚以上】,false"));
}
