use std::fs;

use name_book::{CancelToken, Controller, ErrorKind, Record, Store, Submitted};
use tempfile::TempDir;

fn controller_in(dir: &TempDir) -> Controller {
    let store = Store::open(dir.path().join("SQLite").join("names.db")).unwrap();
    let mut controller = Controller::new(store);
    controller.refresh().unwrap();
    controller
}

fn add(controller: &mut Controller, name: &str) -> Record {
    controller.form_mut().set_draft(name);
    match controller.submit().unwrap() {
        Submitted::Added(record) => record,
        other => panic!("expected insert, got {other:?}"),
    }
}

fn sorted(mut records: Vec<Record>) -> Vec<Record> {
    records.sort_by_key(|record| record.id);
    records
}

#[test]
fn export_then_import_reproduces_the_listing() {
    let app_dir = TempDir::new().unwrap();
    let export_dir = TempDir::new().unwrap();
    let mut controller = controller_in(&app_dir);

    add(&mut controller, "Ada");
    let grace = add(&mut controller, "Grace");
    add(&mut controller, "Linus");
    controller.delete(grace.id).unwrap();
    let before = sorted(controller.store().list_all().unwrap());

    let exported = controller
        .export_to(export_dir.path(), &CancelToken::new())
        .unwrap();
    assert_eq!(exported.file_name().unwrap(), "names.db");
    assert_eq!(
        fs::read(&exported).unwrap(),
        fs::read(controller.store().path()).unwrap()
    );

    add(&mut controller, "added after export");
    let count = controller
        .import_from(&exported, &CancelToken::new())
        .unwrap();

    assert_eq!(count, before.len());
    assert_eq!(sorted(controller.store().list_all().unwrap()), before);
    assert_eq!(sorted(controller.records().as_slice().to_vec()), before);
}

#[test]
fn import_into_a_fresh_data_dir_creates_the_store_folder() {
    let source_dir = TempDir::new().unwrap();
    let mut source = controller_in(&source_dir);
    add(&mut source, "carried over");
    let export_dir = TempDir::new().unwrap();
    let exported = source
        .export_to(export_dir.path(), &CancelToken::new())
        .unwrap();

    let target_dir = TempDir::new().unwrap();
    let mut target = controller_in(&target_dir);
    fs::remove_dir_all(target_dir.path().join("SQLite")).unwrap();

    target.import_from(&exported, &CancelToken::new()).unwrap();
    let names: Vec<String> = target.records().iter().map(|r| r.name.clone()).collect();
    assert_eq!(names, vec!["carried over"]);
}

#[test]
fn importing_a_non_database_surfaces_storage_errors_without_panicking() {
    let app_dir = TempDir::new().unwrap();
    let mut controller = controller_in(&app_dir);
    add(&mut controller, "Ada");

    let garbage = app_dir.path().join("holiday.jpg");
    fs::write(&garbage, vec![0xAB; 8192]).unwrap();

    let err = controller
        .import_from(&garbage, &CancelToken::new())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);
    assert!(controller.records().is_empty());
    assert!(!controller.is_busy());

    assert_eq!(controller.refresh().unwrap_err().kind(), ErrorKind::Storage);
    controller.form_mut().set_draft("Grace");
    assert_eq!(controller.submit().unwrap_err().kind(), ErrorKind::Storage);
}

#[test]
fn a_good_import_recovers_from_a_bad_one() {
    let good_dir = TempDir::new().unwrap();
    let mut good = controller_in(&good_dir);
    add(&mut good, "restored");
    let export_dir = TempDir::new().unwrap();
    let exported = good.export_to(export_dir.path(), &CancelToken::new()).unwrap();

    let app_dir = TempDir::new().unwrap();
    let mut controller = controller_in(&app_dir);
    let garbage = app_dir.path().join("notes.txt");
    fs::write(&garbage, "definitely not sqlite ".repeat(200)).unwrap();
    controller.import_from(&garbage, &CancelToken::new()).unwrap_err();

    assert_eq!(controller.import_from(&exported, &CancelToken::new()).unwrap(), 1);
    add(&mut controller, "new");
    assert_eq!(controller.records().len(), 2);
}
