use std::fs;

use harvester_engine::{ensure_output_dir, AtomicFileWriter, PersistError};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

#[test]
fn output_dir_is_created_on_demand() {
    let temp = TempDir::new().unwrap();
    let nested = temp.path().join("debug_screenshots").join("run1");

    ensure_output_dir(&nested).unwrap();

    assert!(nested.is_dir());
}

#[test]
fn output_dir_that_is_a_file_is_rejected() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("debug_screenshots");
    fs::write(&blocker, "x").unwrap();

    let err = ensure_output_dir(&blocker).unwrap_err();
    assert!(matches!(err, PersistError::OutputDir(_)));
}

#[test]
fn artifacts_are_written_whole_and_replaced() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().join("debug"));
    assert_eq!(writer.dir(), temp.path().join("debug").as_path());

    let png = writer.write("page001_row002_T0.png", [0x89u8, b'P', b'N', b'G']).unwrap();
    assert_eq!(fs::read(&png).unwrap(), b"\x89PNG");

    let again = writer.write("page001_row002_T0.png", b"second".as_slice()).unwrap();
    assert_eq!(png, again);
    assert_eq!(fs::read(&again).unwrap(), b"second");

    let leftovers: Vec<_> = fs::read_dir(writer.dir())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(leftovers.len(), 1);
}

#[test]
fn failed_write_leaves_nothing_behind() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("not_a_dir");
    fs::write(&blocker, "x").unwrap();

    let writer = AtomicFileWriter::new(blocker.clone());
    assert!(writer.write("page001_view_T0.html", "<html></html>").is_err());
    assert!(!blocker.with_file_name("page001_view_T0.html").exists());
}
