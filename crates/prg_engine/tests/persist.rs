use std::fs;

use prg_engine::{AtomicFileWriter, PersistError};
use tempfile::TempDir;

#[test]
fn state_file_in_a_new_folder_is_created() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("watch").join("state").join("prg_state.json");

    let writer = AtomicFileWriter::new(target.clone());
    writer.write(b"{\"version\":1}").unwrap();
    assert_eq!(writer.target(), target.as_path());
    assert_eq!(fs::read_to_string(&target).unwrap(), "{\"version\":1}");
}

#[test]
fn repeated_saves_leave_only_the_state_file() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("prg_state.json");
    let writer = AtomicFileWriter::new(target.clone());

    for pass in 1..=3 {
        writer.write(format!("pass {pass}").as_bytes()).unwrap();
    }
    assert_eq!(fs::read_to_string(&target).unwrap(), "pass 3");
    let names: Vec<_> = fs::read_dir(temp.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(names, vec!["prg_state.json"]);
}

#[test]
fn folder_blocked_by_a_file_keeps_nothing_half_written() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("state");
    fs::write(&blocker, "not a folder").unwrap();

    let err = AtomicFileWriter::new(blocker.join("prg_state.json"))
        .write(b"{}")
        .unwrap_err();
    assert!(matches!(err, PersistError::Folder { ref path, .. } if path == &blocker));
    assert_eq!(fs::read_to_string(&blocker).unwrap(), "not a folder");
}

#[test]
fn folder_path_is_not_a_state_file() {
    let temp = TempDir::new().unwrap();
    let err = AtomicFileWriter::new(temp.path().to_path_buf())
        .write(b"{}")
        .unwrap_err();
    assert!(matches!(err, PersistError::NotAFile(_)));
    assert!(temp.path().is_dir());
}
