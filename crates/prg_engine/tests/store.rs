mod common;

use std::fs;
use std::path::PathBuf;

use common::{clean_ds, day, init_logging, program, write_prg};
use pretty_assertions::assert_eq;
use prg_core::{IssueKind, RecordMap};
use prg_engine::{PrgValidator, Reconciler, StateStore};
use tempfile::TempDir;

/// Scans a small tree holding a duplicate and a record with issues.
fn scanned_records(root: &std::path::Path) -> RecordMap {
    write_prg(&root.join("a"), "9001.prg", &clean_ds("9001"), 1_000);
    write_prg(&root.join("b"), "9001.prg", &clean_ds("9001"), 2_000);
    write_prg(
        &root.join("a"),
        "bad.prg",
        &program("O9002 (ASC)", "1", "2", &[]),
        3_000,
    );
    let mut engine = Reconciler::new(root.to_path_buf(), PrgValidator::default());
    engine.scan();
    engine.records().clone()
}

#[test]
fn save_then_load_same_day_round_trips() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let records = scanned_records(&temp.path().join("share"));
    let store = StateStore::new(temp.path().join("state").join("prg_state.json"));

    let written = store.save(&records, day()).unwrap();
    assert_eq!(written, temp.path().join("state").join("prg_state.json"));

    let loaded = store.load(day());
    assert_eq!(loaded, records);

    let bad = loaded.get("bad.prg").unwrap();
    let detail = bad
        .issues
        .iter()
        .find(|issue| issue.kind == IssueKind::PartLengthMismatch)
        .and_then(|issue| issue.detail.clone());
    assert!(detail.is_some());
}

#[test]
fn state_from_another_day_is_discarded() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let records = scanned_records(&temp.path().join("share"));
    let store = StateStore::new(temp.path().join("prg_state.json"));
    store.save(&records, day()).unwrap();

    let tomorrow = day().succ_opt().unwrap();
    assert!(store.load(tomorrow).is_empty());
}

#[test]
fn missing_or_corrupt_state_loads_empty() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let store = StateStore::new(temp.path().join("prg_state.json"));
    assert!(store.load(day()).is_empty());

    fs::write(store.path(), "{ not json").unwrap();
    assert!(store.load(day()).is_empty());
}

#[test]
fn other_versions_are_treated_as_stale() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let store = StateStore::new(temp.path().join("prg_state.json"));
    fs::write(
        store.path(),
        r#"{"version": 7, "day": "2026-10-19", "files": {}}"#,
    )
    .unwrap();
    assert!(store.load(day()).is_empty());
}

#[test]
fn document_uses_day_and_stable_issue_codes() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let records = scanned_records(&temp.path().join("share"));
    let store = StateStore::new(temp.path().join("prg_state.json"));
    store.save(&records, day()).unwrap();

    let text = fs::read_to_string(store.path()).unwrap();
    let document: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(document["version"], 1);
    assert_eq!(document["day"], "2026-10-19");

    let bad = &document["files"]["bad.prg"];
    assert_eq!(bad["case_type"], "ASC");
    let codes: Vec<u64> = bad["issues"]
        .as_array()
        .unwrap()
        .iter()
        .map(|issue| issue["code"].as_u64().unwrap())
        .collect();
    assert_eq!(codes, vec![6, 4, 7]);

    let duplicate = &document["files"]["9001.prg"]["duplicates"][0];
    assert_eq!(duplicate["issues"][0]["code"], 5);
    assert_eq!(duplicate["modified_ns"], 2_000_000_000_000i64);
}

#[test]
fn unknown_issue_codes_are_dropped() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let store = StateStore::new(temp.path().join("prg_state.json"));
    fs::write(
        store.path(),
        r#"{
  "version": 1,
  "day": "2026-10-19",
  "files": {
    "9001.prg": {
      "file_name": "9001.prg",
      "location": "/nc/a",
      "modified_ns": 5,
      "case_type": "DS",
      "issues": [{"code": 99}, {"code": 4}],
      "duplicates": [
        {"file_name": "9001.prg", "location": "/nc/b", "modified_ns": 6, "case_type": "DS", "issues": []}
      ]
    }
  }
}"#,
    )
    .unwrap();

    let loaded = store.load(day());
    let record = loaded.get("9001.prg").unwrap();
    assert_eq!(record.location, PathBuf::from("/nc/a"));
    assert_eq!(record.stamp.file_id, None);
    let kinds: Vec<_> = record.issues.kinds().collect();
    assert_eq!(kinds, vec![IssueKind::InvalidName]);
    assert!(record.duplicates[0]
        .issues
        .contains(IssueKind::DuplicateOccurrence));
}

#[test]
fn save_reports_unwritable_location() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("state");
    fs::write(&blocker, "a file, not a folder").unwrap();

    let store = StateStore::new(blocker.join("prg_state.json"));
    assert!(store.save(&RecordMap::new(), day()).is_err());
}
