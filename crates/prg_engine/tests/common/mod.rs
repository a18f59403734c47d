#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::NaiveDate;

pub const UG_BLOCK: [&str; 5] = ["#101=1.5", "#102=2.5", "#103=3.5", "#104=4.5", "#105=5.5"];

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(prg_logging::initialize_for_tests);
}

pub fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

/// Program text with every subprogram, the given part length and cut-off,
/// and `tail` appended.
pub fn program(first_line: &str, part_length: &str, cut_off: &str, tail: &[&str]) -> String {
    let mut lines: Vec<String> = vec![
        first_line.to_string(),
        "$0 (FACE)".to_string(),
        "$1 (TURN)".to_string(),
        "$2 (PART OFF)".to_string(),
        "(PartLength)".to_string(),
        format!("#100={part_length}"),
        "T0100 (CUT-OFF)".to_string(),
        "G97 S800".to_string(),
        format!("G0 Z{cut_off}"),
    ];
    lines.extend(tail.iter().map(|line| line.to_string()));
    lines.join("\n") + "\n"
}

/// Clean DS program for `O<number>`.
pub fn clean_ds(number: &str) -> String {
    program(&format!("O{number} (SHAFT DS)"), "100.0000", "100.0000", &[])
}

/// Clean ASC program for `O<number>`.
pub fn clean_asc(number: &str) -> String {
    program(&format!("O{number} (ASC SLEEVE)"), "42.5", "42.5", &UG_BLOCK)
}

pub fn at(secs: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(secs)
}

/// Writes `dir/name` and pins its modification time.
pub fn write_prg(dir: &Path, name: &str, body: &str, mtime_secs: u64) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    set_mtime(&path, mtime_secs);
    path
}

pub fn set_mtime(path: &Path, secs: u64) {
    let file = fs::File::options().write(true).open(path).unwrap();
    file.set_modified(at(secs)).unwrap();
}
