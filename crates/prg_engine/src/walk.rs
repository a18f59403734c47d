use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use walkdir::DirEntry;

pub(crate) static ASC_FOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+_ASC_\(\d+\)$").unwrap());

pub(crate) const ALL_FOLDER: &str = "ALL";

/// Dated ASC pickup folder, e.g. `10.19_ASC_(12)`.
pub fn is_asc_folder_name(name: &str) -> bool {
    ASC_FOLDER.is_match(name)
}

/// Pickup folders hold gathered copies and are never walked. Any folder
/// whose name contains `ALL` (case-sensitive) counts, so `ALL_old` and other
/// renamed pickup folders stay out of the record map.
pub fn is_pickup_dir_name(name: &str) -> bool {
    name.contains(ALL_FOLDER) || is_asc_folder_name(name)
}

pub fn is_prg_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("prg"))
}

/// `filter_entry` predicate: descend everywhere except into pickup folders.
/// The walk root itself is always entered.
pub(crate) fn should_descend(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return true;
    }
    entry
        .file_name()
        .to_str()
        .map_or(true, |name| !is_pickup_dir_name(name))
}
