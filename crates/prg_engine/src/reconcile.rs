use std::collections::HashMap;
use std::fs;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use prg_core::{
    normalize_name, DuplicateChange, DuplicateRecord, FileRecord, FileStamp, RecordMap,
    StateSnapshot, Verdict,
};
use prg_logging::{engine_debug, engine_info, engine_warn};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use walkdir::WalkDir;

use crate::validate::{ValidateError, Validator};
use crate::walk::{is_prg_file, should_descend};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("watched folder {} is unavailable", .0.display())]
    RootUnavailable(PathBuf),
}

/// What one pass did to the record map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PassReport {
    pub added: usize,
    pub replaced: usize,
    /// Duplicate records added or refreshed.
    pub duplicates: usize,
    /// Duplicates and records dropped because their file is gone.
    pub pruned: usize,
    /// Records re-attached at a new location without re-validation.
    pub moved: usize,
    /// Files left for the next pass after an I/O failure or name clash.
    pub skipped: usize,
    pub cancelled: bool,
}

impl PassReport {
    pub fn changed(&self) -> bool {
        self.added + self.replaced + self.duplicates + self.pruned + self.moved > 0
    }
}

/// Modification time and, on Unix, the inode number of a file.
pub fn file_stamp(meta: &fs::Metadata) -> FileStamp {
    let modified_ns = match meta.modified().map(|t| t.duration_since(UNIX_EPOCH)) {
        Ok(Ok(since)) => since.as_nanos() as i64,
        Ok(Err(before)) => -(before.duration().as_nanos() as i64),
        Err(_) => 0,
    };
    FileStamp {
        modified_ns,
        file_id: file_id(meta),
    }
}

#[cfg(unix)]
fn file_id(meta: &fs::Metadata) -> Option<u64> {
    use std::os::unix::fs::MetadataExt;
    Some(meta.ino())
}

#[cfg(not(unix))]
fn file_id(_meta: &fs::Metadata) -> Option<u64> {
    None
}

/// Existence check used by pruning. A check that fails for any reason other
/// than "not found" keeps the record.
fn still_exists(path: &Path) -> bool {
    match fs::symlink_metadata(path) {
        Ok(_) => true,
        Err(err) if err.kind() == io::ErrorKind::NotFound => false,
        Err(err) => {
            engine_warn!("Cannot stat {:?}, keeping it: {}", path, err);
            true
        }
    }
}

/// Incremental reconciliation of one watched root against its record map.
pub struct Reconciler<V: Validator> {
    root: PathBuf,
    validator: V,
    records: RecordMap,
}

impl<V: Validator> Reconciler<V> {
    pub fn new(root: PathBuf, validator: V) -> Self {
        Self::with_records(root, validator, RecordMap::new())
    }

    /// Starts from previously persisted records.
    pub fn with_records(root: PathBuf, validator: V, records: RecordMap) -> Self {
        Self {
            root,
            validator,
            records,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn records(&self) -> &RecordMap {
        &self.records
    }

    pub fn snapshot(&self) -> StateSnapshot {
        self.records.snapshot()
    }

    /// Points the reconciler at a new root and forgets everything tracked.
    pub fn reset_root(&mut self, root: PathBuf) {
        engine_info!("Watched folder changed to {:?}; state cleared", root);
        self.root = root;
        self.records.clear();
    }

    /// Runs one uninterruptible pass; returns whether anything changed.
    pub fn scan(&mut self) -> bool {
        match self.scan_with(&CancellationToken::new()) {
            Ok(report) => report.changed(),
            Err(err) => {
                engine_warn!("Scan skipped: {}", err);
                false
            }
        }
    }

    /// Prunes vanished files, then walks the root. `stop` is checked between
    /// files; a cancelled pass keeps every transition applied so far.
    pub fn scan_with(&mut self, stop: &CancellationToken) -> Result<PassReport, ScanError> {
        match fs::metadata(&self.root) {
            Ok(meta) if meta.is_dir() => {}
            _ => return Err(ScanError::RootUnavailable(self.root.clone())),
        }

        let mut report = PassReport::default();
        let outcome = self.records.prune(still_exists);
        report.pruned = outcome.duplicates_removed;
        let mut retired: HashMap<String, FileRecord> = outcome
            .retired
            .into_iter()
            .map(|record| (record.name.clone(), record))
            .collect();

        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(should_descend);

        for entry in walker {
            if stop.is_cancelled() {
                report.cancelled = true;
                break;
            }
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    engine_warn!("Cannot list {:?}: {}", err.path(), err);
                    continue;
                }
            };
            if !entry.file_type().is_file() || !is_prg_file(entry.path()) {
                continue;
            }
            let Some(file_name) = entry.file_name().to_str().map(str::to_owned) else {
                engine_warn!("Skipping non UTF-8 file name {:?}", entry.path());
                report.skipped += 1;
                continue;
            };
            let Some(location) = entry.path().parent().map(Path::to_path_buf) else {
                continue;
            };

            let name = normalize_name(&file_name);
            if let Some(tracked) = self.shadowed_by(&location, &file_name, &name) {
                engine_warn!(
                    "{:?} differs only in case from {:?} in {:?}; skipped",
                    file_name,
                    tracked,
                    location
                );
                report.skipped += 1;
                continue;
            }

            let stamp = match entry.metadata() {
                Ok(meta) => file_stamp(&meta),
                Err(err) => {
                    engine_warn!("Cannot stat {:?}: {}", entry.path(), err);
                    report.skipped += 1;
                    continue;
                }
            };

            let step = FileSeen {
                path: entry.path(),
                location,
                file_name,
                name,
                stamp,
            };
            if let Err(err) = self.reconcile_file(step, &mut retired, &mut report) {
                engine_warn!("{}; will retry next pass", err);
                report.skipped += 1;
            }
        }

        for name in retired.keys() {
            engine_info!("{} removed", name);
        }
        report.pruned += retired.len();
        Ok(report)
    }

    fn reconcile_file(
        &mut self,
        seen: FileSeen<'_>,
        retired: &mut HashMap<String, FileRecord>,
        report: &mut PassReport,
    ) -> Result<(), ValidateError> {
        let Some(current) = self.records.get(&seen.name) else {
            if let Some(moved) = take_moved(retired, &seen) {
                engine_info!("{} moved to {:?}", seen.name, seen.location);
                self.records.insert_new(moved);
                report.moved += 1;
                return Ok(());
            }
            let verdict = self.checked_validate(seen.path)?;
            engine_debug!("{} tracked at {:?}", seen.file_name, seen.location);
            self.records.insert_new(FileRecord::new(
                seen.location,
                seen.file_name,
                seen.stamp,
                verdict,
            ));
            report.added += 1;
            return Ok(());
        };

        if current.location == seen.location {
            let respelled = current.file_name != seen.file_name;
            if current.stamp != seen.stamp || respelled {
                let verdict = self.checked_validate(seen.path)?;
                let renamed =
                    respelled && self.records.respell_canonical(&seen.name, &seen.file_name);
                if self.records.replace_canonical(&seen.name, seen.stamp, verdict) || renamed {
                    engine_debug!("{} changed in place", seen.file_name);
                    report.replaced += 1;
                }
            }
            return Ok(());
        }

        if let Some(existing) = current.duplicate_at(&seen.location) {
            if existing.stamp == seen.stamp && existing.file_name == seen.file_name {
                return Ok(());
            }
        }
        let verdict: Verdict = self.checked_validate(seen.path)?;
        let duplicate = DuplicateRecord::new(seen.location, seen.file_name, seen.stamp, verdict);
        match self.records.upsert_duplicate(&seen.name, duplicate) {
            DuplicateChange::Added | DuplicateChange::Refreshed => {
                engine_debug!("{} duplicated at {:?}", seen.name, seen.path.parent());
                report.duplicates += 1;
            }
            DuplicateChange::Unchanged | DuplicateChange::Rejected => {}
        }
        Ok(())
    }

    /// Spelling of `name` already tracked in `location` when it differs from
    /// `file_name` and is still present there under that exact spelling.
    fn shadowed_by(&self, location: &Path, file_name: &str, name: &str) -> Option<String> {
        let record = self.records.get(name)?;
        let tracked = if record.location == location {
            &record.file_name
        } else {
            &record.duplicate_at(location)?.file_name
        };
        if tracked == file_name || !has_entry(location, tracked) {
            return None;
        }
        Some(tracked.clone())
    }

    /// Runs the validator for one file. A panic is contained here and turned
    /// into an error so the pass skips the file and carries on.
    fn checked_validate(&self, path: &Path) -> Result<Verdict, ValidateError> {
        match panic::catch_unwind(AssertUnwindSafe(|| self.validator.validate(path))) {
            Ok(result) => result,
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|text| text.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Err(ValidateError::Panicked {
                    path: path.to_path_buf(),
                    message,
                })
            }
        }
    }
}

/// Exact, case-sensitive lookup of `file_name` in the listing of `dir`.
fn has_entry(dir: &Path, file_name: &str) -> bool {
    match fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(Result::ok)
            .any(|entry| entry.file_name().to_str() == Some(file_name)),
        Err(_) => false,
    }
}

struct FileSeen<'a> {
    path: &'a Path,
    location: PathBuf,
    file_name: String,
    name: String,
    stamp: FileStamp,
}

/// A record retired this pass comes back at the new location when the file
/// seen there is the same file: same identity token and modification time.
fn take_moved(
    retired: &mut HashMap<String, FileRecord>,
    seen: &FileSeen<'_>,
) -> Option<FileRecord> {
    let previous = retired.get(&seen.name)?;
    if previous.stamp != seen.stamp || previous.stamp.file_id.is_none() {
        return None;
    }
    let previous = retired.remove(&seen.name)?;
    let duplicates = previous
        .duplicates
        .into_iter()
        .filter(|d| d.location != seen.location && still_exists(&d.path()))
        .collect();
    Some(FileRecord {
        location: seen.location.clone(),
        file_name: seen.file_name.clone(),
        duplicates,
        ..previous
    })
}
