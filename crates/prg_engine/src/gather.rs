use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use prg_core::{CaseType, FileRecord, StateSnapshot};
use prg_logging::{engine_debug, engine_info, engine_warn};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::walk::{is_asc_folder_name, ALL_FOLDER};

#[derive(Debug, Error)]
pub enum GatherError {
    #[error("pickup folder {path} unusable: {source}")]
    Target {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    Copied,
    UpToDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatherReport {
    pub copied: usize,
    pub up_to_date: usize,
    pub failed: usize,
    /// Pickup folder the files went to, after any rename.
    pub target: PathBuf,
}

impl GatherReport {
    fn new(target: PathBuf) -> Self {
        Self {
            copied: 0,
            up_to_date: 0,
            failed: 0,
            target,
        }
    }
}

/// Copies `src` over `dst` unless `dst` already carries the same
/// modification time. The copy keeps the source modification time.
pub fn copy_if_newer(src: &Path, dst: &Path) -> io::Result<CopyOutcome> {
    let src_meta = fs::metadata(src)?;
    let src_modified = src_meta.modified()?;

    match fs::metadata(dst) {
        Ok(dst_meta) if dst_meta.modified().ok() == Some(src_modified) => {
            return Ok(CopyOutcome::UpToDate);
        }
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err),
    }

    let dir = match dst.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    let mut source = fs::File::open(src)?;
    io::copy(&mut source, tmp.as_file_mut())?;
    tmp.as_file().sync_all()?;
    tmp.as_file().set_permissions(src_meta.permissions())?;
    tmp.as_file().set_modified(src_modified)?;
    tmp.persist(dst).map_err(|e| e.error)?;
    Ok(CopyOutcome::Copied)
}

/// Stages clean records into the pickup folders under `pickup_root`.
#[derive(Debug, Clone)]
pub struct Gatherer {
    pickup_root: PathBuf,
    all_folder: String,
}

impl Gatherer {
    pub fn new(pickup_root: PathBuf) -> Self {
        Self {
            pickup_root,
            all_folder: ALL_FOLDER.to_string(),
        }
    }

    pub fn all_dir(&self) -> PathBuf {
        self.pickup_root.join(&self.all_folder)
    }

    /// Every record without issues goes into the flat `ALL` folder.
    pub fn gather_all(&self, snapshot: &StateSnapshot) -> Result<GatherReport, GatherError> {
        let target = self.all_dir();
        fs::create_dir_all(&target).map_err(|source| GatherError::Target {
            path: target.clone(),
            source,
        })?;

        let mut report = GatherReport::new(target.clone());
        for record in snapshot.clean_records() {
            copy_record(record, &target, &mut report);
        }
        engine_info!(
            "Gathered into {:?}: {} copied, {} up to date, {} failed",
            report.target,
            report.copied,
            report.up_to_date,
            report.failed
        );
        Ok(report)
    }

    /// Clean ASC programs go into the dated `<m>.<d>_ASC_(<n>)` folder, which
    /// is renamed afterwards to the number of files it holds.
    pub fn gather_asc(
        &self,
        snapshot: &StateSnapshot,
        today: NaiveDate,
    ) -> Result<GatherReport, GatherError> {
        let folder = match self.find_asc_folder()? {
            Some(folder) => folder,
            None => {
                let folder = self.pickup_root.join(asc_folder_name(today, 0));
                fs::create_dir(&folder).map_err(|source| GatherError::Target {
                    path: folder.clone(),
                    source,
                })?;
                engine_info!("Created ASC folder {:?}", folder);
                folder
            }
        };

        let mut report = GatherReport::new(folder.clone());
        for record in snapshot
            .clean_records()
            .filter(|record| record.case_type == CaseType::Asc)
        {
            copy_record(record, &folder, &mut report);
        }

        report.target = self.rename_to_count(&folder, today);
        engine_info!(
            "Gathered ASC into {:?}: {} copied, {} up to date, {} failed",
            report.target,
            report.copied,
            report.up_to_date,
            report.failed
        );
        Ok(report)
    }

    /// First dated ASC folder directly under the pickup root, by name.
    pub fn find_asc_folder(&self) -> Result<Option<PathBuf>, GatherError> {
        let entries = fs::read_dir(&self.pickup_root).map_err(|source| GatherError::Target {
            path: self.pickup_root.clone(),
            source,
        })?;
        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_ok_and(|t| t.is_dir()))
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| is_asc_folder_name(name))
            .collect();
        names.sort();
        Ok(names.first().map(|name| self.pickup_root.join(name)))
    }

    fn rename_to_count(&self, folder: &Path, today: NaiveDate) -> PathBuf {
        let count = match fs::read_dir(folder) {
            Ok(entries) => entries.filter_map(Result::ok).count(),
            Err(err) => {
                engine_warn!("Cannot count {:?}: {}", folder, err);
                return folder.to_path_buf();
            }
        };
        let renamed = self.pickup_root.join(asc_folder_name(today, count));
        if renamed == folder {
            return renamed;
        }
        match fs::rename(folder, &renamed) {
            Ok(()) => renamed,
            Err(err) => {
                engine_warn!(
                    "Cannot rename {:?} to {:?} (open elsewhere?): {}",
                    folder,
                    renamed,
                    err
                );
                folder.to_path_buf()
            }
        }
    }
}

fn asc_folder_name(day: NaiveDate, count: usize) -> String {
    format!("{}.{}_ASC_({})", day.month(), day.day(), count)
}

fn copy_record(record: &FileRecord, target: &Path, report: &mut GatherReport) {
    let src = record.path();
    let dst = target.join(&record.file_name);
    match copy_if_newer(&src, &dst) {
        Ok(CopyOutcome::Copied) => {
            engine_debug!("Copied {:?} to {:?}", src, dst);
            report.copied += 1;
        }
        Ok(CopyOutcome::UpToDate) => report.up_to_date += 1,
        Err(err) => {
            engine_warn!("Cannot copy {:?} to {:?}: {}", src, dst, err);
            report.failed += 1;
        }
    }
}
