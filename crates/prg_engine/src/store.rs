use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use prg_core::{
    normalize_name, CaseType, DuplicateRecord, FileRecord, FileStamp, Issue, IssueKind, IssueSet,
    RecordMap,
};
use prg_logging::{engine_info, engine_warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::persist::{AtomicFileWriter, PersistError};

/// Format version written into every state document.
pub const STATE_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot write state: {0}")]
    Persist(#[from] PersistError),
    #[error("cannot encode state: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct StateDocument {
    version: u32,
    day: NaiveDate,
    files: BTreeMap<String, StoredRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord {
    file_name: String,
    location: PathBuf,
    modified_ns: i64,
    #[serde(default)]
    file_id: Option<u64>,
    #[serde(default)]
    case_type: String,
    #[serde(default)]
    issues: Vec<StoredIssue>,
    #[serde(default)]
    duplicates: Vec<StoredDuplicate>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredDuplicate {
    file_name: String,
    location: PathBuf,
    modified_ns: i64,
    #[serde(default)]
    file_id: Option<u64>,
    #[serde(default)]
    case_type: String,
    #[serde(default)]
    issues: Vec<StoredIssue>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredIssue {
    code: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

/// JSON state file holding the record map of one day.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, records: &RecordMap, day: NaiveDate) -> Result<PathBuf, StoreError> {
        let document = StateDocument {
            version: STATE_VERSION,
            day,
            files: records
                .iter()
                .map(|record| (record.name.clone(), store_record(record)))
                .collect(),
        };
        let content = serde_json::to_string_pretty(&document)?;
        AtomicFileWriter::new(self.path.clone()).write(content.as_bytes())?;
        Ok(self.path.clone())
    }

    /// Loads the records saved `today`. Anything else (no file, unreadable,
    /// corrupt, another day, another format version) yields an empty map.
    pub fn load(&self, today: NaiveDate) -> RecordMap {
        let content = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                engine_info!("No saved state at {:?}", self.path);
                return RecordMap::new();
            }
            Err(err) => {
                engine_warn!("Failed to read saved state from {:?}: {}", self.path, err);
                return RecordMap::new();
            }
        };

        let document: StateDocument = match serde_json::from_str(&content) {
            Ok(document) => document,
            Err(err) => {
                engine_warn!("Failed to parse saved state from {:?}: {}", self.path, err);
                return RecordMap::new();
            }
        };

        if document.version != STATE_VERSION {
            engine_warn!(
                "Saved state {:?} has version {}, expected {}; starting empty",
                self.path,
                document.version,
                STATE_VERSION
            );
            return RecordMap::new();
        }
        if document.day != today {
            engine_info!(
                "Saved state {:?} is from {}; starting empty",
                self.path,
                document.day
            );
            return RecordMap::new();
        }

        let records: RecordMap = document
            .files
            .into_iter()
            .map(|(name, stored)| restore_record(&name, stored))
            .collect();
        engine_info!("Restored {} records from {:?}", records.len(), self.path);
        records
    }
}

fn store_issues(issues: &IssueSet) -> Vec<StoredIssue> {
    issues
        .iter()
        .map(|issue| StoredIssue {
            code: issue.kind.code(),
            detail: issue.detail.clone(),
        })
        .collect()
}

fn store_record(record: &FileRecord) -> StoredRecord {
    StoredRecord {
        file_name: record.file_name.clone(),
        location: record.location.clone(),
        modified_ns: record.stamp.modified_ns,
        file_id: record.stamp.file_id,
        case_type: record.case_type.code().to_string(),
        issues: store_issues(&record.issues),
        duplicates: record
            .duplicates
            .iter()
            .map(|duplicate| StoredDuplicate {
                file_name: duplicate.file_name.clone(),
                location: duplicate.location.clone(),
                modified_ns: duplicate.stamp.modified_ns,
                file_id: duplicate.stamp.file_id,
                case_type: duplicate.case_type.code().to_string(),
                issues: store_issues(&duplicate.issues),
            })
            .collect(),
    }
}

fn restore_issues(name: &str, stored: Vec<StoredIssue>) -> IssueSet {
    stored
        .into_iter()
        .filter_map(|issue| match IssueKind::from_code(issue.code) {
            Some(kind) => Some(Issue {
                kind,
                detail: issue.detail,
            }),
            None => {
                engine_warn!("Dropping unknown issue code {} on {}", issue.code, name);
                None
            }
        })
        .collect()
}

fn restore_case_type(name: &str, code: &str) -> CaseType {
    CaseType::from_code(code).unwrap_or_else(|| {
        engine_warn!("Unknown case type {:?} on {}; using DS", code, name);
        CaseType::Ds
    })
}

fn restore_record(key: &str, stored: StoredRecord) -> FileRecord {
    let location = stored.location;
    let duplicates = stored
        .duplicates
        .into_iter()
        .filter(|duplicate| duplicate.location != location)
        .map(|duplicate| {
            let mut issues = restore_issues(key, duplicate.issues);
            issues.insert(IssueKind::DuplicateOccurrence);
            DuplicateRecord {
                location: duplicate.location,
                file_name: duplicate.file_name,
                stamp: FileStamp {
                    modified_ns: duplicate.modified_ns,
                    file_id: duplicate.file_id,
                },
                case_type: restore_case_type(key, &duplicate.case_type),
                issues,
            }
        })
        .collect();

    FileRecord {
        name: normalize_name(key),
        file_name: stored.file_name,
        location,
        stamp: FileStamp {
            modified_ns: stored.modified_ns,
            file_id: stored.file_id,
        },
        case_type: restore_case_type(key, &stored.case_type),
        issues: restore_issues(key, stored.issues),
        duplicates,
    }
}
