use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use crate::issue::{Issue, IssueKind, IssueSet};

/// Case type read from a program's first line; selects which rules apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CaseType {
    Asc,
    Tloc,
    Aot,
    #[default]
    Ds,
}

impl CaseType {
    pub fn code(self) -> &'static str {
        match self {
            CaseType::Asc => "ASC",
            CaseType::Tloc => "TLOC",
            CaseType::Aot => "AOT",
            CaseType::Ds => "DS",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "ASC" => Some(CaseType::Asc),
            "TLOC" => Some(CaseType::Tloc),
            "AOT" => Some(CaseType::Aot),
            "DS" => Some(CaseType::Ds),
            _ => None,
        }
    }

    /// ASC, TLOC and AOT programs must carry the UG value block.
    pub fn requires_ug_values(self) -> bool {
        matches!(self, CaseType::Asc | CaseType::Tloc | CaseType::Aot)
    }
}

/// Modification time plus, where the platform offers one, a file identity
/// token. Two stamps differ when either part differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FileStamp {
    /// Nanoseconds since the Unix epoch.
    pub modified_ns: i64,
    pub file_id: Option<u64>,
}

/// What the validator concluded about one file on disk.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Verdict {
    pub case_type: CaseType,
    pub issues: IssueSet,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateRecord {
    pub location: PathBuf,
    pub file_name: String,
    pub stamp: FileStamp,
    pub case_type: CaseType,
    pub issues: IssueSet,
}

impl DuplicateRecord {
    /// Builds a duplicate from a fresh verdict, tagging it as a duplicate.
    pub fn new(location: PathBuf, file_name: String, stamp: FileStamp, verdict: Verdict) -> Self {
        let mut issues = verdict.issues;
        issues.insert(Issue::new(IssueKind::DuplicateOccurrence));
        Self {
            location,
            file_name,
            stamp,
            case_type: verdict.case_type,
            issues,
        }
    }

    pub fn path(&self) -> PathBuf {
        self.location.join(&self.file_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Lower-cased file name; the key of the record map.
    pub name: String,
    /// On-disk spelling of the name at `location`.
    pub file_name: String,
    pub location: PathBuf,
    pub stamp: FileStamp,
    pub case_type: CaseType,
    pub issues: IssueSet,
    pub duplicates: Vec<DuplicateRecord>,
}

impl FileRecord {
    pub fn new(location: PathBuf, file_name: String, stamp: FileStamp, verdict: Verdict) -> Self {
        Self {
            name: normalize_name(&file_name),
            file_name,
            location,
            stamp,
            case_type: verdict.case_type,
            issues: verdict.issues,
            duplicates: Vec::new(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.location.join(&self.file_name)
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn duplicate_at(&self, location: &Path) -> Option<&DuplicateRecord> {
        self.duplicates.iter().find(|d| d.location == location)
    }
}

pub fn normalize_name(file_name: &str) -> String {
    file_name.to_lowercase()
}

/// Outcome of offering a duplicate occurrence to the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateChange {
    Added,
    Refreshed,
    Unchanged,
    /// Rejected: the location is the canonical one, or the name is untracked.
    Rejected,
}

/// Summary of one prune phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneOutcome {
    pub duplicates_removed: usize,
    /// Canonical records whose file vanished, removed from the map whole.
    pub retired: Vec<FileRecord>,
}

impl PruneOutcome {
    pub fn changed(&self) -> bool {
        self.duplicates_removed > 0 || !self.retired.is_empty()
    }
}

/// All tracked records of one watched root, keyed by normalized name.
///
/// Every mutation replaces a whole `FileRecord` value, so a clone taken
/// between two calls never holds a half-applied transition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordMap {
    records: BTreeMap<String, FileRecord>,
}

impl RecordMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&FileRecord> {
        self.records.get(&normalize_name(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileRecord> {
        self.records.values()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Tracks a name seen for the first time. Returns false if the name is
    /// already tracked; the existing canonical location always wins.
    pub fn insert_new(&mut self, record: FileRecord) -> bool {
        if self.records.contains_key(&record.name) {
            return false;
        }
        self.records.insert(record.name.clone(), record);
        true
    }

    /// Re-validated content for the canonical file, edited in place.
    /// Duplicates are carried over. Returns false when nothing differs or the
    /// location is not the canonical one.
    pub fn replace_canonical(&mut self, name: &str, stamp: FileStamp, verdict: Verdict) -> bool {
        let key = normalize_name(name);
        let Some(current) = self.records.get(&key) else {
            return false;
        };
        if current.stamp == stamp
            && current.issues == verdict.issues
            && current.case_type == verdict.case_type
        {
            return false;
        }
        let replacement = FileRecord {
            stamp,
            case_type: verdict.case_type,
            issues: verdict.issues,
            ..current.clone()
        };
        self.records.insert(key, replacement);
        true
    }

    /// Records a new on-disk spelling for the canonical file, e.g. after a
    /// case-only rename on a case-insensitive share.
    pub fn respell_canonical(&mut self, name: &str, file_name: &str) -> bool {
        let key = normalize_name(name);
        let Some(current) = self.records.get(&key) else {
            return false;
        };
        if current.file_name == file_name || normalize_name(file_name) != key {
            return false;
        }
        let replacement = FileRecord {
            file_name: file_name.to_string(),
            ..current.clone()
        };
        self.records.insert(key, replacement);
        true
    }

    /// Adds or refreshes the duplicate of `name` living at `duplicate.location`.
    pub fn upsert_duplicate(&mut self, name: &str, duplicate: DuplicateRecord) -> DuplicateChange {
        let key = normalize_name(name);
        let Some(current) = self.records.get(&key) else {
            return DuplicateChange::Rejected;
        };
        if current.location == duplicate.location {
            return DuplicateChange::Rejected;
        }

        let mut replacement = current.clone();
        let change = match replacement
            .duplicates
            .iter_mut()
            .find(|d| d.location == duplicate.location)
        {
            Some(existing) if *existing == duplicate => DuplicateChange::Unchanged,
            Some(existing) => {
                *existing = duplicate;
                DuplicateChange::Refreshed
            }
            None => {
                replacement.duplicates.push(duplicate);
                DuplicateChange::Added
            }
        };
        if change != DuplicateChange::Unchanged {
            self.records.insert(key, replacement);
        }
        change
    }

    /// Drops every duplicate whose file is gone, and every record whose
    /// canonical file is gone. `exists` answers for a full file path.
    pub fn prune(&mut self, mut exists: impl FnMut(&Path) -> bool) -> PruneOutcome {
        let mut outcome = PruneOutcome::default();
        let keys: Vec<String> = self.records.keys().cloned().collect();

        for key in keys {
            let Some(record) = self.records.get(&key) else {
                continue;
            };
            if !exists(&record.path()) {
                if let Some(retired) = self.records.remove(&key) {
                    outcome.retired.push(retired);
                }
                continue;
            }

            let surviving: Vec<DuplicateRecord> = record
                .duplicates
                .iter()
                .filter(|d| d.location != record.location && exists(&d.path()))
                .cloned()
                .collect();
            let removed = record.duplicates.len() - surviving.len();
            if removed > 0 {
                let replacement = FileRecord {
                    duplicates: surviving,
                    ..record.clone()
                };
                self.records.insert(key, replacement);
                outcome.duplicates_removed += removed;
            }
        }

        outcome
    }

    /// Keeps only what lives under `root`: records located elsewhere are
    /// dropped whole, and so are duplicates outside it. Returns whether
    /// anything was dropped.
    pub fn retain_within(&mut self, root: &Path) -> bool {
        let before = self.records.len();
        self.records.retain(|_, record| record.location.starts_with(root));
        let mut changed = self.records.len() != before;

        for record in self.records.values_mut() {
            let count = record.duplicates.len();
            record.duplicates.retain(|d| d.location.starts_with(root));
            changed |= record.duplicates.len() != count;
        }
        changed
    }

    pub fn remove(&mut self, name: &str) -> Option<FileRecord> {
        self.records.remove(&normalize_name(name))
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            records: self.records.values().cloned().collect(),
        }
    }
}

impl FromIterator<FileRecord> for RecordMap {
    fn from_iter<T: IntoIterator<Item = FileRecord>>(iter: T) -> Self {
        let mut map = RecordMap::new();
        for record in iter {
            map.insert_new(record);
        }
        map
    }
}

/// Read-only copy of the record map handed to readers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateSnapshot {
    pub records: Vec<FileRecord>,
}

/// One (file, location, issue) triple for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRow {
    pub file: String,
    pub location: PathBuf,
    pub kind: IssueKind,
    pub detail: Option<String>,
}

impl StateSnapshot {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clean_records(&self) -> impl Iterator<Item = &FileRecord> {
        self.records.iter().filter(|r| r.is_clean())
    }

    /// Canonical issues first, then each duplicate's, in map order. Rows are
    /// unique by (file, location, kind).
    pub fn issue_rows(&self) -> Vec<IssueRow> {
        let occurrences = self.records.iter().flat_map(|record| {
            std::iter::once((&record.file_name, &record.location, &record.issues)).chain(
                record
                    .duplicates
                    .iter()
                    .map(|d| (&d.file_name, &d.location, &d.issues)),
            )
        });

        let mut seen: HashSet<(&str, &Path, IssueKind)> = HashSet::new();
        let mut rows = Vec::new();
        for (file, location, issues) in occurrences {
            for issue in issues {
                if seen.insert((file.as_str(), location.as_path(), issue.kind)) {
                    rows.push(IssueRow {
                        file: file.clone(),
                        location: location.clone(),
                        kind: issue.kind,
                        detail: issue.detail.clone(),
                    });
                }
            }
        }
        rows
    }
}
