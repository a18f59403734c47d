use std::path::PathBuf;

use crate::{EngineStatus, GatherStats, PassStats, Severity};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub auto_gather: bool,
    pub gather_enabled: bool,
    pub status: EngineStatus,
    pub tracked_files: usize,
    pub rows: Vec<IssueRowView>,
    pub last_pass: Option<PassStats>,
    pub last_gather: Option<GatherStats>,
    pub notice: Option<String>,
    pub quitting: bool,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRowView {
    pub index: usize,
    pub file: String,
    pub location: PathBuf,
    pub label: &'static str,
    pub severity: Severity,
    pub detail: Option<String>,
}
