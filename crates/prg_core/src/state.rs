use std::sync::Arc;

use crate::records::{IssueRow, StateSnapshot};
use crate::view_model::{AppViewModel, IssueRowView};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EngineStatus {
    #[default]
    Starting,
    Watching,
    Unavailable(String),
    Stopping,
    Stopped,
}

/// Figures from one completed reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PassStats {
    pub pass: u64,
    pub tracked: usize,
    pub added: usize,
    pub replaced: usize,
    pub duplicates: usize,
    pub pruned: usize,
    pub moved: usize,
    pub skipped: usize,
    pub duration_ms: u64,
}

impl PassStats {
    pub fn changed(&self) -> bool {
        self.added + self.replaced + self.duplicates + self.pruned + self.moved > 0
    }
}

/// Figures from one gather run over both pickup folders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GatherStats {
    pub copied: usize,
    pub up_to_date: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    auto_gather: bool,
    status: EngineStatus,
    snapshot: Arc<StateSnapshot>,
    rows: Vec<IssueRow>,
    last_pass: Option<PassStats>,
    last_gather: Option<GatherStats>,
    notice: Option<String>,
    quitting: bool,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_auto_gather(auto_gather: bool) -> Self {
        Self {
            auto_gather,
            ..Self::default()
        }
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            auto_gather: self.auto_gather,
            gather_enabled: !self.auto_gather && !self.quitting,
            status: self.status.clone(),
            tracked_files: self.snapshot.len(),
            rows: self
                .rows
                .iter()
                .enumerate()
                .map(|(index, row)| IssueRowView {
                    index,
                    file: row.file.clone(),
                    location: row.location.clone(),
                    label: row.kind.label(),
                    severity: row.kind.severity(),
                    detail: row.detail.clone(),
                })
                .collect(),
            last_pass: self.last_pass,
            last_gather: self.last_gather,
            notice: self.notice.clone(),
            quitting: self.quitting,
            dirty: self.dirty,
        }
    }

    pub fn auto_gather(&self) -> bool {
        self.auto_gather
    }

    pub fn status(&self) -> &EngineStatus {
        &self.status
    }

    pub fn is_quitting(&self) -> bool {
        self.quitting
    }

    pub fn snapshot(&self) -> &Arc<StateSnapshot> {
        &self.snapshot
    }

    pub fn row(&self, index: usize) -> Option<&IssueRow> {
        self.rows.get(index)
    }

    /// Returns whether anything visible changed since the last call.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_auto_gather(&mut self, enabled: bool) -> bool {
        if self.auto_gather == enabled {
            return false;
        }
        self.auto_gather = enabled;
        self.notice = None;
        self.mark_dirty();
        true
    }

    pub(crate) fn set_status(&mut self, status: EngineStatus) {
        if self.status != status {
            self.status = status;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
        self.mark_dirty();
    }

    pub(crate) fn apply_snapshot(&mut self, snapshot: Arc<StateSnapshot>) {
        if *self.snapshot == *snapshot {
            return;
        }
        self.rows = snapshot.issue_rows();
        self.snapshot = snapshot;
        self.mark_dirty();
    }

    pub(crate) fn record_pass(&mut self, stats: PassStats) {
        self.last_pass = Some(stats);
    }

    pub(crate) fn record_gather(&mut self, stats: GatherStats) {
        let visible = stats.copied > 0 || stats.failed > 0 || self.last_gather.is_none();
        self.last_gather = Some(stats);
        if visible {
            self.mark_dirty();
        }
    }

    pub(crate) fn begin_quit(&mut self) -> bool {
        if self.quitting {
            return false;
        }
        self.quitting = true;
        self.set_status(EngineStatus::Stopping);
        self.mark_dirty();
        true
    }
}
