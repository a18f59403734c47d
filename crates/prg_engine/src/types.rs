use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use prg_core::StateSnapshot;

use crate::gather::GatherReport;
use crate::reconcile::PassReport;

#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Persisted state for today was loaded at startup.
    StateRestored(Arc<StateSnapshot>),
    /// The day rolled over onto a new watched folder. Records of the old
    /// folder are gone and `snapshot` is the emptied state.
    RootChanged {
        root: PathBuf,
        snapshot: Arc<StateSnapshot>,
    },
    /// A pass finished. `snapshot` is the newly published state, present only
    /// when the pass changed something.
    ScanCompleted {
        pass: u64,
        tracked: usize,
        duration: Duration,
        report: PassReport,
        snapshot: Option<Arc<StateSnapshot>>,
    },
    ScanFailed {
        reason: String,
    },
    GatherCompleted(GatherSummary),
    StateSaved(PathBuf),
    Stopped,
}

/// Outcome of one gather over both pickup folders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatherSummary {
    pub reports: Vec<GatherReport>,
    /// Pickup folders that could not be used at all.
    pub failures: Vec<String>,
}

impl GatherSummary {
    pub fn copied(&self) -> usize {
        self.reports.iter().map(|r| r.copied).sum()
    }

    pub fn up_to_date(&self) -> usize {
        self.reports.iter().map(|r| r.up_to_date).sum()
    }

    pub fn failed(&self) -> usize {
        self.reports.iter().map(|r| r.failed).sum::<usize>() + self.failures.len()
    }
}
