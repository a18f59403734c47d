use std::path::PathBuf;
use std::sync::Arc;

use crate::{GatherStats, PassStats, StateSnapshot};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Operator flipped the auto-gather switch.
    AutoGatherToggled,
    /// Operator asked for a specific auto-gather setting.
    AutoGatherSet(bool),
    /// Operator asked for a one-off gather.
    GatherClicked,
    /// Operator wants the folder holding issue row `n` (zero based).
    OpenRowRequested(usize),
    /// Operator asked for the issue list again.
    ListRequested,
    SaveRequested,
    QuitRequested,
    /// Engine loaded persisted state at startup.
    StateRestored(Arc<StateSnapshot>),
    /// Engine moved to a new day's watched folder and dropped the old records.
    RootChanged {
        root: PathBuf,
        snapshot: Arc<StateSnapshot>,
    },
    /// Engine finished a pass; `snapshot` is set only when records changed.
    ScanCompleted {
        stats: PassStats,
        snapshot: Option<Arc<StateSnapshot>>,
    },
    /// Engine could not run a pass (watched root unreachable).
    ScanFailed { reason: String },
    GatherCompleted(GatherStats),
    StateSaved(PathBuf),
    EngineStopped,
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
