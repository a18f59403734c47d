//! PRG watch core: record model and the pure front-end state machine.
mod effect;
mod issue;
mod msg;
mod records;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use issue::{Issue, IssueKind, IssueSet, Severity};
pub use msg::Msg;
pub use records::{
    normalize_name, CaseType, DuplicateChange, DuplicateRecord, FileRecord, FileStamp, IssueRow,
    PruneOutcome, RecordMap, StateSnapshot, Verdict,
};
pub use state::{AppState, EngineStatus, GatherStats, PassStats};
pub use update::update;
pub use view_model::{AppViewModel, IssueRowView};
