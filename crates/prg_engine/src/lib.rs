//! PRG watch engine: validation, reconciliation, persistence and gathering.
mod config;
mod engine;
mod gather;
mod persist;
mod reconcile;
mod store;
mod types;
mod validate;
mod walk;

pub use config::{date_path, EngineConfig, WatchRoot};
pub use engine::EngineHandle;
pub use gather::{copy_if_newer, CopyOutcome, GatherError, GatherReport, Gatherer};
pub use persist::{AtomicFileWriter, PersistError};
pub use reconcile::{file_stamp, PassReport, Reconciler, ScanError};
pub use store::{StateStore, StoreError, STATE_VERSION};
pub use tokio_util::sync::CancellationToken;
pub use types::{EngineEvent, GatherSummary};
pub use validate::{
    check_contents, PartLengthAnchor, PrgValidator, ValidateError, ValidationRules, Validator,
};
pub use walk::{is_asc_folder_name, is_pickup_dir_name, is_prg_file};
