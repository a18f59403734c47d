use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    SetAutoGather(bool),
    GatherNow,
    OpenLocation(PathBuf),
    SaveState,
    Shutdown,
}
