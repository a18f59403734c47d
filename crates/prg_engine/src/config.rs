use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::validate::ValidationRules;

/// `Y2026/M10/D19` for 19 October 2026.
pub fn date_path(day: NaiveDate) -> PathBuf {
    Path::new(&day.format("Y%Y").to_string())
        .join(day.format("M%m").to_string())
        .join(day.format("D%d").to_string())
}

/// Watched folder, optionally moving to a new per-day subfolder every day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchRoot {
    pub base: PathBuf,
    /// Insert `Y<yyyy>/M<mm>/D<dd>` between `base` and `suffix`.
    pub dated: bool,
    pub suffix: PathBuf,
}

impl WatchRoot {
    /// A root that never changes with the date.
    pub fn fixed(base: PathBuf) -> Self {
        Self {
            base,
            dated: false,
            suffix: PathBuf::new(),
        }
    }

    pub fn resolve(&self, day: NaiveDate) -> PathBuf {
        let root = if self.dated {
            self.base.join(date_path(day))
        } else {
            self.base.clone()
        };
        if self.suffix.as_os_str().is_empty() {
            root
        } else {
            root.join(&self.suffix)
        }
    }
}

#[derive(Clone)]
pub struct EngineConfig {
    pub watch: WatchRoot,
    pub state_file: PathBuf,
    pub scan_interval: Duration,
    pub rules: ValidationRules,
    /// Save state after every pass that changed something.
    pub autosave: bool,
    /// Gather after every completed pass.
    pub auto_gather: bool,
    /// Calendar day used for the dated root, state freshness and ASC folders.
    pub today: Arc<dyn Fn() -> NaiveDate + Send + Sync>,
}

impl EngineConfig {
    pub fn new(watch: WatchRoot, state_file: PathBuf) -> Self {
        Self {
            watch,
            state_file,
            scan_interval: Duration::from_secs(2),
            rules: ValidationRules::default(),
            autosave: true,
            auto_gather: false,
            today: Arc::new(|| Local::now().date_naive()),
        }
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("watch", &self.watch)
            .field("state_file", &self.state_file)
            .field("scan_interval", &self.scan_interval)
            .field("rules", &self.rules)
            .field("autosave", &self.autosave)
            .field("auto_gather", &self.auto_gather)
            .finish_non_exhaustive()
    }
}
