use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use prg_engine::{AtomicFileWriter, EngineConfig, PartLengthAnchor, ValidationRules, WatchRoot};
use prg_logging::{engine_error, engine_info, engine_warn};
use serde::{Deserialize, Serialize};

pub(crate) const SETTINGS_FILENAME: &str = "prg_watch.ron";

/// Operator-facing settings kept next to the binary's working directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct WatchSettings {
    pub base: PathBuf,
    /// Watch `base/Y<yyyy>/M<mm>/D<dd>/suffix`, moving on at midnight.
    pub dated: bool,
    pub suffix: PathBuf,
    pub state_file: PathBuf,
    pub scan_interval_ms: u64,
    pub tolerance: f64,
    pub part_length_anchor: PartLengthAnchor,
    pub auto_gather: bool,
}

impl Default for WatchSettings {
    fn default() -> Self {
        let rules = ValidationRules::default();
        Self {
            base: PathBuf::from("./nc"),
            dated: false,
            suffix: PathBuf::new(),
            state_file: PathBuf::from("prg_state.json"),
            scan_interval_ms: 2_000,
            tolerance: rules.tolerance,
            part_length_anchor: rules.part_length_anchor,
            auto_gather: false,
        }
    }
}

impl WatchSettings {
    pub(crate) fn engine_config(&self) -> EngineConfig {
        let watch = WatchRoot {
            base: self.base.clone(),
            dated: self.dated,
            suffix: self.suffix.clone(),
        };
        let mut config = EngineConfig::new(watch, self.state_file.clone());
        config.scan_interval = Duration::from_millis(self.scan_interval_ms.max(100));
        config.rules = ValidationRules {
            tolerance: self.tolerance,
            part_length_anchor: self.part_length_anchor,
            ..ValidationRules::default()
        };
        config.auto_gather = self.auto_gather;
        config
    }
}

/// Reads settings from `path`. A missing file is created with defaults; an
/// unreadable one is left alone and defaults are used.
pub(crate) fn load_settings(path: &Path) -> WatchSettings {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            let settings = WatchSettings::default();
            engine_info!("No settings at {:?}; writing defaults", path);
            save_settings(path, &settings);
            return settings;
        }
        Err(err) => {
            engine_warn!("Failed to read settings from {:?}: {}", path, err);
            return WatchSettings::default();
        }
    };

    match ron::from_str(&content) {
        Ok(settings) => {
            engine_info!("Loaded settings from {:?}", path);
            settings
        }
        Err(err) => {
            engine_warn!("Failed to parse settings from {:?}: {}", path, err);
            WatchSettings::default()
        }
    }
}

pub(crate) fn save_settings(path: &Path, settings: &WatchSettings) {
    let pretty = ron::ser::PrettyConfig::new();
    let content = match ron::ser::to_string_pretty(settings, pretty) {
        Ok(text) => text,
        Err(err) => {
            engine_error!("Failed to serialize settings: {}", err);
            return;
        }
    };

    if let Err(err) = AtomicFileWriter::new(path.to_path_buf()).write(content.as_bytes()) {
        engine_error!("Failed to write settings: {}", err);
    }
}
