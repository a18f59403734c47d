//! Log setup for prg_watch.
//!
//! The issue screen owns stdout, so terminal logging goes to stderr only and
//! is kept to warnings by default. The full log is appended to a file.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

pub(crate) struct LogSetup {
    /// Appended to across runs; `None` disables file logging.
    pub file: Option<PathBuf>,
    pub file_level: LevelFilter,
    pub stderr_level: LevelFilter,
}

impl Default for LogSetup {
    fn default() -> Self {
        Self {
            file: Some(PathBuf::from("prg_watch.log")),
            file_level: LevelFilter::Info,
            stderr_level: LevelFilter::Warn,
        }
    }
}

pub(crate) fn initialize(setup: &LogSetup) {
    let config = line_format();
    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();

    if setup.stderr_level != LevelFilter::Off {
        loggers.push(TermLogger::new(
            setup.stderr_level,
            config.clone(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ));
    }
    if let Some(path) = &setup.file {
        match open_log(path) {
            Ok(file) => loggers.push(WriteLogger::new(setup.file_level, config, file)),
            Err(err) => eprintln!("prg_watch: cannot open log {}: {}", path.display(), err),
        }
    }

    if !loggers.is_empty() {
        let _ = CombinedLogger::init(loggers);
    }
}

/// Timestamps and thread names; the scan thread's lines already carry the pass.
fn line_format() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_thread_level(LevelFilter::Info)
        .set_target_level(LevelFilter::Off)
        .build()
}

fn open_log(path: &Path) -> io::Result<File> {
    File::options().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Write;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn log_file_grows_across_runs() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("prg_watch.log");
        fs::write(&path, "yesterday\n").unwrap();

        let mut file = open_log(&path).unwrap();
        file.write_all(b"today\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "yesterday\ntoday\n");
    }

    #[test]
    fn default_setup_keeps_stderr_quiet() {
        let setup = LogSetup::default();
        assert_eq!(setup.stderr_level, LevelFilter::Warn);
        assert_eq!(setup.file.as_deref(), Some(Path::new("prg_watch.log")));
    }
}
