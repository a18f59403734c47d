use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use prg_core::{Effect, GatherStats, Msg, PassStats};
use prg_engine::{EngineEvent, EngineHandle};
use prg_logging::{engine_info, engine_warn};

use super::persistence::{save_settings, WatchSettings};

/// Runs effects from `update` against the engine and feeds engine events back
/// as messages.
pub struct EffectRunner {
    engine: Arc<EngineHandle>,
    settings: WatchSettings,
    settings_path: PathBuf,
}

impl EffectRunner {
    pub fn new(settings: WatchSettings, settings_path: PathBuf, msg_tx: mpsc::Sender<Msg>) -> Self {
        let engine = Arc::new(EngineHandle::new(settings.engine_config()));
        let runner = Self {
            engine,
            settings,
            settings_path,
        };
        runner.spawn_event_loop(msg_tx);
        runner
    }

    pub fn enqueue(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::SetAutoGather(enabled) => {
                    self.engine.set_auto_gather(enabled);
                    self.settings.auto_gather = enabled;
                    save_settings(&self.settings_path, &self.settings);
                }
                Effect::GatherNow => {
                    engine_info!("Manual gather requested");
                    self.engine.gather_now();
                }
                Effect::OpenLocation(path) => {
                    if let Err(err) = open_folder(&path) {
                        engine_warn!("Cannot open {:?}: {}", path, err);
                    }
                }
                Effect::SaveState => self.engine.save_state(),
                Effect::Shutdown => {
                    engine_info!("Shutting down");
                    self.engine.shutdown();
                }
            }
        }
    }

    fn spawn_event_loop(&self, msg_tx: mpsc::Sender<Msg>) {
        let engine = self.engine.clone();
        thread::spawn(move || loop {
            let event = match engine.recv_timeout(Duration::from_millis(100)) {
                Ok(event) => event,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    engine_warn!("Scan thread ended without reporting a stop");
                    let _ = msg_tx.send(Msg::EngineStopped);
                    break;
                }
            };
            let stopped = matches!(event, EngineEvent::Stopped);
            if msg_tx.send(to_msg(event)).is_err() || stopped {
                break;
            }
        });
    }
}

fn to_msg(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::StateRestored(snapshot) => Msg::StateRestored(snapshot),
        EngineEvent::RootChanged { root, snapshot } => Msg::RootChanged { root, snapshot },
        EngineEvent::ScanCompleted {
            pass,
            tracked,
            duration,
            report,
            snapshot,
        } => Msg::ScanCompleted {
            stats: PassStats {
                pass,
                tracked,
                added: report.added,
                replaced: report.replaced,
                duplicates: report.duplicates,
                pruned: report.pruned,
                moved: report.moved,
                skipped: report.skipped,
                duration_ms: duration.as_millis() as u64,
            },
            snapshot,
        },
        EngineEvent::ScanFailed { reason } => Msg::ScanFailed { reason },
        EngineEvent::GatherCompleted(summary) => {
            for failure in &summary.failures {
                engine_warn!("Gather failed: {}", failure);
            }
            Msg::GatherCompleted(GatherStats {
                copied: summary.copied(),
                up_to_date: summary.up_to_date(),
                failed: summary.failed(),
            })
        }
        EngineEvent::StateSaved(path) => Msg::StateSaved(path),
        EngineEvent::Stopped => Msg::EngineStopped,
    }
}

/// Shows `path` in the platform file browser.
fn open_folder(path: &Path) -> io::Result<()> {
    let program = if cfg!(target_os = "windows") {
        "explorer"
    } else if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    };
    Command::new(program).arg(path).spawn().map(|_| ())
}
