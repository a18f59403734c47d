use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use prg_core::StateSnapshot;
use prg_logging::{engine_debug, engine_error, engine_info, engine_warn, set_scan_pass};
use tokio::sync::mpsc as command_channel;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::config::EngineConfig;
use crate::gather::Gatherer;
use crate::reconcile::Reconciler;
use crate::store::StateStore;
use crate::validate::PrgValidator;
use crate::{EngineEvent, GatherSummary};

enum EngineCommand {
    SetAutoGather(bool),
    GatherNow,
    ScanNow,
    SaveState,
}

type SharedSnapshot = Arc<RwLock<Arc<StateSnapshot>>>;

/// Owner-side handle of the background scan thread.
///
/// The record map lives on that thread only; callers see it through
/// [`EngineHandle::snapshot`] and the event channel.
pub struct EngineHandle {
    cmd_tx: command_channel::UnboundedSender<EngineCommand>,
    event_rx: Mutex<mpsc::Receiver<EngineEvent>>,
    snapshot: SharedSnapshot,
    stop: CancellationToken,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Self {
        let (cmd_tx, cmd_rx) = command_channel::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel();
        let snapshot: SharedSnapshot = Arc::default();
        let stop = CancellationToken::new();

        let worker = {
            let snapshot = snapshot.clone();
            let stop = stop.clone();
            thread::spawn(move || run_worker(config, snapshot, cmd_rx, event_tx, stop))
        };

        Self {
            cmd_tx,
            event_rx: Mutex::new(event_rx),
            snapshot,
            stop,
            worker: Mutex::new(Some(worker)),
        }
    }

    pub fn set_auto_gather(&self, enabled: bool) {
        let _ = self.cmd_tx.send(EngineCommand::SetAutoGather(enabled));
    }

    pub fn gather_now(&self) {
        let _ = self.cmd_tx.send(EngineCommand::GatherNow);
    }

    pub fn scan_now(&self) {
        let _ = self.cmd_tx.send(EngineCommand::ScanNow);
    }

    pub fn save_state(&self) {
        let _ = self.cmd_tx.send(EngineCommand::SaveState);
    }

    /// State as of the last completed pass.
    pub fn snapshot(&self) -> Arc<StateSnapshot> {
        match self.snapshot.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.try_recv().ok()
    }

    /// Waits up to `timeout` for the next event. `Disconnected` means the scan
    /// thread is gone and no further events will arrive.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<EngineEvent, RecvTimeoutError> {
        match self.event_rx.lock() {
            Ok(rx) => rx.recv_timeout(timeout),
            Err(_) => Err(RecvTimeoutError::Disconnected),
        }
    }

    /// Stops the scan thread after its final save and waits for it.
    pub fn shutdown(&self) {
        self.stop.cancel();
        let worker = self.worker.lock().ok().and_then(|mut slot| slot.take());
        if let Some(worker) = worker {
            if worker.join().is_err() {
                engine_error!("Scan thread panicked");
            }
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker(
    config: EngineConfig,
    snapshot: SharedSnapshot,
    cmd_rx: command_channel::UnboundedReceiver<EngineCommand>,
    events: mpsc::Sender<EngineEvent>,
    stop: CancellationToken,
) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            engine_error!("Cannot start scan runtime: {}", err);
            let _ = events.send(EngineEvent::Stopped);
            return;
        }
    };
    let worker = Worker::start(config, snapshot, events);
    runtime.block_on(worker.run(cmd_rx, stop));
}

struct Worker {
    config: EngineConfig,
    reconciler: Reconciler<PrgValidator>,
    store: StateStore,
    day: NaiveDate,
    auto_gather: bool,
    pass: u64,
    published: SharedSnapshot,
    events: mpsc::Sender<EngineEvent>,
}

impl Worker {
    fn start(
        config: EngineConfig,
        published: SharedSnapshot,
        events: mpsc::Sender<EngineEvent>,
    ) -> Self {
        let day = (config.today)();
        let root = config.watch.resolve(day);
        let store = StateStore::new(config.state_file.clone());

        let mut records = store.load(day);
        if records.retain_within(&root) {
            engine_info!("Dropped saved records outside {:?}", root);
        }
        let restored = !records.is_empty();
        engine_info!("Watching {:?}", root);

        let worker = Self {
            auto_gather: config.auto_gather,
            reconciler: Reconciler::with_records(
                root,
                PrgValidator::new(config.rules.clone()),
                records,
            ),
            store,
            day,
            pass: 0,
            published,
            events,
            config,
        };
        let snapshot = worker.publish();
        if restored {
            worker.emit(EngineEvent::StateRestored(snapshot));
        }
        worker
    }

    async fn run(
        mut self,
        mut cmd_rx: command_channel::UnboundedReceiver<EngineCommand>,
        stop: CancellationToken,
    ) {
        let mut ticker = tokio::time::interval(self.config.scan_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = stop.cancelled() => break,
                command = cmd_rx.recv() => match command {
                    Some(command) => self.handle(command, &stop),
                    None => break,
                },
                _ = ticker.tick() => self.scan(&stop),
            }
        }

        set_scan_pass(0);
        engine_info!("Scan loop stopping");
        self.save(true);
        self.emit(EngineEvent::Stopped);
    }

    fn handle(&mut self, command: EngineCommand, stop: &CancellationToken) {
        match command {
            EngineCommand::SetAutoGather(enabled) => {
                engine_info!("Auto-gather {}", if enabled { "on" } else { "off" });
                self.auto_gather = enabled;
            }
            EngineCommand::GatherNow => self.gather(),
            EngineCommand::ScanNow => self.scan(stop),
            EngineCommand::SaveState => self.save(true),
        }
    }

    fn scan(&mut self, stop: &CancellationToken) {
        self.roll_over_day();
        self.pass += 1;
        set_scan_pass(self.pass);
        let started = Instant::now();

        match self.reconciler.scan_with(stop) {
            Ok(report) => {
                let snapshot = report.changed().then(|| self.publish());
                if report.changed() {
                    engine_info!(
                        "{} added, {} replaced, {} duplicates, {} pruned, {} moved, {} skipped",
                        report.added,
                        report.replaced,
                        report.duplicates,
                        report.pruned,
                        report.moved,
                        report.skipped
                    );
                    if self.config.autosave {
                        self.save(false);
                    }
                }
                self.emit(EngineEvent::ScanCompleted {
                    pass: self.pass,
                    tracked: self.reconciler.records().len(),
                    duration: started.elapsed(),
                    report,
                    snapshot,
                });
                if self.auto_gather && !report.cancelled {
                    self.gather();
                }
            }
            Err(err) => {
                engine_warn!("{}", err);
                self.emit(EngineEvent::ScanFailed {
                    reason: err.to_string(),
                });
            }
        }
    }

    fn roll_over_day(&mut self) {
        let today = (self.config.today)();
        if today == self.day {
            return;
        }
        engine_info!("Day rolled over to {}", today);
        self.day = today;
        let root = self.config.watch.resolve(today);
        if root != self.reconciler.root() {
            self.reconciler.reset_root(root.clone());
            let snapshot = self.publish();
            self.emit(EngineEvent::RootChanged { root, snapshot });
        }
    }

    fn gather(&mut self) {
        let snapshot = self.current_snapshot();
        let gatherer = Gatherer::new(self.reconciler.root().to_path_buf());
        let mut summary = GatherSummary::default();

        for result in [
            gatherer.gather_all(&snapshot),
            gatherer.gather_asc(&snapshot, self.day),
        ] {
            match result {
                Ok(report) => summary.reports.push(report),
                Err(err) => {
                    engine_warn!("Gather failed: {}", err);
                    summary.failures.push(err.to_string());
                }
            }
        }
        self.emit(EngineEvent::GatherCompleted(summary));
    }

    /// Writes the record map; `announce` reports the path to the front end.
    fn save(&mut self, announce: bool) {
        match self.store.save(self.reconciler.records(), self.day) {
            Ok(path) => {
                engine_debug!("State saved to {:?}", path);
                if announce {
                    self.emit(EngineEvent::StateSaved(path));
                }
            }
            Err(err) => engine_error!("Failed to save state to {:?}: {}", self.store.path(), err),
        }
    }

    fn publish(&self) -> Arc<StateSnapshot> {
        let snapshot = Arc::new(self.reconciler.snapshot());
        match self.published.write() {
            Ok(mut guard) => *guard = snapshot.clone(),
            Err(poisoned) => *poisoned.into_inner() = snapshot.clone(),
        }
        snapshot
    }

    fn current_snapshot(&self) -> Arc<StateSnapshot> {
        match self.published.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn emit(&self, event: EngineEvent) {
        let _ = self.events.send(event);
    }
}
