use crate::{AppState, Effect, EngineStatus, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::AutoGatherToggled => {
            if state.is_quitting() {
                return (state, Vec::new());
            }
            let enabled = !state.auto_gather();
            state.set_auto_gather(enabled);
            vec![Effect::SetAutoGather(enabled)]
        }
        Msg::AutoGatherSet(enabled) => {
            if state.is_quitting() || !state.set_auto_gather(enabled) {
                return (state, Vec::new());
            }
            vec![Effect::SetAutoGather(enabled)]
        }
        Msg::GatherClicked => {
            // Manual gathering is disabled while the engine gathers on its own.
            if state.auto_gather() || state.is_quitting() {
                Vec::new()
            } else {
                vec![Effect::GatherNow]
            }
        }
        Msg::OpenRowRequested(index) => {
            let location = state.row(index).map(|row| row.location.clone());
            match location {
                Some(location) => vec![Effect::OpenLocation(location)],
                None => {
                    state.set_notice(format!("no issue row {}", index + 1));
                    Vec::new()
                }
            }
        }
        Msg::ListRequested => {
            state.mark_dirty();
            Vec::new()
        }
        Msg::SaveRequested => vec![Effect::SaveState],
        Msg::QuitRequested => {
            if state.begin_quit() {
                vec![Effect::Shutdown]
            } else {
                Vec::new()
            }
        }
        Msg::StateRestored(snapshot) => {
            state.apply_snapshot(snapshot);
            Vec::new()
        }
        Msg::RootChanged { root, snapshot } => {
            state.apply_snapshot(snapshot);
            state.set_notice(format!("now watching {}", root.display()));
            Vec::new()
        }
        Msg::ScanCompleted { stats, snapshot } => {
            state.record_pass(stats);
            if !state.is_quitting() {
                state.set_status(EngineStatus::Watching);
            }
            if let Some(snapshot) = snapshot {
                state.apply_snapshot(snapshot);
            }
            Vec::new()
        }
        Msg::ScanFailed { reason } => {
            if !state.is_quitting() {
                state.set_status(EngineStatus::Unavailable(reason));
            }
            Vec::new()
        }
        Msg::GatherCompleted(stats) => {
            state.record_gather(stats);
            Vec::new()
        }
        Msg::StateSaved(path) => {
            state.set_notice(format!("state saved to {}", path.display()));
            Vec::new()
        }
        Msg::EngineStopped => {
            state.set_status(EngineStatus::Stopped);
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}
