use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use chrono::Local;
use prg_core::{update, AppState, Msg};
use prg_logging::engine_info;

use super::command::{self, Input};
use super::effects::EffectRunner;
use super::logging::{self, LogSetup};
use super::persistence::{load_settings, SETTINGS_FILENAME};
use super::render::render;

pub fn run_app() -> anyhow::Result<()> {
    logging::initialize(&LogSetup::default());

    let settings_path = PathBuf::from(SETTINGS_FILENAME);
    let settings = load_settings(&settings_path);
    println!(
        "PRG watch started {} on {}",
        Local::now().format("%Y-%m-%d %H:%M"),
        settings.base.display()
    );
    println!("type help for commands");

    let (msg_tx, msg_rx) = mpsc::channel::<Msg>();
    let mut state = AppState::with_auto_gather(settings.auto_gather);
    let mut effects = EffectRunner::new(settings, settings_path, msg_tx.clone());

    spawn_input_reader(msg_tx.clone())?;

    // Background tick so status changes reach the screen without input.
    thread::spawn(move || {
        let interval = Duration::from_millis(250);
        while msg_tx.send(Msg::Tick).is_ok() {
            thread::sleep(interval);
        }
    });

    println!("{}", render(&state.view()));
    while let Ok(msg) = msg_rx.recv() {
        let stopped = matches!(msg, Msg::EngineStopped);
        let (next, pending) = update(state, msg);
        state = next;
        effects.enqueue(pending);

        if state.consume_dirty() {
            println!("{}", render(&state.view()));
        }
        if stopped {
            break;
        }
    }

    engine_info!("PRG watch exited");
    Ok(())
}

fn spawn_input_reader(msg_tx: mpsc::Sender<Msg>) -> anyhow::Result<()> {
    thread::Builder::new()
        .name("stdin".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                match command::parse_line(&line) {
                    Ok(Input::Msg(msg)) => {
                        if msg_tx.send(msg).is_err() {
                            return;
                        }
                    }
                    Ok(Input::Help) => println!("{}", command::HELP),
                    Ok(Input::Empty) => {}
                    Err(message) => println!("{message}"),
                }
            }
            let _ = msg_tx.send(Msg::QuitRequested);
        })
        .context("failed to start the input thread")?;
    Ok(())
}
