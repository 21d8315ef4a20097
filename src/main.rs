/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::Context;
use crossterm::event::KeyCode;
use rand::Rng;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

use config::GameConfig;
use sim::driver::{Driver, TickOutcome};
use sim::event::GameEvent;
use sim::save::{self, FileScoreStore, MemoryScoreStore, ScoreStore};
use sim::session::{GameSession, Phase};
use ui::input::InputState;
use ui::renderer::Renderer;

const FRAME_SLEEP: Duration = Duration::from_millis(5);
const LOG_FILE: &str = "flapterm.log";

const QUIT_KEYS: [KeyCode; 3] = [KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];
const START_KEYS: [KeyCode; 2] = [KeyCode::Enter, KeyCode::Char(' ')];

fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = GameConfig::load();
    // Fail before the terminal goes raw so the message is readable.
    config.validate().context("invalid configuration")?;

    let mut store: Box<dyn ScoreStore> = if config.score_file.as_os_str().is_empty() {
        tracing::info!("score_file is empty, high score kept in memory only");
        Box::new(MemoryScoreStore::new(0))
    } else {
        let file = FileScoreStore::in_data_dir(&config.score_file);
        tracing::info!(path = %file.path().display(), "high score file");
        Box::new(file)
    };
    let mut session = GameSession::new(config, store.get());
    let mut rng = rand::thread_rng();
    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        let _ = renderer.cleanup();
        return Err(e).context("terminal init failed");
    }

    let result = game_loop(&mut session, store.as_mut(), &mut renderer, &mut rng);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    result?;

    println!();
    println!("Thanks for playing Flapterm!");
    println!("Final Score: {}   High Score: {}", session.score, session.best_score());
    Ok(())
}

/// Log to a file: the terminal is in raw mode on the alternate screen while
/// the game runs. `FLAPTERM_LOG` overrides the path, `RUST_LOG` the filter.
fn init_tracing() {
    let path = std::env::var_os("FLAPTERM_LOG")
        .map(PathBuf::from)
        .unwrap_or_else(|| save::data_dir().join(LOG_FILE));

    let writer = match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => BoxMakeWriter::new(Mutex::new(file)),
        Err(_) => BoxMakeWriter::new(io::sink),
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("tracing subscriber already set");
    }
}

fn game_loop<S, R>(
    session: &mut GameSession,
    store: &mut S,
    renderer: &mut Renderer,
    rng: &mut R,
) -> anyhow::Result<()>
where
    S: ScoreStore + ?Sized,
    R: Rng,
{
    let mut kb = InputState::new();
    let mut driver = Driver::new();
    let tick_rate = Duration::from_millis(session.config.timing.frame_ms);
    let mut last_tick = Instant::now();

    renderer.render(&session.snapshot())?;

    loop {
        kb.drain_events();

        if kb.ctrl_c_pressed() || kb.any_pressed(&QUIT_KEYS) {
            tracing::info!(score = session.score, mid_run = driver.is_running(), "quit");
            break;
        }

        match session.phase {
            Phase::Idle => {
                if kb.any_pressed(&START_KEYS) {
                    start_run(session, &mut driver)?;
                    last_tick = Instant::now();
                }
            }
            Phase::Running => {
                if kb.any_pressed_except(&QUIT_KEYS) {
                    session.flap();
                }
            }
            Phase::GameOver => {
                // Play Again: commit the score, then go straight into a new run.
                if kb.was_pressed(KeyCode::Enter) {
                    session.restart(store);
                    start_run(session, &mut driver)?;
                    last_tick = Instant::now();
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
            match driver.handle() {
                Some(handle) => match driver.tick(handle, session, rng, renderer)? {
                    TickOutcome::Advanced(events) => log_events(&events),
                    TickOutcome::Finished(events) => {
                        log_events(&events);
                        tracing::info!(frames = driver.frames(), "run finished");
                    }
                    TickOutcome::Stale | TickOutcome::Cancelled => {}
                },
                None => renderer.render(&session.snapshot())?,
            }
        }

        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

fn start_run(session: &mut GameSession, driver: &mut Driver) -> anyhow::Result<()> {
    if session.start().context("cannot start a run")? {
        driver.start();
    }
    Ok(())
}

fn log_events(events: &[GameEvent]) {
    for event in events {
        match event {
            GameEvent::Scored { score } => tracing::debug!(score, "scored"),
            _ if event.is_fatal() => tracing::debug!(?event, "collision"),
            _ => tracing::trace!(?event),
        }
    }
}
