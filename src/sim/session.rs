/// GameSession: everything one player's game needs, in one place.
///
/// ## Phases
///
///   Idle ──start──▶ Running ──collision / boundary──▶ GameOver ──restart──▶ Idle
///
/// Only `Running` advances the frame counter or touches the bird and pipes
/// (see `step::step`). `GameOver` is terminal until `restart()`, which
/// commits the high score to the store and then resets the run.
///
/// The bird and the pipe stream are owned here and reset in place between
/// runs; they are never reallocated.

use crate::config::{ConfigError, GameConfig};
use crate::domain::bird::Bird;
use crate::domain::pipe::PipeStream;
use crate::domain::rect::Rect;
use super::save::ScoreStore;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Idle,
    Running,
    GameOver,
}

/// Read-only view handed to the render surface.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub phase: Phase,
    pub field_width: f64,
    pub field_height: f64,
    pub bird: Rect,
    pub pipes: Vec<Rect>,
    pub score: u32,
    pub high_score: u32,
    pub pipe_speed: f64,
    pub frame: u64,
}

pub struct GameSession {
    pub config: GameConfig,

    // ── Entities ──
    pub bird: Bird,
    pub pipes: PipeStream,

    // ── Run tracking ──
    pub phase: Phase,
    pub score: u32,
    pub high_score: u32,
    pub frame: u64,
    pub pipe_speed: f64,
}

impl GameSession {
    /// A fresh session in `Idle`. `high_score` comes from the score store.
    pub fn new(config: GameConfig, high_score: u32) -> Self {
        GameSession {
            bird: Bird::new(&config.bird),
            pipes: PipeStream::new(),
            phase: Phase::Idle,
            score: 0,
            high_score,
            frame: 0,
            pipe_speed: config.pipes.base_speed,
            config,
        }
    }

    /// Idle → Running. Rejects malformed configuration before any geometry
    /// is produced. Returns `Ok(false)` when not in `Idle` (nothing changes).
    pub fn start(&mut self) -> Result<bool, ConfigError> {
        if self.phase != Phase::Idle {
            tracing::debug!(phase = ?self.phase, "start ignored");
            return Ok(false);
        }
        self.config.validate()?;
        self.reset_run();
        self.phase = Phase::Running;
        tracing::info!(high_score = self.high_score, "run started");
        Ok(true)
    }

    /// Set the bird's velocity to the lift impulse. No-op unless Running.
    pub fn flap(&mut self) -> bool {
        if self.phase != Phase::Running {
            return false;
        }
        self.bird.flap();
        true
    }

    /// GameOver → Idle. Commits `max(score, high_score)` to the store exactly
    /// once, then resets the run. A failed write is logged and ignored.
    pub fn restart<S: ScoreStore + ?Sized>(&mut self, store: &mut S) -> bool {
        if self.phase != Phase::GameOver {
            tracing::debug!(phase = ?self.phase, "restart ignored");
            return false;
        }
        self.high_score = self.high_score.max(self.score);
        if let Err(e) = store.set(self.high_score) {
            tracing::warn!(error = %e, "high score not persisted");
        }
        tracing::info!(score = self.score, high_score = self.high_score, "run committed");
        self.reset_run();
        self.phase = Phase::Idle;
        true
    }

    /// Running → GameOver. Called by the step function on the first fatal frame.
    pub fn end_run(&mut self) {
        if self.phase == Phase::Running {
            self.phase = Phase::GameOver;
            tracing::info!(score = self.score, frame = self.frame, "game over");
        }
    }

    /// Best score seen this session, including a run not yet committed.
    pub fn best_score(&self) -> u32 {
        self.high_score.max(self.score)
    }

    /// Pipe speed for a given score: base + one step per `speed_step_score` points.
    pub fn speed_for_score(&self, score: u32) -> f64 {
        let p = &self.config.pipes;
        p.base_speed + f64::from(score / p.speed_step_score.max(1))
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            field_width: self.config.field.width,
            field_height: self.config.field.height,
            bird: self.bird.rect(),
            pipes: self.pipes.rects(),
            score: self.score,
            high_score: self.high_score,
            pipe_speed: self.pipe_speed,
            frame: self.frame,
        }
    }

    fn reset_run(&mut self) {
        self.score = 0;
        self.frame = 0;
        self.pipe_speed = self.config.pipes.base_speed;
        self.bird.reset();
        self.pipes.clear();
    }
}
