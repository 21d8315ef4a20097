/// Frame driver: start / stop / tick around the step function.
///
/// The driver owns no clock. Whatever schedules frames (the terminal loop in
/// `main`, a timer, a test calling `tick` by hand) asks for a `FrameHandle`
/// with `start()` and passes it back on every `tick()`. `stop()` invalidates
/// the handle, so a tick scheduled before the stop can never run a frame.
/// A new run must call `start()` again for a fresh handle.
///
/// A tick while Running: step, then draw the snapshot. The frame that ends the
/// run draws the terminal snapshot once and stops the driver.

use std::io;

use rand::Rng;

use super::event::GameEvent;
use super::session::{GameSession, Phase, Snapshot};
use super::step;

/// Anything that can draw a snapshot. Owns no game state.
pub trait RenderSurface {
    fn draw(&mut self, snapshot: &Snapshot) -> io::Result<()>;
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct FrameHandle(u64);

#[derive(Debug, PartialEq)]
pub enum TickOutcome {
    /// Handle was stopped or superseded. Nothing ran.
    Stale,
    /// Session was not Running; the driver stopped itself.
    Cancelled,
    Advanced(Vec<GameEvent>),
    /// This frame ended the run; the driver is stopped.
    Finished(Vec<GameEvent>),
}

#[derive(Debug, Default)]
pub struct Driver {
    current: Option<FrameHandle>,
    generation: u64,
    frames: u64,
}

impl Driver {
    pub fn new() -> Self {
        Driver::default()
    }

    /// Arm the driver and hand out a new handle. Any older handle goes stale.
    pub fn start(&mut self) -> FrameHandle {
        self.generation += 1;
        let handle = FrameHandle(self.generation);
        self.current = Some(handle);
        self.frames = 0;
        tracing::debug!(generation = self.generation, "driver started");
        handle
    }

    pub fn stop(&mut self) {
        if self.current.take().is_some() {
            tracing::debug!(generation = self.generation, frames = self.frames, "driver stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.current.is_some()
    }

    pub fn handle(&self) -> Option<FrameHandle> {
        self.current
    }

    /// Frames run since the last `start()`.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn tick<R, S>(
        &mut self,
        handle: FrameHandle,
        session: &mut GameSession,
        rng: &mut R,
        surface: &mut S,
    ) -> io::Result<TickOutcome>
    where
        R: Rng,
        S: RenderSurface + ?Sized,
    {
        if self.current != Some(handle) {
            return Ok(TickOutcome::Stale);
        }
        if session.phase != Phase::Running {
            self.stop();
            return Ok(TickOutcome::Cancelled);
        }

        let events = step::step(session, rng);
        self.frames += 1;

        let finished = session.phase == Phase::GameOver;
        if finished {
            self.stop();
        }
        surface.draw(&session.snapshot())?;

        Ok(if finished {
            TickOutcome::Finished(events)
        } else {
            TickOutcome::Advanced(events)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::sim::save::MemoryScoreStore;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[derive(Default)]
    struct Recorder {
        frames: Vec<Snapshot>,
    }

    impl RenderSurface for Recorder {
        fn draw(&mut self, snapshot: &Snapshot) -> io::Result<()> {
            self.frames.push(snapshot.clone());
            Ok(())
        }
    }

    struct Broken;

    impl RenderSurface for Broken {
        fn draw(&mut self, _snapshot: &Snapshot) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
        }
    }

    fn setup() -> (Driver, GameSession, ChaCha8Rng, Recorder) {
        let mut session = GameSession::new(GameConfig::default(), 0);
        session.start().unwrap();
        (Driver::new(), session, ChaCha8Rng::seed_from_u64(1), Recorder::default())
    }

    #[test]
    fn tick_steps_and_draws() {
        let (mut d, mut s, mut r, mut rec) = setup();
        let h = d.start();
        for _ in 0..3 {
            let out = d.tick(h, &mut s, &mut r, &mut rec).unwrap();
            assert!(matches!(out, TickOutcome::Advanced(_)));
        }
        assert_eq!(s.frame, 3);
        assert_eq!(d.frames(), 3);
        assert_eq!(rec.frames.len(), 3);
        assert!(rec.frames.iter().all(|f| f.phase == Phase::Running));
        assert_eq!(rec.frames[2].frame, 3);
    }

    #[test]
    fn unarmed_driver_does_nothing() {
        let (mut d, mut s, mut r, mut rec) = setup();
        let h = d.start();
        d.stop();
        assert_eq!(d.tick(h, &mut s, &mut r, &mut rec).unwrap(), TickOutcome::Stale);
        assert_eq!(s.frame, 0);
        assert!(rec.frames.is_empty());
    }

    #[test]
    fn game_over_draws_once_and_stops() {
        let (mut d, mut s, mut r, mut rec) = setup();
        let h = d.start();
        s.bird.y = 459.9;

        let out = d.tick(h, &mut s, &mut r, &mut rec).unwrap();
        assert_eq!(out, TickOutcome::Finished(vec![GameEvent::HitBoundary]));
        assert!(!d.is_running());
        assert_eq!(rec.frames.len(), 1);
        assert_eq!(rec.frames[0].phase, Phase::GameOver);

        // The already-scheduled tick after the stop is a no-op.
        assert_eq!(d.tick(h, &mut s, &mut r, &mut rec).unwrap(), TickOutcome::Stale);
        assert_eq!(rec.frames.len(), 1);
    }

    #[test]
    fn restart_needs_a_fresh_handle() {
        let (mut d, mut s, mut r, mut rec) = setup();
        let old = d.start();
        s.bird.y = 459.9;
        d.tick(old, &mut s, &mut r, &mut rec).unwrap();

        let mut store = MemoryScoreStore::new(0);
        assert!(s.restart(&mut store));
        assert!(s.start().unwrap());

        // Old handle stays dead even though the session is Running again.
        assert_eq!(d.tick(old, &mut s, &mut r, &mut rec).unwrap(), TickOutcome::Stale);
        assert_eq!(s.frame, 0);

        let new = d.start();
        assert_ne!(old, new);
        assert!(matches!(d.tick(new, &mut s, &mut r, &mut rec).unwrap(), TickOutcome::Advanced(_)));
        assert_eq!(s.frame, 1);
    }

    #[test]
    fn second_start_supersedes_first_handle() {
        let (mut d, mut s, mut r, mut rec) = setup();
        let first = d.start();
        let second = d.start();
        assert_eq!(d.tick(first, &mut s, &mut r, &mut rec).unwrap(), TickOutcome::Stale);
        assert!(matches!(d.tick(second, &mut s, &mut r, &mut rec).unwrap(), TickOutcome::Advanced(_)));
    }

    #[test]
    fn session_not_running_cancels() {
        let mut s = GameSession::new(GameConfig::default(), 0);
        let mut d = Driver::new();
        let mut rec = Recorder::default();
        let h = d.start();
        let out = d.tick(h, &mut s, &mut ChaCha8Rng::seed_from_u64(1), &mut rec).unwrap();
        assert_eq!(out, TickOutcome::Cancelled);
        assert!(!d.is_running());
        assert!(rec.frames.is_empty());
    }

    #[test]
    fn draw_error_propagates_after_stop() {
        let (mut d, mut s, mut r, _) = setup();
        let h = d.start();
        s.bird.y = 459.9;
        assert!(d.tick(h, &mut s, &mut r, &mut Broken).is_err());
        assert_eq!(s.phase, Phase::GameOver);
        assert!(!d.is_running());
    }

    #[test]
    fn full_run_until_the_floor() {
        let (mut d, mut s, mut r, mut rec) = setup();
        let h = d.start();
        let mut ticks = 0;
        while d.is_running() {
            d.tick(h, &mut s, &mut r, &mut rec).unwrap();
            ticks += 1;
            assert!(ticks < 1000, "bird never landed");
        }
        assert_eq!(s.phase, Phase::GameOver);
        assert_eq!(rec.frames.last().map(|f| f.phase), Some(Phase::GameOver));
        assert_eq!(rec.frames.len(), ticks);
    }
}
