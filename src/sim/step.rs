/// The step function: advances a running session by one frame.
///
/// Processing order (fixed, tests depend on it):
///   1. Physics: gravity into velocity, velocity into y
///   2. Boundary check → GameOver, nothing else happens this frame
///   3. Spawn a gap pair on every spawn-interval frame (frame 0 included)
///   4. Advance pipes by the current speed
///   5. Prune pipes that left the field
///   6. Pipe collision → GameOver, but the frame still finishes
///   7. Score check against the single front pipe entry
///   8. Speed-up from score
///   9. Frame counter
///
/// Step 6 does not return early, so on the frame the bird hits a pipe it can
/// still pass the front entry and score.

use rand::Rng;

use super::event::GameEvent;
use super::session::{GameSession, Phase};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step<R: Rng>(s: &mut GameSession, rng: &mut R) -> Vec<GameEvent> {
    if s.phase != Phase::Running { return vec![]; }

    let mut events: Vec<GameEvent> = Vec::new();

    s.bird.integrate();
    if resolve_boundary(s, &mut events) { return events; }
    resolve_spawn(s, rng, &mut events);
    resolve_pipe_movement(s, &mut events);
    resolve_pipe_collision(s, &mut events);
    resolve_scoring(s, &mut events);
    resolve_speed(s, &mut events);
    s.frame += 1;

    events
}

// ══════════════════════════════════════════════════════════════
// Stages
// ══════════════════════════════════════════════════════════════

fn resolve_boundary(s: &mut GameSession, events: &mut Vec<GameEvent>) -> bool {
    if !s.bird.is_out_of_bounds(s.config.field.height) { return false; }
    events.push(GameEvent::HitBoundary);
    s.end_run();
    true
}

fn resolve_spawn<R: Rng>(s: &mut GameSession, rng: &mut R, events: &mut Vec<GameEvent>) {
    let spawned = s.pipes.maybe_spawn(s.frame, &s.config.field, &s.config.pipes, rng);
    if let Some(top_height) = spawned {
        tracing::debug!(frame = s.frame, top_height, "pair spawned");
        events.push(GameEvent::PairSpawned { top_height });
    }
}

fn resolve_pipe_movement(s: &mut GameSession, events: &mut Vec<GameEvent>) {
    s.pipes.advance(s.pipe_speed);
    let count = s.pipes.prune_offscreen();
    if count > 0 {
        events.push(GameEvent::PipesPruned { count });
    }
}

fn resolve_pipe_collision(s: &mut GameSession, events: &mut Vec<GameEvent>) {
    if s.pipes.check_collision(&s.bird.rect()) {
        events.push(GameEvent::HitPipe);
        s.end_run();
    }
}

fn resolve_scoring(s: &mut GameSession, events: &mut Vec<GameEvent>) {
    if s.pipes.consume_if_passed(&s.bird.rect()) {
        s.score += 1;
        events.push(GameEvent::Scored { score: s.score });
    }
}

/// Recomputed on every frame whose score is a positive multiple of the step;
/// repeated frames at the same score give the same speed.
fn resolve_speed(s: &mut GameSession, events: &mut Vec<GameEvent>) {
    let step = s.config.pipes.speed_step_score;
    if s.score == 0 || step == 0 || s.score % step != 0 { return; }

    let speed = s.speed_for_score(s.score);
    if speed != s.pipe_speed {
        s.pipe_speed = speed;
        tracing::info!(score = s.score, speed, "pipes speed up");
        events.push(GameEvent::SpeedChanged { speed });
    }
}
