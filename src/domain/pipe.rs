/// Pipes and the pipe stream.
///
/// Pipes are spawned in gap pairs (top + bottom) at the right edge of the
/// field and scroll left. Each half is its own entry in the stream, pushed
/// top first, so the stream order is spawn order and also left-to-right
/// order: the front entry is always the left-most pipe.
///
/// Scoring pops ONE entry at a time. Passing a full pair therefore takes two
/// successive checks and awards two points.

use std::collections::VecDeque;

use rand::Rng;

use super::rect::Rect;
use crate::config::{FieldConfig, PipeConfig};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PipeSide {
    Top,
    Bottom,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Pipe {
    pub rect: Rect,
    pub side: PipeSide,
    pub pair: u64, // both halves of a gap pair share this id
}

#[derive(Clone, Debug, Default)]
pub struct PipeStream {
    pipes: VecDeque<Pipe>,
    next_pair: u64,
}

impl PipeStream {
    pub fn new() -> Self {
        PipeStream::default()
    }

    pub fn len(&self) -> usize {
        self.pipes.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.pipes.is_empty()
    }

    pub fn front(&self) -> Option<&Pipe> {
        self.pipes.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pipe> {
        self.pipes.iter()
    }

    pub fn rects(&self) -> Vec<Rect> {
        self.iter().map(|p| p.rect).collect()
    }

    /// Drop every pipe. The pair counter keeps running.
    pub fn clear(&mut self) {
        self.pipes.clear();
    }

    /// Spawn a gap pair when `frame` is a multiple of the spawn interval
    /// (frame 0 included). Returns the drawn top height if a pair was spawned.
    pub fn maybe_spawn<R: Rng>(
        &mut self,
        frame: u64,
        field: &FieldConfig,
        cfg: &PipeConfig,
        rng: &mut R,
    ) -> Option<f64> {
        if frame % cfg.spawn_interval != 0 {
            return None;
        }
        let top_height = f64::from(rng.gen_range(cfg.min_height..cfg.min_height + cfg.height_range));
        self.push_pair(top_height, field, cfg);
        Some(top_height)
    }

    /// Append a top/bottom pair at the right edge of the field.
    /// `top.h + gap + bottom.h == field.height` always holds.
    pub fn push_pair(&mut self, top_height: f64, field: &FieldConfig, cfg: &PipeConfig) {
        self.push_pair_at(field.width, top_height, field.height, cfg);
    }

    /// Append a pair at an arbitrary x. Callers keep the stream ordered.
    pub fn push_pair_at(&mut self, x: f64, top_height: f64, field_height: f64, cfg: &PipeConfig) {
        let pair = self.next_pair;
        self.next_pair += 1;

        let bottom_y = top_height + cfg.gap;
        self.pipes.push_back(Pipe {
            rect: Rect::new(x, 0.0, cfg.width, top_height),
            side: PipeSide::Top,
            pair,
        });
        self.pipes.push_back(Pipe {
            rect: Rect::new(x, bottom_y, cfg.width, field_height - bottom_y),
            side: PipeSide::Bottom,
            pair,
        });
    }

    /// Scroll every pipe left by `speed` px.
    pub fn advance(&mut self, speed: f64) {
        for pipe in self.pipes.iter_mut() {
            pipe.rect.x -= speed;
        }
    }

    /// Remove pipes whose right edge is at or past the left boundary.
    /// Order-preserving. Returns how many were removed.
    pub fn prune_offscreen(&mut self) -> usize {
        let before = self.len();
        self.pipes.retain(|p| p.rect.right() > 0.0);
        before - self.len()
    }

    /// Does the bird strictly overlap any pipe?
    pub fn check_collision(&self, bird: &Rect) -> bool {
        self.iter().any(|p| bird.overlaps(&p.rect))
    }

    /// If the bird's left edge is past the front pipe's right edge, remove
    /// that single entry and report a point.
    pub fn consume_if_passed(&mut self, bird: &Rect) -> bool {
        match self.front() {
            Some(front) if bird.x > front.rect.right() => {
                self.pipes.pop_front();
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const FIELD: FieldConfig = FieldConfig { width: 480.0, height: 480.0 };

    fn cfg() -> PipeConfig {
        PipeConfig {
            width: 40.0,
            gap: 150.0,
            spawn_interval: 90,
            min_height: 50,
            height_range: 200,
            base_speed: 2.0,
            speed_step_score: 10,
        }
    }

    fn bird_at(x: f64, y: f64) -> Rect {
        Rect::new(x, y, 20.0, 20.0)
    }

    // ── spawning ──

    #[test]
    fn push_pair_geometry() {
        let mut s = PipeStream::new();
        s.push_pair(100.0, &FIELD, &cfg());
        let rects = s.rects();
        assert_eq!(rects.len(), 2);
        assert_eq!(rects[0], Rect::new(480.0, 0.0, 40.0, 100.0));
        assert_eq!(rects[1], Rect::new(480.0, 250.0, 40.0, 230.0));

        let pipes: Vec<&Pipe> = s.iter().collect();
        assert_eq!(pipes[0].side, PipeSide::Top);
        assert_eq!(pipes[1].side, PipeSide::Bottom);
        assert_eq!(pipes[0].pair, pipes[1].pair);
    }

    #[test]
    fn pair_ids_increase() {
        let mut s = PipeStream::new();
        s.push_pair(60.0, &FIELD, &cfg());
        s.push_pair(70.0, &FIELD, &cfg());
        let ids: Vec<u64> = s.iter().map(|p| p.pair).collect();
        assert_eq!(ids, vec![0, 0, 1, 1]);
    }

    #[test]
    fn spawns_only_on_interval() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut s = PipeStream::new();
        let c = cfg();

        assert!(s.maybe_spawn(0, &FIELD, &c, &mut rng).is_some());
        assert_eq!(s.len(), 2);

        for frame in 1..90 {
            assert!(s.maybe_spawn(frame, &FIELD, &c, &mut rng).is_none());
        }
        assert_eq!(s.len(), 2);

        assert!(s.maybe_spawn(90, &FIELD, &c, &mut rng).is_some());
        assert!(s.maybe_spawn(91, &FIELD, &c, &mut rng).is_none());
        assert!(s.maybe_spawn(180, &FIELD, &c, &mut rng).is_some());
        assert_eq!(s.len(), 6);
    }

    #[test]
    fn spawned_heights_stay_in_range_and_fill_field() {
        let mut rng = ChaCha8Rng::seed_from_u64(12345);
        let c = cfg();
        for i in 0..500u64 {
            let mut s = PipeStream::new();
            let top = s.maybe_spawn(i * 90, &FIELD, &c, &mut rng).unwrap();
            assert!((50.0..250.0).contains(&top), "top height {top} out of range");
            assert_eq!(top.fract(), 0.0);

            let rects = s.rects();
            assert_eq!(rects[0].h, top);
            assert_eq!(rects[0].h + 150.0 + rects[1].h, FIELD.height);
        }
    }

    // ── movement ──

    #[test]
    fn advance_moves_every_pipe() {
        let mut s = PipeStream::new();
        s.push_pair(100.0, &FIELD, &cfg());
        s.advance(2.0);
        s.advance(3.0);
        assert!(s.iter().all(|p| p.rect.x == 475.0));
    }

    #[test]
    fn prune_removes_fully_offscreen_only() {
        let mut s = PipeStream::new();
        s.push_pair(100.0, &FIELD, &cfg());
        s.push_pair(120.0, &FIELD, &cfg());
        // First pair right edge lands exactly on 0, second stays visible.
        for p in s.pipes.iter_mut().take(2) {
            p.rect.x = -40.0;
        }
        assert_eq!(s.prune_offscreen(), 2);
        assert_eq!(s.len(), 2);
        assert!(s.iter().all(|p| p.pair == 1));

        for p in s.pipes.iter_mut() {
            p.rect.x = -39.5;
        }
        assert_eq!(s.prune_offscreen(), 0);
    }

    // ── collision ──

    #[test]
    fn collision_with_top_pipe() {
        let mut s = PipeStream::new();
        s.push_pair(100.0, &FIELD, &cfg());
        for p in s.pipes.iter_mut() {
            p.rect.x = 60.0;
        }
        assert!(s.check_collision(&bird_at(50.0, 90.0)));
    }

    #[test]
    fn no_collision_inside_gap() {
        let mut s = PipeStream::new();
        s.push_pair(100.0, &FIELD, &cfg());
        for p in s.pipes.iter_mut() {
            p.rect.x = 60.0;
        }
        // Touching the top pipe's bottom edge and clear of the bottom pipe.
        assert!(!s.check_collision(&bird_at(50.0, 100.0)));
        assert!(!s.check_collision(&bird_at(50.0, 230.0)));
        assert!(s.check_collision(&bird_at(50.0, 230.5)));
    }

    #[test]
    fn no_collision_when_edges_touch_horizontally() {
        let mut s = PipeStream::new();
        s.push_pair(100.0, &FIELD, &cfg());
        for p in s.pipes.iter_mut() {
            p.rect.x = 70.0; // bird spans 50..70
        }
        assert!(!s.check_collision(&bird_at(50.0, 10.0)));
    }

    // ── scoring ──

    #[test]
    fn consume_pops_one_entry_per_call() {
        let mut s = PipeStream::new();
        s.push_pair(100.0, &FIELD, &cfg());
        for p in s.pipes.iter_mut() {
            p.rect.x = 0.0; // right edge at 40
        }
        let bird = bird_at(50.0, 150.0);

        assert!(s.consume_if_passed(&bird));
        assert_eq!(s.len(), 1);
        assert_eq!(s.front().map(|p| p.side), Some(PipeSide::Bottom));

        assert!(s.consume_if_passed(&bird));
        assert!(s.is_empty());

        assert!(!s.consume_if_passed(&bird));
    }

    #[test]
    fn consume_requires_strictly_past() {
        let mut s = PipeStream::new();
        s.push_pair(100.0, &FIELD, &cfg());
        for p in s.pipes.iter_mut() {
            p.rect.x = 10.0; // right edge at 50 == bird.x
        }
        assert!(!s.consume_if_passed(&bird_at(50.0, 150.0)));
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn clear_empties_stream() {
        let mut s = PipeStream::new();
        s.push_pair(100.0, &FIELD, &cfg());
        s.clear();
        assert!(s.is_empty());
        assert!(s.front().is_none());
    }
}
