/// The bird: a falling body with a fixed horizontal position.
///
/// Per frame: `velocity += gravity`, then `y += velocity` (velocity first).
/// A flap overwrites the velocity with `lift`; it never accumulates.

use super::rect::Rect;
use crate::config::BirdConfig;

#[derive(Clone, Debug, PartialEq)]
pub struct Bird {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub velocity: f64,
    pub gravity: f64,
    pub lift: f64,
    pub start_y: f64,
}

impl Bird {
    pub fn new(cfg: &BirdConfig) -> Self {
        Bird {
            x: cfg.x,
            y: cfg.start_y,
            width: cfg.width,
            height: cfg.height,
            velocity: 0.0,
            gravity: cfg.gravity,
            lift: cfg.lift,
            start_y: cfg.start_y,
        }
    }

    /// One frame of gravity.
    #[inline]
    pub fn integrate(&mut self) {
        self.velocity += self.gravity;
        self.y += self.velocity;
    }

    #[inline]
    pub fn flap(&mut self) {
        self.velocity = self.lift;
    }

    /// Touching the floor or the ceiling counts.
    pub fn is_out_of_bounds(&self, field_height: f64) -> bool {
        self.y + self.height >= field_height || self.y <= 0.0
    }

    /// Back to the start position, at rest.
    pub fn reset(&mut self) {
        self.y = self.start_y;
        self.velocity = 0.0;
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}
