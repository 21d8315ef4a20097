/// Axis-aligned rectangles in play-field pixels.
///
/// Origin is the top-left corner of the field; y grows downward.

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Rect { x, y, w, h }
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    /// Strict AABB overlap. Rectangles that only share an edge do not overlap.
    #[inline]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_rects() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn contained_rect_overlaps() {
        let outer = Rect::new(0.0, 0.0, 100.0, 100.0);
        let inner = Rect::new(40.0, 40.0, 5.0, 5.0);
        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
    }

    #[test]
    fn touching_edges_do_not_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(!a.overlaps(&Rect::new(10.0, 0.0, 10.0, 10.0))); // right edge
        assert!(!a.overlaps(&Rect::new(-10.0, 0.0, 10.0, 10.0))); // left edge
        assert!(!a.overlaps(&Rect::new(0.0, 10.0, 10.0, 10.0))); // bottom edge
        assert!(!a.overlaps(&Rect::new(0.0, -10.0, 10.0, 10.0))); // top edge
    }

    #[test]
    fn overlap_needs_both_axes() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        // x overlaps, y apart
        assert!(!a.overlaps(&Rect::new(5.0, 20.0, 10.0, 10.0)));
        // y overlaps, x apart
        assert!(!a.overlaps(&Rect::new(20.0, 5.0, 10.0, 10.0)));
    }

    #[test]
    fn edges() {
        let r = Rect::new(480.0, 250.0, 40.0, 230.0);
        assert_eq!(r.right(), 520.0);
        assert_eq!(r.bottom(), 480.0);
    }
}
