use std::time::Duration;

use crate::models::Point;

/// Pointer travel, per axis, beyond which a press becomes a drag.
pub const DRAG_THRESHOLD_PX: i32 = 5;
/// Poll interval of the drag tick (~60 Hz).
pub const DRAG_TICK: Duration = Duration::from_millis(16);

/// An in-progress press on an icon.
///
/// Starts armed: it is not yet known whether the press is a click or a drag.
/// Once the pointer has travelled more than [`DRAG_THRESHOLD_PX`] from the
/// start on either axis, it becomes a drag for the rest of the gesture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragSession {
    pub entry: String,
    pub start: Point,
    pub last: Point,
    pub dragging: bool,
}

impl DragSession {
    pub fn new(entry: impl Into<String>, start: Point) -> Self {
        Self {
            entry: entry.into(),
            start,
            last: start,
            dragging: false,
        }
    }

    /// Per-axis test; a diagonal move of (4, 4) stays below the threshold.
    pub fn exceeds_threshold(&self, pointer: Point) -> bool {
        let (dx, dy) = pointer.delta_from(self.start);
        dx.abs() > DRAG_THRESHOLD_PX || dy.abs() > DRAG_THRESHOLD_PX
    }

    /// Feeds a pointer sample. Returns the delta the icon should move by, or
    /// `None` while armed or when the pointer has not moved since the last
    /// sample.
    pub fn advance(&mut self, pointer: Point) -> Option<(i32, i32)> {
        if !self.dragging {
            if !self.exceeds_threshold(pointer) {
                return None;
            }
            self.dragging = true;
        }

        let delta = pointer.delta_from(self.last);
        self.last = pointer;
        (delta != (0, 0)).then_some(delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stays_armed_within_threshold() {
        let mut drag = DragSession::new("a", Point::new(100, 100));
        assert_eq!(drag.advance(Point::new(105, 95)), None);
        assert_eq!(drag.advance(Point::new(104, 104)), None);
        assert!(!drag.dragging);
    }

    #[test]
    fn test_threshold_is_per_axis() {
        let drag = DragSession::new("a", Point::new(0, 0));
        assert!(!drag.exceeds_threshold(Point::new(5, 5)));
        assert!(drag.exceeds_threshold(Point::new(6, 0)));
        assert!(drag.exceeds_threshold(Point::new(0, -6)));
    }

    #[test]
    fn test_first_drag_step_moves_full_displacement() {
        let mut drag = DragSession::new("a", Point::new(100, 100));
        assert_eq!(drag.advance(Point::new(103, 100)), None);
        assert_eq!(drag.advance(Point::new(110, 102)), Some((10, 2)));
        assert!(drag.dragging);
        assert_eq!(drag.advance(Point::new(112, 102)), Some((2, 0)));
        assert_eq!(drag.advance(Point::new(112, 102)), None);
    }

    #[test]
    fn test_dragging_persists_back_inside_threshold() {
        let mut drag = DragSession::new("a", Point::new(0, 0));
        drag.advance(Point::new(20, 0));
        assert_eq!(drag.advance(Point::new(1, 0)), Some((-19, 0)));
        assert!(drag.dragging);
    }
}
