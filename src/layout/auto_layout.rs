use crate::models::Point;

/// Parameters for the column-then-wrap icon placement.
///
/// Icons are stacked top-to-bottom from `origin`, `row_step` apart. Once the
/// cursor passes `desktop_height - bottom_margin`, placement wraps to the top
/// of the next column, `column_step` to the right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoLayout {
    /// First slot (default: 20, 20)
    pub origin: Point,
    /// Vertical distance between slots (default: 70)
    pub row_step: i32,
    /// Horizontal distance between columns (default: 80)
    pub column_step: i32,
    /// Space kept free at the bottom of the desktop (default: 100)
    pub bottom_margin: i32,
    /// Visible desktop height, excluding the taskbar
    pub desktop_height: i32,
}

/// Window height 768 minus the 40 px taskbar.
pub const DEFAULT_DESKTOP_HEIGHT: i32 = 728;

impl Default for AutoLayout {
    fn default() -> Self {
        Self {
            origin: Point::new(20, 20),
            row_step: 70,
            column_step: 80,
            bottom_margin: 100,
            desktop_height: DEFAULT_DESKTOP_HEIGHT,
        }
    }
}

impl AutoLayout {
    pub fn with_desktop_height(desktop_height: i32) -> Self {
        Self {
            desktop_height,
            ..Self::default()
        }
    }

    fn wrap_limit(&self) -> i32 {
        self.desktop_height - self.bottom_margin
    }

    /// True when `b` lies within one slot step of `a` on both axes.
    fn same_cell(&self, a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < self.column_step && (a.y - b.y).abs() < self.row_step
    }

    pub fn cursor(&self) -> AutoLayoutCursor {
        AutoLayoutCursor {
            layout: *self,
            next: self.origin,
        }
    }
}

/// Deterministic placement cursor. Each call to [`AutoLayoutCursor::place`]
/// hands out the current slot and advances.
#[derive(Debug, Clone)]
pub struct AutoLayoutCursor {
    layout: AutoLayout,
    next: Point,
}

impl AutoLayoutCursor {
    pub fn place(&mut self) -> Point {
        let slot = self.next;
        self.next.y += self.layout.row_step;
        if self.next.y > self.layout.wrap_limit() {
            self.next.y = self.layout.origin.y;
            self.next.x += self.layout.column_step;
        }
        slot
    }

    /// Like [`Self::place`], but passes over slots whose cell already holds
    /// one of `taken`.
    pub fn place_avoiding(&mut self, taken: &[Point]) -> Point {
        loop {
            let slot = self.place();
            if !taken.iter().any(|p| self.layout.same_cell(slot, *p)) {
                return slot;
            }
        }
    }
}

impl Iterator for AutoLayoutCursor {
    type Item = Point;

    fn next(&mut self) -> Option<Point> {
        Some(self.place())
    }
}
