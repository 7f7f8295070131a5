use std::path::{Path, PathBuf};

/// Vertical distance from the glyph's top-left to its label's top-left.
pub const LABEL_OFFSET_Y: i32 = 35;
/// Glyph edge length in pixels.
pub const GLYPH_SIZE: i32 = 32;
/// Maximum label width; the label wraps below the glyph within this width.
pub const LABEL_WIDTH: i32 = 64;
/// Height reserved for a (possibly wrapped) label when hit testing.
pub const LABEL_HEIGHT: i32 = 30;

/// Integer point on the desktop surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Component-wise `self - other`.
    pub fn delta_from(self, other: Point) -> (i32, i32) {
        (self.x - other.x, self.y - other.y)
    }

    /// Rounds pointer coordinates coming from the toolkit.
    pub fn from_f64(x: f64, y: f64) -> Self {
        Self::new(x.round() as i32, y.round() as i32)
    }
}

/// Which visual part of an icon a point landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconPart {
    Glyph,
    Label,
}

/// One desktop icon: a glyph and its label, representing one directory child.
///
/// The entry owns the position of both parts. The label is never looked up
/// separately; its position is always derived from the glyph's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconEntry {
    pub path: PathBuf,
    pub display_name: String,
    pub is_folder: bool,
    pub position: Point,
}

impl IconEntry {
    pub fn new(path: PathBuf, is_folder: bool, position: Point) -> Self {
        let display_name = display_name_for(&path);
        Self {
            path,
            display_name,
            is_folder,
            position,
        }
    }

    pub fn label_position(&self) -> Point {
        self.position.offset(0, LABEL_OFFSET_Y)
    }

    pub fn move_by(&mut self, dx: i32, dy: i32) {
        self.position = self.position.offset(dx, dy);
    }

    /// Returns the part of this icon under `point`, glyph first.
    pub fn hit_part(&self, point: Point) -> Option<IconPart> {
        if contains(self.position, GLYPH_SIZE, GLYPH_SIZE, point) {
            return Some(IconPart::Glyph);
        }
        if contains(self.label_position(), LABEL_WIDTH, LABEL_HEIGHT, point) {
            return Some(IconPart::Label);
        }
        None
    }
}

fn contains(origin: Point, width: i32, height: i32, point: Point) -> bool {
    point.x >= origin.x
        && point.x < origin.x + width
        && point.y >= origin.y
        && point.y < origin.y + height
}

/// Base name of a path as shown under its icon.
pub fn display_name_for(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
