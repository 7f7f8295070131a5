use std::collections::HashMap;

use tracing::warn;

use super::icon_entry::{IconEntry, Point};

/// Prefix of a persisted icon position line.
pub const POSITION_LINE_PREFIX: &str = "IconPosition:";

/// Saved icon coordinates keyed by display name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionTable {
    positions: HashMap<String, Point>,
}

impl PositionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the positions of the given icons.
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a IconEntry>) -> Self {
        let positions = entries
            .into_iter()
            .map(|e| (e.display_name.clone(), e.position))
            .collect();
        Self { positions }
    }

    pub fn get(&self, name: &str) -> Option<Point> {
        self.positions.get(name).copied()
    }

    pub fn insert(&mut self, name: impl Into<String>, position: Point) {
        self.positions.insert(name.into(), position);
    }

    /// Moves a stored position from `old` to `new`. Returns false when `old`
    /// had no stored position.
    pub fn rename(&mut self, old: &str, new: &str) -> bool {
        match self.positions.remove(old) {
            Some(pos) => {
                self.positions.insert(new.to_string(), pos);
                true
            }
            None => false,
        }
    }

    /// Returns a table where entries of `overlay` replace entries of `self`.
    pub fn merged_with(&self, overlay: &PositionTable) -> PositionTable {
        let mut positions = self.positions.clone();
        positions.extend(overlay.positions.iter().map(|(k, v)| (k.clone(), *v)));
        PositionTable { positions }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Parses one configuration line. Returns `None` for lines that are not
    /// position lines or are malformed.
    ///
    /// The name may itself contain `|`, so the coordinates are split off the
    /// right-hand end.
    pub fn parse_line(line: &str) -> Option<(String, Point)> {
        let rest = line.strip_prefix(POSITION_LINE_PREFIX)?;
        let mut parts = rest.rsplitn(3, '|');
        let y = parts.next()?.trim().parse::<i32>().ok()?;
        let x = parts.next()?.trim().parse::<i32>().ok()?;
        let name = parts.next()?;
        if name.is_empty() {
            return None;
        }
        Some((unescape_name(name), Point::new(x, y)))
    }

    /// Collects all position lines, skipping malformed ones.
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        let mut table = Self::new();
        for line in lines {
            if !line.starts_with(POSITION_LINE_PREFIX) {
                continue;
            }
            match Self::parse_line(line) {
                Some((name, pos)) => table.insert(name, pos),
                None => warn!("Skipping malformed icon position line: {:?}", line),
            }
        }
        table
    }

    /// Serialized position lines, sorted by name so rewrites are stable.
    pub fn to_lines(&self) -> Vec<String> {
        let mut names: Vec<&String> = self.positions.keys().collect();
        names.sort();
        names
            .into_iter()
            .map(|name| {
                let pos = self.positions[name];
                format!(
                    "{}{}|{}|{}",
                    POSITION_LINE_PREFIX,
                    escape_name(name),
                    pos.x,
                    pos.y
                )
            })
            .collect()
    }
}

/// File names may contain line breaks; the file is line based, so they are
/// written as `\n` and `\r`, with `\` doubled.
fn escape_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

/// Inverse of [`escape_name`]. An unknown escape is kept verbatim.
fn unescape_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut chars = name.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_names_with_line_breaks_survive_rewrite() {
        let mut table = PositionTable::new();
        table.insert("line1\nline2.txt", Point::new(300, 400));
        table.insert("x\nIconPosition:other.txt|0|0", Point::new(5, 6));
        table.insert("back\\slash\\n.txt", Point::new(7, 8));
        table.insert("cr\r.txt", Point::new(9, 10));

        let lines = table.to_lines();
        assert_eq!(lines.len(), 4);
        assert!(lines.iter().all(|l| !l.contains('\n') && !l.contains('\r')));

        let text = lines.join("\n");
        let reloaded = PositionTable::from_lines(text.lines());
        assert_eq!(reloaded, table);
        assert_eq!(reloaded.get("other.txt"), None);
    }

    #[test]
    fn test_parse_line() {
        assert_eq!(
            PositionTable::parse_line("IconPosition:notes.txt|100|230"),
            Some(("notes.txt".to_string(), Point::new(100, 230)))
        );
        assert_eq!(
            PositionTable::parse_line("IconPosition:a|b.txt|-4|7"),
            Some(("a|b.txt".to_string(), Point::new(-4, 7)))
        );
        assert_eq!(PositionTable::parse_line("IconPosition:notes.txt|1"), None);
        assert_eq!(PositionTable::parse_line("IconPosition:|1|2"), None);
        assert_eq!(PositionTable::parse_line("IconPosition:x|one|2"), None);
        assert_eq!(PositionTable::parse_line("/home/me/Desktop"), None);
    }

    #[test]
    fn test_lines_roundtrip_is_stable() {
        let mut table = PositionTable::new();
        table.insert("b", Point::new(100, 20));
        table.insert("a", Point::new(20, 90));

        let lines = table.to_lines();
        assert_eq!(
            lines,
            vec!["IconPosition:a|20|90", "IconPosition:b|100|20"]
        );

        let parsed = PositionTable::from_lines(lines.iter().map(String::as_str));
        assert_eq!(parsed, table);
    }

    #[test]
    fn test_from_lines_ignores_other_lines() {
        let lines = [
            "/home/me/Desktop",
            "/home/me/bg.png",
            "IconPosition:x|1|2",
            "IconPosition:broken",
        ];
        let table = PositionTable::from_lines(lines);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("x"), Some(Point::new(1, 2)));
    }

    #[test]
    fn test_merge_overlay_wins() {
        let mut base = PositionTable::new();
        base.insert("a", Point::new(1, 1));
        base.insert("b", Point::new(2, 2));
        let mut overlay = PositionTable::new();
        overlay.insert("b", Point::new(9, 9));
        overlay.insert("c", Point::new(3, 3));

        let merged = base.merged_with(&overlay);
        assert_eq!(merged.get("a"), Some(Point::new(1, 1)));
        assert_eq!(merged.get("b"), Some(Point::new(9, 9)));
        assert_eq!(merged.get("c"), Some(Point::new(3, 3)));
    }

    #[test]
    fn test_rename_and_snapshot() {
        let entries = vec![
            IconEntry::new(PathBuf::from("/d/one"), true, Point::new(20, 20)),
            IconEntry::new(PathBuf::from("/d/two.txt"), false, Point::new(20, 90)),
        ];
        let mut table = PositionTable::from_entries(&entries);
        assert!(table.rename("two.txt", "2.txt"));
        assert_eq!(table.get("2.txt"), Some(Point::new(20, 90)));
        assert_eq!(table.get("two.txt"), None);
        assert!(!table.rename("missing", "x"));
    }
}
