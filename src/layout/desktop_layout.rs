use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::auto_layout::AutoLayout;
use crate::error::{DesktopError, Result};
use crate::models::icon_entry::display_name_for;
use crate::models::{IconEntry, Point, PositionTable};

/// Immediate children of `root`, folders first, then files. Within each group
/// the order is whatever the file system returns.
pub fn list_children(root: &Path) -> Result<(Vec<PathBuf>, Vec<PathBuf>)> {
    if !root.is_dir() {
        return Err(DesktopError::RootMissing(root.to_path_buf()));
    }

    let entries = std::fs::read_dir(root).map_err(|e| DesktopError::io("read", root, e))?;

    let mut folders = Vec::new();
    let mut files = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = ?err, "Skipping unreadable entry in {:?}", root);
                continue;
            }
        };
        let path = entry.path();
        // Follows symlinks, so a link to a folder shows as a folder.
        if path.is_dir() {
            folders.push(path);
        } else {
            files.push(path);
        }
    }

    Ok((folders, files))
}

/// Builds the icon set for `root`.
///
/// Children with a saved position in `positions` keep it; the rest are placed
/// by the auto-layout cursor in listing order, skipping slots a kept icon
/// already covers. Pure apart from reading the directory.
pub fn build_layout(
    root: &Path,
    positions: &PositionTable,
    layout: &AutoLayout,
) -> Result<Vec<IconEntry>> {
    let (folders, files) = list_children(root)?;

    let mut seen: HashSet<String> = HashSet::with_capacity(folders.len() + files.len());
    let children: Vec<(PathBuf, bool, String, Option<Point>)> = folders
        .into_iter()
        .map(|p| (p, true))
        .chain(files.into_iter().map(|p| (p, false)))
        .map(|(path, is_folder)| {
            let name = display_name_for(&path);
            let stored = if seen.insert(name.clone()) {
                positions.get(&name)
            } else {
                // Only one entry may claim a stored position.
                warn!("Duplicate icon name {:?}; auto-placing the second entry", name);
                None
            };
            (path, is_folder, name, stored)
        })
        .collect();

    // New icons must not land on top of icons that kept their place.
    let taken: Vec<Point> = children.iter().filter_map(|c| c.3).collect();
    let restored = taken.len();

    let mut cursor = layout.cursor();
    let mut icons = Vec::with_capacity(children.len());
    for (path, is_folder, name, stored) in children {
        let position = stored.unwrap_or_else(|| cursor.place_avoiding(&taken));
        debug!("Icon {:?} at ({}, {})", name, position.x, position.y);
        icons.push(IconEntry::new(path, is_folder, position));
    }

    info!(
        "Built desktop layout for {:?}: {} icons ({} restored)",
        root,
        icons.len(),
        restored
    );

    Ok(icons)
}
