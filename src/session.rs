//! The desktop session: owner of the icon set, the highlight and the
//! persisted configuration.
//!
//! Every file system mutation goes through here and ends in [`DesktopSessionState::refresh`],
//! which captures the on-screen positions, rebuilds the icon set from disk
//! and persists the result. Failed mutations return before the refresh, so
//! the displayed layout is left exactly as it was. A drop is the exception:
//! files copied before a failure are kept and shown.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::DesktopConfig;
use crate::error::{DesktopError, Result};
use crate::fs_ops::{self, DropReport, RenameOutcome};
use crate::image_loader;
use crate::layout::{build_layout, AutoLayout};
use crate::models::{IconEntry, IconPart, Point, PositionTable};

pub struct DesktopSessionState {
    config_path: PathBuf,
    config: DesktopConfig,
    layout: AutoLayout,
    icons: Vec<IconEntry>,
    selected: Option<String>,
}

impl DesktopSessionState {
    /// Creates a session with an empty icon set. Call [`Self::rebuild`] to
    /// populate it.
    pub fn new(config_path: PathBuf, config: DesktopConfig, layout: AutoLayout) -> Self {
        Self {
            config_path,
            config,
            layout,
            icons: Vec::new(),
            selected: None,
        }
    }

    pub fn root(&self) -> &Path {
        &self.config.root_dir
    }

    pub fn config(&self) -> &DesktopConfig {
        &self.config
    }

    pub fn icons(&self) -> &[IconEntry] {
        &self.icons
    }

    pub fn icon(&self, name: &str) -> Option<&IconEntry> {
        self.icons.iter().find(|i| i.display_name == name)
    }

    pub fn icon_mut(&mut self, name: &str) -> Option<&mut IconEntry> {
        self.icons.iter_mut().find(|i| i.display_name == name)
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Highlights `name` exclusively, or clears the highlight. Returns the
    /// previously highlighted name when it changed.
    pub fn select(&mut self, name: Option<&str>) -> Option<String> {
        if self.selected.as_deref() == name {
            return None;
        }
        let previous = self.selected.take();
        self.selected = name.map(str::to_string);
        previous
    }

    pub fn set_desktop_height(&mut self, height: i32) {
        self.layout.desktop_height = height;
    }

    /// Topmost icon under `point`. Later icons are drawn above earlier ones,
    /// so the search runs back to front.
    pub fn hit_test(&self, point: Point) -> Option<(&IconEntry, IconPart)> {
        self.icons
            .iter()
            .rev()
            .find_map(|icon| icon.hit_part(point).map(|part| (icon, part)))
    }

    /// Builds the icon set from disk and the persisted position table.
    /// On error the icon set is left empty.
    pub fn rebuild(&mut self) -> Result<()> {
        match build_layout(&self.config.root_dir, &self.config.positions, &self.layout) {
            Ok(icons) => {
                self.icons = icons;
                self.drop_stale_selection();
                Ok(())
            }
            Err(err) => {
                self.icons.clear();
                self.selected = None;
                Err(err)
            }
        }
    }

    /// Captures current on-screen positions, rebuilds from disk with those
    /// positions layered over the persisted table, then saves.
    pub fn refresh(&mut self) -> Result<()> {
        let current = PositionTable::from_entries(&self.icons);
        let merged = self.config.positions.merged_with(&current);
        let icons = build_layout(&self.config.root_dir, &merged, &self.layout)?;
        debug!("Refresh replaced {} icons with {}", self.icons.len(), icons.len());
        self.icons = icons;
        self.drop_stale_selection();
        self.save_positions()
    }

    /// Rewrites the configuration file with the positions of all displayed
    /// icons.
    pub fn save_positions(&mut self) -> Result<()> {
        self.config.positions = PositionTable::from_entries(&self.icons);
        self.config.save(&self.config_path)
    }

    /// Records a new background image path in the configuration. The image
    /// must decode; otherwise the configuration is left unchanged.
    pub fn set_background(&mut self, path: PathBuf) -> Result<()> {
        image_loader::open_image(&path).map_err(|e| DesktopError::Image {
            path: path.clone(),
            message: format!("{:#}", e),
        })?;
        self.config.background_image = path;
        self.config.save(&self.config_path)
    }

    pub fn delete(&mut self, name: &str) -> Result<()> {
        let Some(path) = self.icon(name).map(|i| i.path.clone()) else {
            return Ok(());
        };
        fs_ops::delete_entry(&path)?;
        if let Some(idx) = self.icons.iter().position(|i| i.display_name == name) {
            self.icons.remove(idx);
        }
        self.refresh()
    }

    /// Renames an icon's file. The icon keeps its position under the new name.
    pub fn rename(&mut self, name: &str, new_name: &str) -> Result<RenameOutcome> {
        let Some(path) = self.icon(name).map(|i| i.path.clone()) else {
            return Ok(RenameOutcome::Unchanged);
        };
        let outcome = fs_ops::rename_entry(&path, new_name)?;
        if let RenameOutcome::Renamed { to, .. } = &outcome {
            let new_display = crate::models::icon_entry::display_name_for(to);
            if let Some(icon) = self.icon_mut(name) {
                icon.display_name = new_display.clone();
                icon.path = to.clone();
            }
            self.config.positions.rename(name, &new_display);
            if self.selected.as_deref() == Some(name) {
                self.selected = Some(new_display);
            }
            self.refresh()?;
        }
        Ok(outcome)
    }

    pub fn import(&mut self, source: &Path) -> Result<PathBuf> {
        let dest = fs_ops::import_file(source, &self.config.root_dir)?;
        self.refresh()?;
        Ok(dest)
    }

    pub fn drop_files(&mut self, files: &[PathBuf]) -> Result<DropReport> {
        let report = match fs_ops::import_dropped(files, &self.config.root_dir) {
            Ok(report) => report,
            Err(err) => {
                // Files copied before the failure stay; show them.
                if let Err(refresh_err) = self.refresh() {
                    warn!("Refresh after failed drop: {}", refresh_err);
                }
                return Err(err);
            }
        };
        if !report.imported.is_empty() {
            self.refresh()?;
        }
        info!(
            "Drop imported {} files, skipped {}",
            report.imported.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    pub fn create_text_file(&mut self) -> Result<PathBuf> {
        let path = fs_ops::create_text_file(&self.config.root_dir)?;
        self.refresh()?;
        Ok(path)
    }

    pub fn create_folder(&mut self) -> Result<PathBuf> {
        let path = fs_ops::create_folder(&self.config.root_dir)?;
        self.refresh()?;
        Ok(path)
    }

    fn drop_stale_selection(&mut self) {
        let stale = self
            .selected
            .as_deref()
            .is_some_and(|name| !self.icons.iter().any(|i| i.display_name == name));
        if stale {
            self.selected = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::{tempdir, TempDir};

    struct Fixture {
        root: TempDir,
        conf: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                root: tempdir().unwrap(),
                conf: tempdir().unwrap(),
            }
        }

        fn config_path(&self) -> PathBuf {
            self.conf.path().join("config.txt")
        }

        fn session(&self) -> DesktopSessionState {
            let config = DesktopConfig::load(&self.config_path())
                .unwrap()
                .unwrap_or_else(|| DesktopConfig::new(self.root.path(), "/bg.png"));
            let mut session =
                DesktopSessionState::new(self.config_path(), config, AutoLayout::default());
            session.rebuild().unwrap();
            session
        }
    }

    #[test]
    fn test_rebuild_missing_root_leaves_empty_layout() {
        let fx = Fixture::new();
        let config = DesktopConfig::new(fx.root.path().join("nope"), "");
        let mut session = DesktopSessionState::new(fx.config_path(), config, AutoLayout::default());
        assert!(session.rebuild().is_err());
        assert!(session.icons().is_empty());
    }

    #[test]
    fn test_positions_survive_restart() {
        let fx = Fixture::new();
        File::create(fx.root.path().join("a.txt")).unwrap();
        File::create(fx.root.path().join("b.txt")).unwrap();

        {
            let mut session = fx.session();
            session.icon_mut("a.txt").unwrap().position = Point::new(512, 256);
            session.save_positions().unwrap();
        }

        let session = fx.session();
        assert_eq!(session.icon("a.txt").unwrap().position, Point::new(512, 256));
        let text = fs::read_to_string(fx.config_path()).unwrap();
        assert!(text.starts_with(&format!("{}\n/bg.png\n", fx.root.path().display())));
    }

    #[test]
    fn test_refresh_keeps_moved_icons_and_places_new_ones() {
        let fx = Fixture::new();
        File::create(fx.root.path().join("a.txt")).unwrap();
        let mut session = fx.session();
        assert_eq!(session.icon("a.txt").unwrap().position, Point::new(20, 20));

        session.icon_mut("a.txt").unwrap().position = Point::new(300, 300);
        let created = session.create_text_file().unwrap();

        assert_eq!(session.icons().len(), 2);
        assert_eq!(session.icon("a.txt").unwrap().position, Point::new(300, 300));
        let name = created.file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(session.icon(&name).unwrap().position, Point::new(20, 20));

        // Refresh persisted both icons.
        let saved = DesktopConfig::load(&fx.config_path()).unwrap().unwrap();
        assert_eq!(saved.positions.len(), 2);
        assert_eq!(saved.positions.get("a.txt"), Some(Point::new(300, 300)));
    }

    #[test]
    fn test_created_icon_does_not_cover_existing_one() {
        let fx = Fixture::new();
        File::create(fx.root.path().join("a.txt")).unwrap();
        let mut session = fx.session();

        let created = session.create_text_file().unwrap();
        let name = created.file_name().unwrap().to_string_lossy().into_owned();
        let existing = session.icon("a.txt").unwrap().position;
        let placed = session.icon(&name).unwrap().position;

        assert_eq!(existing, Point::new(20, 20));
        assert_eq!(placed, Point::new(20, 90));
        let (hit, _) = session.hit_test(Point::new(25, 95)).unwrap();
        assert_eq!(hit.display_name, name);
    }

    #[test]
    fn test_delete_folder_removes_from_disk_and_layout() {
        let fx = Fixture::new();
        let folder = fx.root.path().join("Stuff");
        fs::create_dir_all(folder.join("deep")).unwrap();
        File::create(folder.join("deep").join("x.txt")).unwrap();
        File::create(fx.root.path().join("keep.txt")).unwrap();

        let mut session = fx.session();
        session.select(Some("Stuff"));
        session.delete("Stuff").unwrap();

        assert!(!folder.exists());
        assert!(session.icon("Stuff").is_none());
        assert_eq!(session.icons().len(), 1);
        assert_eq!(session.selected(), None);
        let saved = DesktopConfig::load(&fx.config_path()).unwrap().unwrap();
        assert_eq!(saved.positions.get("Stuff"), None);
    }

    #[test]
    fn test_rename_noop_skips_refresh() {
        let fx = Fixture::new();
        File::create(fx.root.path().join("a.txt")).unwrap();
        let mut session = fx.session();

        assert_eq!(session.rename("a.txt", "").unwrap(), RenameOutcome::Unchanged);
        assert_eq!(
            session.rename("a.txt", "a.txt").unwrap(),
            RenameOutcome::Unchanged
        );
        // No refresh means nothing was persisted yet.
        assert!(!fx.config_path().exists());
    }

    #[test]
    fn test_rename_carries_position_and_selection() {
        let fx = Fixture::new();
        File::create(fx.root.path().join("a.txt")).unwrap();
        let mut session = fx.session();
        session.icon_mut("a.txt").unwrap().position = Point::new(640, 80);
        session.select(Some("a.txt"));

        session.rename("a.txt", "renamed.txt").unwrap();

        assert!(session.icon("a.txt").is_none());
        let icon = session.icon("renamed.txt").unwrap();
        assert_eq!(icon.position, Point::new(640, 80));
        assert_eq!(icon.path, fx.root.path().join("renamed.txt"));
        assert_eq!(session.selected(), Some("renamed.txt"));
    }

    #[test]
    fn test_failed_rename_leaves_layout_untouched() {
        let fx = Fixture::new();
        File::create(fx.root.path().join("a.txt")).unwrap();
        File::create(fx.root.path().join("b.txt")).unwrap();
        let mut session = fx.session();
        let before = session.icons().to_vec();

        assert!(session.rename("a.txt", "b.txt").is_err());
        assert_eq!(session.icons(), before.as_slice());
        assert!(!fx.config_path().exists());
    }

    #[test]
    fn test_import_twice_decorates_name() {
        let fx = Fixture::new();
        let src = tempdir().unwrap();
        let source = src.path().join("report.txt");
        fs::write(&source, "x").unwrap();
        File::create(fx.root.path().join("report.txt")).unwrap();
        let mut session = fx.session();

        let first = session.import(&source).unwrap();
        let second = session.import(&source).unwrap();
        assert_eq!(first, fx.root.path().join("report (1).txt"));
        assert_eq!(second, fx.root.path().join("report (2).txt"));
        assert!(session.icon("report (2).txt").is_some());
    }

    #[test]
    fn test_drop_without_allowed_files_does_not_refresh() {
        let fx = Fixture::new();
        let src = tempdir().unwrap();
        let exe = src.path().join("tool.exe");
        fs::write(&exe, "mz").unwrap();
        let mut session = fx.session();

        let report = session.drop_files(&[exe.clone()]).unwrap();
        assert!(report.imported.is_empty());
        assert_eq!(report.skipped, vec![exe]);
        assert!(!fx.config_path().exists());
    }

    #[test]
    fn test_background_must_decode_before_it_is_saved() {
        let fx = Fixture::new();
        let images = tempdir().unwrap();
        let broken = images.path().join("broken.png");
        fs::write(&broken, "not a png").unwrap();
        let mut session = fx.session();

        let err = session.set_background(broken).unwrap_err();
        assert_eq!(err.dialog_title(), "Image Error");
        assert_eq!(session.config().background_image, PathBuf::from("/bg.png"));
        assert!(!fx.config_path().exists());

        let good = images.path().join("good.png");
        image::RgbImage::from_pixel(2, 2, image::Rgb([0, 128, 128]))
            .save(&good)
            .unwrap();
        session.set_background(good.clone()).unwrap();
        let saved = DesktopConfig::load(&fx.config_path()).unwrap().unwrap();
        assert_eq!(saved.background_image, good);
    }

    #[test]
    fn test_select_is_exclusive() {
        let fx = Fixture::new();
        let mut session = fx.session();
        assert_eq!(session.select(Some("a")), None);
        assert_eq!(session.select(Some("a")), None);
        assert_eq!(session.select(Some("b")), Some("a".to_string()));
        assert_eq!(session.selected(), Some("b"));
        assert_eq!(session.select(None), Some("b".to_string()));
        assert_eq!(session.selected(), None);
    }

    #[test]
    fn test_hit_test_prefers_topmost() {
        let fx = Fixture::new();
        File::create(fx.root.path().join("a.txt")).unwrap();
        File::create(fx.root.path().join("b.txt")).unwrap();
        let mut session = fx.session();
        let first = session.icons()[0].display_name.clone();
        let second = session.icons()[1].display_name.clone();
        session.icon_mut(&first).unwrap().position = Point::new(100, 100);
        session.icon_mut(&second).unwrap().position = Point::new(110, 110);

        let (icon, part) = session.hit_test(Point::new(115, 115)).unwrap();
        assert_eq!(icon.display_name, second);
        assert_eq!(part, IconPart::Glyph);
        assert!(session.hit_test(Point::new(5, 5)).is_none());
    }
}
