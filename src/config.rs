//! Line-oriented desktop configuration file.
//!
//! Layout of `config.txt`:
//! - line 1: desktop root directory
//! - line 2: background image path
//! - any number of `IconPosition:<name>|<x>|<y>` lines
//!
//! Saving rewrites the whole file: the first two lines are kept and every
//! position line is replaced.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use tracing::{debug, info};

use crate::error::{DesktopError, Result};
use crate::models::PositionTable;

/// Environment variable overriding the configuration file location.
pub const CONFIG_ENV_VAR: &str = "FAUXDESK_CONFIG";
const CONFIG_FILE_NAME: &str = "config.txt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesktopConfig {
    pub root_dir: PathBuf,
    pub background_image: PathBuf,
    pub positions: PositionTable,
}

impl DesktopConfig {
    pub fn new(root_dir: impl Into<PathBuf>, background_image: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            background_image: background_image.into(),
            positions: PositionTable::new(),
        }
    }

    /// Resolves the configuration path: `$FAUXDESK_CONFIG` if set, otherwise
    /// `XDG_CONFIG_HOME/fauxdesk/config.txt`.
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR).filter(|v| !v.is_empty()) {
            return Ok(PathBuf::from(path));
        }

        let proj_dirs = ProjectDirs::from("", "", "fauxdesk").ok_or_else(|| {
            DesktopError::Config("failed to determine project directories".to_string())
        })?;

        Ok(proj_dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Loads the configuration. Returns `Ok(None)` when the file does not exist
    /// yet, so the caller can run first-time setup.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            debug!("No configuration at {:?}", path);
            return Ok(None);
        }

        let text = std::fs::read_to_string(path)
            .map_err(|e| DesktopError::io("read configuration", path, e))?;
        let config = Self::parse(&text)?;
        info!(
            "Loaded configuration from {:?} ({} saved icon positions)",
            path,
            config.positions.len()
        );
        Ok(Some(config))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text.lines();
        let root_dir = lines.next().map(str::trim).unwrap_or_default();
        if root_dir.is_empty() {
            return Err(DesktopError::RootUnset);
        }
        let background_image = lines.next().map(str::trim).unwrap_or_default();
        let positions = PositionTable::from_lines(lines);

        Ok(Self {
            root_dir: PathBuf::from(root_dir),
            background_image: PathBuf::from(background_image),
            positions,
        })
    }

    pub fn serialize(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.root_dir.to_string_lossy());
        out.push('\n');
        out.push_str(&self.background_image.to_string_lossy());
        out.push('\n');
        for line in self.positions.to_lines() {
            out.push_str(&line);
            out.push('\n');
        }
        out
    }

    /// Writes the whole file, creating the parent directory if needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| DesktopError::io("create configuration directory", parent, e))?;
        }
        std::fs::write(path, self.serialize())
            .map_err(|e| DesktopError::io("write configuration", path, e))?;
        debug!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Image to paint behind the icons: the bundled asset when present,
    /// otherwise the configured path if it exists. `None` means a flat
    /// fallback color.
    pub fn effective_background(&self, bundled: &Path) -> Option<PathBuf> {
        if bundled.is_file() {
            return Some(bundled.to_path_buf());
        }
        if !self.background_image.as_os_str().is_empty() && self.background_image.is_file() {
            return Some(self.background_image.clone());
        }
        None
    }

    /// Fails with a configuration error unless the root is an existing directory.
    pub fn validate_root(&self) -> Result<()> {
        if self.root_dir.as_os_str().is_empty() {
            return Err(DesktopError::RootUnset);
        }
        if !self.root_dir.is_dir() {
            return Err(DesktopError::RootMissing(self.root_dir.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Point;
    use tempfile::tempdir;

    #[test]
    fn test_parse_full_file() {
        let text = "/home/me/Desktop\n/home/me/bg.png\nIconPosition:a.txt|20|20\nIconPosition:Stuff|100|90\n";
        let config = DesktopConfig::parse(text).unwrap();
        assert_eq!(config.root_dir, PathBuf::from("/home/me/Desktop"));
        assert_eq!(config.background_image, PathBuf::from("/home/me/bg.png"));
        assert_eq!(config.positions.get("a.txt"), Some(Point::new(20, 20)));
        assert_eq!(config.positions.get("Stuff"), Some(Point::new(100, 90)));
    }

    #[test]
    fn test_parse_rejects_missing_root() {
        assert!(matches!(
            DesktopConfig::parse(""),
            Err(DesktopError::RootUnset)
        ));
        assert!(matches!(
            DesktopConfig::parse("   \n/bg.png\n"),
            Err(DesktopError::RootUnset)
        ));
    }

    #[test]
    fn test_parse_root_only() {
        let config = DesktopConfig::parse("/desk").unwrap();
        assert_eq!(config.background_image, PathBuf::new());
        assert!(config.positions.is_empty());
    }

    #[test]
    fn test_save_replaces_positions_keeps_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.txt");

        let mut config = DesktopConfig::new("/desk", "/bg.png");
        config.positions.insert("old.txt", Point::new(1, 2));
        config.save(&path).unwrap();

        config.positions = PositionTable::new();
        config.positions.insert("new.txt", Point::new(3, 4));
        config.save(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["/desk", "/bg.png", "IconPosition:new.txt|3|4"]);
    }

    #[test]
    fn test_load_missing_file_is_none() {
        let dir = tempdir().unwrap();
        let loaded = DesktopConfig::load(&dir.path().join("config.txt")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.txt");
        let mut config = DesktopConfig::new(dir.path(), "/bg.png");
        config.positions.insert("x", Point::new(180, 300));
        config.positions.insert("line1\nline2.txt", Point::new(300, 400));
        config.save(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 4);
        let loaded = DesktopConfig::load(&path).unwrap().unwrap();
        assert_eq!(loaded, config);
        assert_eq!(
            loaded.positions.get("line1\nline2.txt"),
            Some(Point::new(300, 400))
        );
    }

    #[test]
    fn test_validate_root() {
        let dir = tempdir().unwrap();
        assert!(DesktopConfig::new(dir.path(), "").validate_root().is_ok());
        assert!(matches!(
            DesktopConfig::new(dir.path().join("gone"), "").validate_root(),
            Err(DesktopError::RootMissing(_))
        ));
        assert!(matches!(
            DesktopConfig::new("", "").validate_root(),
            Err(DesktopError::RootUnset)
        ));
    }

    #[test]
    fn test_effective_background_prefers_bundled_asset() {
        let dir = tempdir().unwrap();
        let bundled = dir.path().join("bundled.png");
        let configured = dir.path().join("mine.png");
        std::fs::write(&configured, b"png").unwrap();
        let config = DesktopConfig::new(dir.path(), &configured);

        assert_eq!(config.effective_background(&bundled), Some(configured.clone()));
        std::fs::write(&bundled, b"png").unwrap();
        assert_eq!(config.effective_background(&bundled), Some(bundled));

        let missing = DesktopConfig::new(dir.path(), dir.path().join("gone.png"));
        assert_eq!(missing.effective_background(&dir.path().join("none.png")), None);
    }
}
