//! Hand-off of desktop icons to the host: file manager, default applications,
//! and the bundled notepad as a last resort.

use std::path::Path;

use gio::prelude::*;
use tracing::{debug, info, warn};

use crate::error::{DesktopError, Result};
use crate::models::IconEntry;

/// The host's application launcher.
pub trait Launcher {
    /// Shows a folder in the system file manager.
    fn open_folder(&self, path: &Path) -> Result<()>;
    /// Opens a file with its associated application. Returns
    /// [`DesktopError::NoAssociation`] when nothing handles the file type.
    fn open_file(&self, path: &Path) -> Result<()>;
    /// Opens a file in the bundled text editor.
    fn open_in_editor(&self, path: &Path) -> Result<()>;
}

/// How an icon ended up being opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenedWith {
    FileManager,
    DefaultApplication,
    TextEditor,
}

/// Opens a desktop icon: folders in the file manager, files with their
/// associated program, falling back to the text editor when no association
/// exists.
pub fn open_entry(entry: &IconEntry, launcher: &dyn Launcher) -> Result<OpenedWith> {
    if entry.is_folder || entry.path.is_dir() {
        launcher.open_folder(&entry.path)?;
        return Ok(OpenedWith::FileManager);
    }

    match launcher.open_file(&entry.path) {
        Ok(()) => Ok(OpenedWith::DefaultApplication),
        Err(DesktopError::NoAssociation(_)) => {
            info!(
                "No association for {:?}; opening in text editor",
                entry.display_name
            );
            launcher.open_in_editor(&entry.path)?;
            Ok(OpenedWith::TextEditor)
        }
        Err(err) => Err(err),
    }
}

/// Desktop file ids of common calculators, most preferred first.
pub const CALCULATOR_APP_IDS: &[&str] = &[
    "org.gnome.Calculator.desktop",
    "gnome-calculator.desktop",
    "org.kde.kcalc.desktop",
    "mate-calc.desktop",
    "galculator.desktop",
    "qalculate-gtk.desktop",
    "org.xfce.Galculator.desktop",
];

/// The most preferred calculator among the installed application ids.
pub fn pick_calculator<'a>(installed: &[&'a str]) -> Option<&'a str> {
    CALCULATOR_APP_IDS
        .iter()
        .find_map(|wanted| installed.iter().find(|id| *id == wanted).copied())
}

/// Starts the host's calculator.
pub fn launch_calculator() -> Result<()> {
    let apps = gio::AppInfo::all();
    let ids: Vec<glib::GString> = apps.iter().filter_map(|app| app.id()).collect();
    let id_refs: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
    let chosen = pick_calculator(&id_refs).ok_or(DesktopError::AppMissing("calculator"))?;

    let app = apps
        .iter()
        .find(|app| app.id().as_deref() == Some(chosen))
        .ok_or(DesktopError::AppMissing("calculator"))?;
    info!("Launching calculator {}", chosen);
    app.launch(&[], None::<&gio::AppLaunchContext>)
        .map_err(|e| DesktopError::Launch {
            path: chosen.into(),
            message: e.to_string(),
        })
}

/// [`Launcher`] backed by GIO. The editor fallback is supplied by the UI.
pub struct GioLauncher<F: Fn(&Path)> {
    open_editor: F,
}

impl<F: Fn(&Path)> GioLauncher<F> {
    pub fn new(open_editor: F) -> Self {
        Self { open_editor }
    }

    fn launch_uri(path: &Path) -> std::result::Result<(), glib::Error> {
        let uri = gio::File::for_path(path).uri();
        debug!("Launching {}", uri);
        gio::AppInfo::launch_default_for_uri(&uri, None::<&gio::AppLaunchContext>)
    }
}

impl<F: Fn(&Path)> Launcher for GioLauncher<F> {
    fn open_folder(&self, path: &Path) -> Result<()> {
        Self::launch_uri(path).map_err(|e| DesktopError::Launch {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn open_file(&self, path: &Path) -> Result<()> {
        let (content_type, _uncertain) = gio::content_type_guess(Some(path), &[]);
        if gio::AppInfo::default_for_type(&content_type, false).is_none() {
            return Err(DesktopError::NoAssociation(path.to_path_buf()));
        }
        Self::launch_uri(path).map_err(|e| {
            if e.matches(gio::IOErrorEnum::NotSupported) {
                DesktopError::NoAssociation(path.to_path_buf())
            } else {
                warn!(error = %e, "Launch failed for {:?}", path);
                DesktopError::Launch {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                }
            }
        })
    }

    fn open_in_editor(&self, path: &Path) -> Result<()> {
        (self.open_editor)(path);
        Ok(())
    }
}
