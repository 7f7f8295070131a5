use std::path::PathBuf;

/// Errors surfaced by desktop operations.
///
/// Configuration errors end the session; everything else is reported to the
/// user and leaves the on-screen layout as it was.
#[derive(Debug, thiserror::Error)]
pub enum DesktopError {
    #[error("Desktop directory is not configured")]
    RootUnset,

    #[error("Desktop directory not found: {}", .0.display())]
    RootMissing(PathBuf),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot load image {}: {message}", path.display())]
    Image { path: PathBuf, message: String },

    #[error("No application is associated with {}", .0.display())]
    NoAssociation(PathBuf),

    #[error("No {0} application is installed")]
    AppMissing(&'static str),

    #[error("Failed to launch {}: {message}", path.display())]
    Launch { path: PathBuf, message: String },
}

impl DesktopError {
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }

    /// Configuration errors are fatal to the desktop session.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::RootUnset | Self::RootMissing(_))
    }

    /// Title used for the user-facing error dialog.
    pub fn dialog_title(&self) -> &'static str {
        match self {
            Self::RootUnset | Self::RootMissing(_) | Self::Config(_) => "Configuration Error",
            Self::Io { action, .. } => match *action {
                "delete" => "Delete Error",
                "rename" => "Rename Error",
                "import" | "copy" => "Import Error",
                "create" => "Creation Error",
                _ => "File Error",
            },
            Self::Image { .. } => "Image Error",
            Self::NoAssociation(_) | Self::AppMissing(_) | Self::Launch { .. } => "Launch Error",
        }
    }
}

pub type Result<T> = std::result::Result<T, DesktopError>;
