//! File system mutations behind the desktop's menu actions and drops.
//!
//! Every function here is synchronous and either completes or returns the
//! first error; nothing is retried.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{DesktopError, Result};

/// Extensions accepted from a drag-and-drop payload (lower case, no dot).
pub const DROP_ALLOWED_EXTENSIONS: &[&str] = &[
    "txt", "md", "log", "csv", "json", "pdf", "doc", "docx", "rtf", "png", "jpg", "jpeg", "bmp",
    "gif", "webp", "mp3", "wav", "mp4", "zip",
];

pub const NEW_TEXT_FILE_NAME: &str = "New Text File.txt";
pub const NEW_FOLDER_NAME: &str = "New Folder";

/// Outcome of a rename request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameOutcome {
    /// Empty or unchanged name; nothing touched.
    Unchanged,
    Renamed { from: PathBuf, to: PathBuf },
}

/// Files copied and skipped by a drop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DropReport {
    pub imported: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
}

/// Returns `dir/file_name`, or the first free `"<base> (<n>)<ext>"` variant
/// with `n` counting from 1.
pub fn unique_destination(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let (base, ext) = split_name(file_name);
    (1u32..)
        .map(|n| dir.join(format!("{} ({}){}", base, n, ext)))
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

/// Splits `"report.final.txt"` into `("report.final", ".txt")`. Dot-files and
/// names without a dot have an empty extension.
fn split_name(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => file_name.split_at(idx),
        _ => (file_name, ""),
    }
}

pub fn is_drop_allowed(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .is_some_and(|e| DROP_ALLOWED_EXTENSIONS.contains(&e.as_str()))
}

/// Copies `source` into `root`, renaming on collision.
pub fn import_file(source: &Path, root: &Path) -> Result<PathBuf> {
    let file_name = source.file_name().ok_or_else(|| {
        DesktopError::io(
            "import",
            source,
            io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
        )
    })?;
    if !source.is_file() {
        return Err(DesktopError::io(
            "import",
            source,
            io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
        ));
    }

    let dest = unique_destination(root, &file_name.to_string_lossy());
    std::fs::copy(source, &dest).map_err(|e| DesktopError::io("import", source, e))?;
    info!("Imported {:?} as {:?}", source, dest);
    Ok(dest)
}

/// Imports the allow-listed files of a drop payload. Folders and other
/// extensions are skipped. Stops at the first copy failure.
pub fn import_dropped(files: &[PathBuf], root: &Path) -> Result<DropReport> {
    let mut report = DropReport::default();
    for file in files {
        if file.is_dir() || !is_drop_allowed(file) {
            debug!("Drop skipped {:?}", file);
            report.skipped.push(file.clone());
            continue;
        }
        report.imported.push(import_file(file, root)?);
    }
    Ok(report)
}

/// Deletes a file, or a folder with everything inside it.
pub fn delete_entry(path: &Path) -> Result<()> {
    let result = if path.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };
    result.map_err(|e| DesktopError::io("delete", path, e))?;
    info!("Deleted {:?}", path);
    Ok(())
}

/// Number of files and folders below `path`, for the delete confirmation.
pub fn count_contents(path: &Path) -> usize {
    if !path.is_dir() {
        return 0;
    }
    WalkDir::new(path)
        .min_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .count()
}

/// Renames `path` within its parent. Empty (after trimming) or unchanged
/// names do nothing. The new name is not validated here; whatever the file
/// system rejects comes back as an error.
pub fn rename_entry(path: &Path, new_name: &str) -> Result<RenameOutcome> {
    let new_name = new_name.trim();
    let current = path.file_name().map(|n| n.to_string_lossy());
    if new_name.is_empty() || current.as_deref() == Some(new_name) {
        return Ok(RenameOutcome::Unchanged);
    }

    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    let dest = parent.join(new_name);
    // rename(2) silently replaces files; refuse instead.
    if dest.exists() {
        return Err(DesktopError::io(
            "rename",
            path,
            io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", dest.display()),
            ),
        ));
    }

    std::fs::rename(path, &dest).map_err(|e| DesktopError::io("rename", path, e))?;
    info!("Renamed {:?} -> {:?}", path, dest);
    Ok(RenameOutcome::Renamed {
        from: path.to_path_buf(),
        to: dest,
    })
}

pub fn create_text_file(root: &Path) -> Result<PathBuf> {
    let path = unique_destination(root, NEW_TEXT_FILE_NAME);
    std::fs::write(&path, "").map_err(|e| DesktopError::io("create", &path, e))?;
    info!("Created {:?}", path);
    Ok(path)
}

pub fn create_folder(root: &Path) -> Result<PathBuf> {
    let path = unique_destination(root, NEW_FOLDER_NAME);
    std::fs::create_dir(&path).map_err(|e| DesktopError::io("create", &path, e))?;
    info!("Created {:?}", path);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::tempdir;

    #[test]
    fn test_split_name() {
        assert_eq!(split_name("a.txt"), ("a", ".txt"));
        assert_eq!(split_name("a.tar.gz"), ("a.tar", ".gz"));
        assert_eq!(split_name("README"), ("README", ""));
        assert_eq!(split_name(".bashrc"), (".bashrc", ""));
    }

    #[test]
    fn test_import_collision_numbering() {
        let src_dir = tempdir().unwrap();
        let root = tempdir().unwrap();
        let source = src_dir.path().join("photo.png");
        fs::write(&source, b"png").unwrap();

        let first = import_file(&source, root.path()).unwrap();
        let second = import_file(&source, root.path()).unwrap();
        let third = import_file(&source, root.path()).unwrap();

        assert_eq!(first, root.path().join("photo.png"));
        assert_eq!(second, root.path().join("photo (1).png"));
        assert_eq!(third, root.path().join("photo (2).png"));
        assert_eq!(fs::read(&third).unwrap(), b"png");
    }

    #[test]
    fn test_import_rejects_directory() {
        let src_dir = tempdir().unwrap();
        let root = tempdir().unwrap();
        let result = import_file(src_dir.path(), root.path());
        assert!(matches!(result, Err(DesktopError::Io { .. })));
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_drop_filters_by_extension() {
        let src_dir = tempdir().unwrap();
        let root = tempdir().unwrap();
        let ok = src_dir.path().join("Notes.TXT");
        let bad = src_dir.path().join("setup.exe");
        let folder = src_dir.path().join("folder.txt");
        fs::write(&ok, "hi").unwrap();
        fs::write(&bad, "mz").unwrap();
        fs::create_dir(&folder).unwrap();

        let report =
            import_dropped(&[ok.clone(), bad.clone(), folder.clone()], root.path()).unwrap();

        assert_eq!(report.imported, vec![root.path().join("Notes.TXT")]);
        assert_eq!(report.skipped, vec![bad, folder]);
    }

    #[test]
    fn test_delete_folder_recursively() {
        let root = tempdir().unwrap();
        let folder = root.path().join("Stuff");
        fs::create_dir_all(folder.join("inner")).unwrap();
        File::create(folder.join("inner").join("a.txt")).unwrap();
        File::create(folder.join("b.txt")).unwrap();

        assert_eq!(count_contents(&folder), 3);
        delete_entry(&folder).unwrap();
        assert!(!folder.exists());
    }

    #[test]
    fn test_delete_missing_is_io_error() {
        let root = tempdir().unwrap();
        let result = delete_entry(&root.path().join("ghost.txt"));
        assert!(matches!(result, Err(DesktopError::Io { action: "delete", .. })));
    }

    #[test]
    fn test_rename_noops() {
        let root = tempdir().unwrap();
        let file = root.path().join("a.txt");
        File::create(&file).unwrap();

        assert_eq!(rename_entry(&file, "").unwrap(), RenameOutcome::Unchanged);
        assert_eq!(rename_entry(&file, "   ").unwrap(), RenameOutcome::Unchanged);
        assert_eq!(rename_entry(&file, "a.txt").unwrap(), RenameOutcome::Unchanged);
        assert!(file.exists());
    }

    #[test]
    fn test_rename_moves_and_refuses_overwrite() {
        let root = tempdir().unwrap();
        let a = root.path().join("a.txt");
        let b = root.path().join("b.txt");
        fs::write(&a, "a").unwrap();
        fs::write(&b, "b").unwrap();

        assert!(rename_entry(&a, "b.txt").is_err());
        assert_eq!(fs::read_to_string(&b).unwrap(), "b");

        let outcome = rename_entry(&a, "c.txt").unwrap();
        assert_eq!(
            outcome,
            RenameOutcome::Renamed {
                from: a.clone(),
                to: root.path().join("c.txt"),
            }
        );
        assert!(!a.exists());
    }

    #[test]
    fn test_create_new_items_numbered() {
        let root = tempdir().unwrap();
        assert_eq!(
            create_text_file(root.path()).unwrap(),
            root.path().join("New Text File.txt")
        );
        assert_eq!(
            create_text_file(root.path()).unwrap(),
            root.path().join("New Text File (1).txt")
        );
        assert_eq!(
            create_folder(root.path()).unwrap(),
            root.path().join("New Folder")
        );
        assert_eq!(
            create_folder(root.path()).unwrap(),
            root.path().join("New Folder (1)")
        );
    }
}
