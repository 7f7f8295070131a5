// Minimal text editor. Also the fallback for files nothing else can open.

use gtk4::prelude::*;
use gtk4::{
    glib, Application, Box as GtkBox, Button, Orientation, PolicyType, ScrolledWindow, TextView,
    Window, WrapMode,
};
use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

use super::dialogs::{self, SaveChoice, TEXT_FILES};
use crate::error::{DesktopError, Result};

const UNTITLED: &str = "Untitled";

/// Title bar text: file name (or "Untitled"), starred when modified.
pub fn window_title(path: Option<&Path>, modified: bool) -> String {
    let name = path
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| UNTITLED.to_string());
    let star = if modified { "*" } else { "" };
    format!("{star}{name} - Notepad")
}

pub fn read_text(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| DesktopError::io("open", path, e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub fn write_text(path: &Path, text: &str) -> Result<()> {
    std::fs::write(path, text).map_err(|e| DesktopError::io("save", path, e))
}

pub struct Notepad {
    self_weak: RefCell<Weak<Notepad>>,
    window: Window,
    text_view: TextView,
    path: RefCell<Option<PathBuf>>,
    modified: Cell<bool>,
    // Set while the buffer is filled programmatically.
    loading: Cell<bool>,
}

impl Notepad {
    /// Opens a new notepad window, optionally loading `path`.
    pub fn open(app: &Application, path: Option<&Path>) -> Rc<Self> {
        let window = Window::builder()
            .application(app)
            .default_width(640)
            .default_height(480)
            .build();

        let toolbar = GtkBox::new(Orientation::Horizontal, 6);
        toolbar.add_css_class("app-toolbar");
        toolbar.set_margin_top(4);
        toolbar.set_margin_bottom(4);
        toolbar.set_margin_start(4);
        toolbar.set_margin_end(4);

        let text_view = TextView::new();
        text_view.set_monospace(true);
        text_view.set_wrap_mode(WrapMode::WordChar);
        text_view.set_vexpand(true);
        let scroller = ScrolledWindow::builder()
            .hscrollbar_policy(PolicyType::Never)
            .vscrollbar_policy(PolicyType::Automatic)
            .child(&text_view)
            .build();

        let layout = GtkBox::new(Orientation::Vertical, 0);
        layout.append(&toolbar);
        layout.append(&scroller);
        window.set_child(Some(&layout));

        let notepad = Rc::new(Self {
            self_weak: RefCell::new(Weak::new()),
            window,
            text_view,
            path: RefCell::new(None),
            modified: Cell::new(false),
            loading: Cell::new(false),
        });
        *notepad.self_weak.borrow_mut() = Rc::downgrade(&notepad);

        for (label, action) in [
            ("New", Self::on_new as fn(&Self)),
            ("Open", Self::on_open),
            ("Save", Self::on_save),
            ("Save As", Self::on_save_as),
        ] {
            let button = Button::with_label(label);
            let notepad_weak = Rc::downgrade(&notepad);
            button.connect_clicked(move |_| {
                if let Some(notepad) = notepad_weak.upgrade() {
                    action(&notepad);
                }
            });
            toolbar.append(&button);
        }

        let notepad_weak = Rc::downgrade(&notepad);
        notepad.text_view.buffer().connect_changed(move |_| {
            if let Some(notepad) = notepad_weak.upgrade() {
                if !notepad.loading.get() {
                    notepad.set_modified(true);
                }
            }
        });

        if let Some(path) = path {
            notepad.load(path);
        }
        notepad.update_title();
        notepad.window.present();

        // The window keeps the editor alive until it is closed.
        unsafe {
            notepad.window.set_data("notepad", notepad.clone());
        }
        notepad.window.connect_close_request(|window| {
            unsafe {
                let _ = window.steal_data::<Rc<Notepad>>("notepad");
            }
            glib::Propagation::Proceed
        });
        notepad
    }

    fn text(&self) -> String {
        let buffer = self.text_view.buffer();
        buffer
            .text(&buffer.start_iter(), &buffer.end_iter(), false)
            .to_string()
    }

    fn set_text(&self, text: &str) {
        self.loading.set(true);
        self.text_view.buffer().set_text(text);
        self.loading.set(false);
    }

    fn set_modified(&self, modified: bool) {
        if self.modified.replace(modified) != modified {
            self.update_title();
        }
    }

    fn update_title(&self) {
        let title = window_title(self.path.borrow().as_deref(), self.modified.get());
        self.window.set_title(Some(&title));
    }

    fn show_error(&self, err: &DesktopError) {
        dialogs::show_error(Some(&self.window), err);
    }

    pub fn load(&self, path: &Path) {
        match read_text(path) {
            Ok(text) => {
                self.set_text(&text);
                *self.path.borrow_mut() = Some(path.to_path_buf());
                self.set_modified(false);
                self.update_title();
                tracing::info!("Notepad opened {:?}", path);
            }
            Err(err) => self.show_error(&err),
        }
    }

    fn save_to(&self, path: &Path) -> bool {
        match write_text(path, &self.text()) {
            Ok(()) => {
                *self.path.borrow_mut() = Some(path.to_path_buf());
                self.set_modified(false);
                self.update_title();
                true
            }
            Err(err) => {
                self.show_error(&err);
                false
            }
        }
    }

    fn clear(&self) {
        self.set_text("");
        *self.path.borrow_mut() = None;
        self.set_modified(false);
        self.update_title();
    }

    fn on_new(&self) {
        if !self.modified.get() || self.text().is_empty() {
            self.clear();
            return;
        }

        let notepad_weak = self.self_weak.borrow().clone();
        dialogs::ask_save_changes(
            Some(&self.window),
            "Do you want to save changes to the current document?",
            move |choice| {
                let Some(notepad) = notepad_weak.upgrade() else {
                    return;
                };
                match choice {
                    SaveChoice::Save => {
                        let path = notepad.path.borrow().clone();
                        match path {
                            Some(path) => {
                                if notepad.save_to(&path) {
                                    notepad.clear();
                                }
                            }
                            // Clearing waits for a path; an untitled buffer is
                            // only cleared once it has been saved somewhere.
                            None => notepad.save_as_then(true),
                        }
                    }
                    SaveChoice::Discard => notepad.clear(),
                    SaveChoice::Cancel => {}
                }
            },
        );
    }

    fn on_open(&self) {
        let notepad_weak = self.self_weak.borrow().clone();
        dialogs::choose_file(Some(&self.window), "Open", Some(TEXT_FILES), move |path| {
            if let Some(notepad) = notepad_weak.upgrade() {
                notepad.load(&path);
            }
        });
    }

    fn on_save(&self) {
        let path = self.path.borrow().clone();
        match path {
            Some(path) => {
                self.save_to(&path);
            }
            None => self.save_as_then(false),
        }
    }

    fn on_save_as(&self) {
        self.save_as_then(false);
    }

    fn save_as_then(&self, clear_after: bool) {
        let initial = self
            .path
            .borrow()
            .as_deref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{UNTITLED}.txt"));
        let notepad_weak = self.self_weak.borrow().clone();
        dialogs::choose_save_file(
            Some(&self.window),
            "Save As",
            Some(TEXT_FILES),
            &initial,
            move |path| {
                if let Some(notepad) = notepad_weak.upgrade() {
                    if notepad.save_to(&path) && clear_after {
                        notepad.clear();
                    }
                }
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_window_title() {
        assert_eq!(window_title(None, false), "Untitled - Notepad");
        assert_eq!(
            window_title(Some(Path::new("/d/notes.txt")), true),
            "*notes.txt - Notepad"
        );
    }

    #[test]
    fn test_read_write_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.txt");
        write_text(&path, "hello\nworld").unwrap();
        assert_eq!(read_text(&path).unwrap(), "hello\nworld");

        let err = read_text(&dir.path().join("missing.txt")).unwrap_err();
        assert_eq!(err.dialog_title(), "File Error");
    }
}
