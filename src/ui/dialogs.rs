// Modal dialogs for the desktop: messages, confirmations, text prompts and
// first-run setup. All dialogs share one shell layout.

use gtk4::prelude::*;
use gtk4::{gio, glib, Align, Box as GtkBox, Button, Entry, Label, Orientation, Window};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use crate::config::DesktopConfig;
use crate::error::DesktopError;

const DIALOG_MARGIN: i32 = 12;

pub struct DialogShell {
    pub dialog: Window,
    pub content: GtkBox,
    pub actions: GtkBox,
}

/// Builds an empty modal dialog with a content area and a right-aligned
/// action row.
pub fn build_dialog_shell(parent: Option<&Window>, title: &str, width: i32) -> DialogShell {
    let dialog = Window::builder()
        .title(title)
        .modal(true)
        .resizable(false)
        .default_width(width)
        .build();
    if let Some(parent) = parent {
        dialog.set_transient_for(Some(parent));
    }

    let content = GtkBox::new(Orientation::Vertical, 12);
    content.set_margin_top(DIALOG_MARGIN);
    content.set_margin_bottom(DIALOG_MARGIN);
    content.set_margin_start(DIALOG_MARGIN);
    content.set_margin_end(DIALOG_MARGIN);

    let actions = GtkBox::new(Orientation::Horizontal, 8);
    actions.set_halign(Align::End);

    let outer = GtkBox::new(Orientation::Vertical, 12);
    outer.append(&content);
    outer.append(&actions);
    outer.set_margin_bottom(DIALOG_MARGIN);
    outer.set_margin_end(DIALOG_MARGIN);
    dialog.set_child(Some(&outer));

    DialogShell {
        dialog,
        content,
        actions,
    }
}

/// Wraps a one-shot callback so several signal handlers can share it; only
/// the first call runs it.
fn once<F: FnOnce() + 'static>(f: F) -> Rc<dyn Fn()> {
    let slot = RefCell::new(Some(f));
    Rc::new(move || {
        if let Some(f) = slot.borrow_mut().take() {
            f();
        }
    })
}

fn message_label(text: &str) -> Label {
    let label = Label::new(Some(text));
    label.set_wrap(true);
    label.set_max_width_chars(60);
    label.set_halign(Align::Start);
    label.set_xalign(0.0);
    label
}

/// Shows a message with an OK button. `on_close` runs once the dialog is
/// dismissed by any means.
pub fn show_message<F>(parent: Option<&Window>, title: &str, message: &str, on_close: F)
where
    F: FnOnce() + 'static,
{
    let shell = build_dialog_shell(parent, title, 380);
    shell.content.append(&message_label(message));

    let ok_button = Button::with_label("OK");
    shell.actions.append(&ok_button);

    let on_close = once(on_close);
    let dialog = shell.dialog.clone();
    ok_button.connect_clicked(move |_| {
        dialog.close();
    });
    shell.dialog.connect_close_request(move |_| {
        on_close();
        glib::Propagation::Proceed
    });

    shell.dialog.set_default_widget(Some(&ok_button));
    shell.dialog.present();
}

/// Reports a failed desktop operation.
pub fn show_error(parent: Option<&Window>, err: &DesktopError) {
    tracing::warn!(error = %err, "Desktop operation failed");
    show_message(parent, err.dialog_title(), &err.to_string(), || {});
}

/// Yes/No question. `on_yes` runs only when the user confirms.
pub fn confirm<F>(parent: Option<&Window>, title: &str, message: &str, on_yes: F)
where
    F: FnOnce() + 'static,
{
    let shell = build_dialog_shell(parent, title, 380);
    shell.content.append(&message_label(message));

    let no_button = Button::with_label("No");
    let yes_button = Button::with_label("Yes");
    shell.actions.append(&no_button);
    shell.actions.append(&yes_button);

    let on_yes = once(on_yes);
    let dialog = shell.dialog.clone();
    yes_button.connect_clicked(move |_| {
        on_yes();
        dialog.close();
    });
    let dialog = shell.dialog.clone();
    no_button.connect_clicked(move |_| {
        dialog.close();
    });

    shell.dialog.set_default_widget(Some(&no_button));
    shell.dialog.present();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveChoice {
    Save,
    Discard,
    Cancel,
}

/// Yes/No/Cancel question about unsaved changes. Closing the dialog counts
/// as Cancel.
pub fn ask_save_changes<F>(parent: Option<&Window>, message: &str, on_choice: F)
where
    F: Fn(SaveChoice) + 'static,
{
    let shell = build_dialog_shell(parent, "Save Changes", 380);
    shell.content.append(&message_label(message));

    let choice = Rc::new(std::cell::Cell::new(SaveChoice::Cancel));
    for (label, value) in [
        ("Cancel", SaveChoice::Cancel),
        ("No", SaveChoice::Discard),
        ("Yes", SaveChoice::Save),
    ] {
        let button = Button::with_label(label);
        let dialog = shell.dialog.clone();
        let choice = choice.clone();
        button.connect_clicked(move |_| {
            choice.set(value);
            dialog.close();
        });
        shell.actions.append(&button);
    }

    shell.dialog.connect_close_request(move |_| {
        on_choice(choice.get());
        glib::Propagation::Proceed
    });
    shell.dialog.present();
}

/// Single-line text prompt. `on_submit` receives the entry text as typed.
pub fn prompt_text<F>(parent: Option<&Window>, title: &str, label: &str, initial: &str, on_submit: F)
where
    F: Fn(String) + 'static,
{
    let shell = build_dialog_shell(parent, title, 360);
    shell.content.append(&message_label(label));

    let entry = Entry::new();
    entry.set_hexpand(true);
    entry.set_text(initial);
    shell.content.append(&entry);

    let cancel_button = Button::with_label("Cancel");
    let ok_button = Button::with_label("OK");
    shell.actions.append(&cancel_button);
    shell.actions.append(&ok_button);

    let dialog = shell.dialog.clone();
    let entry_for_submit = entry.clone();
    let submit = Rc::new(move || {
        let text = entry_for_submit.text().to_string();
        dialog.close();
        on_submit(text);
    });

    let submit_for_button = submit.clone();
    ok_button.connect_clicked(move |_| submit_for_button());
    let submit_for_entry = submit.clone();
    entry.connect_activate(move |_| submit_for_entry());

    let dialog = shell.dialog.clone();
    cancel_button.connect_clicked(move |_| {
        dialog.close();
    });

    // Preselect the base name so typing replaces it but keeps the extension.
    let base_len = match initial.rfind('.') {
        Some(idx) if idx > 0 => initial[..idx].chars().count() as i32,
        _ => -1,
    };
    shell.dialog.present();
    entry.grab_focus();
    entry.select_region(0, base_len);
}

/// A named set of file name patterns for file choosers.
#[derive(Debug, Clone, Copy)]
pub struct FileKinds {
    pub name: &'static str,
    pub patterns: &'static [&'static str],
}

pub const IMAGE_FILES: FileKinds = FileKinds {
    name: "Image files",
    patterns: &["*.jpg", "*.jpeg", "*.png", "*.bmp", "*.gif", "*.webp"],
};

pub const TEXT_FILES: FileKinds = FileKinds {
    name: "Text files",
    patterns: &["*.txt"],
};

fn file_dialog(title: &str, kinds: Option<FileKinds>) -> gtk4::FileDialog {
    let dialog = gtk4::FileDialog::builder().title(title).modal(true).build();
    if let Some(kinds) = kinds {
        let filter = gtk4::FileFilter::new();
        filter.set_name(Some(kinds.name));
        for pattern in kinds.patterns {
            filter.add_pattern(pattern);
        }
        let all = gtk4::FileFilter::new();
        all.set_name(Some("All files"));
        all.add_pattern("*");

        let filters = gio::ListStore::new::<gtk4::FileFilter>();
        filters.append(&filter);
        filters.append(&all);
        dialog.set_filters(Some(&filters));
        dialog.set_default_filter(Some(&filter));
    }
    dialog
}

fn log_chooser_error(err: &glib::Error) {
    if !err.matches(gtk4::DialogError::Dismissed) {
        tracing::warn!(error = %err, "File chooser failed");
    }
}

/// Runs an open-file chooser and passes the chosen path on.
pub fn choose_file<F>(parent: Option<&Window>, title: &str, kinds: Option<FileKinds>, on_chosen: F)
where
    F: Fn(PathBuf) + 'static,
{
    let dialog = file_dialog(title, kinds);
    dialog.open(parent, None::<&gio::Cancellable>, move |result| match result {
        Ok(file) => {
            if let Some(path) = file.path() {
                on_chosen(path);
            }
        }
        Err(err) => log_chooser_error(&err),
    });
}

/// Runs a save-file chooser and passes the chosen path on.
pub fn choose_save_file<F>(
    parent: Option<&Window>,
    title: &str,
    kinds: Option<FileKinds>,
    initial_name: &str,
    on_chosen: F,
) where
    F: Fn(PathBuf) + 'static,
{
    let dialog = file_dialog(title, kinds);
    dialog.set_initial_name(Some(initial_name));
    dialog.save(parent, None::<&gio::Cancellable>, move |result| match result {
        Ok(file) => {
            if let Some(path) = file.path() {
                on_chosen(path);
            }
        }
        Err(err) => log_chooser_error(&err),
    });
}

/// Runs a folder chooser and passes the chosen path on.
pub fn choose_folder<F>(parent: Option<&Window>, title: &str, on_chosen: F)
where
    F: Fn(PathBuf) + 'static,
{
    let dialog = gtk4::FileDialog::builder().title(title).modal(true).build();
    dialog.select_folder(parent, None::<&gio::Cancellable>, move |result| match result {
        Ok(folder) => {
            if let Some(path) = folder.path() {
                on_chosen(path);
            }
        }
        Err(err) => log_chooser_error(&err),
    });
}

/// First-run setup: asks for the desktop directory and background image.
/// `on_done` receives the new configuration, or `None` when the user closed
/// the dialog without saving.
pub fn run_setup<F>(app: &gtk4::Application, on_done: F)
where
    F: FnOnce(Option<DesktopConfig>) + 'static,
{
    let shell = build_dialog_shell(None, "Initial Configuration", 420);
    shell.dialog.set_application(Some(app));

    let desktop_entry = Entry::new();
    desktop_entry.set_hexpand(true);
    desktop_entry.set_placeholder_text(Some("/path/to/desktop/folder"));
    let background_entry = Entry::new();
    background_entry.set_hexpand(true);
    background_entry.set_placeholder_text(Some("/path/to/background.png"));

    let dialog_window = shell.dialog.clone();
    shell.content.append(&message_label("Desktop Path:"));
    shell.content.append(&path_row(&desktop_entry, {
        let parent = dialog_window.clone();
        let entry = desktop_entry.clone();
        move || {
            let entry = entry.clone();
            choose_folder(Some(&parent), "Desktop Folder", move |path| {
                entry.set_text(&path.to_string_lossy());
            });
        }
    }));
    shell.content.append(&message_label("Background Image Path:"));
    shell.content.append(&path_row(&background_entry, {
        let parent = dialog_window.clone();
        let entry = background_entry.clone();
        move || {
            let entry = entry.clone();
            choose_file(Some(&parent), "Background Image", Some(IMAGE_FILES), move |path| {
                entry.set_text(&path.to_string_lossy());
            });
        }
    }));

    let error_label = message_label("");
    error_label.add_css_class("error");
    error_label.set_visible(false);
    shell.content.append(&error_label);

    let save_button = Button::with_label("Save Configuration");
    shell.actions.append(&save_button);

    let result: Rc<RefCell<Option<DesktopConfig>>> = Rc::new(RefCell::new(None));

    let result_for_save = result.clone();
    let dialog = shell.dialog.clone();
    save_button.connect_clicked(move |_| {
        let desktop = desktop_entry.text().trim().to_string();
        let background = background_entry.text().trim().to_string();
        if desktop.is_empty() || background.is_empty() {
            error_label.set_text("Please fill in both paths.");
            error_label.set_visible(true);
            return;
        }
        *result_for_save.borrow_mut() = Some(DesktopConfig::new(desktop, background));
        dialog.close();
    });

    let on_done = RefCell::new(Some(on_done));
    shell.dialog.connect_close_request(move |_| {
        if let Some(on_done) = on_done.borrow_mut().take() {
            on_done(result.borrow_mut().take());
        }
        glib::Propagation::Proceed
    });

    shell.dialog.set_default_widget(Some(&save_button));
    shell.dialog.present();
}

fn path_row<F: Fn() + 'static>(entry: &Entry, on_browse: F) -> GtkBox {
    let row = GtkBox::new(Orientation::Horizontal, 8);
    row.append(entry);
    let browse = Button::with_label("Browse");
    browse.connect_clicked(move |_| on_browse());
    row.append(&browse);
    row
}
