// Desktop window for fauxdesk
// Background picture with an absolutely positioned icon surface on top and
// the taskbar along the bottom.

use gdk4::{Display, Rectangle};
use gtk4::graphene;
use gtk4::prelude::*;
use gtk4::{
    gdk, glib, Align, Application, ApplicationWindow, Box as GtkBox, Button, ContentFit,
    CssProvider, DropTarget, Fixed, GestureClick, GestureDrag, Label, Orientation, Overlay,
    Picture, Popover, Window, STYLE_PROVIDER_PRIORITY_APPLICATION,
};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};
use std::time::Instant;

use super::dialogs::{self, IMAGE_FILES};
use super::icon_widget::IconWidget;
use super::keybindings::{DesktopAction, Keybindings};
use super::notepad::Notepad;
use super::taskbar::{StartMenuItem, Taskbar, TASKBAR_HEIGHT};
use super::viewer::ImageViewer;
use crate::error::{DesktopError, Result};
use crate::fs_ops;
use crate::interaction::{GestureOutcome, InteractionController, DRAG_TICK};
use crate::models::Point;
use crate::session::DesktopSessionState;
use crate::shell::{self, GioLauncher, Launcher};

const WINDOW_WIDTH: i32 = 1024;
const WINDOW_HEIGHT: i32 = 768;
/// Shipped background; wins over the configured image at startup.
const BUNDLED_BACKGROUND: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/background.png");

/// CSS for the desktop - embedded as fallback
const FALLBACK_CSS: &str = r#"
window.desktop {
    background-color: #008080;
}

.desktop-surface {
    background-color: transparent;
}

.icon-label {
    color: #ffffff;
    font-size: 11px;
    text-shadow: 1px 1px 1px rgba(0, 0, 0, 0.8);
    padding: 0 2px;
}

.icon-glyph.selected {
    background-color: rgba(0, 120, 215, 0.45);
}

.icon-label.selected {
    background-color: #0078d7;
    text-shadow: none;
}

.taskbar {
    background-color: rgba(0, 0, 0, 0.6);
    color: #ffffff;
}

.taskbar-clock {
    font-family: monospace;
}

.start-button {
    font-weight: bold;
}

.context-menu-item {
    border: none;
    background-color: transparent;
}

.context-menu-title {
    font-weight: bold;
}

window.bios-screen {
    background-color: #000000;
}

.bios-text {
    color: #c0c0c0;
    font-family: Consolas, monospace;
    font-size: 14px;
}

window.welcome-screen {
    background-color: #000080;
}

.welcome-text {
    color: #ffffff;
    font-size: 32px;
    font-weight: bold;
}
"#;

/// Load and apply the stylesheet
fn load_css() {
    let provider = CssProvider::new();

    let css_path = concat!(env!("CARGO_MANIFEST_DIR"), "/src/style.css");

    if Path::new(css_path).exists() {
        provider.load_from_path(css_path);
        tracing::info!("Loaded CSS from: {}", css_path);
    } else {
        provider.load_from_string(FALLBACK_CSS);
        tracing::debug!("Loaded fallback embedded CSS");
    }

    if let Some(display) = Display::default() {
        gtk4::style_context_add_provider_for_display(
            &display,
            &provider,
            STYLE_PROVIDER_PRIORITY_APPLICATION,
        );
    }
}

/// The desktop: icons over a background, with a taskbar.
pub struct DesktopWindow {
    self_weak: RefCell<Weak<DesktopWindow>>,
    app: Application,
    window: ApplicationWindow,
    background: Picture,
    surface: Fixed,
    taskbar: Rc<Taskbar>,
    keybindings: Rc<Keybindings>,
    session: Rc<RefCell<DesktopSessionState>>,
    controller: RefCell<InteractionController>,
    widgets: RefCell<HashMap<String, IconWidget>>,
    /// Latest pointer position over the surface while the button is held.
    pointer: Cell<Point>,
    drag_tick: RefCell<Option<glib::SourceId>>,
}

impl DesktopWindow {
    /// Builds the desktop for an already populated session.
    pub fn new(app: &Application, session: DesktopSessionState) -> Rc<Self> {
        load_css();

        let window = ApplicationWindow::builder()
            .application(app)
            .title("fauxdesk")
            .default_width(WINDOW_WIDTH)
            .default_height(WINDOW_HEIGHT)
            .build();
        window.add_css_class("desktop");

        let background = Picture::new();
        background.set_content_fit(ContentFit::Cover);
        background.set_can_shrink(true);
        background.set_can_target(false);

        let surface = Fixed::new();
        surface.add_css_class("desktop-surface");
        surface.set_hexpand(true);
        surface.set_vexpand(true);
        surface.set_focusable(true);

        let overlay = Overlay::new();
        overlay.set_child(Some(&background));
        overlay.add_overlay(&surface);
        overlay.set_vexpand(true);

        let taskbar = Taskbar::new();

        let root = GtkBox::new(Orientation::Vertical, 0);
        root.append(&overlay);
        root.append(taskbar.widget());
        window.set_child(Some(&root));

        let desktop = Rc::new(Self {
            self_weak: RefCell::new(Weak::new()),
            app: app.clone(),
            window,
            background,
            surface,
            taskbar,
            keybindings: Rc::new(Keybindings::new()),
            session: Rc::new(RefCell::new(session)),
            controller: RefCell::new(InteractionController::new()),
            widgets: RefCell::new(HashMap::new()),
            pointer: Cell::new(Point::default()),
            drag_tick: RefCell::new(None),
        });
        *desktop.self_weak.borrow_mut() = Rc::downgrade(&desktop);

        desktop.setup_pointer();
        desktop.setup_context_menu();
        desktop.setup_drop_target();
        desktop.setup_keybindings();
        desktop.setup_taskbar();
        desktop.setup_resize_tracking();

        let desktop_weak = Rc::downgrade(&desktop);
        desktop.window.connect_close_request(move |_| {
            if let Some(desktop) = desktop_weak.upgrade() {
                desktop.save_positions_on_exit();
            }
            glib::Propagation::Proceed
        });

        desktop.apply_startup_background();
        desktop.render_icons();
        desktop
    }

    pub fn present(&self) {
        self.window.present();
    }

    fn parent(&self) -> Option<&Window> {
        Some(self.window.upcast_ref())
    }

    fn setup_pointer(self: &Rc<Self>) {
        let drag = GestureDrag::new();
        drag.set_button(gdk::BUTTON_PRIMARY);

        let desktop_weak = Rc::downgrade(self);
        drag.connect_drag_begin(move |_, x, y| {
            if let Some(desktop) = desktop_weak.upgrade() {
                desktop.on_pointer_down(Point::from_f64(x, y));
            }
        });

        let desktop_weak = Rc::downgrade(self);
        drag.connect_drag_update(move |gesture, dx, dy| {
            if let Some(desktop) = desktop_weak.upgrade() {
                if let Some((sx, sy)) = gesture.start_point() {
                    desktop.pointer.set(Point::from_f64(sx + dx, sy + dy));
                }
            }
        });

        let desktop_weak = Rc::downgrade(self);
        drag.connect_drag_end(move |gesture, dx, dy| {
            if let Some(desktop) = desktop_weak.upgrade() {
                let release = gesture
                    .start_point()
                    .map(|(sx, sy)| Point::from_f64(sx + dx, sy + dy))
                    .unwrap_or_else(|| desktop.pointer.get());
                desktop.on_pointer_up(release);
            }
        });

        let desktop_weak = Rc::downgrade(self);
        drag.connect_cancel(move |_, _| {
            if let Some(desktop) = desktop_weak.upgrade() {
                tracing::debug!("Pointer gesture cancelled");
                desktop.stop_drag_tick();
                desktop.controller.borrow_mut().cancel();
            }
        });

        self.surface.add_controller(drag);
    }

    fn on_pointer_down(&self, point: Point) {
        self.pointer.set(point);
        self.surface.grab_focus();
        let armed = {
            let mut session = self.session.borrow_mut();
            self.controller.borrow_mut().pointer_down(&mut session, point)
        };
        self.sync_selection();
        if armed.is_some() {
            self.start_drag_tick();
        }
    }

    fn start_drag_tick(&self) {
        self.stop_drag_tick();
        let desktop_weak = self.self_weak.borrow().clone();
        let source = glib::timeout_add_local(DRAG_TICK, move || {
            let Some(desktop) = desktop_weak.upgrade() else {
                return glib::ControlFlow::Break;
            };
            if !desktop.controller.borrow().is_armed() {
                desktop.drag_tick.borrow_mut().take();
                return glib::ControlFlow::Break;
            }
            desktop.on_drag_tick();
            glib::ControlFlow::Continue
        });
        *self.drag_tick.borrow_mut() = Some(source);
    }

    fn stop_drag_tick(&self) {
        if let Some(source) = self.drag_tick.borrow_mut().take() {
            source.remove();
        }
    }

    fn on_drag_tick(&self) {
        let moved = {
            let mut session = self.session.borrow_mut();
            self.controller
                .borrow_mut()
                .tick(&mut session, self.pointer.get())
        };
        if let Some(moved) = moved {
            if self.controller.borrow().is_dragging() {
                self.surface.set_cursor_from_name(Some("grabbing"));
            }
            self.move_icon_widget(&moved.entry, moved.position);
        }
    }

    fn on_pointer_up(&self, point: Point) {
        self.stop_drag_tick();
        self.surface.set_cursor(None);
        self.pointer.set(point);
        let outcome = {
            let mut session = self.session.borrow_mut();
            self.controller
                .borrow_mut()
                .pointer_up(&mut session, point, Instant::now())
        };

        match outcome {
            Ok(GestureOutcome::Moved(name)) => self.sync_icon_position(&name),
            Ok(GestureOutcome::Selected(_)) => self.sync_selection(),
            Ok(GestureOutcome::Open(name)) => self.open_icon(&name),
            Ok(GestureOutcome::Ignored) => {}
            Err(err) => {
                // The move happened on screen even though saving failed.
                self.render_icons();
                self.report(&err);
            }
        }
    }

    fn move_icon_widget(&self, name: &str, position: Point) {
        if let Some(widget) = self.widgets.borrow().get(name) {
            widget.move_to(&self.surface, position);
        }
    }

    fn sync_icon_position(&self, name: &str) {
        let position = self.session.borrow().icon(name).map(|icon| icon.position);
        if let Some(position) = position {
            self.move_icon_widget(name, position);
        }
    }

    fn sync_selection(&self) {
        let session = self.session.borrow();
        let selected = session.selected();
        for (name, widget) in self.widgets.borrow().iter() {
            widget.set_selected(selected == Some(name.as_str()));
        }
    }

    /// Tears down every icon widget and rebuilds the surface from the
    /// session's icon set.
    fn render_icons(&self) {
        let mut widgets = self.widgets.borrow_mut();
        for (_, widget) in widgets.drain() {
            widget.detach(&self.surface);
        }

        let session = self.session.borrow();
        for entry in session.icons() {
            let widget = IconWidget::new(entry);
            widget.attach(&self.surface, entry.position);
            if let Some(previous) = widgets.insert(widget.name().to_string(), widget) {
                previous.detach(&self.surface);
            }
        }
        tracing::debug!("Rendered {} desktop icons", widgets.len());
        drop(widgets);
        drop(session);

        self.sync_selection();
    }

    fn report(&self, err: &DesktopError) {
        dialogs::show_error(self.parent(), err);
    }

    /// Runs a file system mutation against the session, redraws, and
    /// reports any error. Any gesture in flight is abandoned first since the icon set
    /// is about to be replaced.
    fn run_mutation<F>(&self, mutation: F)
    where
        F: FnOnce(&mut DesktopSessionState) -> Result<()>,
    {
        self.stop_drag_tick();
        {
            let mut controller = self.controller.borrow_mut();
            controller.cancel();
            controller.forget_clicks();
        }

        let result = mutation(&mut self.session.borrow_mut());
        // A failed mutation may still have changed the folder.
        self.render_icons();
        if let Err(err) = result {
            self.report(&err);
        }
    }

    fn open_icon(&self, name: &str) {
        let Some(entry) = self.session.borrow().icon(name).cloned() else {
            return;
        };
        let app = self.app.clone();
        let launcher = GioLauncher::new(move |path: &Path| {
            Notepad::open(&app, Some(path));
        });
        match shell::open_entry(&entry, &launcher) {
            Ok(how) => tracing::info!("Opened {:?} via {:?}", entry.display_name, how),
            Err(err) => self.report(&err),
        }
    }

    fn confirm_delete(&self, name: &str) {
        let Some(entry) = self.session.borrow().icon(name).cloned() else {
            return;
        };
        let message = if entry.is_folder {
            format!(
                "Are you sure you want to delete the folder '{}' and all its contents ({} items)?",
                entry.display_name,
                fs_ops::count_contents(&entry.path)
            )
        } else {
            format!("Are you sure you want to delete '{}'?", entry.display_name)
        };

        let desktop_weak = self.self_weak.borrow().clone();
        let name = entry.display_name;
        dialogs::confirm(self.parent(), "Confirm Delete", &message, move || {
            if let Some(desktop) = desktop_weak.upgrade() {
                desktop.run_mutation(|session| session.delete(&name));
            }
        });
    }

    fn prompt_rename(&self, name: &str) {
        let desktop_weak = self.self_weak.borrow().clone();
        let old_name = name.to_string();
        dialogs::prompt_text(self.parent(), "Rename", "Enter new name:", name, move |text| {
            if let Some(desktop) = desktop_weak.upgrade() {
                desktop.run_mutation(|session| session.rename(&old_name, &text).map(|_| ()));
            }
        });
    }

    fn prompt_import(&self) {
        let desktop_weak = self.self_weak.borrow().clone();
        dialogs::choose_file(self.parent(), "Import File", None, move |path| {
            if let Some(desktop) = desktop_weak.upgrade() {
                desktop.run_mutation(|session| session.import(&path).map(|_| ()));
            }
        });
    }

    fn prompt_background(&self) {
        let desktop_weak = self.self_weak.borrow().clone();
        dialogs::choose_file(
            self.parent(),
            "Change Background",
            Some(IMAGE_FILES),
            move |path| {
                if let Some(desktop) = desktop_weak.upgrade() {
                    desktop.change_background(path);
                }
            },
        );
    }

    fn change_background(&self, path: PathBuf) {
        let result = self.session.borrow_mut().set_background(path.clone());
        match result {
            Ok(()) => {
                tracing::info!("Background changed to {:?}", path);
                self.background.set_filename(Some(&path));
            }
            Err(err) => self.report(&err),
        }
    }

    fn apply_startup_background(&self) {
        let background = self
            .session
            .borrow()
            .config()
            .effective_background(Path::new(BUNDLED_BACKGROUND));
        match background {
            Some(path) => {
                tracing::info!("Using background {:?}", path);
                self.background.set_filename(Some(&path));
            }
            None => tracing::info!("No background image; using flat color"),
        }
    }

    fn drop_files(&self, files: Vec<PathBuf>) {
        self.run_mutation(|session| {
            let report = session.drop_files(&files)?;
            for skipped in &report.skipped {
                tracing::debug!("Drop skipped {:?}", skipped);
            }
            Ok(())
        });
    }

    fn setup_drop_target(self: &Rc<Self>) {
        let target = DropTarget::new(gdk::FileList::static_type(), gdk::DragAction::COPY);
        let desktop_weak = Rc::downgrade(self);
        target.connect_drop(move |_, value, _x, _y| {
            let Some(desktop) = desktop_weak.upgrade() else {
                return false;
            };
            let Ok(list) = value.get::<gdk::FileList>() else {
                return false;
            };
            let files: Vec<PathBuf> = list.files().iter().filter_map(|f| f.path()).collect();
            desktop.drop_files(files);
            true
        });
        self.surface.add_controller(target);
    }

    fn setup_context_menu(self: &Rc<Self>) {
        let click = GestureClick::new();
        click.set_button(gdk::BUTTON_SECONDARY);
        let desktop_weak = Rc::downgrade(self);
        click.connect_pressed(move |gesture, _n_press, x, y| {
            if let Some(desktop) = desktop_weak.upgrade() {
                gesture.set_state(gtk4::EventSequenceState::Claimed);
                desktop.on_context_click(x, y);
            }
        });
        self.surface.add_controller(click);
    }

    fn on_context_click(&self, x: f64, y: f64) {
        let point = Point::from_f64(x, y);
        let hit = self
            .session
            .borrow()
            .hit_test(point)
            .map(|(icon, _)| icon.display_name.clone());

        match hit {
            Some(name) => {
                self.session.borrow_mut().select(Some(&name));
                self.sync_selection();
                self.show_icon_menu(&name, x, y);
            }
            None => self.show_desktop_menu(x, y),
        }
    }

    fn context_popover(&self, x: f64, y: f64, title: &str) -> (Popover, GtkBox) {
        let popover = Popover::new();
        popover.add_css_class("context-menu-popover");
        popover.set_has_arrow(false);
        popover.set_position(gtk4::PositionType::Bottom);
        let anchor_point = graphene::Point::new(x as f32, y as f32);
        let (px, py) = self
            .surface
            .compute_point(&self.window, &anchor_point)
            .map(|p| (p.x(), p.y()))
            .unwrap_or((x as f32, y as f32));
        let pointing = Rectangle::new(px.round() as i32, py.round() as i32, 1, 1);
        popover.set_pointing_to(Some(&pointing));
        popover.set_autohide(true);
        popover.set_parent(&self.window);
        popover.connect_closed(|popover| {
            let popover = popover.clone();
            glib::idle_add_local_once(move || popover.unparent());
        });

        let content = GtkBox::new(Orientation::Vertical, 2);
        content.add_css_class("context-menu");
        content.set_margin_top(6);
        content.set_margin_bottom(6);
        content.set_margin_start(8);
        content.set_margin_end(8);

        let header = Label::new(Some(title));
        header.set_halign(Align::Start);
        header.add_css_class("context-menu-title");
        content.append(&header);

        let sep = gtk4::Separator::new(Orientation::Horizontal);
        sep.add_css_class("context-menu-separator");
        content.append(&sep);

        popover.set_child(Some(&content));
        (popover, content)
    }

    fn add_menu_item<F>(&self, popover: &Popover, content: &GtkBox, label: &str, action: F)
    where
        F: Fn(&DesktopWindow) + 'static,
    {
        let button = Button::with_label(label);
        button.add_css_class("context-menu-item");
        button.set_halign(Align::Fill);
        button.set_hexpand(true);
        let desktop_weak = self.self_weak.borrow().clone();
        let popover = popover.clone();
        button.connect_clicked(move |_| {
            popover.popdown();
            if let Some(desktop) = desktop_weak.upgrade() {
                action(&desktop);
            }
        });
        content.append(&button);
    }

    fn show_icon_menu(&self, name: &str, x: f64, y: f64) {
        let (popover, content) = self.context_popover(x, y, name);

        let target = name.to_string();
        self.add_menu_item(&popover, &content, "Open", move |desktop| {
            desktop.open_icon(&target)
        });
        let target = name.to_string();
        self.add_menu_item(&popover, &content, "Rename", move |desktop| {
            desktop.prompt_rename(&target)
        });
        let target = name.to_string();
        self.add_menu_item(&popover, &content, "Delete", move |desktop| {
            desktop.confirm_delete(&target)
        });

        popover.popup();
    }

    fn show_desktop_menu(&self, x: f64, y: f64) {
        let (popover, content) = self.context_popover(x, y, "Desktop");

        self.add_menu_item(&popover, &content, "New Text File", |desktop| {
            desktop.run_mutation(|session| session.create_text_file().map(|_| ()))
        });
        self.add_menu_item(&popover, &content, "New Folder", |desktop| {
            desktop.run_mutation(|session| session.create_folder().map(|_| ()))
        });
        self.add_menu_item(&popover, &content, "Import File", |desktop| {
            desktop.prompt_import()
        });
        self.add_menu_item(&popover, &content, "Change Background", |desktop| {
            desktop.prompt_background()
        });
        let sep = gtk4::Separator::new(Orientation::Horizontal);
        sep.add_css_class("context-menu-separator");
        content.append(&sep);
        self.add_menu_item(&popover, &content, "Refresh", |desktop| {
            desktop.run_mutation(|session| session.refresh())
        });

        popover.popup();
    }

    fn setup_keybindings(self: &Rc<Self>) {
        self.keybindings.attach(&self.window);

        let desktop_weak = Rc::downgrade(self);
        self.keybindings.connect_action(move |action| {
            if let Some(desktop) = desktop_weak.upgrade() {
                desktop.handle_action(action);
            }
        });
    }

    fn handle_action(&self, action: DesktopAction) {
        let selected = self.session.borrow().selected().map(str::to_string);
        match action {
            DesktopAction::OpenSelected => {
                if let Some(name) = selected {
                    self.open_icon(&name);
                }
            }
            DesktopAction::DeleteSelected => {
                if let Some(name) = selected {
                    self.confirm_delete(&name);
                }
            }
            DesktopAction::RenameSelected => {
                if let Some(name) = selected {
                    self.prompt_rename(&name);
                }
            }
            DesktopAction::Refresh => self.run_mutation(|session| session.refresh()),
            DesktopAction::ClearSelection => {
                self.session.borrow_mut().select(None);
                self.sync_selection();
            }
            DesktopAction::NewTextFile => {
                self.run_mutation(|session| session.create_text_file().map(|_| ()))
            }
            DesktopAction::NewFolder => {
                self.run_mutation(|session| session.create_folder().map(|_| ()))
            }
        }
    }

    fn setup_taskbar(self: &Rc<Self>) {
        let desktop_weak = Rc::downgrade(self);
        self.taskbar.connect_item(move |item| {
            if let Some(desktop) = desktop_weak.upgrade() {
                desktop.on_start_menu(item);
            }
        });
    }

    fn on_start_menu(&self, item: StartMenuItem) {
        match item {
            StartMenuItem::MyComputer => {
                let root = self.session.borrow().root().to_path_buf();
                let launcher = GioLauncher::new(|_: &Path| {});
                if let Err(err) = launcher.open_folder(&root) {
                    self.report(&err);
                }
            }
            StartMenuItem::Notepad => {
                Notepad::open(&self.app, None);
            }
            StartMenuItem::ImageViewer => {
                ImageViewer::open(&self.app, None);
            }
            StartMenuItem::Calculator => {
                if let Err(err) = shell::launch_calculator() {
                    self.report(&err);
                }
            }
            StartMenuItem::ShutDown => {
                let desktop_weak = self.self_weak.borrow().clone();
                dialogs::confirm(
                    self.parent(),
                    "Shut Down",
                    "Are you sure you want to exit?",
                    move || {
                        if let Some(desktop) = desktop_weak.upgrade() {
                            desktop.shut_down();
                        }
                    },
                );
            }
        }
    }

    fn shut_down(&self) {
        tracing::info!("Shutting down");
        self.save_positions_on_exit();
        self.app.quit();
    }

    fn save_positions_on_exit(&self) {
        self.stop_drag_tick();
        self.controller.borrow_mut().cancel();
        if let Err(err) = self.session.borrow_mut().save_positions() {
            tracing::warn!(error = %err, "Failed to save icon positions");
        }
    }

    /// Keeps auto-placement in step with the visible icon area.
    fn setup_resize_tracking(self: &Rc<Self>) {
        let desktop_weak = Rc::downgrade(self);
        self.window.connect_default_height_notify(move |window| {
            let Some(desktop) = desktop_weak.upgrade() else {
                return;
            };
            let height = window.default_height() - TASKBAR_HEIGHT;
            if height > 0 {
                desktop.session.borrow_mut().set_desktop_height(height);
            }
        });
        let height = self.window.default_height() - TASKBAR_HEIGHT;
        if height > 0 {
            self.session.borrow_mut().set_desktop_height(height);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_css_styles_selection() {
        assert!(!FALLBACK_CSS.is_empty());
        assert!(FALLBACK_CSS.contains(".icon-label.selected"));
        assert!(FALLBACK_CSS.contains(".taskbar"));
    }

    #[test]
    fn test_icon_area_matches_default_layout() {
        assert_eq!(
            WINDOW_HEIGHT - TASKBAR_HEIGHT,
            crate::layout::auto_layout::DEFAULT_DESKTOP_HEIGHT
        );
    }
}
