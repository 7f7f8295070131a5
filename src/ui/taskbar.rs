// Taskbar along the bottom of the desktop: Start menu and clock.

use gtk4::prelude::*;
use gtk4::{glib, Align, Box as GtkBox, Button, Label, Orientation, Popover};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// Height of the taskbar; the icon area is the window height minus this.
pub const TASKBAR_HEIGHT: i32 = 40;
const CLOCK_INTERVAL: Duration = Duration::from_secs(1);
const CLOCK_FORMAT: &str = "%H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartMenuItem {
    MyComputer,
    Notepad,
    ImageViewer,
    Calculator,
    ShutDown,
}

impl StartMenuItem {
    pub const ALL: [StartMenuItem; 5] = [
        StartMenuItem::MyComputer,
        StartMenuItem::Notepad,
        StartMenuItem::ImageViewer,
        StartMenuItem::Calculator,
        StartMenuItem::ShutDown,
    ];

    pub fn label(self) -> &'static str {
        match self {
            StartMenuItem::MyComputer => "My Computer",
            StartMenuItem::Notepad => "Notepad",
            StartMenuItem::ImageViewer => "Image Viewer",
            StartMenuItem::Calculator => "Calculator",
            StartMenuItem::ShutDown => "Shut Down",
        }
    }
}

type StartMenuCallback = Box<dyn Fn(StartMenuItem)>;

pub struct Taskbar {
    container: GtkBox,
    clock: Label,
    on_item: Rc<RefCell<Option<StartMenuCallback>>>,
}

impl Taskbar {
    pub fn new() -> Rc<Self> {
        let container = GtkBox::new(Orientation::Horizontal, 8);
        container.add_css_class("taskbar");
        container.set_size_request(-1, TASKBAR_HEIGHT);
        container.set_valign(Align::End);

        let start_button = Button::with_label("Start");
        start_button.add_css_class("start-button");
        start_button.set_margin_start(4);
        start_button.set_valign(Align::Center);
        container.append(&start_button);

        let spacer = GtkBox::new(Orientation::Horizontal, 0);
        spacer.set_hexpand(true);
        container.append(&spacer);

        let clock = Label::new(None);
        clock.add_css_class("taskbar-clock");
        clock.set_margin_end(10);
        container.append(&clock);

        let taskbar = Rc::new(Self {
            container,
            clock,
            on_item: Rc::new(RefCell::new(None)),
        });

        let menu = taskbar.build_start_menu(&start_button);
        start_button.connect_clicked(move |_| menu.popup());

        taskbar.update_clock();
        taskbar.start_clock();
        taskbar
    }

    pub fn widget(&self) -> &GtkBox {
        &self.container
    }

    /// Connect callback for Start menu entries
    pub fn connect_item<F>(&self, callback: F)
    where
        F: Fn(StartMenuItem) + 'static,
    {
        *self.on_item.borrow_mut() = Some(Box::new(callback));
    }

    fn build_start_menu(&self, anchor: &Button) -> Popover {
        let popover = Popover::new();
        popover.add_css_class("context-menu-popover");
        popover.set_has_arrow(false);
        popover.set_position(gtk4::PositionType::Top);
        popover.set_autohide(true);
        popover.set_parent(anchor);

        let content = GtkBox::new(Orientation::Vertical, 4);
        content.add_css_class("context-menu");
        content.set_margin_top(6);
        content.set_margin_bottom(6);
        content.set_margin_start(8);
        content.set_margin_end(8);

        for item in StartMenuItem::ALL {
            if item == StartMenuItem::ShutDown {
                let sep = gtk4::Separator::new(Orientation::Horizontal);
                sep.add_css_class("context-menu-separator");
                content.append(&sep);
            }
            let button = Button::with_label(item.label());
            button.add_css_class("context-menu-item");
            button.set_halign(Align::Fill);
            button.set_hexpand(true);
            let on_item = self.on_item.clone();
            let popover_for_item = popover.clone();
            button.connect_clicked(move |_| {
                popover_for_item.popdown();
                if let Some(ref callback) = *on_item.borrow() {
                    callback(item);
                }
            });
            content.append(&button);
        }

        popover.set_child(Some(&content));
        popover
    }

    fn update_clock(&self) {
        match glib::DateTime::now_local().and_then(|now| now.format(CLOCK_FORMAT)) {
            Ok(text) => self.clock.set_text(&text),
            Err(err) => tracing::warn!(error = ?err, "Failed to format clock"),
        }
    }

    // Runs for the life of the taskbar, independent of any drag tick.
    fn start_clock(self: &Rc<Self>) {
        let taskbar_weak = Rc::downgrade(self);
        glib::timeout_add_local(CLOCK_INTERVAL, move || match taskbar_weak.upgrade() {
            Some(taskbar) => {
                taskbar.update_clock();
                glib::ControlFlow::Continue
            }
            None => glib::ControlFlow::Break,
        });
    }
}
