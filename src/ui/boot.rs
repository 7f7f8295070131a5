// Boot splash: a BIOS-style progress screen followed by a short welcome.
// Purely cosmetic; nothing here touches desktop state.

use gtk4::prelude::*;
use gtk4::{glib, Align, Application, Box as GtkBox, Label, Orientation, ProgressBar, Window};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

pub const BOOT_MESSAGES: [&str; 5] = [
    "Initializing system...",
    "Checking hardware...",
    "Loading drivers...",
    "Configuring settings...",
    "Preparing to boot fauxdesk...",
];
pub const BOOT_STEP: Duration = Duration::from_secs(1);
pub const WELCOME_DURATION: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BootStep {
    pub message: &'static str,
    /// Fraction of the sequence completed, in `(0, 1]`.
    pub progress: f64,
}

/// The BIOS messages in order, one per timer tick.
#[derive(Debug, Default)]
pub struct BootSequence {
    next: usize,
}

impl BootSequence {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Iterator for BootSequence {
    type Item = BootStep;

    fn next(&mut self) -> Option<BootStep> {
        let message = *BOOT_MESSAGES.get(self.next)?;
        self.next += 1;
        Some(BootStep {
            message,
            progress: self.next as f64 / BOOT_MESSAGES.len() as f64,
        })
    }
}

/// Shows the boot screens, then hands over to `on_finished` and closes.
pub fn run_boot<F>(app: &Application, on_finished: F)
where
    F: FnOnce() + 'static,
{
    let window = Window::builder()
        .application(app)
        .title("fauxdesk")
        .default_width(800)
        .default_height(600)
        .resizable(false)
        .build();
    window.add_css_class("bios-screen");

    let content = GtkBox::new(Orientation::Vertical, 12);
    content.set_margin_top(24);
    content.set_margin_start(24);
    content.set_margin_end(24);
    content.set_margin_bottom(24);

    let log = Label::new(None);
    log.add_css_class("bios-text");
    log.set_halign(Align::Start);
    log.set_valign(Align::Start);
    log.set_vexpand(true);
    log.set_xalign(0.0);
    content.append(&log);

    let progress = ProgressBar::new();
    progress.add_css_class("bios-progress");
    content.append(&progress);

    window.set_child(Some(&content));
    window.present();
    tracing::debug!("Boot sequence started");

    let mut sequence = BootSequence::new();
    let mut lines: Vec<&'static str> = Vec::new();
    let on_finished = Rc::new(RefCell::new(Some(on_finished)));
    glib::timeout_add_local(BOOT_STEP, move || match sequence.next() {
        Some(step) => {
            lines.push(step.message);
            log.set_text(&lines.join("\n"));
            progress.set_fraction(step.progress);
            glib::ControlFlow::Continue
        }
        None => {
            show_welcome(&window, on_finished.clone());
            glib::ControlFlow::Break
        }
    });
}

fn show_welcome<F>(window: &Window, on_finished: Rc<RefCell<Option<F>>>)
where
    F: FnOnce() + 'static,
{
    window.remove_css_class("bios-screen");
    window.add_css_class("welcome-screen");

    let welcome = Label::new(Some("Welcome"));
    welcome.add_css_class("welcome-text");
    welcome.set_halign(Align::Center);
    welcome.set_valign(Align::Center);
    window.set_child(Some(&welcome));

    let window = window.clone();
    glib::timeout_add_local_once(WELCOME_DURATION, move || {
        if let Some(on_finished) = on_finished.borrow_mut().take() {
            on_finished();
        }
        window.close();
    });
}
