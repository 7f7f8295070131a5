// Keybindings for the fauxdesk desktop surface
// Keyboard equivalents for the icon context menu
//
// Keybindings:
// - Enter: Open highlighted icon
// - Delete: Delete highlighted icon (with confirmation)
// - F2: Rename highlighted icon
// - F5: Refresh desktop from disk
// - Escape: Clear highlight
// - Ctrl+N: New text file
// - Ctrl+Shift+N: New folder

use gdk4::{Key, ModifierType};
use gtk4::prelude::*;
use gtk4::{glib, EventControllerKey, PropagationPhase, Widget};
use std::cell::RefCell;
use std::rc::Rc;

/// What a key press asks the desktop to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesktopAction {
    OpenSelected,
    DeleteSelected,
    RenameSelected,
    Refresh,
    ClearSelection,
    NewTextFile,
    NewFolder,
}

/// Maps a key press to a desktop action.
pub fn action_for_key(keyval: Key, state: ModifierType) -> Option<DesktopAction> {
    let ctrl = state.contains(ModifierType::CONTROL_MASK);
    let shift = state.contains(ModifierType::SHIFT_MASK);

    match keyval {
        Key::Return | Key::KP_Enter => Some(DesktopAction::OpenSelected),
        Key::Delete | Key::KP_Delete => Some(DesktopAction::DeleteSelected),
        Key::F2 => Some(DesktopAction::RenameSelected),
        Key::F5 => Some(DesktopAction::Refresh),
        Key::Escape => Some(DesktopAction::ClearSelection),
        Key::n | Key::N if ctrl && shift => Some(DesktopAction::NewFolder),
        Key::n | Key::N if ctrl => Some(DesktopAction::NewTextFile),
        _ => None,
    }
}

/// Callback type for desktop actions
pub type ActionCallback = Box<dyn Fn(DesktopAction)>;

/// Keybinding manager for the desktop window
pub struct Keybindings {
    controller: EventControllerKey,
    on_action: Rc<RefCell<Option<ActionCallback>>>,
}

impl Keybindings {
    pub fn new() -> Self {
        let controller = EventControllerKey::new();
        controller.set_propagation_phase(PropagationPhase::Bubble);

        let on_action: Rc<RefCell<Option<ActionCallback>>> = Rc::new(RefCell::new(None));

        let on_action_clone = on_action.clone();
        controller.connect_key_pressed(move |_controller, keyval, _keycode, state| {
            let Some(action) = action_for_key(keyval, state) else {
                return glib::Propagation::Proceed;
            };
            tracing::debug!("Key {:?} -> {:?}", keyval.name(), action);
            if let Some(ref callback) = *on_action_clone.borrow() {
                callback(action);
                return glib::Propagation::Stop;
            }
            glib::Propagation::Proceed
        });

        Self {
            controller,
            on_action,
        }
    }

    /// Attach keybindings to a widget (typically the desktop window)
    pub fn attach(&self, widget: &impl IsA<Widget>) {
        widget.add_controller(self.controller.clone());
    }

    /// Connect callback for desktop actions
    pub fn connect_action<F>(&self, callback: F)
    where
        F: Fn(DesktopAction) + 'static,
    {
        *self.on_action.borrow_mut() = Some(Box::new(callback));
    }
}

impl Default for Keybindings {
    fn default() -> Self {
        Self::new()
    }
}
