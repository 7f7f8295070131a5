// One desktop icon on screen: a 32x32 glyph with its name label below.

use gtk4::prelude::*;
use gtk4::{gio, Fixed, Image, Justification, Label};
use std::cell::RefCell;

use crate::models::icon_entry::{GLYPH_SIZE, LABEL_OFFSET_Y, LABEL_WIDTH};
use crate::models::{IconEntry, Point};

/// Themed icon for an entry: `folder` for directories, otherwise the icon of
/// the guessed content type.
fn glyph_icon(entry: &IconEntry) -> gio::Icon {
    if entry.is_folder {
        return gio::ThemedIcon::new("folder").upcast();
    }
    let (content_type, _uncertain) = gio::content_type_guess(Some(&entry.path), &[]);
    gio::content_type_get_icon(&content_type)
}

fn build_label(text: &str) -> Label {
    let label = Label::new(Some(text));
    label.add_css_class("icon-label");
    label.set_wrap(true);
    label.set_wrap_mode(gtk4::pango::WrapMode::WordChar);
    label.set_justify(Justification::Left);
    label.set_max_width_chars(10);
    label.set_lines(2);
    label.set_ellipsize(gtk4::pango::EllipsizeMode::End);
    label.set_size_request(LABEL_WIDTH, -1);
    label.set_xalign(0.0);
    label.set_can_target(false);
    label
}

/// Owns both widgets of an icon so they can only be placed and moved
/// together.
pub struct IconWidget {
    name: String,
    glyph: Image,
    label: RefCell<Option<Label>>,
}

impl IconWidget {
    pub fn new(entry: &IconEntry) -> Self {
        let glyph = Image::from_gicon(&glyph_icon(entry));
        glyph.set_pixel_size(GLYPH_SIZE);
        glyph.set_size_request(GLYPH_SIZE, GLYPH_SIZE);
        glyph.add_css_class("icon-glyph");
        glyph.set_can_target(false);

        Self {
            name: entry.display_name.clone(),
            glyph,
            label: RefCell::new(Some(build_label(&entry.display_name))),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Puts both parts on the surface at the entry's position.
    pub fn attach(&self, surface: &Fixed, position: Point) {
        surface.put(&self.glyph, position.x as f64, position.y as f64);
        if let Some(label) = self.label.borrow().as_ref() {
            let at = label_origin(position);
            surface.put(label, at.x as f64, at.y as f64);
        }
    }

    /// Moves glyph and label to a new glyph position.
    pub fn move_to(&self, surface: &Fixed, position: Point) {
        surface.move_(&self.glyph, position.x as f64, position.y as f64);
        self.ensure_label(surface, position);
        if let Some(label) = self.label.borrow().as_ref() {
            let at = label_origin(position);
            surface.move_(label, at.x as f64, at.y as f64);
        }
    }

    /// Re-creates the label if it is no longer on the surface, so a glyph is
    /// never shown without its name. Only [`Self::detach`] takes the label
    /// off, and a detached widget is dropped right after, so this is a guard
    /// against something else removing surface children.
    fn ensure_label(&self, surface: &Fixed, position: Point) {
        let state = match self.label.borrow().as_ref() {
            Some(label) if label.parent().as_ref() == Some(surface.upcast_ref::<gtk4::Widget>()) => {
                LabelState::OnSurface
            }
            Some(_) => LabelState::Detached,
            None => LabelState::Missing,
        };
        if !state.needs_rebuild() {
            return;
        }

        tracing::debug!("Label for {:?} missing; recreating", self.name);
        let label = build_label(&self.name);
        if self.glyph.has_css_class("selected") {
            label.add_css_class("selected");
        }
        let at = label_origin(position);
        surface.put(&label, at.x as f64, at.y as f64);
        *self.label.borrow_mut() = Some(label);
    }

    pub fn set_selected(&self, selected: bool) {
        let apply = |widget: &gtk4::Widget| {
            if selected {
                widget.add_css_class("selected");
            } else {
                widget.remove_css_class("selected");
            }
        };
        apply(self.glyph.upcast_ref());
        if let Some(label) = self.label.borrow().as_ref() {
            apply(label.upcast_ref());
        }
    }

    pub fn detach(&self, surface: &Fixed) {
        surface.remove(&self.glyph);
        if let Some(label) = self.label.borrow_mut().take() {
            if label.parent().is_some() {
                surface.remove(&label);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LabelState {
    OnSurface,
    /// Still owned, but removed from the surface or moved elsewhere.
    Detached,
    Missing,
}

impl LabelState {
    fn needs_rebuild(self) -> bool {
        self != LabelState::OnSurface
    }
}

/// Where the label widget goes: left-aligned under the glyph, matching the
/// label hit box of [`IconEntry::hit_part`].
fn label_origin(glyph: Point) -> Point {
    glyph.offset(0, LABEL_OFFSET_Y)
}
