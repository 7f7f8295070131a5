// Image viewer window for fauxdesk
// Features:
// - Zoom in/out in x1.2 steps, reset to 1:1
// - Previous/next image within the same folder, wrapping at either end
// - Small LRU texture cache so stepping back and forth does not re-decode
//
// Keys: Left/Right step, +/- zoom, 0 reset

use gdk4::{MemoryFormat, MemoryTexture, Texture};
use gtk4::gdk::Key;
use gtk4::prelude::*;
use gtk4::{
    glib, Application, Box as GtkBox, Button, ContentFit, EventControllerKey, Label, Orientation,
    Picture, PolicyType, ScrolledWindow, Window,
};
use lru::LruCache;
use std::cell::{Cell, RefCell};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

use super::dialogs::{self, IMAGE_FILES};

/// Extensions the viewer steps through.
pub const VIEWER_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif", "webp"];
pub const ZOOM_STEP: f64 = 1.2;
const MAX_SCALE: f64 = 10.0;
const MIN_SCALE: f64 = 0.1;
const CACHE_MAX_BYTES: usize = 64 * 1024 * 1024;

pub fn is_viewable(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| VIEWER_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Viewable images in `path`'s folder, sorted by file name.
pub fn sibling_images(path: &Path) -> Vec<PathBuf> {
    let Some(dir) = path.parent() else {
        return Vec::new();
    };
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!(error = ?err, "Failed to list {:?}", dir);
            return Vec::new();
        }
    };
    let mut images: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_viewable(p))
        .collect();
    images.sort();
    images
}

/// Neighbour of `current` in `images`, wrapping around. Falls back to the
/// first image when `current` is not in the list.
pub fn step_wrapping(images: &[PathBuf], current: &Path, forward: bool) -> Option<PathBuf> {
    if images.is_empty() {
        return None;
    }
    let len = images.len();
    let next = match images.iter().position(|p| p == current) {
        Some(idx) if forward => (idx + 1) % len,
        Some(idx) => (idx + len - 1) % len,
        None => 0,
    };
    images.get(next).cloned()
}

pub fn clamp_scale(scale: f64) -> f64 {
    scale.clamp(MIN_SCALE, MAX_SCALE)
}

#[derive(Clone)]
struct CachedTexture {
    texture: Texture,
    bytes: usize,
}

struct TextureCache {
    max_bytes: usize,
    bytes: usize,
    entries: LruCache<PathBuf, CachedTexture>,
}

impl TextureCache {
    fn new(max_bytes: usize) -> Self {
        let capacity = NonZeroUsize::new(64).unwrap_or(NonZeroUsize::MIN);
        Self {
            max_bytes,
            bytes: 0,
            entries: LruCache::new(capacity),
        }
    }

    fn get(&mut self, path: &Path) -> Option<Texture> {
        self.entries.get(path).map(|c| c.texture.clone())
    }

    fn insert(&mut self, path: PathBuf, texture: Texture) {
        let bytes = (texture.width().max(0) as usize) * (texture.height().max(0) as usize) * 4;
        if let Some(existing) = self.entries.put(path, CachedTexture { texture, bytes }) {
            self.bytes = self.bytes.saturating_sub(existing.bytes);
        }
        self.bytes = self.bytes.saturating_add(bytes);

        while self.bytes > self.max_bytes && self.entries.len() > 1 {
            if let Some((_path, evicted)) = self.entries.pop_lru() {
                self.bytes = self.bytes.saturating_sub(evicted.bytes);
            } else {
                break;
            }
        }
    }
}

/// Create a GDK texture from RGBA data
fn create_texture_from_rgba(data: &[u8], width: u32, height: u32) -> Option<Texture> {
    if width == 0 || height == 0 {
        return None;
    }
    let expected = (width as u64)
        .saturating_mul(height as u64)
        .saturating_mul(4);
    if (data.len() as u64) < expected {
        tracing::warn!(
            "Skipping texture: data too small ({} bytes for {}x{})",
            data.len(),
            width,
            height
        );
        return None;
    }
    let bytes = glib::Bytes::from(data);
    let texture = MemoryTexture::new(
        width as i32,
        height as i32,
        MemoryFormat::R8g8b8a8,
        &bytes,
        (width * 4) as usize,
    );
    Some(texture.upcast())
}

fn load_texture(path: &Path) -> anyhow::Result<Texture> {
    // GDK handles the common formats directly; the image crate covers the rest.
    if let Ok(texture) = Texture::from_filename(path) {
        return Ok(texture);
    }
    let decoded = crate::image_loader::decode_rgba(path)?;
    create_texture_from_rgba(&decoded.data, decoded.width, decoded.height)
        .ok_or_else(|| anyhow::anyhow!("Failed to create texture for {:?}", path))
}

pub struct ImageViewer {
    self_weak: RefCell<Weak<ImageViewer>>,
    window: Window,
    picture: Picture,
    info_label: Label,
    current: RefCell<Option<PathBuf>>,
    natural_size: Cell<(i32, i32)>,
    scale: Cell<f64>,
    cache: RefCell<TextureCache>,
}

impl ImageViewer {
    /// Opens a viewer window, optionally showing `path`.
    pub fn open(app: &Application, path: Option<&Path>) -> Rc<Self> {
        let window = Window::builder()
            .application(app)
            .title("Image Viewer")
            .default_width(800)
            .default_height(600)
            .build();

        let toolbar = GtkBox::new(Orientation::Horizontal, 6);
        toolbar.add_css_class("app-toolbar");
        toolbar.set_margin_top(4);
        toolbar.set_margin_bottom(4);
        toolbar.set_margin_start(4);
        toolbar.set_margin_end(4);

        let picture = Picture::new();
        picture.set_can_shrink(true);
        picture.set_content_fit(ContentFit::Fill);
        picture.set_halign(gtk4::Align::Center);
        picture.set_valign(gtk4::Align::Center);

        let scroller = ScrolledWindow::builder()
            .hscrollbar_policy(PolicyType::Automatic)
            .vscrollbar_policy(PolicyType::Automatic)
            .vexpand(true)
            .child(&picture)
            .build();
        scroller.add_css_class("viewer-canvas");

        let info_label = Label::new(None);
        info_label.add_css_class("viewer-info");
        info_label.set_halign(gtk4::Align::Start);
        info_label.set_margin_start(6);

        let layout = GtkBox::new(Orientation::Vertical, 0);
        layout.append(&toolbar);
        layout.append(&scroller);
        layout.append(&info_label);
        window.set_child(Some(&layout));

        let viewer = Rc::new(Self {
            self_weak: RefCell::new(Weak::new()),
            window,
            picture,
            info_label,
            current: RefCell::new(None),
            natural_size: Cell::new((0, 0)),
            scale: Cell::new(1.0),
            cache: RefCell::new(TextureCache::new(CACHE_MAX_BYTES)),
        });
        *viewer.self_weak.borrow_mut() = Rc::downgrade(&viewer);

        for (label, action) in [
            ("Open", Self::prompt_open as fn(&Self)),
            ("Previous", Self::show_previous),
            ("Next", Self::show_next),
            ("Zoom In", Self::zoom_in),
            ("Zoom Out", Self::zoom_out),
            ("Reset", Self::reset_zoom),
        ] {
            let button = Button::with_label(label);
            let viewer_weak = Rc::downgrade(&viewer);
            button.connect_clicked(move |_| {
                if let Some(viewer) = viewer_weak.upgrade() {
                    action(&viewer);
                }
            });
            toolbar.append(&button);
        }

        viewer.setup_keyboard();

        if let Some(path) = path {
            viewer.show(path);
        }
        viewer.window.present();

        unsafe {
            viewer.window.set_data("image-viewer", viewer.clone());
        }
        viewer.window.connect_close_request(|window| {
            unsafe {
                let _ = window.steal_data::<Rc<ImageViewer>>("image-viewer");
            }
            glib::Propagation::Proceed
        });
        viewer
    }

    fn setup_keyboard(&self) {
        let controller = EventControllerKey::new();
        let viewer_weak = self.self_weak.borrow().clone();
        controller.connect_key_pressed(move |_, keyval, _keycode, _state| {
            let Some(viewer) = viewer_weak.upgrade() else {
                return glib::Propagation::Proceed;
            };
            match keyval {
                Key::Left => viewer.show_previous(),
                Key::Right => viewer.show_next(),
                Key::plus | Key::equal | Key::KP_Add => viewer.zoom_in(),
                Key::minus | Key::KP_Subtract => viewer.zoom_out(),
                Key::_0 | Key::KP_0 => viewer.reset_zoom(),
                _ => return glib::Propagation::Proceed,
            }
            glib::Propagation::Stop
        });
        self.window.add_controller(controller);
    }

    pub fn show(&self, path: &Path) {
        let cached = self.cache.borrow_mut().get(path);
        let texture = match cached {
            Some(texture) => texture,
            None => match load_texture(path) {
                Ok(texture) => {
                    self.cache
                        .borrow_mut()
                        .insert(path.to_path_buf(), texture.clone());
                    texture
                }
                Err(err) => {
                    tracing::warn!(error = ?err, "Failed to load image");
                    dialogs::show_message(
                        Some(&self.window),
                        "Image Error",
                        &format!("Could not open {}", path.display()),
                        || {},
                    );
                    return;
                }
            },
        };

        self.natural_size.set((texture.width(), texture.height()));
        self.picture.set_paintable(Some(&texture));
        *self.current.borrow_mut() = Some(path.to_path_buf());
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.window.set_title(Some(&format!("{name} - Image Viewer")));
        self.set_scale(1.0);
    }

    fn prompt_open(&self) {
        let viewer_weak = self.self_weak.borrow().clone();
        dialogs::choose_file(Some(&self.window), "Open Image", Some(IMAGE_FILES), move |path| {
            if let Some(viewer) = viewer_weak.upgrade() {
                viewer.show(&path);
            }
        });
    }

    fn step(&self, forward: bool) {
        let Some(current) = self.current.borrow().clone() else {
            return;
        };
        if let Some(next) = step_wrapping(&sibling_images(&current), &current, forward) {
            if next != current {
                self.show(&next);
            }
        }
    }

    fn show_previous(&self) {
        self.step(false);
    }

    fn show_next(&self) {
        self.step(true);
    }

    fn zoom_in(&self) {
        self.set_scale(self.scale.get() * ZOOM_STEP);
    }

    fn zoom_out(&self) {
        self.set_scale(self.scale.get() / ZOOM_STEP);
    }

    fn reset_zoom(&self) {
        self.set_scale(1.0);
    }

    fn set_scale(&self, scale: f64) {
        let scale = clamp_scale(scale);
        self.scale.set(scale);
        let (w, h) = self.natural_size.get();
        if w <= 0 || h <= 0 {
            return;
        }
        let scaled_w = ((w as f64) * scale).round().max(1.0) as i32;
        let scaled_h = ((h as f64) * scale).round().max(1.0) as i32;
        self.picture.set_size_request(scaled_w, scaled_h);
        self.info_label
            .set_text(&format!("{}x{}  {:.0}%", w, h, scale * 100.0));
    }
}
