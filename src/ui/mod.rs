pub mod boot;
pub mod dialogs;
pub mod icon_widget;
pub mod keybindings;
pub mod notepad;
pub mod taskbar;
pub mod viewer;
pub mod window;

pub use window::DesktopWindow;
