pub mod auto_layout;
pub mod desktop_layout;

pub use auto_layout::AutoLayout;
pub use desktop_layout::build_layout;
