pub mod icon_entry;
pub mod position_table;

pub use icon_entry::{IconEntry, IconPart, Point};
pub use position_table::PositionTable;
