pub mod physics;
pub mod slot_table;
pub mod time;
