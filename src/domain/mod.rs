pub mod board;
pub mod gravity;
pub mod hint;
pub mod matcher;
pub mod tile;
