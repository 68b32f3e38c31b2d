pub mod effects;
pub mod event;
pub mod save;
pub mod step;
pub mod world;
