pub mod achievements;
pub mod catalog;
pub mod event;
pub mod history;
pub mod save;
pub mod step;
pub mod world;
