//! Pure puzzle rules: no I/O, no clocks, no terminal.

pub mod layout;
pub mod position;
pub mod progress;
pub mod rules;
pub mod state;
pub mod tile;
