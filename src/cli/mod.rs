//! Terminal front end: interactive player and sequence checks

pub mod check;
pub mod play;
