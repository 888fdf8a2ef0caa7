//! Individual lint checks

pub mod flow;
pub mod media;
pub mod timing;
