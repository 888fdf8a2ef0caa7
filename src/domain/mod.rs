//! Domain layer - Stages, sequences and the contracts of their collaborators
//!
//! Nothing in here knows about files, terminals or clocks.

pub mod entities;
pub mod errors;
pub mod repositories;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use repositories::*;
pub use value_objects::*;
