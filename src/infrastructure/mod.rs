//! Infrastructure layer - Adapters for files, documents and media
//!
//! This layer contains implementations of the domain traits that deal with
//! external concerns like the file system and audio output.

pub mod flags;
pub mod media;
pub mod sequence_document;

pub use flags::*;
pub use media::*;
pub use sequence_document::*;
