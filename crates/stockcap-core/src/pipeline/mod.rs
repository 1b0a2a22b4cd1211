//! Image captioning pipeline components.
//!
//! This module contains all the stages of the captioning pipeline:
//! - **discovery**: Find image files in a folder
//! - **validate**: Pre-processing validation
//! - **decode**: Load and decode images from various formats
//! - **processor**: Caption, title and keywords for a single image
//! - **batch**: Bounded fan-out of the processor over many files
//! - **hash**: BLAKE3 hashing for downloaded model files

pub mod batch;
pub mod decode;
pub mod discovery;
pub mod hash;
pub mod processor;
pub mod validate;

// Re-exports for convenient access
pub use batch::{BatchReport, BatchRunner};
pub use decode::{DecodedImage, ImageDecoder};
pub use discovery::{DiscoveredFile, FileDiscovery};
pub use hash::Hasher;
pub use processor::{summarize_title, ImageProcessor};
pub use validate::Validator;
