//! One module per kind of source. Each returns an [`ExtractionResult`]
//! rather than an error for every expected failure.
//!
//! [`ExtractionResult`]: crate::model::ExtractionResult

pub mod image;
pub mod slideshow;
pub mod video;
pub mod website;

pub use video::VideoPipeline;
