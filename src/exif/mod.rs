//! Embedded photo metadata extraction.
//!
//! [`extract`] flattens every EXIF tag of an image into ordered
//! `(tag name, display value)` pairs, pulling pixel dimensions out into a
//! separate field. Images without metadata are not an error.

mod reader;

pub use reader::{Dimensions, ExtractedMetadata, extract};

#[cfg(test)]
pub(crate) use reader::tests as fixtures;

/// Failure to make sense of an image's bytes.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The bytes are not any image container we recognize.
    #[error("unrecognized image data: {0}")]
    Unrecognized(String),
}
