//! Error type shared by every editing operation.
//!
//! Every variant is recoverable: an operation that fails leaves the session
//! exactly as it was before the call.

use thiserror::Error;

use crate::modules::image_edit::LayerId;

pub type Result<T> = std::result::Result<T, EditorError>;

#[derive(Error, Debug)]
pub enum EditorError {
    /// The input bytes could not be rasterized (corrupt or unsupported format).
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    /// The surface could not be written in the requested format.
    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("layer {0} not found")]
    NotFound(LayerId),

    /// A parameter was outside the range the operation accepts.
    #[error("invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("no active layer")]
    NoActiveLayer,

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("nothing to redo")]
    NothingToRedo,
}

impl EditorError {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation { field, message: message.into() }
    }
}
