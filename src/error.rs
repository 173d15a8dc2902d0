//! Error types for decoding, encoding, and ignored edits.

use thiserror::Error;

/// The external decoder could not produce a pixel buffer.
///
/// This is the only failure the engine reports to its caller; a failed load
/// leaves the editor exactly as it was.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The decoded image has a zero dimension.
    #[error("Decoded image is empty ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    /// The decoded image is past the pixel limit.
    #[error("Decoded image is too large ({width}x{height})")]
    TooLarge { width: u32, height: u32 },

    /// The background decode worker went away without sending a result.
    #[error("Decode worker disconnected before producing a result")]
    WorkerDisconnected,
}

/// Export failures.
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No image loaded")]
    NoImageLoaded,
}

/// Why an edit was ignored.
///
/// The editor never returns these from its mutating methods: every one of
/// them is a silent no-op at the API boundary. They exist so the reason can be
/// logged, and so the CLI can reject a malformed recipe step up front.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditError {
    #[error("No image loaded")]
    NoImageLoaded,

    #[error("Invalid transform argument: {0}")]
    InvalidTransformArgument(String),

    #[error("Nothing to {0}")]
    EmptyHistory(&'static str),

    #[error("No crop in progress")]
    NoActiveCrop,

    #[error("Invalid edit step '{step}': {reason}")]
    InvalidStep { step: String, reason: String },
}

pub type Result<T> = std::result::Result<T, DecodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = DecodeError::EmptyImage { width: 0, height: 12 };
        assert_eq!(err.to_string(), "Decoded image is empty (0x12)");

        let err = EditError::EmptyHistory("undo");
        assert_eq!(err.to_string(), "Nothing to undo");

        let err = EditError::InvalidStep {
            step: "resize=axb".to_string(),
            reason: "expected WxH".to_string(),
        };
        assert!(err.to_string().contains("resize=axb"));
        assert!(err.to_string().contains("expected WxH"));
    }
}
