use common::ErrorLocation;
use thiserror::Error as ThisError;

/// Errors from the envelope codec.
///
/// None of these are fatal: the connection layer reports them on the
/// log path and keeps the link alive. The controller firmware may
/// evolve independently of the console, so an unreadable or unknown
/// envelope must never tear the session down.
#[derive(Debug, ThisError)]
pub enum CodecError {
    /// Unparsable text, wrong envelope shape (zero or multiple keys),
    /// or a payload that does not fit the variant.
    #[error("Malformed envelope ({reason}): {raw} {location}")]
    MalformedEnvelope {
        raw: String,
        reason: String,
        location: ErrorLocation,
    },

    /// Well-formed envelope with a tag this console does not know.
    #[error("Unknown envelope variant: {tag} {location}")]
    UnknownVariant {
        tag: String,
        location: ErrorLocation,
    },

    #[error("Failed to encode request: {message} {location}")]
    Encode {
        message: String,
        location: ErrorLocation,
    },
}
