//! Shared leaf types for the pager console workspace.
//!
//! This crate contains pure data structures with no business logic.
//! `console-core` builds the session engine on top of them.

pub mod error;
pub mod redacted_credential;

pub use error::error_location::ErrorLocation;
pub use error::redact_error::RedactError;
pub use redacted_credential::RedactedCredential;
