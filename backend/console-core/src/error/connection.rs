use common::ErrorLocation;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum ConnectionError {
    #[error("Invalid controller endpoint: {message} {location}")]
    InvalidEndpoint {
        message: String,
        location: ErrorLocation,
    },
}
