pub mod codec;
pub mod connection;
pub mod logger;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Codec(#[from] codec::CodecError),

    #[error(transparent)]
    Connection(#[from] connection::ConnectionError),

    #[error(transparent)]
    Logger(#[from] logger::LoggerError),
}
