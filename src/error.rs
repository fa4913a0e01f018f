use thiserror::Error;

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("no signed-in user")]
    Auth,
    #[error("protected column: {0}")]
    Protected(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("remote read error: {0}")]
    RemoteRead(String),
    #[error("remote write error: {0}")]
    RemoteWrite(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, BoardError>;
