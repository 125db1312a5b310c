use std::io;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("dispatcher is no longer running")]
    Disconnected,

    #[error("configuration error: {0}")]
    Config(String),
}
