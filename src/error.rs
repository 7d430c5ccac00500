use tessera::PuzzleError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Puzzle error: {0}")]
    Puzzle(#[from] PuzzleError),

    #[error("Missing resource: {0}")]
    ResourceMissing(String),

    #[error("PNG decode error: {0}")]
    ImageDecode(String),

    #[error("PNG encode error: {0}")]
    ImageEncode(String),

    #[error("Invalid sidecar: {0}")]
    Sidecar(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
