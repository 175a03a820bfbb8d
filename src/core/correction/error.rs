use thiserror::Error;

#[derive(Debug, Error)]
pub enum CorrectionError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Config error: {0}")]
    Config(String),
    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),
    #[error("Media engine error: {0}")]
    Media(String),
    #[error("Report serialization error: {0}")]
    Report(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CorrectionError>;
