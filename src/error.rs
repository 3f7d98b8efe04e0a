use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Task not found: {0}")]
    NotFound(u32),

    #[error("Cannot pop from empty {0}")]
    EmptyStructure(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl TrackerError {
    /// Builds an `Io` error for a data file whose contents cannot be trusted.
    pub fn corrupt(message: impl Into<String>) -> Self {
        TrackerError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            message.into(),
        ))
    }

    /// Builds an `Io` error for a data file that ends before its declared contents.
    pub fn truncated(message: impl Into<String>) -> Self {
        TrackerError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            message.into(),
        ))
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;
