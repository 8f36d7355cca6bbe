/// Error types shared by the galaxy crates
use thiserror::Error;

/// Main error type for the core library
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid value for `{field}`: {message}")]
    InvalidConfig { field: String, message: String },

    #[error("Invalid colour: {0}")]
    Color(String),

    #[error("STL error: {0}")]
    Stl(String),

    #[error("Failed to load resource `{name}`: {message}")]
    Resource { name: String, message: String },

    #[error("Configuration parse error: {0}")]
    ConfigParse(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        CoreError::InvalidConfig {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
