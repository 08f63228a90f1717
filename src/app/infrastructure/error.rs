use thiserror::Error;

#[derive(Error, Debug)]
pub enum BionicError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Markup error at byte {position}: {message}")]
    Markup { position: u64, message: String },

    #[error("Preferences error: {0}")]
    Preferences(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl BionicError {
    pub fn markup(position: u64, message: impl Into<String>) -> Self {
        Self::Markup {
            position,
            message: message.into(),
        }
    }
}

/// Convenience type alias for Results with BionicError
pub type Result<T> = std::result::Result<T, BionicError>;
