use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tauri error: {0}")]
    Tauri(#[from] tauri::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Prompt error: {0}")]
    Prompt(String),
}

impl AppError {
    /// Short label shown in the tray tooltip next to the error glyph
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Network(_) => "network",
            AppError::Api { .. } => "api",
            AppError::Decode(_) => "decode",
            AppError::Io(_) => "io",
            AppError::Tauri(_) => "tray",
            AppError::Config(_) => "config",
            AppError::Prompt(_) => "prompt",
        }
    }
}

// Implement alias for Result to simplify usage
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_message() {
        let err = AppError::Api {
            status: 401,
            body: "unauthorized".to_string(),
        };
        assert_eq!(err.to_string(), "API returned status 401: unauthorized");
        assert_eq!(err.kind(), "api");
    }
}
