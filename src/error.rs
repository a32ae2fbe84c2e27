use thiserror::Error;

/// Presentation-generation API errors
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Rate limit exceeded")]
    RateLimited { retry_after: Option<String> },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    #[error("Deck is empty")]
    EmptyDeck,
}
