use thiserror::Error;

/// Failure reported by the remote catalog or the transport underneath it.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Resource not found at {url}: {body}")]
    NotFound { url: String, body: String },

    #[error("Rate limited by {url}")]
    RateLimited { url: String },

    #[error("Server error from {url}: {body}")]
    ServerError { url: String, body: String },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response from {url}: {detail}")]
    InvalidResponse { url: String, detail: String },
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(url: &str, status: reqwest::StatusCode, body: &str) -> Self {
        let url = url.to_string();
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            404 => ApiError::NotFound { url, body: truncated },
            429 => ApiError::RateLimited { url },
            500..=599 => ApiError::ServerError { url, body: truncated },
            _ => ApiError::InvalidResponse {
                url,
                detail: format!("Status {}: {}", status, truncated),
            },
        }
    }
}
