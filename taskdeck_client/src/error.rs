use thiserror::Error;

/// Shown when a request never got an answer from the server.
pub const UNEXPECTED_ERROR: &str = "An unexpected error occurred";

/// Failure of a call made through [`ApiClient`](crate::api::ApiClient).
#[derive(Error, Debug)]
pub enum ClientError {
    /// No session token; nothing was sent.
    #[error("No auth token found")]
    NoCredentials,

    /// The server answered 401. The session has already been ended.
    #[error("{}", .0.as_deref().unwrap_or("Not authorized, please log in again"))]
    Unauthorized(Option<String>),

    #[error("{}", .0.as_deref().unwrap_or("Not found"))]
    NotFound(Option<String>),

    #[error("{}", .message.as_deref().unwrap_or("Request failed"))]
    Rejected { status: u16, message: Option<String> },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl ClientError {
    /// The `message` the server put in its error body, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ClientError::Unauthorized(message)
            | ClientError::NotFound(message)
            | ClientError::Rejected { message, .. } => message.as_deref(),
            ClientError::NoCredentials | ClientError::Network(_) => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized(_))
    }
}
