use http::StatusCode;
use serde::Serialize;

/// Errors surfaced by the storefront client.
///
/// The variants mirror how a failure should be presented to a shopper:
/// transport problems, an expired session, a business error reported by the
/// backend, or data that could not be trusted at the network boundary.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Remote error ({status}): {message}")]
    Remote { status: StatusCode, message: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Token store error: {0}")]
    TokenStore(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::MalformedResponse(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

impl From<validator::ValidationErrors> for ClientError {
    fn from(err: validator::ValidationErrors) -> Self {
        ClientError::Validation(err.to_string())
    }
}

impl ClientError {
    /// Returns the status code reported in the uniform response shape.
    /// Failures that never reached the backend report 500, as the storefront always has.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Remote { status, .. } => *status,
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
            Self::Network(_) | Self::Config(_) | Self::TokenStore(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message suitable for a toast notification.
    pub fn user_message(&self) -> String {
        match self {
            Self::Remote { message, .. } => message.clone(),
            Self::Network(_) => "An unexpected error occurred".to_string(),
            Self::Auth(_) => "Your session has expired, please log in again".to_string(),
            _ => self.to_string(),
        }
    }

    /// True when stored credentials were purged and the caller should send the user to login.
    pub fn requires_login(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}

/// Uniform result shape handed to presentation code.
///
/// Callers that prefer not to match on [`ClientError`] can convert any
/// service result into this flat form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse<T> {
    pub error: bool,
    pub data: Option<T>,
    pub message: String,
    pub code: u16,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            error: false,
            data: Some(data),
            message: StatusCode::OK
                .canonical_reason()
                .unwrap_or("OK")
                .to_string(),
            code: StatusCode::OK.as_u16(),
        }
    }

    pub fn failure(err: &ClientError) -> Self {
        Self {
            error: true,
            data: None,
            message: err.user_message(),
            code: err.status_code().as_u16(),
        }
    }
}

impl<T> From<Result<T, ClientError>> for ApiResponse<T> {
    fn from(result: Result<T, ClientError>) -> Self {
        match result {
            Ok(data) => ApiResponse::success(data),
            Err(err) => ApiResponse::failure(&err),
        }
    }
}
