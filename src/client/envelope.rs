use serde::{Deserialize, Serialize};

use crate::errors::ClientError;

/// Standard response wrapper used by every backend endpoint: `{ "data": ..., "message": ... }`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    /// The payload, or `MalformedResponse` when the backend left it out.
    pub fn into_data(self) -> Result<T, ClientError> {
        self.data
            .ok_or_else(|| ClientError::MalformedResponse("response has no data field".into()))
    }
}

/// Payload of `POST /refresh-token`.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct RefreshTokenData {
    pub access_token: String,
}
