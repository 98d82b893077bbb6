use reqwest::{header, Method, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::envelope::{Envelope, RefreshTokenData};
use crate::{auth::TokenStore, config::ClientConfig, errors::ClientError};

pub const REFRESH_TOKEN_PATH: &str = "/refresh-token";

/// A backend call described independently of any attempt, so it can be resent.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ClientError> {
        let value = serde_json::to_value(body).map_err(|e| {
            ClientError::Validation(format!("failed to encode request body: {}", e))
        })?;
        self.body = Some(value);
        Ok(self)
    }
}

/// Per-call authentication state. A call is resent at most once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AttemptState {
    Initial,
    Retried,
}

/// HTTP client that attaches the stored access token and silently
/// re-authenticates once when the backend answers 401.
///
/// Concurrent calls that hit 401 at the same time each perform their own
/// refresh; nothing deduplicates them.
#[derive(Clone)]
pub struct TokenizedClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
}

impl std::fmt::Debug for TokenizedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenizedClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl TokenizedClient {
    pub fn new(config: &ClientConfig, tokens: Arc<dyn TokenStore>) -> Result<Self, ClientError> {
        Url::parse(config.base_url()).map_err(|e| {
            ClientError::Config(format!("invalid base URL {}: {}", config.base_url(), e))
        })?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url().to_string(),
            tokens,
        })
    }

    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Send `request`, refreshing the access token once on 401.
    ///
    /// Any non-401 status is returned as-is for the caller to classify.
    ///
    /// # Errors
    ///
    /// * `Network` - the request could not be delivered
    /// * `Auth` - the refresh exchange failed, or the resent request was
    ///   rejected again; stored tokens have been purged in both cases
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn send(&self, request: &ApiRequest) -> Result<Response, ClientError> {
        let mut state = AttemptState::Initial;

        loop {
            let access_token = self.tokens.access_token().await;
            let response = self.dispatch(request, access_token.as_deref()).await?;

            if response.status() != StatusCode::UNAUTHORIZED {
                return Ok(response);
            }

            match state {
                AttemptState::Initial => {
                    debug!("access token rejected; refreshing");
                    self.refresh_access_token().await?;
                    state = AttemptState::Retried;
                }
                AttemptState::Retried => {
                    warn!("request still unauthorized after refresh; purging session");
                    self.purge_tokens().await;
                    return Err(ClientError::Auth(
                        "request unauthorized after token refresh".to_string(),
                    ));
                }
            }
        }
    }

    /// Send and decode the `{data, message}` envelope of a successful response.
    pub async fn request<T: DeserializeOwned>(
        &self,
        request: &ApiRequest,
    ) -> Result<Envelope<T>, ClientError> {
        let response = self.send(request).await?;
        decode_envelope(response).await
    }

    /// Send with a caller-supplied bearer token. No refresh is attempted.
    #[instrument(skip(self, request, bearer), fields(method = %request.method, path = %request.path))]
    pub async fn request_with_bearer<T: DeserializeOwned>(
        &self,
        request: &ApiRequest,
        bearer: &str,
    ) -> Result<Envelope<T>, ClientError> {
        let response = self.dispatch(request, Some(bearer)).await?;
        decode_envelope(response).await
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> Result<Response, ClientError> {
        let mut builder = self
            .http
            .request(request.method.clone(), self.url(&request.path))
            .header(header::ACCEPT, "application/json");

        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        Ok(builder.send().await?)
    }

    async fn refresh_access_token(&self) -> Result<(), ClientError> {
        match self.exchange_refresh_token().await {
            Ok(access_token) => {
                self.tokens.set_access_token(access_token).await?;
                info!("access token refreshed");
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "token refresh failed; purging session");
                self.purge_tokens().await;
                Err(ClientError::Auth(format!("token refresh failed: {}", err)))
            }
        }
    }

    async fn exchange_refresh_token(&self) -> Result<String, ClientError> {
        let refresh_token = self
            .tokens
            .refresh_token()
            .await
            .ok_or_else(|| ClientError::Auth("no refresh token stored".to_string()))?;

        let response = self
            .http
            .post(self.url(REFRESH_TOKEN_PATH))
            .header(header::ACCEPT, "application/json")
            .bearer_auth(refresh_token)
            .send()
            .await?;

        let envelope: Envelope<RefreshTokenData> = decode_envelope(response).await?;
        Ok(envelope.into_data()?.access_token)
    }

    async fn purge_tokens(&self) {
        if let Err(err) = self.tokens.clear().await {
            warn!(error = %err, "failed to purge stored tokens");
        }
    }
}

async fn decode_envelope<T: DeserializeOwned>(
    response: Response,
) -> Result<Envelope<T>, ClientError> {
    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
        return Err(remote_error(status, &body));
    }

    serde_json::from_slice(&body).map_err(|e| {
        ClientError::MalformedResponse(format!("unexpected {} response body: {}", status, e))
    })
}

/// Prefer the backend's `message` field; fall back to the raw body, then the status reason.
fn remote_error(status: StatusCode, body: &[u8]) -> ClientError {
    let text = String::from_utf8_lossy(body).trim().to_string();
    let message = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_owned))
        .filter(|m| !m.is_empty())
        .or_else(|| (!text.is_empty()).then(|| text.clone()))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Error").to_string());

    ClientError::Remote { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_prefers_message_field() {
        let err = remote_error(
            StatusCode::BAD_REQUEST,
            br#"{"message":"insufficient stock"}"#,
        );
        assert!(matches!(
            err,
            ClientError::Remote { status: StatusCode::BAD_REQUEST, ref message } if message == "insufficient stock"
        ));
    }

    #[test]
    fn remote_error_falls_back_to_body_then_reason() {
        let err = remote_error(StatusCode::BAD_GATEWAY, b"upstream down");
        assert!(matches!(err, ClientError::Remote { ref message, .. } if message == "upstream down"));

        let err = remote_error(StatusCode::NOT_FOUND, b"");
        assert!(matches!(err, ClientError::Remote { ref message, .. } if message == "Not Found"));
    }

    #[test]
    fn request_builders_encode_json_body() {
        let request = ApiRequest::put("/cart/update")
            .json(&serde_json::json!({ "cart_product_id": 1, "quantity": 2 }))
            .expect("body should encode");

        assert_eq!(request.method, Method::PUT);
        assert_eq!(
            request.body,
            Some(serde_json::json!({ "cart_product_id": 1, "quantity": 2 }))
        );
    }
}
