use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::debug;

use crate::errors::ClientError;

/// Access/refresh token pair issued at login.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            refresh_token: Some(refresh_token.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

/// Durable home of the session tokens.
///
/// Implementations must be safe to share between concurrent requests; each
/// call observes the latest completed write.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn access_token(&self) -> Option<String>;

    async fn refresh_token(&self) -> Option<String>;

    /// Replace the access token, keeping the refresh token.
    async fn set_access_token(&self, token: String) -> Result<(), ClientError>;

    async fn set_tokens(&self, tokens: TokenPair) -> Result<(), ClientError>;

    /// Purge both tokens.
    async fn clear(&self) -> Result<(), ClientError>;
}

#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    tokens: RwLock<TokenPair>,
}

impl InMemoryTokenStore {
    pub fn new(tokens: TokenPair) -> Self {
        Self {
            tokens: RwLock::new(tokens),
        }
    }

    pub async fn snapshot(&self) -> TokenPair {
        self.tokens.read().await.clone()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn access_token(&self) -> Option<String> {
        self.tokens.read().await.access_token.clone()
    }

    async fn refresh_token(&self) -> Option<String> {
        self.tokens.read().await.refresh_token.clone()
    }

    async fn set_access_token(&self, token: String) -> Result<(), ClientError> {
        self.tokens.write().await.access_token = Some(token);
        Ok(())
    }

    async fn set_tokens(&self, tokens: TokenPair) -> Result<(), ClientError> {
        *self.tokens.write().await = tokens;
        Ok(())
    }

    async fn clear(&self) -> Result<(), ClientError> {
        *self.tokens.write().await = TokenPair::default();
        Ok(())
    }
}

/// Token store backed by a JSON session file.
///
/// The file is rewritten on every change and removed when the session is
/// cleared. Reads are served from memory after [`FileTokenStore::open`].
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    tokens: RwLock<TokenPair>,
}

impl FileTokenStore {
    /// Open the session at `path`; a missing file yields an empty session.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, ClientError> {
        let path = path.into();
        let tokens = match tokio::fs::read_to_string(&path).await {
            Ok(data) => serde_json::from_str(&data).map_err(|e| {
                ClientError::TokenStore(format!(
                    "failed to parse session file {}: {}",
                    path.display(),
                    e
                ))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => TokenPair::default(),
            Err(e) => {
                return Err(ClientError::TokenStore(format!(
                    "failed to read session file {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        Ok(Self {
            path,
            tokens: RwLock::new(tokens),
        })
    }

    async fn persist(&self, tokens: &TokenPair) -> Result<(), ClientError> {
        if tokens.is_empty() {
            return self.remove_file().await;
        }

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                ClientError::TokenStore(format!(
                    "failed creating directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let payload = serde_json::to_vec_pretty(tokens)
            .map_err(|e| ClientError::TokenStore(e.to_string()))?;
        tokio::fs::write(&self.path, payload).await.map_err(|e| {
            ClientError::TokenStore(format!("failed writing {}: {}", self.path.display(), e))
        })?;

        debug!(path = %self.path.display(), "session file written");
        Ok(())
    }

    async fn remove_file(&self) -> Result<(), ClientError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ClientError::TokenStore(format!(
                "failed to remove {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn access_token(&self) -> Option<String> {
        self.tokens.read().await.access_token.clone()
    }

    async fn refresh_token(&self) -> Option<String> {
        self.tokens.read().await.refresh_token.clone()
    }

    async fn set_access_token(&self, token: String) -> Result<(), ClientError> {
        let mut tokens = self.tokens.write().await;
        tokens.access_token = Some(token);
        self.persist(&tokens).await
    }

    async fn set_tokens(&self, tokens: TokenPair) -> Result<(), ClientError> {
        let mut current = self.tokens.write().await;
        *current = tokens;
        self.persist(&current).await
    }

    async fn clear(&self) -> Result<(), ClientError> {
        let mut current = self.tokens.write().await;
        *current = TokenPair::default();
        self.remove_file().await
    }
}
