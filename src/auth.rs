//! OAuth2 authorization for the Gmail API

use async_trait::async_trait;
use google_gmail1::{hyper_rustls, hyper_util, yup_oauth2, Gmail};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use yup_oauth2::storage::{TokenInfo, TokenStorage};
use yup_oauth2::ApplicationSecret;

use crate::error::{GmailError, Result};
use crate::token_store::{load_client_secret, StoredCredential, TokenStore};

/// Read/write access to messages and labels
pub const MODIFY_SCOPE: &str = "https://www.googleapis.com/auth/gmail.modify";

/// Permission to send mail
pub const SEND_SCOPE: &str = "https://www.googleapis.com/auth/gmail.send";

/// Scopes requested during the consent flow
pub const REQUIRED_SCOPES: &[&str] = &[MODIFY_SCOPE, SEND_SCOPE];

/// Type alias for Gmail Hub to simplify type signatures
pub type GmailHub =
    Gmail<hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>>;

/// Obtains a usable credential, from disk or through interactive consent
pub struct Authorizer {
    credentials_path: PathBuf,
    store: TokenStore,
}

impl Authorizer {
    /// # Arguments
    /// * `credentials_path` - OAuth2 client credentials (`installed` or `web`)
    /// * `store` - where the derived long-lived credential is persisted
    pub fn new(credentials_path: impl Into<PathBuf>, store: TokenStore) -> Self {
        Self {
            credentials_path: credentials_path.into(),
            store,
        }
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    /// Return the persisted credential if one parses, otherwise run consent.
    ///
    /// The stored refresh token is not validated here; a revoked token
    /// surfaces on the first API call.
    pub async fn authorize(&self) -> Result<StoredCredential> {
        if let Some(credential) = self.store.load().await {
            info!("Using stored credential from {:?}", self.store.path());
            return Ok(credential);
        }

        self.consent().await
    }

    /// Run the consent flow unconditionally and persist its result
    pub async fn consent(&self) -> Result<StoredCredential> {
        let secret = load_client_secret(&self.credentials_path).await?;

        info!("No usable stored credential, starting consent flow");
        let refresh_token = run_consent_flow(secret.clone()).await?;

        let credential =
            StoredCredential::authorized_user(secret.client_id, secret.client_secret, refresh_token);
        self.store.save(&credential).await?;

        info!("Credential saved to {:?}", self.store.path());
        Ok(credential)
    }
}

/// Token storage that only remembers the last token it was handed.
/// Lets the consent flow's refresh token be read back out of the authenticator.
#[derive(Clone, Default)]
struct CapturedToken {
    token: Arc<Mutex<Option<TokenInfo>>>,
}

impl CapturedToken {
    fn refresh_token(&self) -> Option<String> {
        self.token
            .lock()
            .ok()?
            .as_ref()
            .and_then(|t| t.refresh_token.clone())
    }
}

#[async_trait]
impl TokenStorage for CapturedToken {
    async fn set(&self, _scopes: &[&str], token: TokenInfo) -> anyhow::Result<()> {
        let mut slot = self
            .token
            .lock()
            .map_err(|_| anyhow::anyhow!("token capture lock poisoned"))?;
        *slot = Some(token);
        Ok(())
    }

    async fn get(&self, _scopes: &[&str]) -> Option<TokenInfo> {
        self.token.lock().ok()?.clone()
    }
}

/// Installed-app flow with a local redirect listener; returns the refresh token
async fn run_consent_flow(secret: ApplicationSecret) -> Result<String> {
    let captured = CapturedToken::default();

    // HTTPRedirect opens a browser for user authorization
    let auth = yup_oauth2::InstalledFlowAuthenticator::builder(
        secret,
        yup_oauth2::InstalledFlowReturnMethod::HTTPRedirect,
    )
    .with_storage(Box::new(captured.clone()))
    .build()
    .await
    .map_err(|e| GmailError::AuthError(format!("Failed to build authenticator: {}", e)))?;

    auth.token(REQUIRED_SCOPES)
        .await
        .map_err(|e| GmailError::AuthError(format!("Consent flow failed: {}", e)))?;

    captured.refresh_token().ok_or_else(|| {
        warn!("Consent flow completed without issuing a refresh token");
        GmailError::AuthError("Consent flow did not return a refresh token".to_string())
    })
}

/// Build a Gmail API hub from a stored authorized-user credential
///
/// Access tokens are minted from the refresh token on demand.
pub async fn build_hub(credential: &StoredCredential) -> Result<GmailHub> {
    let auth = yup_oauth2::AuthorizedUserAuthenticator::builder(
        credential.to_authorized_user_secret(),
    )
    .build()
    .await
    .map_err(|e| GmailError::AuthError(format!("Failed to build authenticator: {}", e)))?;

    // Use HTTP/1 for compatibility (HTTP/1 works better with google-gmail1)
    let client = hyper_util::client::legacy::Client::builder(hyper_util::rt::TokioExecutor::new())
        .build(
            hyper_rustls::HttpsConnectorBuilder::new()
                .with_native_roots()
                .map_err(|e| GmailError::AuthError(format!("Failed to load TLS roots: {}", e)))?
                .https_or_http()
                .enable_http1()
                .build(),
        );

    Ok(Gmail::new(client, auth))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_scopes_constants() {
        assert_eq!(REQUIRED_SCOPES.len(), 2);
        assert!(REQUIRED_SCOPES.contains(&"https://www.googleapis.com/auth/gmail.modify"));
        assert!(REQUIRED_SCOPES.contains(&"https://www.googleapis.com/auth/gmail.send"));
    }

    #[tokio::test]
    async fn test_authorize_returns_stored_credential_unchanged() {
        let dir = tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        let stored = StoredCredential::authorized_user("id", "secret", "1//stale-but-unchecked");
        store.save(&stored).await.unwrap();

        // No credentials file exists, so reaching the consent flow would fail
        let authorizer = Authorizer::new(dir.path().join("credentials.json"), store);
        let credential = authorizer.authorize().await.unwrap();

        assert_eq!(credential, stored);
    }

    #[tokio::test]
    async fn test_authorize_without_token_or_credentials_fails() {
        let dir = tempdir().unwrap();
        let authorizer = Authorizer::new(
            dir.path().join("credentials.json"),
            TokenStore::new(dir.path().join("token.json")),
        );

        let err = authorizer.authorize().await.unwrap_err();
        assert!(matches!(err, GmailError::AuthError(_)));
    }

    #[tokio::test]
    async fn test_captured_token_keeps_refresh_token() {
        let captured = CapturedToken::default();
        assert_eq!(captured.refresh_token(), None);

        let token = TokenInfo {
            access_token: Some("ya29.access".to_string()),
            refresh_token: Some("1//refresh".to_string()),
            expires_at: None,
            id_token: None,
        };
        captured.set(REQUIRED_SCOPES, token).await.unwrap();

        assert_eq!(captured.refresh_token().as_deref(), Some("1//refresh"));
        assert!(captured.get(REQUIRED_SCOPES).await.is_some());
    }
}
