//! Persisted OAuth2 credential storage

use google_gmail1::yup_oauth2;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use yup_oauth2::authorized_user::AuthorizedUserSecret;
use yup_oauth2::ApplicationSecret;

use crate::error::{GmailError, Result};

/// `type` value written to the token file
pub const AUTHORIZED_USER: &str = "authorized_user";

/// Long-lived credential derived from the consent flow
///
/// Serialized as `{"type", "client_id", "client_secret", "refresh_token"}`,
/// the same shape Google tooling uses for authorized-user credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredential {
    #[serde(rename = "type")]
    pub kind: String,
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl StoredCredential {
    pub fn authorized_user(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            kind: AUTHORIZED_USER.to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            refresh_token: refresh_token.into(),
        }
    }

    pub fn to_authorized_user_secret(&self) -> AuthorizedUserSecret {
        AuthorizedUserSecret {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            refresh_token: self.refresh_token.clone(),
            key_type: self.kind.clone(),
        }
    }
}

/// Reads and writes the persisted token file
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted credential
    ///
    /// A missing, unreadable or malformed file all yield `None`, which sends
    /// the caller back through the consent flow.
    pub async fn load(&self) -> Option<StoredCredential> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No token file at {:?}", self.path);
                return None;
            }
            Err(e) => {
                warn!("Could not read token file {:?}: {}", self.path, e);
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(credential) => Some(credential),
            Err(e) => {
                warn!("Ignoring malformed token file {:?}: {}", self.path, e);
                None
            }
        }
    }

    /// Persist the credential, creating parent directories as needed
    pub async fn save(&self, credential: &StoredCredential) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_string(credential)?;

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&self.path).await?;
        // An existing file keeps its old mode on open, so tighten it before writing
        secure_token_file(&self.path).await?;
        file.write_all(json.as_bytes()).await?;
        file.flush().await?;

        debug!("Saved credential to {:?}", self.path);
        Ok(())
    }

    /// Remove the persisted credential if present
    pub async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Load the application client credentials (`installed` or `web` key)
pub async fn load_client_secret(path: &Path) -> Result<ApplicationSecret> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        GmailError::AuthError(format!("Failed to read credentials {:?}: {}", path, e))
    })?;

    yup_oauth2::parse_application_secret(content)
        .map_err(|e| GmailError::AuthError(format!("Failed to parse credentials: {}", e)))
}

/// Secure token file permissions on Unix systems
///
/// Sets file permissions to 0600 (read/write for owner only)
#[cfg(unix)]
pub async fn secure_token_file(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = tokio::fs::metadata(path).await?.permissions();
    perms.set_mode(0o600);
    tokio::fs::set_permissions(path, perms).await?;
    Ok(())
}

/// Windows uses ACLs, so there is nothing to tighten here
#[cfg(windows)]
pub async fn secure_token_file(_path: &Path) -> Result<()> {
    Ok(())
}
