//! Creation and application of the "already replied" label
use std::sync::Arc;

use crate::client::GmailClient;
use crate::error::{GmailError, Result};
use tracing::{debug, info};

/// System label removed from processed messages
pub const INBOX_LABEL: &str = "INBOX";

/// Manages the single well-known label that marks auto-replied messages
pub struct LabelManager {
    client: Arc<dyn GmailClient>,
    label_name: String,
    label_id: Option<String>, // resolved once per process
}

impl LabelManager {
    pub fn new(client: Arc<dyn GmailClient>, label_name: impl Into<String>) -> Self {
        Self {
            client,
            label_name: label_name.into(),
            label_id: None,
        }
    }

    pub fn label_name(&self) -> &str {
        &self.label_name
    }

    /// ID resolved by a previous [`LabelManager::ensure_label`] call
    pub fn label_id(&self) -> Option<&str> {
        self.label_id.as_deref()
    }

    /// Ensure the label exists and return its ID
    ///
    /// Creation is attempted first. If Gmail reports a conflict the existing
    /// label is looked up by exact name. Any other error is returned as is.
    pub async fn ensure_label(&mut self) -> Result<String> {
        if let Some(id) = &self.label_id {
            return Ok(id.clone());
        }

        let id = match self.client.create_label(&self.label_name).await {
            Ok(id) => {
                info!("Created label '{}' with ID: {}", self.label_name, id);
                id
            }
            Err(e) if e.is_conflict() => {
                debug!("Label '{}' already exists, looking it up", self.label_name);
                self.find_existing().await?
            }
            Err(e) => return Err(e),
        };

        self.label_id = Some(id.clone());
        Ok(id)
    }

    async fn find_existing(&self) -> Result<String> {
        let labels = self.client.list_labels().await?;

        labels
            .into_iter()
            .find(|label| label.name == self.label_name)
            .map(|label| {
                info!("Using existing label '{}' ({})", label.name, label.id);
                label.id
            })
            .ok_or_else(|| {
                GmailError::LabelError(format!(
                    "Label '{}' reported as existing but not found in label list",
                    self.label_name
                ))
            })
    }

    /// Add `label_id` to a message and take it out of the inbox, in one call
    pub async fn apply_label(&self, message_id: &str, label_id: &str) -> Result<()> {
        self.client
            .modify_labels(
                message_id,
                &[label_id.to_string()],
                &[INBOX_LABEL.to_string()],
            )
            .await
    }
}
