//! Gmail API client used by the auto-reply worker

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use google_gmail1::api::{Label, Message, ModifyMessageRequest};
use std::io::Cursor;
use std::sync::Arc;
use tracing::debug;

use crate::auth::{GmailHub, MODIFY_SCOPE, SEND_SCOPE};
use crate::error::{GmailError, Result};
use crate::models::{Header, LabelInfo, MessageHeaders, MessageRef};

/// Trait defining the Gmail operations the worker relies on, for easier testing
#[async_trait]
pub trait GmailClient: Send + Sync {
    /// List messages matching a query. Only the first result page is returned.
    async fn list_message_refs(&self, query: &str) -> Result<Vec<MessageRef>>;

    /// Fetch the named headers of a message (`format=metadata`)
    async fn get_message_headers(&self, id: &str, names: &[String]) -> Result<MessageHeaders>;

    /// Send a message given its base64url-encoded RFC 822 form
    async fn send_message(&self, raw: &str) -> Result<()>;

    /// Create a label, returning its ID. An existing name yields [`GmailError::Conflict`].
    async fn create_label(&self, name: &str) -> Result<String>;

    /// List all labels in the account
    async fn list_labels(&self) -> Result<Vec<LabelInfo>>;

    /// Add and remove labels on one message in a single call
    async fn modify_labels(
        &self,
        message_id: &str,
        add_label_ids: &[String],
        remove_label_ids: &[String],
    ) -> Result<()>;
}

/// Gmail client backed by the `google-gmail1` hub
pub struct ProductionGmailClient {
    hub: GmailHub,
}

impl ProductionGmailClient {
    pub fn new(hub: GmailHub) -> Self {
        Self { hub }
    }
}

fn parse_message_headers(id: &str, msg: Message) -> MessageHeaders {
    let headers = msg
        .payload
        .and_then(|p| p.headers)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|h| match (h.name, h.value) {
            (Some(name), Some(value)) => Some(Header { name, value }),
            _ => None,
        })
        .collect();

    MessageHeaders {
        id: msg.id.unwrap_or_else(|| id.to_string()),
        headers,
    }
}

fn optional_ids(ids: &[String]) -> Option<Vec<String>> {
    if ids.is_empty() {
        None
    } else {
        Some(ids.to_vec())
    }
}

#[async_trait]
impl GmailClient for ProductionGmailClient {
    async fn list_message_refs(&self, query: &str) -> Result<Vec<MessageRef>> {
        let (_, response) = self
            .hub
            .users()
            .messages_list("me")
            .q(query)
            .add_scope(MODIFY_SCOPE)
            .doit()
            .await?;

        let refs = response
            .messages
            .unwrap_or_default()
            .into_iter()
            .filter_map(|msg| {
                msg.id.map(|id| MessageRef {
                    id,
                    thread_id: msg.thread_id,
                })
            })
            .collect();

        Ok(refs)
    }

    async fn get_message_headers(&self, id: &str, names: &[String]) -> Result<MessageHeaders> {
        let mut call = self.hub.users().messages_get("me", id).format("metadata");
        for name in names {
            call = call.add_metadata_headers(name);
        }

        let (_, msg) = call.add_scope(MODIFY_SCOPE).doit().await?;
        Ok(parse_message_headers(id, msg))
    }

    async fn send_message(&self, raw: &str) -> Result<()> {
        // The hub only exposes messages.send as a media upload, so the
        // encoded message goes back to its RFC 822 bytes on the wire.
        let rfc822 = URL_SAFE_NO_PAD.decode(raw).map_err(|e| {
            GmailError::InvalidMessageFormat(format!("Reply is not valid base64url: {}", e))
        })?;
        let mime_type: mime::Mime = "message/rfc822"
            .parse()
            .map_err(|e| GmailError::Unknown(format!("Invalid MIME type: {}", e)))?;

        let (_, sent) = self
            .hub
            .users()
            .messages_send(Message::default(), "me")
            .add_scope(SEND_SCOPE)
            .upload(Cursor::new(rfc822), mime_type)
            .await?;

        debug!("Sent message {}", sent.id.unwrap_or_default());
        Ok(())
    }

    async fn create_label(&self, name: &str) -> Result<String> {
        let label = Label {
            name: Some(name.to_string()),
            message_list_visibility: Some("show".to_string()),
            label_list_visibility: Some("labelShow".to_string()),
            ..Default::default()
        };

        let (_, created_label) = self
            .hub
            .users()
            .labels_create(label, "me")
            .add_scope(MODIFY_SCOPE)
            .doit()
            .await?;

        created_label
            .id
            .ok_or_else(|| GmailError::LabelError("Created label has no ID".to_string()))
    }

    async fn list_labels(&self) -> Result<Vec<LabelInfo>> {
        let (_, response) = self
            .hub
            .users()
            .labels_list("me")
            .add_scope(MODIFY_SCOPE)
            .doit()
            .await?;

        let labels: Vec<LabelInfo> = response
            .labels
            .unwrap_or_default()
            .into_iter()
            .filter_map(|label| match (label.id, label.name) {
                (Some(id), Some(name)) => Some(LabelInfo { id, name }),
                _ => None,
            })
            .collect();

        debug!("Successfully parsed {} labels", labels.len());
        Ok(labels)
    }

    async fn modify_labels(
        &self,
        message_id: &str,
        add_label_ids: &[String],
        remove_label_ids: &[String],
    ) -> Result<()> {
        let modify_request = ModifyMessageRequest {
            add_label_ids: optional_ids(add_label_ids),
            remove_label_ids: optional_ids(remove_label_ids),
        };

        self.hub
            .users()
            .messages_modify(modify_request, "me", message_id)
            .add_scope(MODIFY_SCOPE)
            .doit()
            .await?;

        Ok(())
    }
}

// Implement GmailClient for Arc<T> to allow shared ownership
#[async_trait]
impl<T: GmailClient + ?Sized> GmailClient for Arc<T> {
    async fn list_message_refs(&self, query: &str) -> Result<Vec<MessageRef>> {
        self.as_ref().list_message_refs(query).await
    }

    async fn get_message_headers(&self, id: &str, names: &[String]) -> Result<MessageHeaders> {
        self.as_ref().get_message_headers(id, names).await
    }

    async fn send_message(&self, raw: &str) -> Result<()> {
        self.as_ref().send_message(raw).await
    }

    async fn create_label(&self, name: &str) -> Result<String> {
        self.as_ref().create_label(name).await
    }

    async fn list_labels(&self) -> Result<Vec<LabelInfo>> {
        self.as_ref().list_labels().await
    }

    async fn modify_labels(
        &self,
        message_id: &str,
        add_label_ids: &[String],
        remove_label_ids: &[String],
    ) -> Result<()> {
        self.as_ref()
            .modify_labels(message_id, add_label_ids, remove_label_ids)
            .await
    }
}
