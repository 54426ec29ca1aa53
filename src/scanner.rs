//! Unread-inbox scanning

use std::sync::Arc;

use crate::client::GmailClient;
use crate::error::Result;
use crate::models::MessageRef;
use tracing::debug;

/// Gmail search for messages still waiting on a reply
pub const UNREPLIED_QUERY: &str = "in:inbox is:unread";

/// Queries the mailbox for messages that have not been replied to yet
pub struct MessageScanner {
    client: Arc<dyn GmailClient>,
    query: String,
}

impl MessageScanner {
    pub fn new(client: Arc<dyn GmailClient>, query: impl Into<String>) -> Self {
        Self {
            client,
            query: query.into(),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Unread inbox messages, in the order Gmail returns them.
    ///
    /// Only the first result page is read; anything beyond it is picked up
    /// on a later tick once earlier messages have left the inbox.
    pub async fn list_unreplied(&self) -> Result<Vec<MessageRef>> {
        let messages = self.client.list_message_refs(&self.query).await?;
        debug!("Query '{}' matched {} messages", self.query, messages.len());
        Ok(messages)
    }
}
