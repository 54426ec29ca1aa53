//! Canned reply construction and sending

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::debug;

use crate::client::GmailClient;
use crate::config::ReplyConfig;
use crate::error::{GmailError, Result};
use crate::models::MessageRef;

/// Prefix marking a subject as a reply
pub const REPLY_PREFIX: &str = "Re:";

static ANGLE_ADDRESS: Lazy<Regex> = Lazy::new(|| Regex::new(r"<(.*)>").unwrap());

/// Address between the angle brackets of a `From` header
///
/// `"Name <addr>"` yields `addr`. A header without brackets is rejected.
pub fn extract_reply_address(from: &str) -> Result<String> {
    ANGLE_ADDRESS
        .captures(from)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| {
            GmailError::InvalidMessageFormat(format!(
                "From header has no <address>: {:?}",
                from
            ))
        })
}

/// `"Re: "` + subject, unless the subject already starts with `"Re:"`
pub fn reply_subject(subject: &str) -> String {
    if subject.starts_with(REPLY_PREFIX) {
        subject.to_string()
    } else {
        format!("{} {}", REPLY_PREFIX, subject)
    }
}

/// Base64url without padding, as the Gmail `raw` field expects
///
/// Uses the RFC 4648 URL-safe alphabet: `+` becomes `-` and `/` becomes `_`.
/// Mapping both onto `-` would make the output undecodable.
pub fn encode_raw(message: &str) -> String {
    URL_SAFE_NO_PAD.encode(message.as_bytes())
}

/// A reply ready to be rendered as an RFC 822 message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingReply {
    pub from: String,
    pub to: String,
    pub subject: String,
    /// Used for both `In-Reply-To` and `References`
    pub in_reply_to: String,
    pub body: String,
}

impl OutgoingReply {
    /// Build the reply to `message_id` from its `From` and `Subject` headers
    pub fn for_message(
        message_id: &str,
        from_header: &str,
        subject: &str,
        config: &ReplyConfig,
    ) -> Result<Self> {
        Ok(Self {
            from: config.from.clone(),
            to: extract_reply_address(from_header)?,
            subject: reply_subject(subject),
            in_reply_to: message_id.to_string(),
            body: config.body.clone(),
        })
    }

    pub fn to_rfc822(&self) -> String {
        [
            format!("From: {}", self.from),
            format!("To: {}", self.to),
            format!("Subject: {}", self.subject),
            format!("In-Reply-To: {}", self.in_reply_to),
            format!("References: {}", self.in_reply_to),
            String::new(),
            self.body.clone(),
        ]
        .join("\n")
    }

    pub fn encoded(&self) -> String {
        encode_raw(&self.to_rfc822())
    }
}

/// Fetches a message's headers and sends the canned reply
pub struct ReplyComposer {
    client: Arc<dyn GmailClient>,
    config: ReplyConfig,
}

impl ReplyComposer {
    pub fn new(client: Arc<dyn GmailClient>, config: ReplyConfig) -> Self {
        Self { client, config }
    }

    pub async fn reply(&self, message: &MessageRef) -> Result<()> {
        let headers = self
            .client
            .get_message_headers(&message.id, &["Subject".to_string(), "From".to_string()])
            .await?;

        let reply = OutgoingReply::for_message(
            &message.id,
            headers.require("From")?,
            headers.require("Subject")?,
            &self.config,
        )?;
        debug!("Replying to {} as '{}'", reply.to, reply.subject);

        self.client.send_message(&reply.encoded()).await
    }
}
