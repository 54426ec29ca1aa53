//! Common test utilities and fixtures

#![allow(dead_code)]

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use gmail_autoreply::client::GmailClient;
use gmail_autoreply::config::Config;
use gmail_autoreply::error::{GmailError, Result};
use gmail_autoreply::models::{LabelInfo, MessageHeaders, MessageRef};
use mockall::mock;

/// Create a message reference as returned by the unread query
pub fn create_test_ref(id: &str) -> MessageRef {
    MessageRef {
        id: id.to_string(),
        thread_id: Some(format!("thread-{}", id)),
    }
}

/// Create the Subject/From header set for a message
pub fn create_test_headers(id: &str, subject: &str, from: &str) -> MessageHeaders {
    MessageHeaders::new(id)
        .with_header("Subject", subject)
        .with_header("From", from)
}

pub fn create_test_label_info(id: &str, name: &str) -> LabelInfo {
    LabelInfo {
        id: id.to_string(),
        name: name.to_string(),
    }
}

/// Config with the stock label, reply text and query
pub fn test_config() -> Config {
    Config::default()
}

/// API error for an already existing label
pub fn conflict_error() -> GmailError {
    GmailError::Conflict("Label name exists or conflicts".to_string())
}

/// Decode a `raw` message handed to `send_message`
pub fn decode_raw(raw: &str) -> String {
    let bytes = URL_SAFE_NO_PAD.decode(raw).expect("raw message is base64url");
    String::from_utf8(bytes).expect("raw message is UTF-8")
}

/// Value of an RFC 822 header line in a decoded message
pub fn header_line<'a>(message: &'a str, name: &str) -> Option<&'a str> {
    let prefix = format!("{}: ", name);
    message
        .lines()
        .take_while(|line| !line.is_empty())
        .find_map(|line| line.strip_prefix(prefix.as_str()))
}

// Mock implementation of GmailClient for testing
mock! {
    pub GmailClient {}

    #[async_trait::async_trait]
    impl GmailClient for GmailClient {
        async fn list_message_refs(&self, query: &str) -> Result<Vec<MessageRef>>;
        async fn get_message_headers(&self, id: &str, names: &[String]) -> Result<MessageHeaders>;
        async fn send_message(&self, raw: &str) -> Result<()>;
        async fn create_label(&self, name: &str) -> Result<String>;
        async fn list_labels(&self) -> Result<Vec<LabelInfo>>;
        async fn modify_labels(
            &self,
            message_id: &str,
            add_label_ids: &[String],
            remove_label_ids: &[String],
        ) -> Result<()>;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_test_headers() {
        let headers = create_test_headers("m1", "Hello", "A <a@x.com>");
        assert_eq!(headers.id, "m1");
        assert_eq!(headers.get("Subject"), Some("Hello"));
        assert_eq!(headers.get("From"), Some("A <a@x.com>"));
    }

    #[test]
    fn test_header_line_stops_at_body() {
        let message = "To: a@x.com\nSubject: Re: Hi\n\nTo: not-a-header";
        assert_eq!(header_line(message, "To"), Some("a@x.com"));
        assert_eq!(header_line(message, "Subject"), Some("Re: Hi"));
        assert_eq!(header_line(message, "From"), None);
    }
}
