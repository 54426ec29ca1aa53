use serde::{Deserialize, Serialize};

use crate::error::{GmailError, Result};

/// Reference to a message returned by a list query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    pub id: String,
    pub thread_id: Option<String>,
}

impl MessageRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            thread_id: None,
        }
    }
}

/// A single message header as reported by the Gmail API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

/// Header metadata for one message, fetched with `format=metadata`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHeaders {
    pub id: String,
    pub headers: Vec<Header>,
}

impl MessageHeaders {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            headers: Vec::new(),
        }
    }

    /// Builder-style helper, mostly for fixtures
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push(Header {
            name: name.to_string(),
            value: value.to_string(),
        });
        self
    }

    /// First header whose name matches exactly (case-sensitive)
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name == name)
            .map(|h| h.value.as_str())
    }

    /// Like [`MessageHeaders::get`] but a missing header is a malformed-message fault
    pub fn require(&self, name: &str) -> Result<&str> {
        self.get(name).ok_or_else(|| {
            GmailError::InvalidMessageFormat(format!(
                "Message {} has no {} header",
                self.id, name
            ))
        })
    }
}

/// Label info returned from Gmail API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelInfo {
    pub id: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_exact() {
        let headers = MessageHeaders::new("m1")
            .with_header("Subject", "Hello")
            .with_header("From", "A <a@x.com>");

        assert_eq!(headers.get("Subject"), Some("Hello"));
        assert_eq!(headers.get("from"), None);
        assert_eq!(headers.require("From").unwrap(), "A <a@x.com>");
    }

    #[test]
    fn test_missing_header_is_invalid_format() {
        let headers = MessageHeaders::new("m2").with_header("Subject", "Hi");

        let err = headers.require("From").unwrap_err();
        assert!(matches!(err, GmailError::InvalidMessageFormat(_)));
        assert!(err.to_string().contains("m2"));
    }
}
