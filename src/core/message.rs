//! # Messages
//!
//! One entry in the chat log. User messages carry the prompt text; assistant
//! messages carry the outcome of a batch, one token per requested image:
//!
//! ```text
//! 3f0c...e1|error:API error (HTTP 500): overloaded|9a2b...77
//! └─ key ─┘ └──────────── failure ──────────────┘ └─ key ─┘
//! ```
//!
//! The token string is only the persisted form. Code reads it through
//! [`BatchItem`] and never splits `content` by hand.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::imaging::ImageMeta;

pub const TOKEN_DELIMITER: &str = "|";
pub const ERROR_PREFIX: &str = "error:";

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
pub enum Role {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "assistant")]
    Assistant,
}

/// Outcome of one call in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchItem {
    /// Image was generated and stored under this key.
    Success(String),
    /// The call failed with this message.
    Failure(String),
}

impl BatchItem {
    pub fn to_token(&self) -> String {
        match self {
            BatchItem::Success(key) => key.clone(),
            // The delimiter would split the failure into two tokens
            BatchItem::Failure(msg) => {
                format!("{ERROR_PREFIX}{}", msg.replace(TOKEN_DELIMITER, "/"))
            }
        }
    }

    pub fn from_token(token: &str) -> Self {
        match token.strip_prefix(ERROR_PREFIX) {
            Some(msg) => BatchItem::Failure(msg.to_string()),
            None => BatchItem::Success(token.to_string()),
        }
    }
}

/// Joins batch outcomes into the persisted token string, preserving order.
pub fn encode_batch(items: &[BatchItem]) -> String {
    items
        .iter()
        .map(BatchItem::to_token)
        .collect::<Vec<_>>()
        .join(TOKEN_DELIMITER)
}

/// Splits a token string back into batch outcomes. Empty content has no items.
pub fn decode_batch(content: &str) -> Vec<BatchItem> {
    if content.is_empty() {
        return Vec::new();
    }
    content
        .split(TOKEN_DELIMITER)
        .map(BatchItem::from_token)
        .collect()
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(alias = "type")]
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub is_error: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_loading: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_meta: Option<ImageMeta>,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

impl Message {
    pub fn user(prompt: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: prompt.into(),
            is_error: false,
            is_loading: false,
            image_meta: None,
            timestamp: now_millis(),
        }
    }

    /// The assistant message shown while a batch is in flight.
    pub fn placeholder() -> Self {
        Self {
            role: Role::Assistant,
            content: String::new(),
            is_error: false,
            is_loading: true,
            image_meta: None,
            timestamp: now_millis(),
        }
    }

    pub fn batch(items: &[BatchItem], meta: ImageMeta) -> Self {
        Self {
            role: Role::Assistant,
            content: encode_batch(items),
            is_error: false,
            is_loading: false,
            image_meta: Some(meta),
            timestamp: now_millis(),
        }
    }

    /// A whole-batch failure.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: text.into(),
            is_error: true,
            is_loading: false,
            image_meta: None,
            timestamp: now_millis(),
        }
    }

    /// Decoded batch outcomes. Only finished, non-error assistant messages have any.
    pub fn items(&self) -> Vec<BatchItem> {
        if self.role != Role::Assistant || self.is_error || self.is_loading {
            return Vec::new();
        }
        decode_batch(&self.content)
    }
}
