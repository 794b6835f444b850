//! # MessageList View
//!
//! Turns the chat log into display-ready items.
//!
//! ## Responsibilities
//!
//! - Reconcile a stuck placeholder on mount
//! - Resolve assistant tokens to image sources via the image store
//! - Cache resolutions, redoing one only when its message content changes
//!
//! Token order is display order. Failures become error tiles in place;
//! keys the store no longer knows are dropped.

use chrono::{Local, TimeZone};
use log::{debug, warn};

use crate::core::chat::ChatState;
use crate::core::message::{BatchItem, Message, Role, decode_batch};
use crate::store::ImageStore;

pub const USER_LABEL: &str = "You";
pub const ASSISTANT_LABEL: &str = "DALL·E 3";

/// One slot in an assistant message's image grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tile {
    Image { key: String, src: String },
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// Prompt text of a user message
    Text(String),
    /// Batch still in flight
    Loading,
    /// Whole-batch failure
    Alert(String),
    Tiles(Vec<Tile>),
}

/// Everything needed to draw one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatItem {
    pub author: &'static str,
    pub meta_line: Option<String>,
    pub body: Body,
    pub timestamp: Option<String>,
}

impl ChatItem {
    /// Image sources in display order.
    pub fn image_sources(&self) -> Vec<&str> {
        match &self.body {
            Body::Tiles(tiles) => tiles
                .iter()
                .filter_map(|tile| match tile {
                    Tile::Image { src, .. } => Some(src.as_str()),
                    Tile::Error(_) => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

struct Resolution {
    content: String,
    tiles: Vec<Tile>,
}

/// Display state for the message log. Must outlive individual renders so
/// the resolution cache survives between them.
#[derive(Default)]
pub struct MessageListView {
    resolutions: Vec<Option<Resolution>>,
    mounted: bool,
}

impl MessageListView {
    pub fn new() -> Self {
        Self::default()
    }

    /// First-time setup. Drops a placeholder left over from an interrupted run.
    pub fn mount(&mut self, chat: &mut ChatState) {
        if self.mounted {
            return;
        }
        self.mounted = true;
        if chat.fix_broken_message() {
            debug!("Mount reconciled an interrupted generation");
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Builds display items for the whole log.
    pub fn items(&mut self, chat: &ChatState) -> Vec<ChatItem> {
        let messages = chat.messages();
        self.resolutions.resize_with(messages.len(), || None);
        messages
            .iter()
            .enumerate()
            .map(|(index, message)| self.item(index, message, chat.store().as_ref()))
            .collect()
    }

    fn item(&mut self, index: usize, message: &Message, store: &dyn ImageStore) -> ChatItem {
        let body = match message.role {
            Role::User => Body::Text(message.content.clone()),
            Role::Assistant if message.is_loading => Body::Loading,
            Role::Assistant if message.is_error => Body::Alert(message.content.clone()),
            Role::Assistant => Body::Tiles(self.tiles(index, &message.content, store)),
        };
        ChatItem {
            author: match message.role {
                Role::User => USER_LABEL,
                Role::Assistant => ASSISTANT_LABEL,
            },
            meta_line: message.image_meta.map(|meta| meta.describe()),
            body,
            timestamp: format_timestamp(message.timestamp),
        }
    }

    fn tiles(&mut self, index: usize, content: &str, store: &dyn ImageStore) -> Vec<Tile> {
        let slot = &mut self.resolutions[index];
        if let Some(cached) = slot.as_ref()
            && cached.content == content
        {
            return cached.tiles.clone();
        }
        let tiles = resolve_tiles(store, content);
        *slot = Some(Resolution {
            content: content.to_string(),
            tiles: tiles.clone(),
        });
        tiles
    }
}

/// Resolves a token string against the store, in token order.
pub fn resolve_tiles(store: &dyn ImageStore, content: &str) -> Vec<Tile> {
    decode_batch(content)
        .into_iter()
        .filter_map(|item| match item {
            BatchItem::Failure(msg) => Some(Tile::Error(msg)),
            BatchItem::Success(key) => match store.retrieve_image(&key) {
                Ok(Some(src)) => Some(Tile::Image { key, src }),
                Ok(None) => None,
                Err(e) => {
                    warn!("Failed to load image {}: {}", key, e);
                    None
                }
            },
        })
        .collect()
}

fn format_timestamp(millis: i64) -> Option<String> {
    if millis <= 0 {
        return None;
    }
    Local
        .timestamp_millis_opt(millis)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
}
