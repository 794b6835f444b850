//! # View
//!
//! Front-end-agnostic presentation of the chat log. Produces plain data
//! ([`ChatItem`]) that any adapter can draw; drawing itself lives in the
//! adapter (see `console`).

pub mod export;
pub mod message_list;

pub use export::{ExportError, export_image};
pub use message_list::{Body, ChatItem, MessageListView, Tile};
