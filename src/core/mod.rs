//! # Core Application Logic
//!
//! Easel's business logic. It knows nothing about any specific front end.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • ChatState (log)      │
//!                    │  • ConfigState (knobs)  │
//!                    │  • Persistence          │
//!                    └───────────┬─────────────┘
//!                                │
//!            ┌───────────────────┼───────────────────┐
//!            ▼                   ▼                   ▼
//!     ┌────────────┐      ┌────────────┐      ┌────────────┐
//!     │  imaging   │      │   store    │      │    view    │
//!     │ (provider) │      │ (images)   │      │ (console)  │
//!     └────────────┘      └────────────┘      └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`chat`]: `ChatState`, the message log and the generation lifecycle
//! - [`config_state`]: `ConfigState`, persisted per-image settings
//! - [`message`]: `Message` and the batch token codec
//! - [`persist`]: namespaced JSON records on disk
//! - [`settings`]: the application config file

pub mod chat;
pub mod config_state;
pub mod message;
pub mod persist;
pub mod settings;
