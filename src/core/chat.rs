//! # Chat State
//!
//! The message log plus everything needed to turn a prompt into a batch of
//! images.
//!
//! ```text
//! submit_prompt()
//!   ├── no API key?        → raise api_key_dialog, append nothing
//!   ├── session active?    → Busy, append nothing
//!   └── append [user, placeholder], open session
//!         │
//!         ▼
//! GenerationJob::run()     count × generate_image() → store_image()
//!         │                joined in request order
//!         ▼
//! complete_generation()    placeholder → batch message (or error message)
//! ```
//!
//! The job owns clones of everything it touches, so the log stays free to
//! mutate (cancel, clear) while the batch is in flight. Results are matched
//! back to their session by number. A cancelled session's reply slot stays
//! in the log so items that resolved before the cancel still land there;
//! results whose slot is gone are dropped.
//!
//! The message log is persisted under `chat-store` on every mutation.

use std::fmt;
use std::sync::Arc;

use futures::future::join_all;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::core::config_state::{ConfigState, Count};
use crate::core::message::{BatchItem, Message, Role};
use crate::core::persist::Persistence;
use crate::imaging::{ImageMeta, ImageProvider, ImageRequest, ResponseFormat};
use crate::store::ImageStore;

pub const CHAT_NAMESPACE: &str = "chat-store";
pub const DEFAULT_MODEL: &str = "dall-e-3";
const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// A batch that failed as a whole, as opposed to one of its items.
#[derive(Debug)]
pub enum GenerationError {
    /// The configured count isn't a positive number.
    InvalidCount(String),
    /// The batch task died before producing results.
    Aborted(String),
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationError::InvalidCount(count) => write!(f, "invalid image count '{count}'"),
            GenerationError::Aborted(msg) => write!(f, "generation aborted: {msg}"),
        }
    }
}

impl std::error::Error for GenerationError {}

/// What `submit_prompt` did.
pub enum Submission {
    /// Nothing was appended; the front end should ask for a key.
    NeedsApiKey,
    /// A batch is already running. Nothing was appended.
    Busy,
    /// Messages were appended; run the job and hand its result back.
    Started(GenerationJob),
}

/// Persisted slice of the chat state. Transient flags never hit disk.
#[derive(Serialize, Deserialize, Default)]
struct ChatRecord {
    #[serde(default)]
    messages: Vec<Message>,
}

struct ActiveSession {
    id: u64,
    cancel: CancellationToken,
}

/// Reply slot of a cancelled session, still waiting for its result.
struct StoppedReply {
    session: u64,
    index: usize,
}

/// One prompt's worth of image calls, detached from the chat state.
pub struct GenerationJob {
    session: u64,
    prompt: String,
    model: String,
    api_key: String,
    count: Count,
    meta: ImageMeta,
    provider: Arc<dyn ImageProvider>,
    store: Arc<dyn ImageStore>,
    cancel: CancellationToken,
}

/// Output of a finished [`GenerationJob`].
#[derive(Debug)]
pub struct GenerationResult {
    pub session: u64,
    pub meta: ImageMeta,
    pub outcome: Result<Vec<BatchItem>, GenerationError>,
}

impl GenerationJob {
    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn meta(&self) -> ImageMeta {
        self.meta
    }

    /// Runs every call in the batch and joins them in request order.
    pub async fn run(self) -> GenerationResult {
        let outcome = match self.count.value() {
            Some(n) if n > 0 => Ok(self.run_batch(n).await),
            _ => Err(GenerationError::InvalidCount(self.count.as_str().to_string())),
        };
        GenerationResult {
            session: self.session,
            meta: self.meta,
            outcome,
        }
    }

    /// Like [`run`](Self::run), but on its own task so a panicking call
    /// turns into a whole-batch failure instead of unwinding the caller.
    pub async fn run_in_task(self) -> GenerationResult {
        let session = self.session;
        let meta = self.meta;
        match tokio::spawn(self.run()).await {
            Ok(result) => result,
            Err(e) => {
                warn!("Generation task for session {} died: {}", session, e);
                GenerationResult {
                    session,
                    meta,
                    outcome: Err(GenerationError::Aborted(e.to_string())),
                }
            }
        }
    }

    async fn run_batch(&self, n: usize) -> Vec<BatchItem> {
        info!(
            "Session {}: generating {} image(s) with {} via {}",
            self.session,
            n,
            self.model,
            self.provider.name()
        );
        let request = ImageRequest {
            api_key: &self.api_key,
            prompt: &self.prompt,
            model: &self.model,
            n: 1,
            response_format: ResponseFormat::B64Json,
            size: self.meta.size,
            style: self.meta.style,
            quality: self.meta.quality,
        };
        let items = join_all((0..n).map(|index| self.generate_one(index, request))).await;

        let failed = items
            .iter()
            .filter(|item| matches!(item, BatchItem::Failure(_)))
            .count();
        info!(
            "Session {}: batch done, {} succeeded, {} failed",
            self.session,
            n - failed,
            failed
        );
        items
    }

    async fn generate_one(&self, index: usize, request: ImageRequest<'_>) -> BatchItem {
        let b64 = match self.provider.generate_image(request, &self.cancel).await {
            Ok(b64) => b64,
            Err(e) => {
                warn!("Session {} item {} failed: {}", self.session, index, e);
                return BatchItem::Failure(e.to_string());
            }
        };
        // Stored before the key can appear in any message
        match self
            .store
            .store_image(&format!("{PNG_DATA_URI_PREFIX}{b64}"))
        {
            Ok(key) => {
                debug!("Session {} item {} stored as {}", self.session, index, key);
                BatchItem::Success(key)
            }
            Err(e) => {
                warn!("Session {} item {} could not be stored: {}", self.session, index, e);
                BatchItem::Failure(e.to_string())
            }
        }
    }
}

pub struct ChatState {
    messages: Vec<Message>,
    input_prompt: String,
    api_key_dialog: bool,
    active: Option<ActiveSession>,
    stopped: Vec<StoppedReply>,
    next_session: u64,
    model: String,
    provider: Arc<dyn ImageProvider>,
    store: Arc<dyn ImageStore>,
    persistence: Persistence,
}

impl ChatState {
    /// Restores the persisted message log. A missing or unreadable log starts empty.
    pub fn load(
        provider: Arc<dyn ImageProvider>,
        store: Arc<dyn ImageStore>,
        persistence: Persistence,
        model: impl Into<String>,
    ) -> Self {
        let messages = match persistence.load::<ChatRecord>(CHAT_NAMESPACE) {
            Ok(Some(record)) => {
                info!("Restored {} message(s)", record.messages.len());
                record.messages
            }
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Failed to load chat log, starting empty: {}", e);
                Vec::new()
            }
        };
        Self {
            messages,
            input_prompt: String::new(),
            api_key_dialog: false,
            active: None,
            stopped: Vec::new(),
            next_session: 1,
            model: model.into(),
            provider,
            store,
            persistence,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_generating(&self) -> bool {
        self.active.is_some()
    }

    pub fn input_prompt(&self) -> &str {
        &self.input_prompt
    }

    pub fn set_input_prompt(&mut self, prompt: impl Into<String>) {
        self.input_prompt = prompt.into();
    }

    /// True while the front end should be asking for an API key.
    pub fn api_key_dialog_open(&self) -> bool {
        self.api_key_dialog
    }

    pub fn toggle_api_key_dialog(&mut self, open: bool) {
        self.api_key_dialog = open;
    }

    pub fn store(&self) -> &Arc<dyn ImageStore> {
        &self.store
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Starts a batch for the current input prompt.
    pub fn submit_prompt(&mut self, config: &ConfigState) -> Submission {
        if config.api_key().is_empty() {
            info!("Submission blocked: no API key");
            self.api_key_dialog = true;
            return Submission::NeedsApiKey;
        }
        if self.is_generating() {
            debug!("Submission ignored: generation already in progress");
            return Submission::Busy;
        }

        let prompt = self.input_prompt.clone();
        self.messages.push(Message::user(prompt.clone()));
        self.messages.push(Message::placeholder());
        self.save();

        let session = self.next_session;
        self.next_session += 1;
        let cancel = CancellationToken::new();
        self.active = Some(ActiveSession {
            id: session,
            cancel: cancel.clone(),
        });
        info!("Session {} started (count={})", session, config.count().as_str());

        Submission::Started(GenerationJob {
            session,
            prompt,
            model: self.model.clone(),
            api_key: config.api_key().to_string(),
            count: config.count().clone(),
            meta: config.image_meta(),
            provider: self.provider.clone(),
            store: self.store.clone(),
            cancel,
        })
    }

    /// Replaces the session's reply slot with the batch outcome.
    ///
    /// Returns the index of the message that was written, or `None` when the
    /// result belongs to no known session or its slot is gone.
    pub fn complete_generation(&mut self, result: GenerationResult) -> Option<usize> {
        let index = if self.active.as_ref().is_some_and(|a| a.id == result.session) {
            self.active = None;
            match self.messages.last() {
                Some(last) if last.is_loading => self.messages.len() - 1,
                _ => {
                    self.messages.push(Message::placeholder());
                    self.messages.len() - 1
                }
            }
        } else {
            let Some(pos) = self
                .stopped
                .iter()
                .position(|s| s.session == result.session)
            else {
                debug!("Discarding result of unknown session {}", result.session);
                return None;
            };
            let stopped = self.stopped.remove(pos);
            if !self.messages.get(stopped.index).is_some_and(is_stopped_slot) {
                debug!(
                    "Discarding result of session {}: reply slot is gone",
                    result.session
                );
                return None;
            }
            debug!("Session {} finished after cancel", result.session);
            stopped.index
        };

        self.messages[index] = match result.outcome {
            Ok(items) => Message::batch(&items, result.meta),
            Err(e) => {
                warn!("Session {} failed: {}", result.session, e);
                Message::error(e.to_string())
            }
        };
        self.save();
        Some(index)
    }

    /// Submits and waits for the batch on the current task.
    ///
    /// Returns false if nothing was started (no key, or already generating).
    pub async fn submit_and_wait(&mut self, config: &ConfigState) -> bool {
        match self.submit_prompt(config) {
            Submission::Started(job) => {
                let result = job.run_in_task().await;
                self.complete_generation(result);
                true
            }
            Submission::NeedsApiKey | Submission::Busy => false,
        }
    }

    /// Signals the active session to stop and ends the in-progress state.
    ///
    /// The placeholder stops loading but keeps its place, so items that
    /// resolved before the cancel still show up once the result arrives.
    pub fn cancel_generation(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        active.cancel.cancel();
        if let Some(last) = self.messages.last_mut()
            && last.is_loading
        {
            last.is_loading = false;
            self.stopped.push(StoppedReply {
                session: active.id,
                index: self.messages.len() - 1,
            });
            self.save();
        }
        info!("Session {} cancelled", active.id);
    }

    /// Drops a trailing placeholder left behind by an interrupted run.
    ///
    /// Returns true if a message was removed. Never touches the placeholder
    /// of a batch that is still running.
    pub fn fix_broken_message(&mut self) -> bool {
        if self.is_generating() {
            return false;
        }
        if self.messages.last().is_some_and(|m| m.is_loading) {
            self.messages.pop();
            self.save();
            info!("Dropped stale loading message");
            return true;
        }
        false
    }

    /// Empties the log and purges every stored image.
    pub fn clear_messages(&mut self) {
        self.cancel_generation();
        self.stopped.clear();
        self.messages.clear();
        self.save();
        if let Err(e) = self.store.clear() {
            warn!("Failed to clear image store: {}", e);
        }
        info!("Chat cleared");
    }

    fn save(&self) {
        let record = ChatRecord {
            messages: self.messages.clone(),
        };
        if let Err(e) = self.persistence.save(CHAT_NAMESPACE, &record) {
            warn!("Failed to persist chat log: {}", e);
        }
    }
}

/// A cancelled placeholder that no result has filled yet.
fn is_stopped_slot(message: &Message) -> bool {
    message.role == Role::Assistant
        && !message.is_loading
        && !message.is_error
        && message.content.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::{Quality, Size, Style};
    use crate::test_support::{
        HangingProvider, PanickingProvider, ScriptedProvider, Step, configured, test_chat,
    };
    use std::time::Duration;

    #[test]
    fn test_submit_without_key_appends_nothing() {
        let (mut chat, _store) = test_chat(Arc::new(ScriptedProvider::always_ok()));
        let config = ConfigState::load(Persistence::ephemeral());
        chat.set_input_prompt("a lighthouse");

        let first = chat.submit_prompt(&config);

        assert!(matches!(first, Submission::NeedsApiKey));
        assert!(chat.messages().is_empty());
        assert!(chat.api_key_dialog_open());
        assert!(!chat.is_generating());
    }

    #[test]
    fn test_submit_while_generating_is_noop() {
        let (mut chat, _store) = test_chat(Arc::new(ScriptedProvider::always_ok()));
        let config = configured("1");
        chat.set_input_prompt("first");
        let _job = match chat.submit_prompt(&config) {
            Submission::Started(job) => job,
            _ => panic!("expected first submission to start"),
        };
        assert_eq!(chat.messages().len(), 2);

        chat.set_input_prompt("second");
        assert!(matches!(chat.submit_prompt(&config), Submission::Busy));
        assert_eq!(chat.messages().len(), 2);
    }

    #[test]
    fn test_submit_appends_user_and_placeholder() {
        let (mut chat, _store) = test_chat(Arc::new(ScriptedProvider::always_ok()));
        chat.set_input_prompt("a red fox");
        let _job = chat.submit_prompt(&configured("2"));

        let messages = chat.messages();
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "a red fox");
        assert_eq!(messages[1].role, Role::Assistant);
        assert!(messages[1].is_loading);
        assert!(chat.is_generating());
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_order() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Step::image("AAAA", Duration::from_millis(30)),
            Step::fail(500, "overloaded", Duration::from_millis(0)),
            Step::image("CCCC", Duration::from_millis(5)),
        ]));
        let (mut chat, store) = test_chat(provider.clone());
        chat.set_input_prompt("three foxes");

        assert!(chat.submit_and_wait(&configured("3")).await);
        assert_eq!(provider.calls(), 3);

        assert!(!chat.is_generating());
        assert_eq!(chat.messages().len(), 2);
        let reply = &chat.messages()[1];
        assert!(!reply.is_loading);
        assert!(!reply.is_error);

        let tokens: Vec<&str> = reply.content.split('|').collect();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1], "error:API error (HTTP 500): overloaded");

        let first = store.retrieve_image(tokens[0]).unwrap();
        let third = store.retrieve_image(tokens[2]).unwrap();
        assert_eq!(first.as_deref(), Some("data:image/png;base64,AAAA"));
        assert_eq!(third.as_deref(), Some("data:image/png;base64,CCCC"));
    }

    #[tokio::test]
    async fn test_batch_records_meta_from_submission() {
        let (mut chat, _store) = test_chat(Arc::new(ScriptedProvider::always_ok()));
        let mut config = configured("1");
        config.set_quality(Quality::Hd);
        config.set_style(Style::Natural);
        config.set_size(Size::Portrait);
        chat.set_input_prompt("tall tower");

        let job = match chat.submit_prompt(&config) {
            Submission::Started(job) => job,
            _ => panic!("expected submission to start"),
        };
        // Changing settings mid-flight doesn't rewrite history
        config.set_size(Size::Square);
        let result = job.run().await;
        chat.complete_generation(result);

        let meta = chat.messages()[1].image_meta.unwrap();
        assert_eq!(meta.size, Size::Portrait);
        assert_eq!(meta.quality, Quality::Hd);
        assert_eq!(meta.style, Style::Natural);
    }

    #[tokio::test]
    async fn test_invalid_count_is_whole_batch_failure() {
        let (mut chat, _store) = test_chat(Arc::new(ScriptedProvider::always_ok()));
        chat.set_input_prompt("anything");

        assert!(chat.submit_and_wait(&configured("lots")).await);

        let reply = &chat.messages()[1];
        assert!(reply.is_error);
        assert_eq!(reply.content, "invalid image count 'lots'");
        assert!(!chat.is_generating());

        chat.set_input_prompt("nothing at all");
        assert!(chat.submit_and_wait(&configured("0")).await);
        let reply = &chat.messages()[3];
        assert!(reply.is_error);
        assert_eq!(reply.content, "invalid image count '0'");
    }

    #[tokio::test]
    async fn test_panicking_call_is_whole_batch_failure() {
        let (mut chat, _store) = test_chat(Arc::new(PanickingProvider));
        chat.set_input_prompt("anything");

        assert!(chat.submit_and_wait(&configured("2")).await);

        let reply = &chat.messages()[1];
        assert!(reply.is_error);
        assert!(reply.content.starts_with("generation aborted"));
        assert!(!chat.is_generating());
    }

    #[tokio::test]
    async fn test_cancel_mid_batch_then_submit_again() {
        let provider = Arc::new(HangingProvider::default());
        let (mut chat, _store) = test_chat(provider.clone());
        let config = configured("2");
        chat.set_input_prompt("never finishes");

        let job = match chat.submit_prompt(&config) {
            Submission::Started(job) => job,
            _ => panic!("expected submission to start"),
        };
        let handle = tokio::spawn(job.run());
        tokio::task::yield_now().await;

        chat.cancel_generation();
        assert!(!chat.is_generating());
        assert_eq!(chat.messages().len(), 2);
        assert!(chat.messages().iter().all(|m| !m.is_loading));

        // A new batch may start before the cancelled one unwinds
        chat.set_input_prompt("try again");
        assert!(matches!(chat.submit_prompt(&config), Submission::Started(_)));
        assert_eq!(chat.messages().len(), 4);
        assert_eq!(chat.messages().iter().filter(|m| m.is_loading).count(), 1);

        let result = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(provider.calls(), 2);
        assert_eq!(chat.complete_generation(result), Some(1));

        let reply = &chat.messages()[1];
        assert!(!reply.is_error);
        assert_eq!(
            reply.content,
            "error:request was aborted|error:request was aborted"
        );
        // The live batch keeps its own placeholder
        assert!(chat.messages()[3].is_loading);
        assert!(chat.is_generating());
    }

    #[tokio::test]
    async fn test_cancel_keeps_items_resolved_before_it() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Step::image("AAAA", Duration::ZERO),
            Step::image("BBBB", Duration::from_secs(30)),
        ]));
        let (mut chat, store) = test_chat(provider.clone());
        chat.set_input_prompt("one fast, one slow");

        let job = match chat.submit_prompt(&configured("2")) {
            Submission::Started(job) => job,
            _ => panic!("expected submission to start"),
        };
        let handle = tokio::spawn(job.run());
        tokio::time::sleep(Duration::from_millis(100)).await;

        chat.cancel_generation();
        let result = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(chat.complete_generation(result), Some(1));

        assert_eq!(chat.messages().len(), 2);
        let items = chat.messages()[1].items();
        assert_eq!(items.len(), 2);
        let BatchItem::Success(key) = &items[0] else {
            panic!("expected the fast image to survive, got {:?}", items[0]);
        };
        assert_eq!(
            store.retrieve_image(key).unwrap().as_deref(),
            Some("data:image/png;base64,AAAA")
        );
        assert_eq!(items[1], BatchItem::Failure("request was aborted".to_string()));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_result_dropped_once_slot_is_gone() {
        let (mut chat, _store) = test_chat(Arc::new(HangingProvider::default()));
        let job = match chat.submit_prompt(&configured("1")) {
            Submission::Started(job) => job,
            _ => panic!("expected submission to start"),
        };
        let handle = tokio::spawn(job.run());
        tokio::task::yield_now().await;

        chat.cancel_generation();
        chat.clear_messages();
        let result = handle.await.unwrap();

        assert_eq!(chat.complete_generation(result), None);
        assert!(chat.messages().is_empty());
    }

    #[test]
    fn test_cancel_without_session_is_noop() {
        let (mut chat, _store) = test_chat(Arc::new(ScriptedProvider::always_ok()));
        chat.cancel_generation();
        assert!(chat.messages().is_empty());
    }

    #[test]
    fn test_fix_broken_message_drops_only_trailing_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = Persistence::open(dir.path()).unwrap();
        let record = ChatRecord {
            messages: vec![
                Message::user("one"),
                Message::batch(&[BatchItem::Success("k".to_string())], configured("1").image_meta()),
                Message::user("two"),
                Message::placeholder(),
            ],
        };
        persistence.save(CHAT_NAMESPACE, &record).unwrap();

        let (mut chat, _store) = crate::test_support::test_chat_with(
            Arc::new(ScriptedProvider::always_ok()),
            persistence.clone(),
        );
        assert!(chat.fix_broken_message());

        assert_eq!(chat.messages(), &record.messages[..3]);
        assert!(!chat.fix_broken_message());

        // The repair is persisted
        let reloaded: ChatRecord = persistence.load(CHAT_NAMESPACE).unwrap().unwrap();
        assert_eq!(reloaded.messages.len(), 3);
    }

    #[test]
    fn test_fix_broken_message_leaves_live_placeholder() {
        let (mut chat, _store) = test_chat(Arc::new(ScriptedProvider::always_ok()));
        let _job = chat.submit_prompt(&configured("1"));
        assert!(!chat.fix_broken_message());
        assert_eq!(chat.messages().len(), 2);
    }

    #[tokio::test]
    async fn test_clear_messages_purges_store() {
        let (mut chat, store) = test_chat(Arc::new(ScriptedProvider::always_ok()));
        chat.set_input_prompt("keep?");
        chat.submit_and_wait(&configured("2")).await;
        let keys: Vec<String> = chat.messages()[1]
            .items()
            .into_iter()
            .filter_map(|item| match item {
                BatchItem::Success(key) => Some(key),
                BatchItem::Failure(_) => None,
            })
            .collect();
        assert_eq!(keys.len(), 2);

        chat.clear_messages();

        assert!(chat.messages().is_empty());
        for key in keys {
            assert!(store.retrieve_image(&key).unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn test_messages_persist_but_flags_do_not() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = Persistence::open(dir.path()).unwrap();
        {
            let (mut chat, _store) = crate::test_support::test_chat_with(
                Arc::new(ScriptedProvider::always_ok()),
                persistence.clone(),
            );
            chat.set_input_prompt("saved prompt");
            chat.submit_and_wait(&configured("1")).await;
        }

        let raw = std::fs::read_to_string(dir.path().join("chat-store.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let state = value["state"].as_object().unwrap();
        assert_eq!(state.keys().collect::<Vec<_>>(), vec!["messages"]);

        let (chat, _store) = crate::test_support::test_chat_with(
            Arc::new(ScriptedProvider::always_ok()),
            persistence,
        );
        assert_eq!(chat.messages().len(), 2);
        assert_eq!(chat.messages()[0].content, "saved prompt");
        assert!(!chat.is_generating());
        assert!(chat.input_prompt().is_empty());
    }

    #[test]
    fn test_stale_result_after_clear_is_ignored() {
        let (mut chat, _store) = test_chat(Arc::new(ScriptedProvider::always_ok()));
        let job = match chat.submit_prompt(&configured("1")) {
            Submission::Started(job) => job,
            _ => panic!("expected submission to start"),
        };
        chat.clear_messages();
        let result = tokio_test::block_on(job.run());
        chat.complete_generation(result);
        assert!(chat.messages().is_empty());
    }
}
