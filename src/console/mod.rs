//! # Console Adapter
//!
//! Line-oriented terminal front end. Reads prompts and commands from stdin,
//! drives `ChatState`/`ConfigState`, and prints what `MessageListView`
//! produces.
//!
//! ## Event Loop
//!
//! ```text
//! select! {
//!     result channel   → chat.complete_generation()
//!     Ctrl-C           → cancel batch (or quit when idle)
//!     stdin line       → parse → handle
//! }
//! ```
//!
//! At most one batch is live; `ChatState` refuses a second submission while
//! one is active. Each batch runs on its own task and reports back over a
//! channel, so a cancelled batch still delivers whatever it resolved.

pub mod command;

use std::io;
use std::time::Duration;

use futures::future::BoxFuture;
use log::{debug, info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::core::chat::{ChatState, GenerationResult, Submission};
use crate::core::config_state::ConfigState;
use crate::view::{Body, ChatItem, MessageListView, Tile, export_image};
use command::{Command, HELP};

/// What the loop should do after handling a command.
pub enum Flow {
    Continue,
    Quit,
    /// A batch started; poll it to completion.
    Generate(BoxFuture<'static, GenerationResult>),
}

pub struct Console {
    chat: ChatState,
    config: ConfigState,
    view: MessageListView,
}

impl Console {
    pub fn new(mut chat: ChatState, config: ConfigState) -> Self {
        let mut view = MessageListView::new();
        view.mount(&mut chat);
        Self { chat, config, view }
    }

    pub fn chat(&self) -> &ChatState {
        &self.chat
    }

    pub fn config(&self) -> &ConfigState {
        &self.config
    }

    pub fn handle(&mut self, command: Command) -> Flow {
        debug!("Console command: {:?}", command);
        match command {
            Command::Prompt(prompt) => return self.submit(prompt),
            Command::SetKey(key) => {
                self.config.set_api_key(key);
                self.chat.toggle_api_key_dialog(false);
                println!("API key saved.");
            }
            Command::Quality(quality) => {
                self.config.set_quality(quality);
                println!("Quality: {quality}");
            }
            Command::Style(style) => {
                self.config.set_style(style);
                println!("Style: {style}");
            }
            Command::Size(size) => {
                self.config.set_size(size);
                println!("Size: {size}");
            }
            Command::Count(count) => {
                self.config.set_count(count);
                println!("Images per prompt: {}", self.config.count().as_str());
            }
            Command::Reset => {
                self.config.reset();
                println!("Image settings reset.");
                self.print_config();
            }
            Command::ShowConfig => self.print_config(),
            Command::Clear => {
                self.chat.clear_messages();
                println!("Conversation and images cleared.");
            }
            Command::Save { index, path } => self.save_image(index, &path),
            Command::History => {
                for item in self.view.items(&self.chat) {
                    print_item(&item);
                }
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => return Flow::Quit,
        }
        Flow::Continue
    }

    fn submit(&mut self, prompt: String) -> Flow {
        self.chat.set_input_prompt(prompt);
        match self.chat.submit_prompt(&self.config) {
            Submission::Started(job) => {
                println!(
                    "Generating {} image(s), {}... (Ctrl-C to cancel)",
                    self.config.count().as_str(),
                    job.meta().describe()
                );
                Flow::Generate(Box::pin(job.run_in_task()))
            }
            Submission::NeedsApiKey => {
                println!("An OpenAI API key is required. Set one with /key <api-key>.");
                Flow::Continue
            }
            Submission::Busy => {
                println!("Still generating. Wait for it to finish or press Ctrl-C.");
                Flow::Continue
            }
        }
    }

    pub fn finish(&mut self, result: GenerationResult) {
        let Some(index) = self.chat.complete_generation(result) else {
            return;
        };
        if let Some(item) = self.view.items(&self.chat).get(index) {
            print_item(item);
        }
    }

    pub fn cancel(&mut self) {
        self.chat.cancel_generation();
        println!("Generation cancelled.");
    }

    fn print_config(&self) {
        let config = self.config.config();
        let key_state = if config.api_key.is_empty() { "not set" } else { "set" };
        println!(
            "model: {}\napi key: {}\nquality: {}\nstyle: {}\nsize: {}\ncount: {}",
            self.chat.model(),
            key_state,
            config.quality,
            config.style,
            config.size,
            config.count.as_str()
        );
    }

    fn save_image(&mut self, index: usize, path: &std::path::Path) {
        let items = self.view.items(&self.chat);
        let Some(latest) = items
            .iter()
            .rev()
            .find(|item| !item.image_sources().is_empty())
        else {
            println!("No images to save yet.");
            return;
        };
        let sources = latest.image_sources();
        let Some(src) = index.checked_sub(1).and_then(|i| sources.get(i)) else {
            println!("The latest batch has {} image(s).", sources.len());
            return;
        };
        match export_image(src, path) {
            Ok(bytes) => println!("Saved {} bytes to {}", bytes, path.display()),
            Err(e) => {
                warn!("Export failed: {}", e);
                println!("Could not save image: {e}");
            }
        }
    }
}

fn print_item(item: &ChatItem) {
    println!();
    match &item.timestamp {
        Some(ts) => println!("── {} · {}", item.author, ts),
        None => println!("── {}", item.author),
    }
    if let Some(meta) = &item.meta_line {
        println!("   {meta}");
    }
    match &item.body {
        Body::Text(text) => println!("{text}"),
        Body::Loading => println!("(generating...)"),
        Body::Alert(text) => println!("Error: {text}"),
        Body::Tiles(tiles) if tiles.is_empty() => println!("(no images)"),
        Body::Tiles(tiles) => {
            for (n, tile) in tiles.iter().enumerate() {
                match tile {
                    Tile::Image { key, src } => {
                        println!("  [{}] image {} ({} bytes)", n + 1, key, src.len())
                    }
                    Tile::Error(msg) => println!("  [{}] failed: {}", n + 1, msg),
                }
            }
        }
    }
}

/// Cancelled calls return as soon as they see the token; this only bounds
/// a provider that ignores it.
const UNWIND_TIMEOUT: Duration = Duration::from_secs(2);

/// Runs a batch on its own task and sends the result back to the loop.
fn spawn_batch(
    batch: BoxFuture<'static, GenerationResult>,
    tx: mpsc::UnboundedSender<GenerationResult>,
) {
    tokio::spawn(async move {
        // Receiver only goes away when the console has exited
        let _ = tx.send(batch.await);
    });
}

/// Runs the console until `/quit`, end of input, or Ctrl-C while idle.
pub async fn run(mut console: Console) -> io::Result<()> {
    println!("Easel ({}). Type /help for commands.", console.chat().model());
    let history = console.chat().messages().len();
    if history > 0 {
        println!("{history} message(s) in history. /history to show them.");
    }
    if console.config().api_key().is_empty() {
        println!("No API key set yet. Use /key <api-key>.");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut in_flight = 0usize;

    loop {
        tokio::select! {
            Some(result) = rx.recv() => {
                in_flight -= 1;
                console.finish(result);
            }
            signal = tokio::signal::ctrl_c() => {
                signal?;
                if console.chat().is_generating() {
                    console.cancel();
                } else {
                    info!("Interrupted while idle, exiting");
                    break;
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("Input closed, exiting");
                    break;
                };
                let command = match command::parse(&line) {
                    Ok(Some(command)) => command,
                    Ok(None) => continue,
                    Err(msg) => {
                        println!("{msg}");
                        continue;
                    }
                };
                match console.handle(command) {
                    Flow::Continue => {}
                    Flow::Quit => break,
                    Flow::Generate(batch) => {
                        in_flight += 1;
                        spawn_batch(batch, tx.clone());
                    }
                }
            }
        }
    }

    // Leave no session dangling; its placeholder must not be persisted
    if console.chat().is_generating() {
        console.cancel();
    }
    let drain = async {
        while in_flight > 0
            && let Some(result) = rx.recv().await
        {
            in_flight -= 1;
            console.finish(result);
        }
    };
    if tokio::time::timeout(UNWIND_TIMEOUT, drain).await.is_err() {
        warn!("Gave up waiting for cancelled batches");
    }
    Ok(())
}
