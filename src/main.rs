use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use easel::console::{self, Console};
use easel::core::chat::ChatState;
use easel::core::config_state::ConfigState;
use easel::core::persist::Persistence;
use easel::core::settings::{self, CliOverrides, ResolvedSettings, StoreKind};
use easel::imaging::{ImageProvider, OpenAiImageProvider};
use easel::store::{DiskImageStore, ImageStore, MemoryImageStore};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

#[derive(Parser)]
#[command(name = "easel", about = "Chat-style AI image generation")]
struct Args {
    /// Directory for the chat log, settings, images and log file
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Keep everything in memory; nothing is read from or written to disk
    #[arg(long)]
    ephemeral: bool,

    /// Image model to request
    #[arg(short, long)]
    model: Option<String>,
}

fn init_logging(settings: &ResolvedSettings) {
    if settings.ephemeral {
        return;
    }
    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .build();

    if std::fs::create_dir_all(&settings.data_dir).is_ok()
        && let Ok(log_file) = File::create(settings.data_dir.join("easel.log"))
    {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }
}

fn build_store(settings: &ResolvedSettings) -> std::io::Result<Arc<dyn ImageStore>> {
    Ok(match settings.image_store {
        StoreKind::Memory => Arc::new(MemoryImageStore::new()),
        StoreKind::Disk => Arc::new(DiskImageStore::open(settings.data_dir.join("images"))?),
    })
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    let config_file = match settings::load_settings() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Ignoring ~/.easel/config.toml: {e}");
            settings::EaselConfig::default()
        }
    };
    let resolved = settings::resolve(
        &config_file,
        &CliOverrides {
            data_dir: args.data_dir.as_deref(),
            model: args.model.as_deref(),
            ephemeral: args.ephemeral,
        },
    );

    init_logging(&resolved);
    log::info!(
        "Easel starting up: model={}, data_dir={}, store={:?}",
        resolved.model,
        resolved.data_dir.display(),
        resolved.image_store
    );

    let persistence = if resolved.ephemeral {
        Persistence::ephemeral()
    } else {
        Persistence::open(&resolved.data_dir)?
    };

    let mut config = ConfigState::load(persistence.clone());
    if config.api_key().is_empty()
        && let Some(key) = &resolved.openai_api_key
    {
        log::info!("Seeding API key from config/environment");
        config.set_api_key(key.clone());
    }

    let provider: Arc<dyn ImageProvider> = Arc::new(OpenAiImageProvider::new(Some(
        resolved.openai_base_url.clone(),
    )));
    let chat = ChatState::load(provider, build_store(&resolved)?, persistence, resolved.model.clone());

    console::run(Console::new(chat, config)).await
}
