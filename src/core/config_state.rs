//! # Image Settings
//!
//! The user-editable generation settings: API key, quality, style, size and
//! how many images each prompt produces. Persisted under `config-storage`
//! and written through on every setter.
//!
//! Not to be confused with [`crate::core::settings`], the read-only
//! application config file.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::core::persist::Persistence;
use crate::imaging::{ImageMeta, Quality, Size, Style};

pub const CONFIG_NAMESPACE: &str = "config-storage";

/// Number of images per prompt, kept as the numeric string the user typed.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(transparent)]
pub struct Count(String);

impl Default for Count {
    fn default() -> Self {
        Count("1".to_string())
    }
}

impl Count {
    pub fn new(count: impl Into<String>) -> Self {
        Count(count.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The count as a number, if the string is one.
    pub fn value(&self) -> Option<usize> {
        self.0.trim().parse().ok()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageConfig {
    pub api_key: String,
    pub quality: Quality,
    pub style: Style,
    pub size: Size,
    pub count: Count,
}

pub struct ConfigState {
    config: ImageConfig,
    persistence: Persistence,
}

impl ConfigState {
    /// Loads persisted settings, falling back to defaults if there are none
    /// or they can't be read.
    pub fn load(persistence: Persistence) -> Self {
        let config = match persistence.load::<ImageConfig>(CONFIG_NAMESPACE) {
            Ok(Some(config)) => {
                info!("Restored image settings");
                config
            }
            Ok(None) => ImageConfig::default(),
            Err(e) => {
                warn!("Failed to load image settings, using defaults: {}", e);
                ImageConfig::default()
            }
        };
        Self {
            config,
            persistence,
        }
    }

    pub fn config(&self) -> &ImageConfig {
        &self.config
    }

    pub fn api_key(&self) -> &str {
        &self.config.api_key
    }

    pub fn quality(&self) -> Quality {
        self.config.quality
    }

    pub fn style(&self) -> Style {
        self.config.style
    }

    pub fn size(&self) -> Size {
        self.config.size
    }

    pub fn count(&self) -> &Count {
        &self.config.count
    }

    /// The settings a batch submitted right now would be generated with.
    pub fn image_meta(&self) -> ImageMeta {
        ImageMeta {
            size: self.config.size,
            quality: self.config.quality,
            style: self.config.style,
        }
    }

    pub fn set_api_key(&mut self, key: impl Into<String>) {
        self.config.api_key = key.into().trim().to_string();
        self.save();
    }

    pub fn set_quality(&mut self, quality: Quality) {
        self.config.quality = quality;
        self.save();
    }

    pub fn set_style(&mut self, style: Style) {
        self.config.style = style;
        self.save();
    }

    pub fn set_size(&mut self, size: Size) {
        self.config.size = size;
        self.save();
    }

    pub fn set_count(&mut self, count: impl Into<String>) {
        self.config.count = Count::new(count);
        self.save();
    }

    /// Restores quality, style, size and count. The API key is kept.
    pub fn reset(&mut self) {
        let api_key = std::mem::take(&mut self.config.api_key);
        self.config = ImageConfig {
            api_key,
            ..ImageConfig::default()
        };
        self.save();
    }

    fn save(&self) {
        if let Err(e) = self.persistence.save(CONFIG_NAMESPACE, &self.config) {
            warn!("Failed to persist image settings: {}", e);
        } else {
            debug!("Image settings saved");
        }
    }
}
