use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Rendering quality requested from the image model.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Quality {
    #[serde(rename = "standard")]
    #[default]
    Standard,
    /// Finer detail, slower and more expensive
    #[serde(rename = "hd")]
    Hd,
}

/// Visual style of the generated image.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Style {
    /// Hyper-real, dramatic
    #[serde(rename = "vivid")]
    #[default]
    Vivid,
    /// More subdued, less hyper-real
    #[serde(rename = "natural")]
    Natural,
}

/// The three resolutions the model accepts.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Size {
    #[serde(rename = "1024x1024")]
    #[default]
    Square,
    #[serde(rename = "1792x1024")]
    Landscape,
    #[serde(rename = "1024x1792")]
    Portrait,
}

/// How the API hands back image bytes. We only ever ask for base64.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResponseFormat {
    #[serde(rename = "b64_json")]
    #[default]
    B64Json,
    #[serde(rename = "url")]
    Url,
}

impl Quality {
    pub fn as_str(self) -> &'static str {
        match self {
            Quality::Standard => "standard",
            Quality::Hd => "hd",
        }
    }
}

impl Style {
    pub fn as_str(self) -> &'static str {
        match self {
            Style::Vivid => "vivid",
            Style::Natural => "natural",
        }
    }
}

impl Size {
    pub fn as_str(self) -> &'static str {
        match self {
            Size::Square => "1024x1024",
            Size::Landscape => "1792x1024",
            Size::Portrait => "1024x1792",
        }
    }
}

macro_rules! display_and_parse {
    ($ty:ident, $label:literal, [$($variant:ident),+]) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $(
                    if s.eq_ignore_ascii_case($ty::$variant.as_str()) {
                        return Ok($ty::$variant);
                    }
                )+
                let allowed: Vec<&str> = vec![$($ty::$variant.as_str()),+];
                Err(format!("unknown {} '{}' (expected one of: {})", $label, s, allowed.join(", ")))
            }
        }
    };
}

display_and_parse!(Quality, "quality", [Standard, Hd]);
display_and_parse!(Style, "style", [Vivid, Natural]);
display_and_parse!(Size, "size", [Square, Landscape, Portrait]);

/// Settings a batch was generated with, shown under each assistant message.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageMeta {
    pub size: Size,
    pub quality: Quality,
    pub style: Style,
}

impl ImageMeta {
    /// e.g. `1024x1024, hd quality, vivid look`
    pub fn describe(&self) -> String {
        format!(
            "{}, {} quality, {} look",
            self.size, self.quality, self.style
        )
    }
}
