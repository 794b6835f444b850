pub mod provider;
pub mod providers;
pub mod types;

pub use provider::{ImageProvider, ImageRequest, ProviderError};
pub use providers::OpenAiImageProvider;
pub use types::{ImageMeta, Quality, ResponseFormat, Size, Style};
