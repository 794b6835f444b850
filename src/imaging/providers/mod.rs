pub mod openai;

pub use openai::OpenAiImageProvider;
