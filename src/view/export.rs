//! Saving a displayed image to a file.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::info;

#[derive(Debug)]
pub enum ExportError {
    /// Source isn't a base64 `data:` URI.
    NotDataUri,
    Decode(base64::DecodeError),
    Io(io::Error),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::NotDataUri => write!(f, "image source is not a base64 data URI"),
            ExportError::Decode(e) => write!(f, "image payload is not valid base64: {e}"),
            ExportError::Io(e) => write!(f, "failed to write image: {e}"),
        }
    }
}

impl std::error::Error for ExportError {}

/// A decoded `data:<mime>;base64,<payload>` URI.
#[derive(Debug, PartialEq, Eq)]
pub struct DecodedImage {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl DecodedImage {
    /// File extension matching the MIME type, `bin` if unknown.
    pub fn extension(&self) -> &str {
        match self.mime.as_str() {
            "image/png" => "png",
            "image/jpeg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "bin",
        }
    }
}

pub fn decode_data_uri(src: &str) -> Result<DecodedImage, ExportError> {
    let rest = src.strip_prefix("data:").ok_or(ExportError::NotDataUri)?;
    let (header, payload) = rest.split_once(',').ok_or(ExportError::NotDataUri)?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or(ExportError::NotDataUri)?;
    let bytes = STANDARD.decode(payload).map_err(ExportError::Decode)?;
    Ok(DecodedImage {
        mime: if mime.is_empty() {
            "application/octet-stream".to_string()
        } else {
            mime.to_string()
        },
        bytes,
    })
}

/// Decodes `src` and writes the raw image bytes to `path`. Returns the byte count.
pub fn export_image(src: &str, path: &Path) -> Result<usize, ExportError> {
    let image = decode_data_uri(src)?;
    fs::write(path, &image.bytes).map_err(ExportError::Io)?;
    info!("Exported {} bytes to {}", image.bytes.len(), path.display());
    Ok(image.bytes.len())
}
