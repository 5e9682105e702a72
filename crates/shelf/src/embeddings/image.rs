//! Image payloads for multimodal embedders.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::Path;
use topicshelf_core::{AppError, AppResult};

/// Image subtypes accepted by image embedders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Webp,
    Bmp,
}

impl ImageFormat {
    /// Map a file extension (case-insensitive, `.jpg` included) to a format.
    pub fn from_extension(ext: &str) -> AppResult<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "webp" => Ok(Self::Webp),
            "bmp" => Ok(Self::Bmp),
            other => Err(AppError::UnsupportedImage(other.to_string())),
        }
    }

    pub fn from_path(path: &Path) -> AppResult<Self> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        Self::from_extension(ext)
    }

    /// MIME subtype (`image/<subtype>`).
    pub fn subtype(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Webp => "webp",
            Self::Bmp => "bmp",
        }
    }
}

/// Base64-encoded image ready to send to a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInput {
    pub format: ImageFormat,
    pub base64: String,
}

impl ImageInput {
    pub fn from_bytes(format: ImageFormat, bytes: &[u8]) -> Self {
        Self {
            format,
            base64: STANDARD.encode(bytes),
        }
    }

    /// Read and encode an image file.
    ///
    /// The format is checked before the file is read.
    pub async fn from_path(path: &Path) -> AppResult<Self> {
        let format = ImageFormat::from_path(path)?;
        let bytes = tokio::fs::read(path).await?;
        Ok(Self::from_bytes(format, &bytes))
    }

    /// `data:` URL form used by OpenAI-style image inputs.
    pub fn data_url(&self) -> String {
        format!("data:image/{};base64,{}", self.format.subtype(), self.base64)
    }
}
