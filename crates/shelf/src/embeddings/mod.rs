//! Embedding providers.
//!
//! Providers are selected by configuration (`service:` key) and expose a text
//! capability and, for multimodal services, an image capability.

pub mod image;
pub mod provider;
pub mod providers;

pub use image::{ImageFormat, ImageInput};
pub use provider::{create_provider, EmbeddingProvider};
