//! Embedding provider implementations, one per service.

mod http;

pub mod ark;
pub mod mock;
pub mod ollama;
pub mod openai;

pub use ark::ArkProvider;
pub use mock::MockProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
