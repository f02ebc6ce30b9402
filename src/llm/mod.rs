pub mod client;
pub mod legal;
pub mod provider;
pub mod resolver;
pub mod vision;

pub use client::LlmClient;
pub use legal::{LegalTextGenerator, LegalTextRequest};
pub use provider::{create_provider, LlmProvider};
pub use resolver::ModelResolver;
