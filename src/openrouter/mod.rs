//! OpenRouter client (OpenAI-compatible API) used to list models and send chats.

mod client;
mod error;
mod models;

pub use client::{ModelProvider, OPENROUTER_BASE_URL, OpenRouterClient, create_openrouter_client};
pub use error::{OpenRouterError, OpenRouterResult};
pub use models::{Model, price_value};
