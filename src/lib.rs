//! DragonScales: a mixture-of-experts router over free OpenRouter models.
//!
//! The library backs three binaries: the `dragonscales` worker, the HTTPS `dragonscales-ui`
//! and the `chat-log-tail` helper.

pub mod bootstrap;
pub mod cache;
pub mod config;
pub mod dragon;
mod dto;
mod error;
pub mod logtail;
pub mod openrouter;
pub mod router;
pub mod routes;
pub mod services;
pub mod state;
pub mod telemetry;
pub mod tls;
pub mod vault;
