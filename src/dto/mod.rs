/// Chat request and reply payloads.
pub mod chat;
/// Expert listing and selection payloads.
pub mod expert;
/// Health check payload.
pub mod health;
