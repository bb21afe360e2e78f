//! HTTP request handlers.

mod chat;
mod health;

pub use chat::{ChatError, chat};
pub use health::{livez, readyz};
