//! Wire types for the IntelliChat gateway.
//!
//! These types describe the JSON exchanged on `POST /api/chat`. They are shared by
//! the server (which validates requests against them), the HTTP client, and the
//! conversation renderer.

mod message;
mod provider;
mod request;
mod response;

pub use message::{ChatMessage, Reference, Role};
pub use provider::{AzureConfig, ProviderConfig, ProviderName, RemoteConfig};
pub use request::ChatRequest;
pub use response::{ChatResponse, ErrorBody, ResponseText};
