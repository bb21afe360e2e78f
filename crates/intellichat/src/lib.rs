//! IntelliChat - a thin chat gateway in front of OpenAI, Azure OpenAI, Mistral, Anthropic and Cohere.

pub mod chat;
pub mod cli;
pub mod client;
pub mod config;
pub mod context;
pub mod handlers;
pub mod keys;
pub mod llm;
pub mod response;
pub mod server;
pub mod terminal;
