//! Interactive terminal chat against a running gateway.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::sync::Arc;

use intellichat_panel::ChatPanel;
use intellichat_types::{ChatMessage, ChatRequest, ProviderConfig, ProviderName};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;
use ulid::Ulid;

use crate::client::ChatClient;
use crate::terminal::TerminalView;

const WELCOME: &str = "Hi, how can I help you today? Type /quit to leave.";

/// Options for a terminal chat session.
#[derive(Debug, Clone)]
pub struct ChatOptions {
    pub url: String,
    pub provider: ProviderName,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub system_message: Option<String>,
    pub n: u32,
    pub with_context: bool,
    pub one_key: Option<String>,
    pub documents: bool,
}

impl ChatOptions {
    /// Build the request for the conversation so far.
    pub fn request(&self, messages: Vec<ChatMessage>) -> ChatRequest {
        let mut providers = BTreeMap::new();
        if self.api_key.is_some() || self.model.is_some() {
            let mut config = ProviderConfig::default_for(self.provider);
            if let Some(key) = &self.api_key {
                config = config.with_api_key(key.clone());
            }
            if let Some(model) = &self.model {
                config = config.with_model(model.clone());
            }
            providers.insert(self.provider, config);
        }

        ChatRequest {
            providers,
            provider: Some(self.provider),
            system_message: self.system_message.clone(),
            n: Some(self.n),
            with_context: self.with_context,
            intellinode_data: self.documents,
            one_key: self.one_key.clone(),
            ..ChatRequest::new(messages)
        }
    }
}

fn new_id() -> String {
    Ulid::new().to_string()
}

struct Session<W: Write> {
    panel: ChatPanel,
    view: TerminalView<W>,
    welcome: ChatMessage,
    chat: Option<Arc<[ChatMessage]>>,
}

impl<W: Write> Session<W> {
    fn redraw(&mut self, status: Option<&str>) -> io::Result<()> {
        let nodes = self.panel.render(self.chat.as_ref(), Some(&self.welcome));
        self.view.draw(&nodes, status)?;
        self.panel.run_effects(self.chat.as_ref(), &mut self.view);
        Ok(())
    }

    fn messages(&self) -> Vec<ChatMessage> {
        self.chat.as_deref().map(<[ChatMessage]>::to_vec).unwrap_or_default()
    }

    /// Publish a new list; the panel scrolls because its identity changed.
    fn set_messages(&mut self, messages: Vec<ChatMessage>) {
        self.chat = Some(messages.into());
    }
}

/// Run the chat loop until stdin closes or the user types `/quit`.
pub async fn run(options: ChatOptions) -> anyhow::Result<()> {
    let client = ChatClient::new(&options.url);
    let mut session = Session {
        panel: ChatPanel::new(),
        view: TerminalView::new(io::stdout()),
        welcome: ChatMessage::assistant(WELCOME).with_id(new_id()),
        chat: None,
    };
    session.redraw(None)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if matches!(text, "/quit" | "/exit") {
            break;
        }

        let mut messages = session.messages();
        messages.push(ChatMessage::user(text).with_id(new_id()));
        session.set_messages(messages.clone());
        session.redraw(Some("thinking..."))?;

        match client.send(&options.request(messages.clone())).await {
            Ok(response) => {
                let content = response.response.primary().unwrap_or_default().to_string();
                let mut reply = ChatMessage::assistant(content).with_id(new_id());
                if let Some(references) = response.references.filter(|r| !r.is_empty()) {
                    reply = reply.with_references(references);
                }
                messages.push(reply);
                session.set_messages(messages);
                session.redraw(None)?;
            }
            Err(e) => {
                warn!(error = %e, "Chat request failed");
                session.redraw(Some(&format!("error: {e}")))?;
            }
        }
    }

    Ok(())
}
