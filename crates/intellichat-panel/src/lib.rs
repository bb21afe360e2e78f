//! Conversation renderer.
//!
//! [`render`] is a pure function from a message list (or a single initial
//! message) to a flat list of [`PanelNode`]s. [`ChatPanel`] wraps it with the one
//! side effect the panel has: keeping the end anchor scrolled into view whenever
//! the message list changes identity.

mod effect;

use std::borrow::Cow;
use std::sync::Arc;

use intellichat_types::ChatMessage;

pub use effect::EffectDeps;

/// One rendered child of the panel.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelNode<'a> {
    Message(MessageItem<'a>),
    /// Empty element placed after the last message; the scroll target.
    EndAnchor,
}

/// A rendered message.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageItem<'a> {
    /// Stable key: the message id, or its position when the caller gave none.
    pub key: Cow<'a, str>,
    pub message: &'a ChatMessage,
    /// Set only on the final message of a list (drives the cursor display).
    pub last: bool,
}

impl PanelNode<'_> {
    pub fn as_message(&self) -> Option<&MessageItem<'_>> {
        match self {
            PanelNode::Message(item) => Some(item),
            PanelNode::EndAnchor => None,
        }
    }
}

/// Render a conversation.
///
/// A non-empty `chat` wins over `initial`. An initial message renders alone,
/// without the end anchor. With neither, nothing is rendered.
pub fn render<'a>(
    chat: Option<&'a [ChatMessage]>,
    initial: Option<&'a ChatMessage>,
) -> Vec<PanelNode<'a>> {
    if let Some(chat) = chat.filter(|c| !c.is_empty()) {
        let last_index = chat.len() - 1;
        let mut nodes: Vec<PanelNode<'a>> = chat
            .iter()
            .enumerate()
            .map(|(index, message)| {
                PanelNode::Message(MessageItem {
                    key: message_key(message, index),
                    message,
                    last: index == last_index,
                })
            })
            .collect();
        nodes.push(PanelNode::EndAnchor);
        return nodes;
    }

    if let Some(message) = initial {
        return vec![PanelNode::Message(MessageItem {
            key: message_key(message, 0),
            message,
            last: false,
        })];
    }

    Vec::new()
}

fn message_key(message: &ChatMessage, index: usize) -> Cow<'_, str> {
    match message.id.as_deref() {
        Some(id) => Cow::Borrowed(id),
        None => Cow::Owned(index.to_string()),
    }
}

/// How the anchor is brought into view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Smooth,
    Instant,
}

/// The surface that owns the anchor element (a browser view, a terminal, ...).
pub trait ScrollTarget {
    fn scroll_into_view(&mut self, behavior: ScrollBehavior);
}

/// Reference to the end anchor. Attached only while the anchor is rendered.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AnchorRef {
    attached: bool,
}

impl AnchorRef {
    pub fn is_attached(&self) -> bool {
        self.attached
    }
}

/// The conversation panel.
///
/// Holds nothing but the anchor reference and the dependency record of its
/// scroll effect.
#[derive(Debug, Default)]
pub struct ChatPanel {
    end_ref: AnchorRef,
    scroll_deps: EffectDeps<[ChatMessage]>,
}

impl ChatPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn end_ref(&self) -> AnchorRef {
        self.end_ref
    }

    /// Render one frame and update the anchor reference.
    pub fn render<'a>(
        &mut self,
        chat: Option<&'a Arc<[ChatMessage]>>,
        initial: Option<&'a ChatMessage>,
    ) -> Vec<PanelNode<'a>> {
        let nodes = render(chat.map(|c| &c[..]), initial);
        self.end_ref.attached = matches!(nodes.last(), Some(PanelNode::EndAnchor));
        nodes
    }

    /// Run the scroll effect once the rendered frame is on screen.
    ///
    /// Scrolls the anchor into view when `chat` is a different list than on the
    /// previous call (or on the first call) and the anchor is attached.
    pub fn run_effects<T: ScrollTarget + ?Sized>(
        &mut self,
        chat: Option<&Arc<[ChatMessage]>>,
        target: &mut T,
    ) {
        if self.scroll_deps.changed(chat) && self.end_ref.is_attached() {
            target.scroll_into_view(ScrollBehavior::Smooth);
        }
    }
}
