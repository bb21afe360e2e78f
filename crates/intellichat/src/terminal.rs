//! Terminal surface for the conversation panel.

use std::io::{self, Write};

use intellichat_panel::{PanelNode, ScrollBehavior, ScrollTarget};
use intellichat_types::Role;
use tracing::debug;

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";
const SEPARATOR: &str = "────";

/// Draws rendered panel frames to a writer.
pub struct TerminalView<W: Write> {
    out: W,
    clear_screen: bool,
    scrolls: usize,
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            clear_screen: true,
            scrolls: 0,
        }
    }

    /// Append frames instead of redrawing in place.
    pub fn without_clear(mut self) -> Self {
        self.clear_screen = false;
        self
    }

    /// Number of times the end anchor was scrolled into view.
    pub fn scrolls(&self) -> usize {
        self.scrolls
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Draw one frame, with an optional status line under the conversation.
    pub fn draw(&mut self, nodes: &[PanelNode<'_>], status: Option<&str>) -> io::Result<()> {
        if self.clear_screen {
            write!(self.out, "{CLEAR_SCREEN}")?;
        }

        let items: Vec<_> = nodes.iter().filter_map(PanelNode::as_message).collect();
        for (index, item) in items.iter().enumerate() {
            let speaker = match item.message.role {
                Role::User => "you",
                Role::Assistant => "assistant",
                Role::System => "system",
            };
            writeln!(self.out, "{speaker}: {}", item.message.content)?;

            if let Some(references) = item.message.references.as_deref()
                && !references.is_empty()
            {
                let names: Vec<&str> = references
                    .iter()
                    .map(|r| r.document_name.as_str())
                    .collect();
                writeln!(self.out, "  sources: {}", names.join(", "))?;
            }
            if index + 1 < items.len() {
                writeln!(self.out, "{SEPARATOR}")?;
            }
        }

        if let Some(status) = status {
            writeln!(self.out, "({status})")?;
        }
        Ok(())
    }
}

impl<W: Write> ScrollTarget for TerminalView<W> {
    fn scroll_into_view(&mut self, behavior: ScrollBehavior) {
        // A terminal is always scrolled to its last line once output is flushed.
        if let Err(e) = self.out.flush() {
            debug!(error = %e, ?behavior, "Failed to flush terminal");
        }
        self.scrolls += 1;
    }
}
