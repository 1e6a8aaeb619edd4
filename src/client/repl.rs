//! The interactive chat loop.

use super::banner::{self, READY};
use super::prompt::{LineReader, Prompt, PromptResult};
use super::spinner::Spinner;
use crate::llm::ChatTransport;
use crate::render::{Renderer, Role};
use std::io::{self, Write};
use tracing::{debug, warn};

const GOODBYE: &str = "👋 Goodbye! Happy coding!";

/// A parsed line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Exit,
    Clear,
    Chat(String),
    Empty,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Empty;
        }
        match line.to_lowercase().as_str() {
            "exit" | "quit" | "bye" => Command::Exit,
            "clear" => Command::Clear,
            _ => Command::Chat(line.to_string()),
        }
    }
}

/// How a single exchange ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatOutcome {
    Replied,
    Failed,
    Interrupted,
}

/// One chat session: a transport plus the renderer for its replies.
pub struct Conversation<T> {
    transport: T,
    renderer: Renderer,
    animate: bool,
}

impl<T: ChatTransport> Conversation<T> {
    pub fn new(transport: T, renderer: Renderer, animate: bool) -> Self {
        Self {
            transport,
            renderer,
            animate,
        }
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Send `message` and render the reply, or the error in its place.
    pub async fn chat<W: Write>(&self, out: &mut W, message: &str) -> io::Result<ChatOutcome> {
        let spinner = Spinner::new(
            "🦆 Ducky is thinking...",
            self.renderer.theme().color(Role::Accent),
            self.animate,
        );
        let Some(result) = spinner.run(out, self.transport.send_message(message)).await? else {
            return Ok(ChatOutcome::Interrupted);
        };

        match result {
            Ok(reply) => {
                debug!(bytes = reply.len(), "rendering reply");
                self.renderer.render_reply(out, &reply)?;
                Ok(ChatOutcome::Replied)
            }
            Err(err) => {
                warn!(%err, "chat request failed");
                self.renderer
                    .status_line(out, Role::Error, &format!("❌ Error: {err}"))?;
                out.flush()?;
                Ok(ChatOutcome::Failed)
            }
        }
    }
}

/// Read, send, render until the user leaves.
pub async fn run_loop<T, R, W>(
    conversation: &Conversation<T>,
    reader: &mut R,
    out: &mut W,
) -> io::Result<()>
where
    T: ChatTransport,
    R: LineReader,
    W: Write,
{
    let renderer = conversation.renderer();
    renderer.text_panel(out, None, Role::Primary, READY)?;
    out.flush()?;

    let prompt = Prompt::new("🦆 You");
    loop {
        let line = match reader.read_line(&prompt)? {
            PromptResult::Submitted(line) => line,
            PromptResult::Cancelled => continue,
            PromptResult::Interrupted => break,
        };

        match Command::parse(&line) {
            Command::Empty => continue,
            Command::Exit => break,
            Command::Clear => banner::show_welcome(out, renderer)?,
            Command::Chat(message) => {
                if conversation.chat(out, &message).await? == ChatOutcome::Interrupted {
                    break;
                }
            }
        }
    }

    renderer.status_line(out, Role::Accent, GOODBYE)?;
    out.flush()
}
