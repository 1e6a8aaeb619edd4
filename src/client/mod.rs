//! Terminal front end.
//!
//! - `banner`: logo and welcome panel
//! - `prompt`: inline line input
//! - `setup`: first-run API key onboarding
//! - `repl`: the chat loop
//! - `spinner`: progress indicator while a request is in flight

pub mod banner;
pub mod prompt;
pub mod repl;
pub mod setup;
pub mod spinner;

pub use prompt::TerminalPrompt;
pub use repl::{run_loop, ChatOutcome, Conversation};
pub use setup::{run_setup, ApiKeyVerifier};
