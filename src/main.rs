//! ducky - a rubber duck for programmers, in the terminal.
//!
//! Chats with an OpenAI-compatible model and renders its replies with the
//! prose formatted as markdown and the code blocks highlighted in panels.

mod client;
mod config;
mod credentials;
mod llm;
mod render;
mod segment;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use client::{banner, ChatOutcome, Conversation, TerminalPrompt};
use config::Settings;
use credentials::CredentialStore;
use crossterm::execute;
use crossterm::style::{Print, PrintStyledContent, Stylize};
use crossterm::tty::IsTty;
use llm::OpenAiTransport;
use render::{DisplayTheme, Renderer, Role};
use std::io::{self, Write};
use std::process::Command as ProcessCommand;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Width used when the terminal size is unknown.
const DEFAULT_WIDTH: usize = 80;

#[derive(Parser)]
#[command(name = "ducky")]
#[command(author, version, about = "Your intelligent coding companion in the terminal")]
struct Cli {
    /// Ask a single question and exit
    #[arg(value_name = "QUESTION")]
    query: Option<String>,

    /// Override the configured model
    #[arg(short = 'm', long, value_name = "MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Enter and verify an API key, replacing any stored one
    Setup,
    /// Open the settings file in $EDITOR
    Config,
}

/// Everything a session needs, resolved from settings and flags.
struct App {
    settings: Settings,
    store: CredentialStore,
    renderer: Renderer,
    /// Stdout is a terminal; spinners animate.
    interactive: bool,
}

impl App {
    fn load(model: Option<String>) -> Result<Self> {
        let mut settings = Settings::load().context("Failed to load settings")?;
        if let Some(model) = model {
            settings.api.model = model;
        }
        let store = CredentialStore::open_default()?;
        let renderer = Renderer::new(DisplayTheme::from_settings(&settings.theme), terminal_width());
        Ok(Self {
            settings,
            store,
            renderer,
            interactive: io::stdout().is_tty(),
        })
    }

    fn prompt(&self) -> TerminalPrompt {
        let theme = self.renderer.theme();
        TerminalPrompt::new(theme.color(Role::Accent), theme.color(Role::Muted))
    }

    fn conversation(self, api_key: String) -> Result<Conversation<OpenAiTransport>> {
        let transport = OpenAiTransport::new(&self.settings.api, api_key)
            .context("Failed to create HTTP client")?;
        info!(model = transport.model(), "chat transport ready");
        Ok(Conversation::new(transport, self.renderer, self.interactive))
    }
}

#[tokio::main]
async fn main() {
    init_logging();
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        let _ = execute!(
            io::stderr(),
            PrintStyledContent(format!("❌ Fatal error: {err:#}").red()),
            Print("\n")
        );
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("DUCKY_LOG").unwrap_or_else(|_| EnvFilter::new("ducky=error"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Config) => handle_config(),
        Some(Commands::Setup) => handle_setup(App::load(cli.model)?).await,
        None => {
            let app = App::load(cli.model)?;
            match cli.query {
                Some(query) => handle_query(app, &query).await,
                None => run_interactive(app).await,
            }
        }
    }
}

/// Full interactive session: banner, key check or onboarding, chat loop.
async fn run_interactive(app: App) -> Result<()> {
    let mut out = io::stdout();
    let mut reader = app.prompt();

    banner::show_welcome(&mut out, &app.renderer)?;

    let api_key = match app.store.resolve_api_key() {
        Some(key) => {
            app.renderer
                .status_line(&mut out, Role::Success, "✅ API key found! Ducky is ready.")?;
            out.flush()?;
            tokio::time::sleep(Duration::from_secs(1)).await;
            key
        }
        None => match onboard(&app, &mut reader, &mut out).await? {
            Some(key) => key,
            None => return Ok(()),
        },
    };

    let conversation = app.conversation(api_key)?;
    banner::show_welcome(&mut out, conversation.renderer())?;
    client::run_loop(&conversation, &mut reader, &mut out).await?;
    Ok(())
}

/// Run setup. `None` means the user backed out and was told so.
async fn onboard(
    app: &App,
    reader: &mut TerminalPrompt,
    out: &mut io::Stdout,
) -> Result<Option<String>> {
    let verifier = client::ApiKeyVerifier::new(app.settings.api.clone());
    let key = client::run_setup(reader, &verifier, &app.store, &app.renderer, out, app.interactive)
        .await?;

    match key {
        Some(key) => {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Ok(Some(key))
        }
        None => {
            app.renderer
                .status_line(out, Role::Error, "❌ Setup cancelled. Exiting...")?;
            out.flush()?;
            Ok(None)
        }
    }
}

/// Handle the setup command.
async fn handle_setup(app: App) -> Result<()> {
    let mut out = io::stdout();
    let mut reader = app.prompt();
    banner::show_welcome(&mut out, &app.renderer)?;
    onboard(&app, &mut reader, &mut out).await?;
    Ok(())
}

/// Ask one question, print the reply, exit non-zero if it failed.
async fn handle_query(app: App, query: &str) -> Result<()> {
    let api_key = app
        .store
        .resolve_api_key()
        .ok_or_else(|| anyhow!("No API key configured. Run `ducky setup` first."))?;

    let mut out = io::stdout();
    let conversation = app.conversation(api_key)?;
    match conversation.chat(&mut out, query).await? {
        ChatOutcome::Replied => Ok(()),
        ChatOutcome::Failed | ChatOutcome::Interrupted => std::process::exit(1),
    }
}

/// Handle the config command.
fn handle_config() -> Result<()> {
    let settings_path = Settings::settings_path()?;

    if !settings_path.exists() {
        Settings::default().save()?;
        println!("Created default settings at {}", settings_path.display());
    }

    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
    let status = ProcessCommand::new(&editor)
        .arg(&settings_path)
        .status()
        .context("Failed to open editor")?;

    if !status.success() {
        eprintln!("Editor exited with non-zero status");
    }

    Ok(())
}

fn terminal_width() -> usize {
    crossterm::terminal::size()
        .map(|(columns, _)| columns as usize)
        .unwrap_or(DEFAULT_WIDTH)
}
