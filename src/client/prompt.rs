//! Line input.
//!
//! Renders a bordered single-line input box in a small inline viewport under
//! the scrollback, similar to `gum input`. Once a line is submitted the box
//! is wiped and the line is echoed into the scrollback.

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    style::{Color as TermColor, Print, PrintStyledContent, Stylize},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    backend::CrosstermBackend,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal, TerminalOptions, Viewport,
};
use std::io::{self, Stdout};
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

/// Rows taken by the input box: border, text, border.
const VIEWPORT_HEIGHT: u16 = 3;

/// Character shown in place of secret input.
const MASK: char = '•';

/// What the user did at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptResult {
    /// User submitted a line (possibly empty).
    Submitted(String),
    /// User backed out with Escape.
    Cancelled,
    /// User pressed Ctrl+C or Ctrl+D.
    Interrupted,
}

/// A question to ask.
#[derive(Debug, Clone)]
pub struct Prompt {
    pub label: String,
    /// Hide the typed characters.
    pub secret: bool,
    /// Used when the user submits an empty line.
    pub default: Option<String>,
}

impl Prompt {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            secret: false,
            default: None,
        }
    }

    pub fn secret(mut self) -> Self {
        self.secret = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Apply the default to an empty submission.
    fn resolve(&self, value: String) -> String {
        match &self.default {
            Some(default) if value.trim().is_empty() => default.clone(),
            _ => value,
        }
    }
}

/// Source of user input lines.
pub trait LineReader {
    fn read_line(&mut self, prompt: &Prompt) -> io::Result<PromptResult>;
}

/// Reads lines from the real terminal.
pub struct TerminalPrompt {
    accent: TermColor,
    muted: TermColor,
}

impl TerminalPrompt {
    pub fn new(accent: TermColor, muted: TermColor) -> Self {
        Self { accent, muted }
    }

    /// Leave a record of the answer in the scrollback.
    fn echo(&self, prompt: &Prompt, result: &PromptResult) -> io::Result<()> {
        let PromptResult::Submitted(value) = result else {
            return Ok(());
        };
        let shown = if prompt.secret {
            "(hidden)".to_string()
        } else {
            value.clone()
        };
        execute!(
            io::stdout(),
            PrintStyledContent(format!("{}: ", prompt.label).with(self.accent).bold()),
            PrintStyledContent(shown.with(if prompt.secret { self.muted } else { TermColor::Reset })),
            Print("\n")
        )
    }
}

/// Restores cooked mode even if the input loop bails out early.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

impl LineReader for TerminalPrompt {
    fn read_line(&mut self, prompt: &Prompt) -> io::Result<PromptResult> {
        let result = {
            let _raw = RawModeGuard::enable()?;
            let backend = CrosstermBackend::new(io::stdout());
            let mut terminal = Terminal::with_options(
                backend,
                TerminalOptions {
                    viewport: Viewport::Inline(VIEWPORT_HEIGHT),
                },
            )?;

            let result = run_input_loop(&mut terminal, prompt, self.accent, self.muted);

            // Wipe the input box; the cursor is left where it started.
            terminal.clear()?;
            result?
        };

        let result = match result {
            PromptResult::Submitted(value) => PromptResult::Submitted(prompt.resolve(value)),
            other => other,
        };
        self.echo(prompt, &result)?;
        Ok(result)
    }
}

/// The main input loop.
fn run_input_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    prompt: &Prompt,
    accent: TermColor,
    muted: TermColor,
) -> io::Result<PromptResult> {
    let mut input = Input::default();

    loop {
        terminal.draw(|frame| draw_ui(frame, &input, prompt, accent, muted))?;

        if let Event::Key(key) = event::read()? {
            // Only handle key press events (not release)
            if key.kind != KeyEventKind::Press {
                continue;
            }

            match key.code {
                KeyCode::Enter => {
                    return Ok(PromptResult::Submitted(input.value().to_string()));
                }
                KeyCode::Esc => {
                    return Ok(PromptResult::Cancelled);
                }
                KeyCode::Char('c') | KeyCode::Char('d')
                    if key.modifiers.contains(KeyModifiers::CONTROL) =>
                {
                    return Ok(PromptResult::Interrupted);
                }
                _ => {
                    input.handle_event(&Event::Key(key));
                }
            }
        }
    }
}

/// Draw the input box.
fn draw_ui(frame: &mut Frame, input: &Input, prompt: &Prompt, accent: TermColor, muted: TermColor) {
    let area = frame.area();

    let block = Block::default()
        .title(format!(" {} ", prompt.label))
        .title_style(
            Style::default()
                .fg(to_ratatui(accent))
                .add_modifier(Modifier::BOLD),
        )
        .borders(Borders::ALL)
        .border_style(Style::default().fg(to_ratatui(muted)));

    let inner_area = block.inner(area);
    frame.render_widget(block, area);

    let width = inner_area.width as usize;
    let scroll = input.visual_scroll(width);

    let content = if input.value().is_empty() {
        let hint = prompt
            .default
            .as_ref()
            .map(|d| format!("default: {}", d))
            .unwrap_or_default();
        Line::from(Span::styled(hint, Style::default().fg(to_ratatui(muted))))
    } else {
        Line::from(Span::raw(display_value(input.value(), prompt.secret)))
    };

    let paragraph = Paragraph::new(content).scroll((0, scroll as u16));
    frame.render_widget(paragraph, inner_area);

    let cursor_x = inner_area.x + cursor_offset(input.visual_cursor(), scroll) as u16;
    frame.set_cursor_position((cursor_x, inner_area.y));
}

/// Text shown in the box; secrets are masked one symbol per character.
fn display_value(value: &str, secret: bool) -> String {
    if secret {
        value.chars().map(|_| MASK).collect()
    } else {
        value.to_string()
    }
}

/// Cursor column relative to the visible window.
fn cursor_offset(visual_cursor: usize, scroll: usize) -> usize {
    visual_cursor.max(scroll) - scroll
}

fn to_ratatui(color: TermColor) -> Color {
    match color {
        TermColor::Rgb { r, g, b } => Color::Rgb(r, g, b),
        TermColor::AnsiValue(v) => Color::Indexed(v),
        TermColor::Black => Color::Black,
        TermColor::DarkGrey => Color::DarkGray,
        TermColor::Red | TermColor::DarkRed => Color::Red,
        TermColor::Green | TermColor::DarkGreen => Color::Green,
        TermColor::Yellow | TermColor::DarkYellow => Color::Yellow,
        TermColor::Blue | TermColor::DarkBlue => Color::Blue,
        TermColor::Magenta | TermColor::DarkMagenta => Color::Magenta,
        TermColor::Cyan | TermColor::DarkCyan => Color::Cyan,
        TermColor::White => Color::White,
        TermColor::Grey => Color::Gray,
        TermColor::Reset => Color::Reset,
    }
}
