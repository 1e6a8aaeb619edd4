//! Screen clearing and the welcome banner.

use crate::render::{Align, Panel, Renderer, Role, Span};
use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::{Print, PrintStyledContent, Stylize};
use crossterm::terminal::{Clear, ClearType};
use std::io::{self, Write};
use unicode_width::UnicodeWidthStr;

const LOGO: &str = r"
██████╗ ██╗   ██╗ ██████╗██╗  ██╗██╗   ██╗
██╔══██╗██║   ██║██╔════╝██║ ██╔╝╚██╗ ██╔╝
██║  ██║██║   ██║██║     █████╔╝  ╚████╔╝
██║  ██║██║   ██║██║     ██╔═██╗   ╚██╔╝
██████╔╝╚██████╔╝╚██████╗██║  ██╗   ██║
╚═════╝  ╚═════╝  ╚═════╝╚═╝  ╚═╝   ╚═╝
";

const WELCOME: [&str; 2] = ["Welcome to Ducky AI! 🦆", "Your intelligent coding companion"];

pub const READY: &str = "🦆 Ducky is ready! Type your programming questions or requests.\n\
Commands: 'exit' or 'quit' to leave, 'clear' to clear screen";

/// Clear the screen and scrollback, cursor to the top-left.
pub fn clear_screen<W: Write>(out: &mut W) -> io::Result<()> {
    queue!(out, Clear(ClearType::All), Clear(ClearType::Purge), MoveTo(0, 0))?;
    out.flush()
}

/// Clear the screen and draw the logo and welcome panel.
pub fn show_welcome<W: Write>(out: &mut W, renderer: &Renderer) -> io::Result<()> {
    clear_screen(out)?;

    let accent = renderer.theme().color(Role::Accent);
    let logo_width = LOGO.lines().map(|l| l.width()).max().unwrap_or(0);
    let indent = " ".repeat(renderer.width().saturating_sub(logo_width) / 2);
    for line in LOGO.lines() {
        queue!(
            out,
            Print(&indent),
            PrintStyledContent(line.with(accent)),
            Print("\n")
        )?;
    }

    let welcome: Vec<_> = WELCOME
        .iter()
        .map(|line| vec![Span::new(*line, crate::render::bold())])
        .collect();
    Panel::new(renderer.width(), renderer.theme().color(Role::Primary))
        .align(Align::Center)
        .vertical_padding(1)
        .draw(out, &welcome)?;

    queue!(out, Print("\n"))?;
    out.flush()
}
