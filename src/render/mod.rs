//! Terminal rendering of model replies.
//!
//! Prose segments go through the markdown renderer; code segments are drawn
//! in a highlighted panel followed by a copy hint. Output goes to any
//! [`Write`] sink and I/O errors are returned to the caller as-is.

pub mod highlight;
pub mod markdown;
pub mod panel;
pub mod theme;

pub use panel::{Align, Line, Panel, Span};
pub use theme::{DisplayTheme, Role};

use crate::segment::{segment, Segment};
use crossterm::queue;
use crossterm::style::{ContentStyle, Print, PrintStyledContent, Stylize};
use highlight::Highlighter;
use std::io::{self, Write};

/// Language label used when a fence has no tag.
pub const FALLBACK_LANGUAGE: &str = "text";

/// Draws segments with a fixed theme at a fixed width.
pub struct Renderer {
    theme: DisplayTheme,
    highlighter: Highlighter,
    width: usize,
}

impl Renderer {
    /// `width` is the panel width in columns.
    pub fn new(theme: DisplayTheme, width: usize) -> Self {
        let highlighter = Highlighter::new(theme.syntax_theme());
        Self {
            theme,
            highlighter,
            width: width.max(panel::MIN_WIDTH),
        }
    }

    pub fn theme(&self) -> &DisplayTheme {
        &self.theme
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Render a raw reply: header, segments, trailing blank line.
    pub fn render_reply<W: Write>(&self, out: &mut W, reply: &str) -> io::Result<()> {
        queue!(out, Print("\n"))?;
        Panel::new(self.width, self.theme.color(Role::Accent))
            .draw(out, &[vec![Span::new("🦆 Ducky's Response", bold())]])?;
        self.render(out, &segment(reply))?;
        queue!(out, Print("\n"))?;
        out.flush()
    }

    /// Render segments in order.
    pub fn render<W: Write>(&self, out: &mut W, segments: &[Segment]) -> io::Result<()> {
        for segment in segments {
            match segment {
                Segment::Prose { text } => self.render_prose(out, text)?,
                Segment::Code { language, body } => self.render_code(out, language, body)?,
            }
        }
        out.flush()
    }

    fn render_prose<W: Write>(&self, out: &mut W, text: &str) -> io::Result<()> {
        for line in markdown::render_markdown(text, &self.theme) {
            write_line(out, &line)?;
        }
        Ok(())
    }

    fn render_code<W: Write>(&self, out: &mut W, language: &str, body: &str) -> io::Result<()> {
        let language = if language.is_empty() {
            FALLBACK_LANGUAGE
        } else {
            language
        };
        let lines = self.highlighter.highlight(body, language);
        Panel::new(self.width, self.theme.color(Role::Muted))
            .title(language)
            .fill(self.theme.color(Role::CodeBackground))
            .draw(out, &lines)?;
        self.status_line(
            out,
            Role::Muted,
            &format!("💡 Tip: You can copy this {} code", language),
        )
    }

    /// One line of text in a theme color.
    pub fn status_line<W: Write>(&self, out: &mut W, role: Role, text: &str) -> io::Result<()> {
        queue!(
            out,
            PrintStyledContent(text.with(self.theme.color(role))),
            Print("\n")
        )
    }

    /// A bordered panel of plain text lines.
    pub fn text_panel<W: Write>(
        &self,
        out: &mut W,
        title: Option<&str>,
        role: Role,
        text: &str,
    ) -> io::Result<()> {
        let lines: Vec<Line> = text.lines().map(|l| vec![Span::plain(l)]).collect();
        let mut panel = Panel::new(self.width, self.theme.color(role));
        if let Some(title) = title {
            panel = panel.title(title);
        }
        panel.draw(out, &lines)
    }
}

/// Print a styled line followed by a newline.
pub fn write_line<W: Write>(out: &mut W, line: &[Span]) -> io::Result<()> {
    for span in line {
        queue!(out, PrintStyledContent(span.style.apply(span.text.as_str())))?;
    }
    queue!(out, Print("\n"))
}

/// Bold default-colored text.
pub fn bold() -> ContentStyle {
    let mut style = ContentStyle::new();
    style.attributes.set(crossterm::style::Attribute::Bold);
    style
}

/// Remove CSI escape sequences, leaving the visible text.
#[cfg(test)]
pub(crate) fn strip_ansi(text: &str) -> String {
    let mut visible = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\x1b' {
            visible.push(c);
            continue;
        }
        if chars.peek() == Some(&'[') {
            chars.next();
            for c in chars.by_ref() {
                if ('@'..='~').contains(&c) {
                    break;
                }
            }
        }
    }
    visible
}
