//! Bordered panels.
//!
//! A panel is a rounded box drawn with box-drawing characters around a list
//! of styled lines. Content wider than the panel is hard-wrapped at display
//! width and every row is padded so the right border lines up.

use crossterm::queue;
use crossterm::style::{Color, ContentStyle, Print, PrintStyledContent, Stylize};
use std::io::{self, Write};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Narrowest panel we will draw.
pub const MIN_WIDTH: usize = 12;

/// A run of text sharing one style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub style: ContentStyle,
}

impl Span {
    pub fn new(text: impl Into<String>, style: ContentStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, ContentStyle::new())
    }
}

/// One visual line.
pub type Line = Vec<Span>;

/// Display width of a line.
pub fn line_width(line: &[Span]) -> usize {
    line.iter().map(|span| span.text.width()).sum()
}

/// Break a line into rows no wider than `width` columns. Always returns at
/// least one row. A character wider than `width` gets a row of its own.
pub fn wrap_line(line: &[Span], width: usize) -> Vec<Line> {
    let width = width.max(1);
    let mut rows = Vec::new();
    let mut row: Line = Vec::new();
    let mut row_width = 0;

    for span in line {
        let mut text = String::new();
        for ch in span.text.chars() {
            let ch_width = ch.width().unwrap_or(0);
            if row_width + ch_width > width && row_width > 0 {
                if !text.is_empty() {
                    row.push(Span::new(std::mem::take(&mut text), span.style));
                }
                rows.push(std::mem::take(&mut row));
                row_width = 0;
            }
            text.push(ch);
            row_width += ch_width;
        }
        if !text.is_empty() {
            row.push(Span::new(text, span.style));
        }
    }

    rows.push(row);
    rows
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

/// Box layout and colors.
#[derive(Debug, Clone)]
pub struct Panel<'a> {
    width: usize,
    title: Option<&'a str>,
    border: Color,
    fill: Option<Color>,
    align: Align,
    vertical_padding: usize,
}

impl<'a> Panel<'a> {
    /// A panel `width` columns wide, borders included.
    pub fn new(width: usize, border: Color) -> Self {
        Self {
            width: width.max(MIN_WIDTH),
            title: None,
            border,
            fill: None,
            align: Align::Left,
            vertical_padding: 0,
        }
    }

    pub fn title(mut self, title: &'a str) -> Self {
        self.title = Some(title);
        self
    }

    /// Background color for the inside of the box.
    pub fn fill(mut self, color: Color) -> Self {
        self.fill = Some(color);
        self
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    /// Blank rows above and below the content.
    pub fn vertical_padding(mut self, rows: usize) -> Self {
        self.vertical_padding = rows;
        self
    }

    /// Columns available for content.
    pub fn inner_width(&self) -> usize {
        self.width - 4
    }

    /// Draw the panel. An empty `lines` draws one blank row.
    pub fn draw<W: Write>(&self, out: &mut W, lines: &[Line]) -> io::Result<()> {
        self.draw_top(out)?;

        let blank: Line = Vec::new();
        for _ in 0..self.vertical_padding {
            self.draw_row(out, &blank)?;
        }

        if lines.is_empty() {
            self.draw_row(out, &blank)?;
        }
        for line in lines {
            for row in wrap_line(line, self.inner_width()) {
                self.draw_row(out, &row)?;
            }
        }

        for _ in 0..self.vertical_padding {
            self.draw_row(out, &blank)?;
        }

        self.draw_bottom(out)
    }

    fn draw_top<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let mut top = String::from("╭─");
        if let Some(title) = self.title {
            let label = format!(" {} ", title);
            top.push_str(&label);
        }
        let used = top.width();
        top.push_str(&"─".repeat(self.width.saturating_sub(used + 1)));
        top.push('╮');
        queue!(out, PrintStyledContent(top.with(self.border)), Print("\n"))
    }

    fn draw_bottom<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let bottom = format!("╰{}╯", "─".repeat(self.width - 2));
        queue!(out, PrintStyledContent(bottom.with(self.border)), Print("\n"))
    }

    fn draw_row<W: Write>(&self, out: &mut W, row: &[Span]) -> io::Result<()> {
        let slack = self.inner_width().saturating_sub(line_width(row));
        let (left, right) = match self.align {
            Align::Left => (0, slack),
            Align::Center => (slack / 2, slack - slack / 2),
        };

        queue!(out, PrintStyledContent("│".with(self.border)))?;
        self.print_fill(out, 1 + left)?;
        for span in row {
            let mut style = span.style;
            if style.background_color.is_none() {
                style.background_color = self.fill;
            }
            queue!(out, PrintStyledContent(style.apply(span.text.as_str())))?;
        }
        self.print_fill(out, right + 1)?;
        queue!(out, PrintStyledContent("│".with(self.border)), Print("\n"))
    }

    fn print_fill<W: Write>(&self, out: &mut W, columns: usize) -> io::Result<()> {
        if columns == 0 {
            return Ok(());
        }
        let spaces = " ".repeat(columns);
        match self.fill {
            Some(color) => queue!(out, PrintStyledContent(spaces.on(color))),
            None => queue!(out, Print(spaces)),
        }
    }
}
