//! Markdown rendering for prose segments.
//!
//! Parses with pulldown-cmark and turns the event stream into styled lines.
//! Long lines are left to the terminal to wrap.

use super::panel::{Line, Span};
use super::theme::{DisplayTheme, Role};
use crossterm::style::{Attribute, ContentStyle};
use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use unicode_width::UnicodeWidthStr;

const RULE_WIDTH: usize = 40;

/// Render markdown `text` into styled lines. Trailing blank lines are dropped.
pub fn render_markdown(text: &str, theme: &DisplayTheme) -> Vec<Line> {
    let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let mut renderer = MarkdownRenderer::new(theme);
    for event in Parser::new_ext(text, options) {
        renderer.process_event(event);
    }
    renderer.finish()
}

struct ListState {
    /// Next number for ordered lists; `None` for bullets.
    next: Option<u64>,
    /// Width of the marker of the current item, for continuation lines.
    marker_width: usize,
}

struct LinkState {
    url: String,
    text: String,
}

struct MarkdownRenderer<'t> {
    theme: &'t DisplayTheme,
    lines: Vec<Line>,
    current: Line,
    style_stack: Vec<ContentStyle>,
    list_stack: Vec<ListState>,
    /// The next line flushed starts a list item and gets its marker.
    marker_pending: bool,
    quote_depth: usize,
    in_code_block: bool,
    links: Vec<LinkState>,
}

impl<'t> MarkdownRenderer<'t> {
    fn new(theme: &'t DisplayTheme) -> Self {
        Self {
            theme,
            lines: Vec::new(),
            current: Vec::new(),
            style_stack: vec![ContentStyle::new()],
            list_stack: Vec::new(),
            marker_pending: false,
            quote_depth: 0,
            in_code_block: false,
            links: Vec::new(),
        }
    }

    fn current_style(&self) -> ContentStyle {
        self.style_stack.last().copied().unwrap_or_default()
    }

    fn push_style(&mut self, attributes: &[Attribute], role: Option<Role>) {
        let mut style = self.current_style();
        for attribute in attributes {
            style.attributes.set(*attribute);
        }
        if let Some(role) = role {
            style.foreground_color = Some(self.theme.color(role));
        }
        self.style_stack.push(style);
    }

    fn pop_style(&mut self) {
        if self.style_stack.len() > 1 {
            self.style_stack.pop();
        }
    }

    fn code_style(&self) -> ContentStyle {
        let mut style = ContentStyle::new();
        style.foreground_color = Some(self.theme.color(Role::Accent));
        style.background_color = Some(self.theme.color(Role::CodeBackground));
        style
    }

    fn muted_style(&self) -> ContentStyle {
        let mut style = ContentStyle::new();
        style.foreground_color = Some(self.theme.color(Role::Muted));
        style
    }

    fn process_event(&mut self, event: Event) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.add_text(&text),
            Event::Code(code) => {
                let style = self.code_style();
                self.current.push(Span::new(code.to_string(), style));
                if let Some(link) = self.links.last_mut() {
                    link.text.push_str(&code);
                }
            }
            Event::SoftBreak => self.add_text(" "),
            Event::HardBreak => self.push_line(),
            Event::Rule => {
                self.flush();
                let style = self.muted_style();
                self.current.push(Span::new("─".repeat(RULE_WIDTH), style));
                self.push_line();
                self.blank_line();
            }
            Event::TaskListMarker(checked) => {
                let marker = if checked { "[x] " } else { "[ ] " };
                self.current.push(Span::plain(marker));
            }
            Event::Html(html) | Event::InlineHtml(html) => {
                // Shown verbatim; there is nothing to interpret it with.
                self.add_raw_lines(&html);
            }
            _ => {}
        }
    }

    fn start_tag(&mut self, tag: Tag) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush();
                match level {
                    HeadingLevel::H1 => {
                        self.push_style(&[Attribute::Bold, Attribute::Underlined], Some(Role::Accent))
                    }
                    HeadingLevel::H2 => self.push_style(&[Attribute::Bold], Some(Role::Accent)),
                    _ => self.push_style(&[Attribute::Bold], None),
                }
            }
            Tag::BlockQuote(_) => {
                self.flush();
                self.quote_depth += 1;
                self.push_style(&[Attribute::Italic], None);
            }
            Tag::CodeBlock(_) => {
                self.flush();
                self.in_code_block = true;
            }
            Tag::List(start) => {
                self.flush();
                self.list_stack.push(ListState {
                    next: start,
                    marker_width: 0,
                });
            }
            Tag::Item => {
                self.flush();
                self.marker_pending = true;
            }
            Tag::Emphasis => self.push_style(&[Attribute::Italic], None),
            Tag::Strong => self.push_style(&[Attribute::Bold], None),
            Tag::Strikethrough => self.push_style(&[Attribute::CrossedOut], None),
            Tag::Link { dest_url, .. } => {
                self.push_style(&[Attribute::Underlined], Some(Role::Accent));
                self.links.push(LinkState {
                    url: dest_url.to_string(),
                    text: String::new(),
                });
            }
            _ => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                self.flush();
                if self.list_stack.is_empty() {
                    self.blank_line();
                }
            }
            TagEnd::Heading(_) => {
                self.flush();
                self.pop_style();
                self.blank_line();
            }
            TagEnd::BlockQuote(_) => {
                self.flush();
                self.pop_style();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.blank_line();
            }
            TagEnd::CodeBlock => {
                self.flush();
                self.in_code_block = false;
                self.blank_line();
            }
            TagEnd::List(_) => {
                self.flush();
                self.list_stack.pop();
                if self.list_stack.is_empty() {
                    self.blank_line();
                }
            }
            TagEnd::Item => {
                self.flush();
                if let Some(list) = self.list_stack.last_mut() {
                    list.next = list.next.map(|n| n + 1);
                }
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => self.pop_style(),
            TagEnd::Link => {
                self.pop_style();
                if let Some(link) = self.links.pop() {
                    if !link.url.is_empty() && link.url != link.text {
                        let style = self.muted_style();
                        self.current.push(Span::new(format!(" ({})", link.url), style));
                    }
                }
            }
            _ => {}
        }
    }

    fn add_text(&mut self, text: &str) {
        if self.in_code_block {
            let style = self.code_style();
            self.add_lines(text, |line| vec![Span::plain("  "), Span::new(line, style)]);
            return;
        }
        if let Some(link) = self.links.last_mut() {
            link.text.push_str(text);
        }
        let style = self.current_style();
        self.current.push(Span::new(text, style));
    }

    fn add_raw_lines(&mut self, text: &str) {
        self.add_lines(text, |line| vec![Span::plain(line)]);
    }

    /// Append `text`, ending the current line at each newline.
    fn add_lines(&mut self, text: &str, to_spans: impl Fn(String) -> Line) {
        let mut parts = text.split('\n').peekable();
        while let Some(part) = parts.next() {
            let is_last = parts.peek().is_none();
            if !part.is_empty() {
                self.current.extend(to_spans(part.to_string()));
            }
            if !is_last {
                self.push_line();
            }
        }
    }

    /// Emit the pending line if it has content or owes a list marker.
    fn flush(&mut self) {
        if !self.current.is_empty() || self.marker_pending {
            self.push_line();
        }
    }

    /// Emit the pending line, with quote and list prefixes.
    fn push_line(&mut self) {
        let mut line = Vec::new();

        if self.quote_depth > 0 {
            let style = self.muted_style();
            line.push(Span::new("│ ".repeat(self.quote_depth), style));
        }

        let depth = self.list_stack.len();
        if let Some(list) = self.list_stack.last_mut() {
            let indent = "  ".repeat(depth - 1);
            if self.marker_pending {
                let marker = match list.next {
                    Some(n) => format!("{}. ", n),
                    None => "• ".to_string(),
                };
                list.marker_width = marker.width();
                let mut style = ContentStyle::new();
                style.foreground_color = Some(self.theme.color(Role::Accent));
                line.push(Span::plain(indent));
                line.push(Span::new(marker, style));
                self.marker_pending = false;
            } else {
                line.push(Span::plain(format!("{}{}", indent, " ".repeat(list.marker_width))));
            }
        }

        line.append(&mut self.current);
        line.retain(|span| !span.text.is_empty());
        self.lines.push(line);
    }

    /// Separate blocks with at most one blank line.
    fn blank_line(&mut self) {
        if self.lines.last().is_some_and(|line| !line.is_empty()) {
            self.lines.push(Vec::new());
        }
    }

    fn finish(mut self) -> Vec<Line> {
        self.flush();
        while self.lines.last().is_some_and(|line| line.is_empty()) {
            self.lines.pop();
        }
        self.lines
    }
}
