//! Code block syntax highlighting backed by syntect.

use super::panel::{Line, Span};
use crossterm::style::{Attribute, Color, ContentStyle};
use std::sync::OnceLock;
use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, Style, Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;
use tracing::{debug, warn};

/// Tab stops inside code panels.
const TAB: &str = "    ";

/// Bundled syntax and theme definitions, loaded once.
struct SyntectAssets {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
}

fn syntect_assets() -> &'static SyntectAssets {
    static ASSETS: OnceLock<SyntectAssets> = OnceLock::new();
    ASSETS.get_or_init(|| SyntectAssets {
        syntax_set: SyntaxSet::load_defaults_newlines(),
        theme_set: ThemeSet::load_defaults(),
    })
}

/// Highlights code bodies with one syntect theme.
pub struct Highlighter {
    theme: Option<Theme>,
}

impl Highlighter {
    /// Use the named bundled theme, or the first available one if the name
    /// is unknown.
    pub fn new(theme_name: &str) -> Self {
        let themes = &syntect_assets().theme_set.themes;
        let theme = match themes.get(theme_name) {
            Some(theme) => Some(theme.clone()),
            None => {
                warn!(theme = theme_name, "unknown syntax theme, using a bundled default");
                themes.values().next().cloned()
            }
        };
        Self { theme }
    }

    /// Split `code` into styled lines. Unknown languages are shown unstyled.
    pub fn highlight(&self, code: &str, language: &str) -> Vec<Line> {
        let assets = syntect_assets();
        let (Some(theme), Some(syntax)) = (&self.theme, find_syntax(&assets.syntax_set, language))
        else {
            return code.lines().map(|line| vec![Span::plain(expand_tabs(line))]).collect();
        };

        let mut highlighter = HighlightLines::new(syntax, theme);
        LinesWithEndings::from(code)
            .map(|line| match highlighter.highlight_line(line, &assets.syntax_set) {
                Ok(ranges) => ranges
                    .into_iter()
                    .map(|(style, text)| (style, strip_line_ending(text)))
                    .filter(|(_, text)| !text.is_empty())
                    .map(|(style, text)| Span::new(expand_tabs(text), to_content_style(style)))
                    .collect(),
                Err(err) => {
                    debug!(%err, "highlighting failed, showing line unstyled");
                    vec![Span::plain(expand_tabs(strip_line_ending(line)))]
                }
            })
            .collect()
    }
}

fn find_syntax<'a>(syntax_set: &'a SyntaxSet, language: &str) -> Option<&'a SyntaxReference> {
    if language.is_empty() {
        return None;
    }
    syntax_set
        .find_syntax_by_token(language)
        .or_else(|| syntax_set.find_syntax_by_extension(language))
}

fn strip_line_ending(text: &str) -> &str {
    text.trim_end_matches(['\n', '\r'])
}

fn expand_tabs(text: &str) -> String {
    text.replace('\t', TAB)
}

/// Foreground and font style only; the panel owns the background.
fn to_content_style(style: Style) -> ContentStyle {
    let fg = style.foreground;
    let mut content = ContentStyle::new();
    content.foreground_color = Some(Color::Rgb {
        r: fg.r,
        g: fg.g,
        b: fg.b,
    });
    if style.font_style.contains(FontStyle::BOLD) {
        content.attributes.set(Attribute::Bold);
    }
    if style.font_style.contains(FontStyle::ITALIC) {
        content.attributes.set(Attribute::Italic);
    }
    if style.font_style.contains(FontStyle::UNDERLINE) {
        content.attributes.set(Attribute::Underlined);
    }
    content
}
