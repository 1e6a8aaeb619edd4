//! Display theme.

use crate::config::ThemeSettings;
use crossterm::style::Color;
use tracing::warn;

/// A named color slot in the theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Primary,
    Accent,
    Success,
    Error,
    Warning,
    Muted,
    CodeBackground,
}

/// Role colors plus the syntax highlighting theme. Built once at startup and
/// never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayTheme {
    primary: Color,
    accent: Color,
    success: Color,
    error: Color,
    warning: Color,
    muted: Color,
    code_background: Color,
    syntax_theme: String,
}

impl Default for DisplayTheme {
    fn default() -> Self {
        Self {
            primary: rgb(0x1E, 0x3A, 0x8A),
            accent: rgb(0xF5, 0x9E, 0x0B),
            success: rgb(0x10, 0xB9, 0x81),
            error: rgb(0xEF, 0x44, 0x44),
            warning: rgb(0xF5, 0x9E, 0x0B),
            muted: rgb(0x64, 0x74, 0x8B),
            code_background: rgb(0x1F, 0x29, 0x37),
            syntax_theme: "base16-eighties.dark".to_string(),
        }
    }
}

impl DisplayTheme {
    /// Default palette with any valid overrides from settings applied.
    pub fn from_settings(settings: &ThemeSettings) -> Self {
        let defaults = Self::default();
        Self {
            primary: pick("primary", settings.primary.as_deref(), defaults.primary),
            accent: pick("accent", settings.accent.as_deref(), defaults.accent),
            success: pick("success", settings.success.as_deref(), defaults.success),
            error: pick("error", settings.error.as_deref(), defaults.error),
            warning: pick("warning", settings.warning.as_deref(), defaults.warning),
            muted: pick("muted", settings.muted.as_deref(), defaults.muted),
            code_background: pick("code_bg", settings.code_bg.as_deref(), defaults.code_background),
            syntax_theme: settings.syntax_theme.clone(),
        }
    }

    pub fn color(&self, role: Role) -> Color {
        match role {
            Role::Primary => self.primary,
            Role::Accent => self.accent,
            Role::Success => self.success,
            Role::Error => self.error,
            Role::Warning => self.warning,
            Role::Muted => self.muted,
            Role::CodeBackground => self.code_background,
        }
    }

    /// Name of the syntect theme used for code blocks.
    pub fn syntax_theme(&self) -> &str {
        &self.syntax_theme
    }
}

fn rgb(r: u8, g: u8, b: u8) -> Color {
    Color::Rgb { r, g, b }
}

fn pick(role: &str, value: Option<&str>, fallback: Color) -> Color {
    match value {
        None => fallback,
        Some(hex) => parse_hex_color(hex).unwrap_or_else(|| {
            warn!(role, value = hex, "invalid theme color, using default");
            fallback
        }),
    }
}

/// Parse `#RRGGBB` (the `#` is optional).
pub fn parse_hex_color(hex: &str) -> Option<Color> {
    let digits = hex.trim().trim_start_matches('#');
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some(rgb(channel(0)?, channel(2)?, channel(4)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#F59E0B"), Some(rgb(0xF5, 0x9E, 0x0B)));
        assert_eq!(parse_hex_color("10b981"), Some(rgb(0x10, 0xB9, 0x81)));
        assert_eq!(parse_hex_color("#FFF"), None);
        assert_eq!(parse_hex_color("#GGGGGG"), None);
        assert_eq!(parse_hex_color("#ÄÄÄ"), None);
    }

    #[test]
    fn test_default_palette() {
        let theme = DisplayTheme::default();
        assert_eq!(theme.color(Role::Accent), rgb(0xF5, 0x9E, 0x0B));
        assert_eq!(theme.color(Role::Error), rgb(0xEF, 0x44, 0x44));
        assert_eq!(theme.syntax_theme(), "base16-eighties.dark");
    }

    #[test]
    fn test_overrides_and_invalid_fallback() {
        let settings = ThemeSettings {
            accent: Some("#000000".to_string()),
            muted: Some("not a color".to_string()),
            syntax_theme: "InspiredGitHub".to_string(),
            ..ThemeSettings::default()
        };
        let theme = DisplayTheme::from_settings(&settings);
        assert_eq!(theme.color(Role::Accent), rgb(0, 0, 0));
        assert_eq!(theme.color(Role::Muted), DisplayTheme::default().color(Role::Muted));
        assert_eq!(theme.syntax_theme(), "InspiredGitHub");
    }
}
