//! Theme colors, with optional overrides from the `[theme]` config table

use ratatui::style::Color;

use crate::config::ThemeConfig;
use crate::feed::Category;

/// Theme colors for the UI
#[derive(Debug, Clone)]
pub struct Theme {
    pub accent: Color,      // Active borders, countdown
    pub cat: Color,         // Cat column
    pub dog: Color,         // Dog column
    pub warning: Color,     // Last seconds of the countdown
    pub text: Color,
    pub text_dim: Color,
    pub bg_selected: Color,
    pub inactive: Color,    // Unfocused borders
    pub header: Color,
}

impl Default for Theme {
    fn default() -> Self {
        // Catppuccin-inspired
        Self {
            accent: Color::Rgb(250, 179, 135),
            cat: Color::Rgb(245, 194, 231),
            dog: Color::Rgb(166, 218, 149),
            warning: Color::Rgb(243, 139, 168),
            text: Color::Rgb(205, 214, 244),
            text_dim: Color::Rgb(147, 153, 178),
            bg_selected: Color::Rgb(69, 71, 90),
            inactive: Color::Rgb(88, 91, 112),
            header: Color::Rgb(243, 139, 168),
        }
    }
}

impl Theme {
    /// Defaults with any valid overrides applied; invalid values are logged and skipped
    pub fn from_config(overrides: &ThemeConfig) -> Self {
        let mut theme = Self::default();

        let slots: [(&str, &Option<String>, &mut Color); 5] = [
            ("accent", &overrides.accent, &mut theme.accent),
            ("cat", &overrides.cat, &mut theme.cat),
            ("dog", &overrides.dog, &mut theme.dog),
            ("text", &overrides.text, &mut theme.text),
            ("text_dim", &overrides.text_dim, &mut theme.text_dim),
        ];

        for (name, value, slot) in slots {
            let Some(value) = value else { continue };
            match parse_hex_color(value) {
                Some(color) => *slot = color,
                None => tracing::warn!("Ignoring invalid theme color {} = {:?}", name, value),
            }
        }

        theme
    }

    pub fn category(&self, category: Category) -> Color {
        match category {
            Category::Cat => self.cat,
            Category::Dog => self.dog,
        }
    }
}

/// Parse a hex color string (#RRGGBB or #RGB)
fn parse_hex_color(s: &str) -> Option<Color> {
    let s = s.trim().trim_start_matches('#');
    if !s.is_ascii() {
        return None;
    }

    match s.len() {
        6 => {
            let r = u8::from_str_radix(&s[0..2], 16).ok()?;
            let g = u8::from_str_radix(&s[2..4], 16).ok()?;
            let b = u8::from_str_radix(&s[4..6], 16).ok()?;
            Some(Color::Rgb(r, g, b))
        }
        3 => {
            let r = u8::from_str_radix(&s[0..1], 16).ok()? * 17;
            let g = u8::from_str_radix(&s[1..2], 16).ok()? * 17;
            let b = u8::from_str_radix(&s[2..3], 16).ok()? * 17;
            Some(Color::Rgb(r, g, b))
        }
        _ => None,
    }
}
