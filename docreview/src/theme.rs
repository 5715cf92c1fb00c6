//! Color themes.
//!
//! Three built-ins: `dark` and `light` use ANSI 16 colors and work on any
//! terminal; `catppuccin-mocha` uses RGB and needs truecolor.

use docreview_core::Severity;
use ratatui::style::Color;

/// Names accepted by [`Theme::from_name`], in cycling order.
pub const THEME_NAMES: [&str; 3] = ["dark", "light", "catppuccin-mocha"];

#[derive(Debug, Clone)]
pub struct Theme {
    pub name: &'static str,

    pub border_active: Color,
    pub border_inactive: Color,

    // Severity badges
    pub badge_critical: Color,
    pub badge_high: Color,
    pub badge_medium: Color,
    pub badge_low: Color,
    pub badge_info: Color,

    /// Checkbox mark of selected issues.
    pub selected: Color,
    /// Flagged text inside the detail panel.
    pub flagged: Color,
    pub suggestion: Color,
    /// Secondary text: context, hints, empty states.
    pub muted: Color,

    pub status_bar_bg: Color,
    pub status_bar_fg: Color,
    pub status_mode_normal: Color,
    pub status_mode_search: Color,
    pub status_error: Color,

    pub background: Color,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            name: "dark",
            border_active: Color::Cyan,
            border_inactive: Color::DarkGray,

            badge_critical: Color::LightRed,
            badge_high: Color::Red,
            badge_medium: Color::Yellow,
            badge_low: Color::Blue,
            badge_info: Color::DarkGray,

            selected: Color::Green,
            flagged: Color::LightYellow,
            suggestion: Color::Green,
            muted: Color::DarkGray,

            status_bar_bg: Color::DarkGray,
            status_bar_fg: Color::White,
            status_mode_normal: Color::Cyan,
            status_mode_search: Color::Yellow,
            status_error: Color::LightRed,

            background: Color::Reset,
        }
    }

    pub fn light() -> Self {
        Self {
            name: "light",
            border_active: Color::Blue,
            border_inactive: Color::Gray,

            badge_critical: Color::Red,
            badge_high: Color::Magenta,
            badge_medium: Color::Yellow,
            badge_low: Color::Blue,
            badge_info: Color::Gray,

            selected: Color::Green,
            flagged: Color::Magenta,
            suggestion: Color::Green,
            muted: Color::Gray,

            status_bar_bg: Color::Gray,
            status_bar_fg: Color::Black,
            status_mode_normal: Color::Blue,
            status_mode_search: Color::Magenta,
            status_error: Color::Red,

            background: Color::Reset,
        }
    }

    /// Catppuccin Mocha palette. <https://github.com/catppuccin/catppuccin>
    pub fn catppuccin_mocha() -> Self {
        let green = Color::Rgb(166, 227, 161); // #a6e3a1
        let red = Color::Rgb(243, 139, 168); // #f38ba8
        let maroon = Color::Rgb(235, 160, 172); // #eba0ac
        let yellow = Color::Rgb(249, 226, 175); // #f9e2af
        let peach = Color::Rgb(250, 179, 135); // #fab387
        let blue = Color::Rgb(137, 180, 250); // #89b4fa
        let lavender = Color::Rgb(180, 190, 254); // #b4befe
        let overlay1 = Color::Rgb(127, 132, 156); // #7f849c
        let surface1 = Color::Rgb(69, 71, 90); // #45475a
        let base = Color::Rgb(30, 30, 46); // #1e1e2e
        let text = Color::Rgb(205, 214, 244); // #cdd6f4

        Self {
            name: "catppuccin-mocha",
            border_active: lavender,
            border_inactive: overlay1,

            badge_critical: red,
            badge_high: maroon,
            badge_medium: peach,
            badge_low: blue,
            badge_info: overlay1,

            selected: green,
            flagged: yellow,
            suggestion: green,
            muted: overlay1,

            status_bar_bg: surface1,
            status_bar_fg: text,
            status_mode_normal: lavender,
            status_mode_search: yellow,
            status_error: red,

            background: base,
        }
    }

    /// Resolves a theme name; unknown names fall back to `dark`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "catppuccin-mocha" | "catppuccin_mocha" => Self::catppuccin_mocha(),
            "light" => Self::light(),
            "dark" => Self::dark(),
            other => {
                tracing::warn!(theme = other, "unknown theme, falling back to dark");
                Self::dark()
            }
        }
    }

    /// The theme after `self` in [`THEME_NAMES`].
    pub fn next(&self) -> Self {
        let pos = THEME_NAMES.iter().position(|n| *n == self.name).unwrap_or(0);
        Self::from_name(THEME_NAMES[(pos + 1) % THEME_NAMES.len()])
    }

    pub fn badge(&self, severity: Severity) -> Color {
        match severity {
            Severity::Critical => self.badge_critical,
            Severity::High => self.badge_high,
            Severity::Medium => self.badge_medium,
            Severity::Low => self.badge_low,
            Severity::Info => self.badge_info,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycling_visits_every_theme() {
        let mut theme = Theme::from_name("dark");
        let mut seen = vec![theme.name];
        for _ in 0..THEME_NAMES.len() {
            theme = theme.next();
            seen.push(theme.name);
        }
        assert_eq!(seen, ["dark", "light", "catppuccin-mocha", "dark"]);
        assert_eq!(Theme::from_name("nope").name, "dark");
    }
}
