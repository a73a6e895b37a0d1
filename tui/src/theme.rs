//! Color theme and glyphs for the hwdiag TUI.
//!
//! Uses a slate/blue palette by default with an optional high-contrast override.

use ratatui::{
    style::{Color, Modifier, Style},
    symbols::Marker,
};

use hwdiag_engine::{Severity, UiOptions};

/// Slate palette constants.
mod colors {
    use super::Color;

    // === Backgrounds ===
    pub const BG_DARK: Color = Color::Rgb(15, 23, 42); // slate-900
    pub const BG_PANEL: Color = Color::Rgb(30, 41, 59); // slate-800
    pub const BG_BORDER: Color = Color::Rgb(51, 65, 85); // slate-700

    // === Foregrounds ===
    pub const TEXT_PRIMARY: Color = Color::Rgb(241, 245, 249); // slate-100
    pub const TEXT_SECONDARY: Color = Color::Rgb(203, 213, 225); // slate-300
    pub const TEXT_MUTED: Color = Color::Rgb(148, 163, 184); // slate-400

    // === Network ===
    pub const EDGE_START: Color = Color::Rgb(59, 130, 246); // blue-500
    pub const EDGE_END: Color = Color::Rgb(147, 51, 234); // purple-600
    pub const NODE_ACTIVE: Color = Color::Rgb(59, 130, 246); // #3b82f6
    pub const NODE_ACTIVE_BORDER: Color = Color::Rgb(96, 165, 250); // #60a5fa
    pub const NODE_INACTIVE: Color = Color::Rgb(71, 85, 105); // #475569
    pub const NODE_INACTIVE_BORDER: Color = Color::Rgb(100, 116, 139); // #64748b

    // === Severity ===
    pub const GREEN: Color = Color::Rgb(34, 197, 94); // green-500
    pub const YELLOW: Color = Color::Rgb(234, 179, 8); // yellow-500
    pub const ORANGE: Color = Color::Rgb(249, 115, 22); // orange-500
    pub const RED: Color = Color::Rgb(239, 68, 68); // red-500

    pub const ACCENT: Color = Color::Rgb(96, 165, 250); // blue-400
}

/// Resolved theme palette used by the UI.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub bg_dark: Color,
    pub bg_panel: Color,
    pub bg_border: Color,
    pub text_primary: Color,
    pub text_secondary: Color,
    pub text_muted: Color,
    pub accent: Color,
    pub edge_start: Color,
    pub edge_end: Color,
    pub node_active: Color,
    pub node_active_border: Color,
    pub node_inactive: Color,
    pub node_inactive_border: Color,
    pub green: Color,
    pub yellow: Color,
    pub orange: Color,
    pub red: Color,
    /// Blend edge colors over the background. Off for the named-color palette.
    pub blend: bool,
}

impl Palette {
    #[must_use]
    pub fn standard() -> Self {
        Self {
            bg_dark: colors::BG_DARK,
            bg_panel: colors::BG_PANEL,
            bg_border: colors::BG_BORDER,
            text_primary: colors::TEXT_PRIMARY,
            text_secondary: colors::TEXT_SECONDARY,
            text_muted: colors::TEXT_MUTED,
            accent: colors::ACCENT,
            edge_start: colors::EDGE_START,
            edge_end: colors::EDGE_END,
            node_active: colors::NODE_ACTIVE,
            node_active_border: colors::NODE_ACTIVE_BORDER,
            node_inactive: colors::NODE_INACTIVE,
            node_inactive_border: colors::NODE_INACTIVE_BORDER,
            green: colors::GREEN,
            yellow: colors::YELLOW,
            orange: colors::ORANGE,
            red: colors::RED,
            blend: true,
        }
    }

    #[must_use]
    pub fn high_contrast() -> Self {
        Self {
            bg_dark: Color::Black,
            bg_panel: Color::Black,
            bg_border: Color::Gray,
            text_primary: Color::White,
            text_secondary: Color::Gray,
            text_muted: Color::DarkGray,
            accent: Color::Cyan,
            edge_start: Color::Blue,
            edge_end: Color::Magenta,
            node_active: Color::LightBlue,
            node_active_border: Color::White,
            node_inactive: Color::DarkGray,
            node_inactive_border: Color::Gray,
            green: Color::Green,
            yellow: Color::Yellow,
            orange: Color::LightRed,
            red: Color::Red,
            blend: false,
        }
    }

    #[must_use]
    pub fn severity(&self, severity: Severity) -> Color {
        match severity {
            Severity::Low => self.green,
            Severity::Medium => self.yellow,
            Severity::High => self.orange,
            Severity::Critical => self.red,
        }
    }
}

#[must_use]
pub fn palette(options: UiOptions) -> Palette {
    if options.high_contrast {
        Palette::high_contrast()
    } else {
        Palette::standard()
    }
}

/// ASCII/Unicode glyphs for icons and spinners.
#[derive(Debug, Clone, Copy)]
pub struct Glyphs {
    pub bullet: &'static str,
    pub check: &'static str,
    pub cross: &'static str,
    pub arrow: &'static str,
    pub bar_full: &'static str,
    pub bar_empty: &'static str,
    /// Canvas marker for the network graph.
    pub marker: Marker,
    pub spinner_frames: &'static [&'static str],
}

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const SPINNER_FRAMES_ASCII: &[&str] = &["|", "/", "-", "\\"];

#[must_use]
pub fn glyphs(options: UiOptions) -> Glyphs {
    if options.ascii_only {
        Glyphs {
            bullet: "*",
            check: "OK",
            cross: "X",
            arrow: ">",
            bar_full: "#",
            bar_empty: ".",
            marker: Marker::Dot,
            spinner_frames: SPINNER_FRAMES_ASCII,
        }
    } else {
        Glyphs {
            bullet: "•",
            check: "✓",
            cross: "✗",
            arrow: "→",
            bar_full: "█",
            bar_empty: "░",
            marker: Marker::Braille,
            spinner_frames: SPINNER_FRAMES,
        }
    }
}

/// When `reduced_motion` is enabled, returns a static glyph instead of cycling.
#[must_use]
pub fn spinner_frame(tick: u64, options: UiOptions) -> &'static str {
    let frames = glyphs(options).spinner_frames;
    if options.reduced_motion {
        frames[0]
    } else {
        frames[(tick / 4) as usize % frames.len()]
    }
}

/// Linear blend from `from` to `to`. Non-RGB colors switch at the midpoint.
#[must_use]
pub fn mix(from: Color, to: Color, t: f64) -> Color {
    let t = t.clamp(0.0, 1.0);
    match (from, to) {
        (Color::Rgb(r1, g1, b1), Color::Rgb(r2, g2, b2)) => {
            let lerp = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
            Color::Rgb(lerp(r1, r2), lerp(g1, g2), lerp(b1, b2))
        }
        _ if t < 0.5 => from,
        _ => to,
    }
}

/// Pre-defined styles for common UI elements.
pub mod styles {
    use super::{Modifier, Palette, Style};

    #[must_use]
    pub fn title(palette: &Palette) -> Style {
        Style::default()
            .fg(palette.text_primary)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn badge(palette: &Palette) -> Style {
        Style::default()
            .fg(palette.bg_dark)
            .bg(palette.accent)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn key_hint(palette: &Palette) -> Style {
        Style::default().fg(palette.text_muted)
    }

    #[must_use]
    pub fn key_highlight(palette: &Palette) -> Style {
        Style::default()
            .fg(palette.accent)
            .add_modifier(Modifier::BOLD)
    }
}
