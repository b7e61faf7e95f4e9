use crate::config::{
    HexColor, StyleOverride, ThemeConfig as UserThemeConfig, ThemeModifier, ThemePreset, ThemeToken,
};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use std::collections::HashMap;

/// The eight colors each preset is defined by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Palette {
    pub bg: HexColor,
    pub sidebar_bg: HexColor,
    pub text: HexColor,
    pub accent: HexColor,
    pub secondary_bg: HexColor,
    pub card_bg: HexColor,
    pub code_bg: HexColor,
    pub highlight: HexColor,
}

impl Palette {
    pub(crate) const fn colors(&self) -> [HexColor; 8] {
        [
            self.bg,
            self.sidebar_bg,
            self.text,
            self.accent,
            self.secondary_bg,
            self.card_bg,
            self.code_bg,
            self.highlight,
        ]
    }
}

/// A row of colored cells previewing a preset. Empty when styling is off.
pub(crate) fn swatch(preset: ThemePreset, enabled: bool) -> Vec<Span<'static>> {
    if !enabled {
        return Vec::new();
    }
    palette(preset)
        .colors()
        .into_iter()
        .map(|color| Span::styled("  ", Style::default().bg(color_from_hex(color))))
        .collect()
}

pub(crate) const fn palette(preset: ThemePreset) -> Palette {
    match preset {
        ThemePreset::DarkMode => Palette {
            bg: HexColor::rgb(0x1a, 0x1a, 0x1a),
            sidebar_bg: HexColor::rgb(0x2d, 0x2d, 0x2d),
            text: HexColor::rgb(0xff, 0xff, 0xff),
            accent: HexColor::rgb(0x42, 0x87, 0xf5),
            secondary_bg: HexColor::rgb(0x3d, 0x3d, 0x3d),
            card_bg: HexColor::rgb(0x2a, 0x2a, 0x2a),
            code_bg: HexColor::rgb(0x25, 0x25, 0x25),
            highlight: HexColor::rgb(0xf9, 0xa8, 0x25),
        },
        ThemePreset::Oceanic => Palette {
            bg: HexColor::rgb(0x0f, 0x20, 0x27),
            sidebar_bg: HexColor::rgb(0x20, 0x3a, 0x43),
            text: HexColor::rgb(0xf0, 0xf8, 0xff),
            accent: HexColor::rgb(0x64, 0xb5, 0xf6),
            secondary_bg: HexColor::rgb(0x2c, 0x53, 0x64),
            card_bg: HexColor::rgb(0x1c, 0x31, 0x3a),
            code_bg: HexColor::rgb(0x16, 0x20, 0x25),
            highlight: HexColor::rgb(0x4f, 0xc3, 0xf7),
        },
        ThemePreset::Forest => Palette {
            bg: HexColor::rgb(0x0a, 0x1e, 0x0f),
            sidebar_bg: HexColor::rgb(0x1e, 0x3b, 0x26),
            text: HexColor::rgb(0xe8, 0xf5, 0xe9),
            accent: HexColor::rgb(0x66, 0xbb, 0x6a),
            secondary_bg: HexColor::rgb(0x2e, 0x57, 0x35),
            card_bg: HexColor::rgb(0x1b, 0x2e, 0x20),
            code_bg: HexColor::rgb(0x0f, 0x22, 0x13),
            highlight: HexColor::rgb(0xae, 0xd5, 0x81),
        },
        ThemePreset::Sunset => Palette {
            bg: HexColor::rgb(0x1a, 0x0f, 0x1c),
            sidebar_bg: HexColor::rgb(0x2c, 0x1e, 0x33),
            text: HexColor::rgb(0xff, 0xeb, 0xee),
            accent: HexColor::rgb(0xff, 0x70, 0x43),
            secondary_bg: HexColor::rgb(0x3e, 0x28, 0x42),
            card_bg: HexColor::rgb(0x26, 0x18, 0x29),
            code_bg: HexColor::rgb(0x1c, 0x13, 0x1e),
            highlight: HexColor::rgb(0xff, 0xab, 0x40),
        },
    }
}

#[derive(Debug, Clone)]
pub struct Theme {
    enabled: bool,
    styles: HashMap<ThemeToken, Style>,
}

impl Theme {
    #[cfg(test)]
    pub fn new(enabled: bool) -> Self {
        Self::from_config(enabled, &UserThemeConfig::default())
    }

    pub fn from_config(enabled: bool, config: &UserThemeConfig) -> Self {
        let mut styles = preset_styles(config.preset);
        for (token, override_style) in &config.styles {
            let base = styles.get(token).copied().unwrap_or_default();
            styles.insert(*token, merge_style(base, override_style));
        }

        Self { enabled, styles }
    }

    pub fn style(&self, token: ThemeToken) -> Style {
        if !self.enabled {
            return disabled_style(token);
        }

        self.styles.get(&token).copied().unwrap_or_default()
    }
}

fn preset_styles(preset: ThemePreset) -> HashMap<ThemeToken, Style> {
    let palette = palette(preset);
    ThemeToken::all()
        .iter()
        .copied()
        .map(|token| (token, palette_style(&palette, token)))
        .collect()
}

fn palette_style(palette: &Palette, token: ThemeToken) -> Style {
    let fg = |color| Style::default().fg(color_from_hex(color));
    match token {
        ThemeToken::UserPrompt => fg(palette.accent).add_modifier(Modifier::BOLD),
        ThemeToken::AssistantPrompt => fg(palette.highlight).add_modifier(Modifier::BOLD),
        ThemeToken::UserText | ThemeToken::AssistantText => fg(palette.text),
        ThemeToken::CodeBlock => fg(palette.text).bg(color_from_hex(palette.code_bg)),
        ThemeToken::Timestamp => fg(palette.text).add_modifier(Modifier::DIM),
        ThemeToken::Thinking => fg(palette.accent)
            .bg(color_from_hex(palette.card_bg))
            .add_modifier(Modifier::ITALIC),
        ThemeToken::SystemInfo => fg(palette.accent),
        ThemeToken::SystemWarning => fg(palette.highlight).add_modifier(Modifier::BOLD),
        ThemeToken::SystemError => Style::default()
            .fg(Color::Rgb(247, 118, 142))
            .add_modifier(Modifier::BOLD),
    }
}

fn disabled_style(token: ThemeToken) -> Style {
    match token {
        ThemeToken::UserPrompt | ThemeToken::AssistantPrompt => {
            Style::default().add_modifier(Modifier::BOLD)
        }
        _ => Style::default(),
    }
}

fn merge_style(base: Style, override_style: &StyleOverride) -> Style {
    let mut merged = base;

    if let Some(fg) = override_style.fg {
        merged = merged.fg(color_from_hex(fg));
    }

    if let Some(bg) = override_style.bg {
        merged = merged.bg(color_from_hex(bg));
    }

    if let Some(modifiers) = &override_style.modifiers {
        merged = merged
            .remove_modifier(Modifier::all())
            .add_modifier(modifiers_to_modifier(modifiers));
    }

    merged
}

fn color_from_hex(color: HexColor) -> Color {
    Color::Rgb(color.r, color.g, color.b)
}

fn modifiers_to_modifier(modifiers: &[ThemeModifier]) -> Modifier {
    modifiers
        .iter()
        .copied()
        .fold(Modifier::empty(), |acc, modifier| {
            acc | modifier_to_ratatui(modifier)
        })
}

fn modifier_to_ratatui(modifier: ThemeModifier) -> Modifier {
    match modifier {
        ThemeModifier::Bold => Modifier::BOLD,
        ThemeModifier::Dim => Modifier::DIM,
        ThemeModifier::Italic => Modifier::ITALIC,
        ThemeModifier::Underlined => Modifier::UNDERLINED,
        ThemeModifier::Reversed => Modifier::REVERSED,
        ThemeModifier::CrossedOut => Modifier::CROSSED_OUT,
    }
}
