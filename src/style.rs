//! Visual selection for the widget surface: font sizing, theme lookup, and
//! the catalogs the composer picks from. Everything here is a total
//! function; unknown identifiers fall through to defaults instead of
//! erroring.

use std::collections::HashMap;

/// Shown on the widget until the first note arrives. Displayed unquoted.
pub const PLACEHOLDER_NOTE: &str = "Waiting for note...";

pub const FONT_LARGE: f32 = 40.0;
pub const FONT_MEDIUM_LARGE: f32 = 32.0;
pub const FONT_MEDIUM: f32 = 24.0;
pub const FONT_SMALL: f32 = 16.0;

/// Display size bucket by character count. The cut points are fixed by
/// previously shipped widgets; changing them changes rendered output on
/// existing home screens.
pub fn note_font_size(len: usize) -> f32 {
    match len {
        0..=12 => FONT_LARGE,
        13..=30 => FONT_MEDIUM_LARGE,
        31..=80 => FONT_MEDIUM,
        _ => FONT_SMALL,
    }
}

/// The placeholder is shown bare; everything else reads as a quotation.
pub fn display_note_text(raw: &str) -> String {
    if raw == PLACEHOLDER_NOTE {
        raw.to_string()
    } else {
        format!("\"{raw}\"")
    }
}

/// Widget text color, constrained to two values so it stays legible on any
/// background asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Foreground {
    LightOnDark,
    DarkOnLight,
}

impl Foreground {
    pub fn hex(&self) -> &'static str {
        match self {
            Foreground::LightOnDark => "#FFFFFF",
            Foreground::DarkOnLight => "#2D3436",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeVisual {
    /// Background asset identifier resolved by the widget layout.
    pub background: &'static str,
    pub foreground: Foreground,
}

const THEME_BACKGROUNDS: &[(&str, &str)] = &[
    ("light", "bg_light"),
    ("dark", "bg_dark"),
    ("pink", "bg_pink"),
    ("mountain", "bg_mountain"),
    ("beach", "bg_beach"),
    ("bunny", "bg_bunny"),
    ("duck_wink", "bg_duck_wink"),
    ("duck_rain", "bg_duck_rain"),
    ("duck_clueless", "bg_duck_clueless"),
    ("mm_hug", "bg_mm_hug"),
];

/// Resolve a theme identifier to its background asset and text color.
/// Unrecognized themes get the neutral light background; only the dark,
/// pink and mountain backgrounds are dark enough to need light text.
pub fn theme_visual(theme: &str) -> ThemeVisual {
    let background = THEME_BACKGROUNDS
        .iter()
        .find(|(id, _)| *id == theme)
        .map(|(_, asset)| *asset)
        .unwrap_or("bg_light");
    let foreground = match theme {
        "dark" | "pink" | "mountain" => Foreground::LightOnDark,
        _ => Foreground::DarkOnLight,
    };
    ThemeVisual {
        background,
        foreground,
    }
}

/// A selectable vibe in the composer: accent color for the picker circle
/// plus a short label.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub id: &'static str,
    pub color: &'static str,
    pub label: &'static str,
}

pub const THEMES: &[Theme] = &[
    Theme { id: "duck_wink", color: "#f7cbb0", label: "🐣" },
    Theme { id: "bunny", color: "#F0D0C1", label: "🐰" },
    Theme { id: "duck_rain", color: "#D6DBE1", label: "🦆" },
    Theme { id: "duck_clueless", color: "#FFD6D8", label: "🦢" },
    Theme { id: "mm_hug", color: "#F7E1C9", label: "🐻" },
    Theme { id: "beach", color: "#9EC9CB", label: "🌊" },
    Theme { id: "mountain", color: "#f3ce7d", label: "⛱️" },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sticker {
    pub id: &'static str,
    pub label: &'static str,
}

pub const STICKERS: &[Sticker] = &[
    Sticker { id: "sticker_heart", label: "❤️" },
    Sticker { id: "sticker_ghost", label: "👻" },
    Sticker { id: "sticker_frog", label: "🐸" },
    Sticker { id: "sticker_squirrel", label: "🐿️" },
    Sticker { id: "sticker_bunny", label: "🐰" },
    Sticker { id: "sticker_catsad", label: "😿" },
];

/// Look up a sticker's display label. `None` means the identifier is not a
/// shipped asset and the renderer must keep whatever it showed last.
pub fn sticker_label(id: &str) -> Option<&'static str> {
    sticker_asset(id).map(|s| s.label)
}

/// Resolve a sticker identifier to its shipped asset.
pub fn sticker_asset(id: &str) -> Option<Sticker> {
    STICKERS.iter().find(|s| s.id == id).copied()
}

const SENDER_COLORS: &[&str] = &[
    "#D96E52", "#C15572", "#D88948", "#3A7E6F", "#3F6596", "#6A4BA6",
    "#B03E54", "#A07A52", "#2C747C", "#3B7992",
];

/// Assigns each sender name a display color for the history list. A name
/// keeps its color for the palette's lifetime; new names take the next
/// color in order, wrapping when the list runs out.
#[derive(Debug, Default)]
pub struct SenderPalette {
    assigned: HashMap<String, &'static str>,
    next: usize,
}

impl SenderPalette {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn color_for(&mut self, sender: &str) -> &'static str {
        if let Some(color) = self.assigned.get(sender) {
            return color;
        }
        let color = SENDER_COLORS[self.next % SENDER_COLORS.len()];
        self.next += 1;
        self.assigned.insert(sender.to_string(), color);
        color
    }
}
