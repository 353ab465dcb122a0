use std::fmt;

use serde_json::Value;

use crate::style::{self, Sticker};

/// Everything the widget host needs to draw one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetView {
    pub note_line: String,
    pub font_size: f32,
    pub timestamp: String,
    pub signature: String,
    pub background: &'static str,
    pub text_color: &'static str,
    pub sticker: Option<Sticker>,
    /// Whether the note text and its divider are visible (hidden in sticker
    /// mode).
    pub show_text: bool,
}

impl WidgetView {
    /// The frame shown before any note has ever been stored.
    pub fn initial() -> WidgetView {
        let blank = WidgetView {
            note_line: String::new(),
            font_size: style::FONT_SMALL,
            timestamp: String::new(),
            signature: String::new(),
            background: "bg_light",
            text_color: style::Foreground::DarkOnLight.hex(),
            sticker: None,
            show_text: true,
        };
        WidgetView::from_stored("{}", &blank)
    }

    /// Render the persisted widget state. Total: malformed JSON degrades to
    /// a fixed error frame, and an unresolvable sticker keeps `previous` on
    /// screen instead of blanking it.
    pub fn from_stored(raw: &str, previous: &WidgetView) -> WidgetView {
        let json: Value = match serde_json::from_str(raw) {
            Ok(value @ Value::Object(_)) => value,
            _ => return WidgetView::degraded(raw),
        };
        let field = |key: &str| json.get(key).and_then(Value::as_str);

        let text = field("text").unwrap_or(style::PLACEHOLDER_NOTE);
        let timestamp = field("time").unwrap_or_default().to_string();
        let signature = field("sender").unwrap_or_default().to_string();
        let theme = field("theme").unwrap_or("light");
        let kind = field("type").unwrap_or("text");
        let visual = style::theme_visual(theme);

        if kind == "sticker" {
            let content = field("content").unwrap_or_default();
            match style::sticker_asset(content) {
                Some(sticker) => {
                    return WidgetView {
                        note_line: String::new(),
                        font_size: style::FONT_SMALL,
                        timestamp,
                        signature,
                        background: visual.background,
                        text_color: visual.foreground.hex(),
                        sticker: Some(sticker),
                        show_text: false,
                    }
                }
                None => return previous.clone(),
            }
        }

        WidgetView {
            note_line: style::display_note_text(text),
            font_size: style::note_font_size(text.chars().count()),
            timestamp,
            signature,
            background: visual.background,
            text_color: visual.foreground.hex(),
            sticker: None,
            show_text: true,
        }
    }

    /// Fixed fallback frame for an unparseable stored value: the raw string
    /// as the note body, "Error" as the timestamp, smallest size.
    fn degraded(raw: &str) -> WidgetView {
        WidgetView {
            note_line: raw.to_string(),
            font_size: style::FONT_SMALL,
            timestamp: "Error".to_string(),
            signature: String::new(),
            background: "bg_light",
            text_color: style::Foreground::DarkOnLight.hex(),
            sticker: None,
            show_text: true,
        }
    }
}

impl fmt::Display for WidgetView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[{} / {}]", self.background, self.text_color)?;
        match &self.sticker {
            Some(sticker) => writeln!(f, "{}", sticker.label)?,
            None => writeln!(f, "{} ({}sp)", self.note_line, self.font_size)?,
        }
        if self.show_text {
            writeln!(f, "----")?;
        }
        write!(f, "{}  {}", self.signature, self.timestamp)
    }
}
