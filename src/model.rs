use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a note carries: plain text or a sticker reference.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NoteKind {
    Text,
    Sticker,
}

impl NoteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteKind::Text => "text",
            NoteKind::Sticker => "sticker",
        }
    }

    /// Anything that is not literally "sticker" is treated as text.
    pub fn parse(s: &str) -> NoteKind {
        match s {
            "sticker" => NoteKind::Sticker,
            _ => NoteKind::Text,
        }
    }
}

/// A partial write to the shared note. `None` fields are left untouched by
/// the store (merge semantics).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteFields {
    pub text: Option<String>,
    pub sender: Option<String>,
    pub theme: Option<String>,
    pub kind: Option<NoteKind>,
    pub content: Option<String>,
}

/// Snapshot of the shared note document as stored. Every field except the
/// code may be absent; consumers default them at the formatting boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SharedNote {
    pub code: String,
    pub text: Option<String>,
    pub sender: Option<String>,
    pub theme: Option<String>,
    pub kind: Option<NoteKind>,
    pub content: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl SharedNote {
    pub fn empty(code: &str) -> Self {
        SharedNote {
            code: code.to_string(),
            text: None,
            sender: None,
            theme: None,
            kind: None,
            content: None,
            updated_at: None,
        }
    }
}

/// One append-only history record, same field shape as the live note.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub text: Option<String>,
    pub sender: Option<String>,
    pub theme: Option<String>,
    pub kind: Option<NoteKind>,
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Delivered to subscribers after each committed write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub code: String,
    pub note: SharedNote,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_str() {
        assert_eq!(NoteKind::parse(NoteKind::Text.as_str()), NoteKind::Text);
        assert_eq!(
            NoteKind::parse(NoteKind::Sticker.as_str()),
            NoteKind::Sticker
        );
    }

    #[test]
    fn unknown_kind_falls_back_to_text() {
        assert_eq!(NoteKind::parse("gif"), NoteKind::Text);
        assert_eq!(NoteKind::parse(""), NoteKind::Text);
    }
}
