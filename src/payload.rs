//! Shapes the shared note into the flat JSON consumed by the widget and the
//! push pipeline. Formatting never fails: absent or malformed fields
//! degrade to fixed defaults.

use std::collections::BTreeMap;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{NoteKind, SharedNote};

/// Routing sentinel carried in every push data payload. Platform glue only;
/// nothing reads its value beyond equality.
pub const CLICK_ACTION: &str = "FLUTTER_NOTIFICATION_CLICK";

/// The flattened note as persisted for the widget: exactly these six keys,
/// always present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WidgetPayload {
    pub text: String,
    pub time: String,
    pub sender: String,
    pub theme: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
}

impl WidgetPayload {
    /// Live-listener variant, fed by a store snapshot. The sticker fallback
    /// here is `sticker_heart`; the background variant uses the empty
    /// string. Both are long-shipped and deliberately not unified.
    pub fn from_snapshot(note: &SharedNote) -> Self {
        WidgetPayload {
            text: note.text.clone().unwrap_or_else(|| "Welcome!".to_string()),
            time: clock_time(note.updated_at),
            sender: note.sender.clone().unwrap_or_default(),
            theme: note.theme.clone().unwrap_or_else(|| "light".to_string()),
            kind: note.kind.unwrap_or(NoteKind::Text).as_str().to_string(),
            content: note
                .content
                .clone()
                .unwrap_or_else(|| "sticker_heart".to_string()),
        }
    }

    /// Background-delivery variant, fed by the flat push data map when the
    /// app is not running.
    pub fn from_push_data(data: &BTreeMap<String, String>) -> Self {
        let time = data
            .get("time")
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|ts| clock_time(Some(ts.with_timezone(&Utc))))
            .unwrap_or_else(|| "Just now".to_string());
        let field = |key: &str| data.get(key).cloned().filter(|v| !v.is_empty());
        WidgetPayload {
            text: field("text").unwrap_or_else(|| "New Note!".to_string()),
            time,
            sender: field("sender").unwrap_or_default(),
            theme: field("theme").unwrap_or_else(|| "light".to_string()),
            kind: field("type").unwrap_or_else(|| "text".to_string()),
            content: field("content").unwrap_or_default(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("widget payload serializes")
    }
}

/// Flat key/value map for a data-only push message. `time` is the trigger's
/// own invocation instant, not the document timestamp.
pub fn push_data(note: &SharedNote, now: DateTime<Utc>) -> BTreeMap<String, String> {
    let mut data = BTreeMap::new();
    data.insert(
        "text".to_string(),
        note.text.clone().unwrap_or_else(|| "New Note!".to_string()),
    );
    data.insert(
        "sender".to_string(),
        note.sender.clone().unwrap_or_else(|| "Partner".to_string()),
    );
    data.insert(
        "theme".to_string(),
        note.theme.clone().unwrap_or_else(|| "light".to_string()),
    );
    data.insert(
        "type".to_string(),
        note.kind.unwrap_or(NoteKind::Text).as_str().to_string(),
    );
    data.insert(
        "content".to_string(),
        note.content.clone().unwrap_or_default(),
    );
    data.insert("time".to_string(), now.to_rfc3339());
    data.insert("click_action".to_string(), CLICK_ACTION.to_string());
    data
}

/// Local-time hour:minute display string, "Just now" when the record has no
/// timestamp yet.
pub fn clock_time(ts: Option<DateTime<Utc>>) -> String {
    match ts {
        Some(ts) => ts.with_timezone(&Local).format("%I:%M %p").to_string(),
        None => "Just now".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NoteKind;

    #[test]
    fn snapshot_defaults_fill_every_key() {
        let payload = WidgetPayload::from_snapshot(&SharedNote::empty("AAAAAA"));
        assert_eq!(payload.text, "Welcome!");
        assert_eq!(payload.time, "Just now");
        assert_eq!(payload.sender, "");
        assert_eq!(payload.theme, "light");
        assert_eq!(payload.kind, "text");
        assert_eq!(payload.content, "sticker_heart");
    }

    #[test]
    fn snapshot_keeps_present_fields() {
        let note = SharedNote {
            code: "AAAAAA".into(),
            text: Some("miss you".into()),
            sender: Some("— Ana".into()),
            theme: Some("beach".into()),
            kind: Some(NoteKind::Sticker),
            content: Some("sticker_frog".into()),
            updated_at: Some(Utc::now()),
        };
        let payload = WidgetPayload::from_snapshot(&note);
        assert_eq!(payload.text, "miss you");
        assert_eq!(payload.sender, "— Ana");
        assert_eq!(payload.theme, "beach");
        assert_eq!(payload.kind, "sticker");
        assert_eq!(payload.content, "sticker_frog");
        assert_ne!(payload.time, "Just now");
    }

    #[test]
    fn push_data_defaults_differ_from_snapshot_defaults() {
        let payload = WidgetPayload::from_push_data(&BTreeMap::new());
        assert_eq!(payload.text, "New Note!");
        assert_eq!(payload.content, "");
        assert_eq!(payload.time, "Just now");
        assert_eq!(payload.theme, "light");
        assert_eq!(payload.kind, "text");
    }

    #[test]
    fn push_data_with_bad_time_degrades_to_just_now() {
        let mut data = BTreeMap::new();
        data.insert("time".to_string(), "yesterday-ish".to_string());
        let payload = WidgetPayload::from_push_data(&data);
        assert_eq!(payload.time, "Just now");
    }

    #[test]
    fn push_data_map_carries_the_full_key_set() {
        let note = SharedNote::empty("AAAAAA");
        let data = push_data(&note, Utc::now());
        for key in ["text", "sender", "theme", "type", "content", "time", "click_action"] {
            assert!(data.contains_key(key), "missing {key}");
        }
        assert_eq!(data["click_action"], CLICK_ACTION);
        assert_eq!(data["sender"], "Partner");
        assert_eq!(data["text"], "New Note!");
    }

    #[test]
    fn formatting_round_trips_exactly() {
        let payload = WidgetPayload::from_snapshot(&SharedNote::empty("AAAAAA"));
        let parsed: WidgetPayload = serde_json::from_str(&payload.to_json()).unwrap();
        assert_eq!(parsed, payload);
        // Re-serializing the parsed value is byte-identical.
        assert_eq!(parsed.to_json(), payload.to_json());
    }

    #[test]
    fn json_uses_the_wire_key_for_kind() {
        let payload = WidgetPayload::from_snapshot(&SharedNote::empty("AAAAAA"));
        let value: serde_json::Value = serde_json::from_str(&payload.to_json()).unwrap();
        assert!(value.get("type").is_some());
        assert!(value.get("kind").is_none());
    }
}
