//! Background delivery path: a push data map arrives while the app is not
//! running, gets reshaped into the widget payload, and wakes the bridge.

use std::collections::BTreeMap;

use tracing::{info, instrument};

use crate::payload::WidgetPayload;
use crate::widget::WidgetBridge;

#[instrument(skip_all)]
pub fn handle_push_message(data: &BTreeMap<String, String>, bridge: &WidgetBridge) {
    let payload = WidgetPayload::from_push_data(data);
    info!(sender = %payload.sender, "note received in background");
    bridge.set(&payload.to_json());
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn push_data_lands_in_widget_storage() {
        let td = tempdir().unwrap();
        let bridge = WidgetBridge::new(td.path());
        let mut data = BTreeMap::new();
        data.insert("text".to_string(), "thinking of you".to_string());
        data.insert("sender".to_string(), "— Ben".to_string());
        handle_push_message(&data, &bridge);

        let stored: WidgetPayload = serde_json::from_str(&bridge.get()).unwrap();
        assert_eq!(stored.text, "thinking of you");
        assert_eq!(stored.sender, "— Ben");
        // Background variant defaults.
        assert_eq!(stored.content, "");
        assert_eq!(stored.time, "Just now");
    }
}
