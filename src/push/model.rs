use serde::Deserialize;
use serde_json::Value;

/// Successful send: the provider echoes the message resource name.
#[derive(Deserialize, Debug)]
pub struct SendResponse {
    pub name: String,
}

#[derive(Deserialize, Debug)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Deserialize, Debug)]
pub struct ErrorBody {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub details: Vec<Value>,
}

impl ErrorResponse {
    /// True when the provider reports the device token as no longer
    /// registered, the one error class that triggers token cleanup.
    pub fn is_unregistered(&self) -> bool {
        if self.error.status == "NOT_FOUND" {
            return true;
        }
        self.error.details.iter().any(|detail| {
            detail
                .get("errorCode")
                .and_then(Value::as_str)
                .map(|code| code == "UNREGISTERED")
                .unwrap_or(false)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unregistered_detected_by_status_or_error_code() {
        let by_status: ErrorResponse = serde_json::from_str(
            r#"{"error": {"status": "NOT_FOUND", "message": "Requested entity was not found."}}"#,
        )
        .unwrap();
        assert!(by_status.is_unregistered());

        let by_code: ErrorResponse = serde_json::from_str(
            r#"{"error": {"status": "INVALID_ARGUMENT", "details": [{"errorCode": "UNREGISTERED"}]}}"#,
        )
        .unwrap();
        assert!(by_code.is_unregistered());

        let other: ErrorResponse = serde_json::from_str(
            r#"{"error": {"status": "UNAVAILABLE", "message": "try later"}}"#,
        )
        .unwrap();
        assert!(!other.is_unregistered());
    }
}
