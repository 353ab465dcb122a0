//! Row shapes returned by repositories. Business logic lives above.

use chrono::{DateTime, Utc};

/// One change event waiting in the outbox for the fan-out worker.
#[derive(Debug, Clone)]
pub struct PendingEvent {
    pub id: i64,
    pub code: String,
    pub created_at: DateTime<Utc>,
}
