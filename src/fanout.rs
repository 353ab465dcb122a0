//! Fan-out worker: drains the change outbox, pushes each write to every
//! registered device except the sender's, and prunes tokens the provider
//! reports as dead.

use anyhow::Result;
use chrono::Utc;
use futures::future::join_all;
use tracing::{info, instrument, warn};

use crate::db::{self, Pool};
use crate::model::{ChangeEvent, SharedNote};
use crate::payload;
use crate::push::{PushError, PushMessage, PushSender};
use crate::subscription::NoteBus;

/// Process at most one pending change event. Returns whether there was one,
/// so the caller's poll loop knows when to sleep.
#[instrument(skip_all)]
pub async fn process_next_event(pool: &Pool, push: &dyn PushSender, bus: &NoteBus) -> Result<bool> {
    let event = match db::next_event(pool).await? {
        Some(event) => event,
        None => return Ok(false),
    };
    match db::get_note(pool, &event.code).await? {
        Some(note) => {
            fan_out(pool, push, &note).await?;
            bus.publish(ChangeEvent {
                code: event.code.clone(),
                note,
            });
            info!(id = event.id, code = %event.code, "change event processed");
        }
        // The document went away between write and pickup; nothing to relay.
        None => warn!(id = event.id, code = %event.code, "change event for missing note"),
    }
    db::delete_event(pool, event.id).await?;
    Ok(true)
}

/// One send per registered token whose name is not part of the sender
/// label, all issued concurrently. The barrier waits for every send, then
/// applies token deletions in a single statement.
#[instrument(skip_all)]
pub async fn fan_out(pool: &Pool, push: &dyn PushSender, note: &SharedNote) -> Result<()> {
    let tokens = db::token_map(pool, &note.code).await?;
    let sender = note.sender.clone().unwrap_or_else(|| "Partner".to_string());
    let message = PushMessage {
        data: payload::push_data(note, Utc::now()),
    };

    let sends = tokens
        .iter()
        .filter(|(name, _)| !sender.contains(name.as_str()))
        .map(|(name, token)| {
            let message = &message;
            async move {
                match push.send(token, message).await {
                    Ok(id) => {
                        info!(name = %name, %id, "push delivered");
                        None
                    }
                    Err(PushError::Unregistered) => {
                        warn!(name = %name, "token invalid, removing");
                        Some(name.clone())
                    }
                    Err(err) => {
                        warn!(?err, name = %name, "push send failed");
                        None
                    }
                }
            }
        });

    let stale: Vec<String> = join_all(sends).await.into_iter().flatten().collect();
    if !stale.is_empty() {
        db::delete_tokens(pool, &note.code, &stale).await?;
    }
    Ok(())
}
