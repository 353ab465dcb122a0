//! Composer operations: pairing setup and sending a note. These are the
//! write paths; everything downstream (widget, push) reacts through the
//! change outbox.

use anyhow::{bail, Context, Result};
use tracing::{info, instrument};

use crate::db::{self, Pool};
use crate::model::{NoteFields, NoteKind};
use crate::pairing::{self, PairingState};

/// What the composer collected before hitting send.
#[derive(Debug, Clone)]
pub enum NoteInput {
    Text(String),
    Sticker(String),
}

/// Write one note: merge into the live document, append a history entry,
/// and enqueue a change event for the fan-out worker. Any failure comes
/// back as a single error for the caller to surface; the composer's input
/// is untouched so the user can retry.
#[instrument(skip_all)]
pub async fn send_note(
    pool: &Pool,
    pairing: &PairingState,
    input: &NoteInput,
    theme: Option<&str>,
) -> Result<()> {
    let mut fields = NoteFields {
        sender: Some(pairing.sender_label()),
        ..Default::default()
    };
    match input {
        NoteInput::Text(note) => {
            let note = note.trim();
            if note.is_empty() {
                bail!("note text is empty");
            }
            fields.kind = Some(NoteKind::Text);
            fields.text = Some(note.to_string());
        }
        NoteInput::Sticker(sticker) => {
            if sticker.is_empty() {
                bail!("no sticker selected");
            }
            fields.kind = Some(NoteKind::Sticker);
            fields.content = Some(sticker.clone());
            fields.text = Some("Sent a sticker".to_string());
        }
    }
    // Theme rides along only when the composer picked one; otherwise the
    // widget keeps its current vibe.
    if let Some(theme) = theme.filter(|t| !t.is_empty()) {
        fields.theme = Some(theme.to_string());
    }

    let ts = db::upsert_note(pool, &pairing.couple_code, &fields)
        .await
        .context("failed to write note")?;
    db::append_history(pool, &pairing.couple_code, &fields, ts)
        .await
        .context("failed to append history")?;
    db::enqueue_event(pool, &pairing.couple_code)
        .await
        .context("failed to enqueue change event")?;
    info!(code = %pairing.couple_code, kind = ?fields.kind, "note sent");
    Ok(())
}

/// First-run setup: create a fresh shared document under a new code.
#[instrument(skip_all)]
pub async fn create_pair(pool: &Pool) -> Result<String> {
    let code = pairing::generate_code();
    let fields = NoteFields {
        text: Some("Welcome to PairNote! ❤️".to_string()),
        ..Default::default()
    };
    db::upsert_note(pool, &code, &fields)
        .await
        .context("could not create code")?;
    info!(%code, "pairing created");
    Ok(code)
}

/// Join an existing pairing. Validates shape and existence, nothing else:
/// the code is the whole credential.
#[instrument(skip_all)]
pub async fn join_pair(pool: &Pool, input: &str) -> Result<String> {
    let code = match pairing::normalize_code(input) {
        Some(code) => code,
        None => bail!("that couple code is not valid"),
    };
    if !db::pair_exists(pool, &code).await? {
        bail!("that couple code doesn't exist");
    }
    info!(%code, "pairing joined");
    Ok(code)
}
