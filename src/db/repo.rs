use super::model::PendingEvent;
use crate::model::{HistoryEntry, NoteFields, NoteKind, SharedNote};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use tracing::instrument;

pub type Pool = SqlitePool;

pub async fn init_pool(database_url: &str) -> Result<Pool> {
    let normalized = prepare_sqlite_url(database_url);
    let pool = SqlitePool::connect(&normalized).await?;
    // Enable WAL and stricter durability.
    sqlx::query("PRAGMA journal_mode=WAL;")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous=FULL;")
        .execute(&pool)
        .await?;
    Ok(pool)
}

/// If using a file-backed SQLite URL, expand a leading `~/` and ensure the
/// parent directory exists. Leaves in-memory URLs untouched.
fn prepare_sqlite_url(url: &str) -> String {
    if !url.starts_with("sqlite:") {
        return url.to_string();
    }
    if url.starts_with("sqlite::memory") {
        return url.to_string();
    }

    let rest = &url["sqlite:".len()..];
    let path_with_query = rest.strip_prefix("//").unwrap_or(rest);

    let (path_part, query_part) = match path_with_query.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (path_with_query, None),
    };

    if path_part.is_empty() {
        return url.to_string();
    }

    let expanded_path = if let Some(rest) = path_part.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            format!("{}/{}", home.trim_end_matches('/'), rest)
        } else {
            path_part.to_string()
        }
    } else {
        path_part.to_string()
    };

    if let Some(parent) = std::path::Path::new(&expanded_path).parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }

    let mut rebuilt = String::from("sqlite://");
    rebuilt.push_str(&expanded_path);
    if let Some(q) = query_part {
        rebuilt.push('?');
        rebuilt.push_str(q);
    }
    rebuilt
}

pub async fn run_migrations(pool: &Pool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Merge-write the shared note: only the fields present in `fields` change,
/// everything else keeps its stored value. The store assigns the timestamp.
/// Returns the assigned timestamp.
#[instrument(skip_all)]
pub async fn upsert_note(pool: &Pool, code: &str, fields: &NoteFields) -> Result<DateTime<Utc>> {
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO notes (code, text, sender, theme, kind, content, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?) \
         ON CONFLICT(code) DO UPDATE SET \
             text = COALESCE(excluded.text, notes.text), \
             sender = COALESCE(excluded.sender, notes.sender), \
             theme = COALESCE(excluded.theme, notes.theme), \
             kind = COALESCE(excluded.kind, notes.kind), \
             content = COALESCE(excluded.content, notes.content), \
             updated_at = excluded.updated_at",
    )
    .bind(code)
    .bind(fields.text.as_deref())
    .bind(fields.sender.as_deref())
    .bind(fields.theme.as_deref())
    .bind(fields.kind.map(|k| k.as_str()))
    .bind(fields.content.as_deref())
    .bind(now)
    .execute(pool)
    .await?;
    Ok(now)
}

#[instrument(skip_all)]
pub async fn get_note(pool: &Pool, code: &str) -> Result<Option<SharedNote>> {
    let row = sqlx::query(
        "SELECT code, text, sender, theme, kind, content, updated_at FROM notes WHERE code = ?",
    )
    .bind(code)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|row| SharedNote {
        code: row.get("code"),
        text: row.get("text"),
        sender: row.get("sender"),
        theme: row.get("theme"),
        kind: row
            .get::<Option<String>, _>("kind")
            .map(|k| NoteKind::parse(&k)),
        content: row.get("content"),
        updated_at: row.get("updated_at"),
    }))
}

/// Existence check used by the join flow. Validates nothing beyond the row
/// being there.
#[instrument(skip_all)]
pub async fn pair_exists(pool: &Pool, code: &str) -> Result<bool> {
    let found = sqlx::query_scalar::<_, i64>("SELECT 1 FROM notes WHERE code = ?")
        .bind(code)
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}

#[instrument(skip_all)]
pub async fn append_history(
    pool: &Pool,
    code: &str,
    fields: &NoteFields,
    created_at: DateTime<Utc>,
) -> Result<i64> {
    let rec = sqlx::query(
        "INSERT INTO history (code, text, sender, theme, kind, content, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(code)
    .bind(fields.text.as_deref())
    .bind(fields.sender.as_deref())
    .bind(fields.theme.as_deref())
    .bind(fields.kind.map(|k| k.as_str()))
    .bind(fields.content.as_deref())
    .bind(created_at)
    .fetch_one(pool)
    .await?;
    Ok(rec.get::<i64, _>("id"))
}

/// Newest-first history, capped at `limit`.
#[instrument(skip_all)]
pub async fn recent_history(pool: &Pool, code: &str, limit: i64) -> Result<Vec<HistoryEntry>> {
    let rows = sqlx::query(
        "SELECT id, text, sender, theme, kind, content, created_at FROM history \
         WHERE code = ? ORDER BY created_at DESC, id DESC LIMIT ?",
    )
    .bind(code)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .map(|row| HistoryEntry {
            id: row.get("id"),
            text: row.get("text"),
            sender: row.get("sender"),
            theme: row.get("theme"),
            kind: row
                .get::<Option<String>, _>("kind")
                .map(|k| NoteKind::parse(&k)),
            content: row.get("content"),
            created_at: row.get("created_at"),
        })
        .collect())
}

/// History as shown to the user: the newest entry is the live note itself,
/// so it is dropped from the list.
#[instrument(skip_all)]
pub async fn display_history(pool: &Pool, code: &str, limit: i64) -> Result<Vec<HistoryEntry>> {
    let mut entries = recent_history(pool, code, limit).await?;
    if !entries.is_empty() {
        entries.remove(0);
    }
    Ok(entries)
}

/// Register or replace a participant's push token. Keyed by name so a new
/// phone replaces the old token rather than adding a second one.
#[instrument(skip_all)]
pub async fn set_token(pool: &Pool, code: &str, name: &str, token: &str) -> Result<()> {
    sqlx::query(
        "INSERT INTO tokens (code, name, token, updated_at) VALUES (?, ?, ?, ?) \
         ON CONFLICT(code, name) DO UPDATE SET \
             token = excluded.token, updated_at = excluded.updated_at",
    )
    .bind(code)
    .bind(name)
    .bind(token)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(())
}

/// Token map for a pairing, name-ordered for deterministic fan-out.
#[instrument(skip_all)]
pub async fn token_map(pool: &Pool, code: &str) -> Result<Vec<(String, String)>> {
    let rows = sqlx::query("SELECT name, token FROM tokens WHERE code = ? ORDER BY name")
        .bind(code)
        .fetch_all(pool)
        .await?;
    Ok(rows
        .into_iter()
        .map(|row| (row.get("name"), row.get("token")))
        .collect())
}

/// Delete the named tokens in one statement. Keyed deletes, so a concurrent
/// re-registration of an unrelated name is never clobbered.
#[instrument(skip_all)]
pub async fn delete_tokens(pool: &Pool, code: &str, names: &[String]) -> Result<()> {
    if names.is_empty() {
        return Ok(());
    }
    let placeholders = vec!["?"; names.len()].join(", ");
    let sql = format!("DELETE FROM tokens WHERE code = ? AND name IN ({placeholders})");
    let mut query = sqlx::query(&sql).bind(code);
    for name in names {
        query = query.bind(name);
    }
    query.execute(pool).await?;
    Ok(())
}

#[instrument(skip_all)]
pub async fn enqueue_event(pool: &Pool, code: &str) -> Result<i64> {
    let rec = sqlx::query("INSERT INTO note_events (code, created_at) VALUES (?, ?) RETURNING id")
        .bind(code)
        .bind(Utc::now())
        .fetch_one(pool)
        .await?;
    Ok(rec.get::<i64, _>("id"))
}

#[instrument(skip_all)]
pub async fn next_event(pool: &Pool) -> Result<Option<PendingEvent>> {
    let row = sqlx::query("SELECT id, code, created_at FROM note_events ORDER BY id LIMIT 1")
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|row| PendingEvent {
        id: row.get("id"),
        code: row.get("code"),
        created_at: row.get("created_at"),
    }))
}

#[instrument(skip_all)]
pub async fn delete_event(pool: &Pool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM note_events WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_sqlite_url_passes_through_memory_and_foreign_schemes() {
        assert_eq!(
            prepare_sqlite_url("sqlite::memory:"),
            "sqlite::memory:".to_string()
        );
        assert_eq!(
            prepare_sqlite_url("postgres://x/y"),
            "postgres://x/y".to_string()
        );
    }

    #[test]
    fn prepare_sqlite_url_rebuilds_file_urls() {
        let url = prepare_sqlite_url("sqlite://some/dir/notes.db?mode=rwc");
        assert!(url.starts_with("sqlite://"));
        assert!(url.ends_with("notes.db?mode=rwc"));
    }
}
