//! Local pairing state: which code this device belongs to and the name the
//! user signs with. Stored as one small JSON file under the data dir; any
//! read failure means "not set up yet" and routes the user to setup.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

const PAIRING_FILE: &str = "pairing.json";
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
pub const CODE_LEN: usize = 6;

static CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new("^[A-Z0-9]{6}$").expect("valid code regex"));

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PairingState {
    pub couple_code: String,
    pub display_name: String,
}

impl PairingState {
    /// The label notes are signed with.
    pub fn sender_label(&self) -> String {
        format!("— {}", self.display_name)
    }
}

/// Six uppercase alphanumeric characters, generated client-side and trusted
/// unique without a collision check.
pub fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Trim and uppercase user input, then check the shape.
pub fn normalize_code(input: &str) -> Option<String> {
    let code = input.trim().to_ascii_uppercase();
    CODE_RE.is_match(&code).then_some(code)
}

fn state_path(data_dir: &Path) -> PathBuf {
    data_dir.join(PAIRING_FILE)
}

pub fn load(data_dir: &Path) -> Option<PairingState> {
    let path = state_path(data_dir);
    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
        Err(err) => {
            warn!(?err, path = %path.display(), "failed to read pairing state");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(state) => Some(state),
        Err(err) => {
            warn!(?err, "pairing state unreadable, treating as unpaired");
            None
        }
    }
}

pub fn save(data_dir: &Path, state: &PairingState) -> Result<()> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create {}", data_dir.display()))?;
    let raw = serde_json::to_string_pretty(state).context("failed to encode pairing state")?;
    std::fs::write(state_path(data_dir), raw).context("failed to write pairing state")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn generated_codes_have_the_documented_shape() {
        for _ in 0..50 {
            let code = generate_code();
            assert_eq!(normalize_code(&code), Some(code));
        }
    }

    #[test]
    fn normalize_uppercases_and_trims() {
        assert_eq!(normalize_code("  x7z9kp "), Some("X7Z9KP".to_string()));
        assert_eq!(normalize_code("AB12"), None);
        assert_eq!(normalize_code("ABC-12"), None);
        assert_eq!(normalize_code("ABCDEFG"), None);
    }

    #[test]
    fn save_then_load_round_trips() {
        let td = tempdir().unwrap();
        let state = PairingState {
            couple_code: "X7Z9KP".into(),
            display_name: "Ana".into(),
        };
        save(td.path(), &state).unwrap();
        assert_eq!(load(td.path()), Some(state));
    }

    #[test]
    fn missing_or_corrupt_state_reads_as_unpaired() {
        let td = tempdir().unwrap();
        assert_eq!(load(td.path()), None);
        std::fs::write(td.path().join(PAIRING_FILE), "not json").unwrap();
        assert_eq!(load(td.path()), None);
    }

    #[test]
    fn sender_label_carries_the_signature_prefix() {
        let state = PairingState {
            couple_code: "X7Z9KP".into(),
            display_name: "Ana".into(),
        };
        assert_eq!(state.sender_label(), "— Ana");
    }
}
