//! Content repositories: where games and players come from.
//!
//! A repository stores one [`SourceBundle`]. Reads never fail: a missing,
//! unreadable or outdated bundle yields the built-in defaults. Writes and
//! imports report [`ContentError`].

use super::error::ContentError;
use super::models::{GameRecord, PlayerRecord, SCHEMA_VERSION, SourceBundle};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, instrument, warn};

const DEFAULT_BUNDLE: &str = include_str!("default_bundle.json");

/// Message for an import whose top level is an array.
pub const IMPORT_ARRAY_MESSAGE: &str = "Import failed: expected an object, got an array.";

/// Message for an import missing either list.
pub const IMPORT_SHAPE_MESSAGE: &str =
    "Import failed: file must include gamesSource[] and playersSource[] arrays.";

/// The built-in bundle, stamped now.
#[instrument]
pub fn default_bundle() -> SourceBundle {
    match serde_json::from_str::<SourceBundle>(DEFAULT_BUNDLE) {
        Ok(bundle) => bundle.restamped(),
        Err(e) => {
            warn!(error = %e, "Built-in bundle unreadable, using an empty one");
            SourceBundle::current(Vec::new(), Vec::new())
        }
    }
}

/// Parses a stored bundle, or `None` if it is unusable.
fn parse_stored(raw: &str) -> Option<SourceBundle> {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "Stored bundle is not JSON");
            return None;
        }
    };

    let version = value.get("schemaVersion").and_then(Value::as_u64);
    let shaped = value.get("gamesSource").is_some_and(Value::is_array)
        && value.get("playersSource").is_some_and(Value::is_array);
    if version != Some(u64::from(SCHEMA_VERSION)) || !shaped {
        warn!(?version, shaped, "Stored bundle has the wrong shape or version");
        return None;
    }

    match serde_json::from_value(value) {
        Ok(bundle) => Some(bundle),
        Err(e) => {
            warn!(error = %e, "Stored bundle records are malformed");
            None
        }
    }
}

/// Validates an imported document and builds the bundle to store.
#[instrument(skip(value))]
fn bundle_from_import(value: Value) -> Result<SourceBundle, ContentError> {
    if value.is_array() {
        return Err(ContentError::new(IMPORT_ARRAY_MESSAGE));
    }

    let (Some(games), Some(players)) = (
        value.get("gamesSource").filter(|v| v.is_array()),
        value.get("playersSource").filter(|v| v.is_array()),
    ) else {
        return Err(ContentError::new(IMPORT_SHAPE_MESSAGE));
    };

    let games: Vec<GameRecord> = serde_json::from_value(games.clone())
        .map_err(|e| ContentError::new(format!("Import failed: bad game record: {}", e)))?;
    let players: Vec<PlayerRecord> = serde_json::from_value(players.clone())
        .map_err(|e| ContentError::new(format!("Import failed: bad player record: {}", e)))?;

    info!(games = games.len(), players = players.len(), "Import accepted");
    Ok(SourceBundle::current(games, players))
}

/// Storage for the content bundle.
pub trait ContentRepository: Send + Sync {
    /// The effective bundle: stored content, or defaults when there is none.
    fn load_bundle(&self) -> SourceBundle;

    /// Stores `bundle`, re-stamped with the current version and time.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError`] if the bundle cannot be written.
    fn save_bundle(&self, bundle: &SourceBundle) -> Result<(), ContentError>;

    /// Discards stored content so that defaults apply again.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError`] if stored content cannot be removed.
    fn reset_to_defaults(&self) -> Result<(), ContentError>;

    /// Effective games.
    fn games(&self) -> Vec<GameRecord> {
        self.load_bundle().games_source().clone()
    }

    /// Effective players.
    fn players(&self) -> Vec<PlayerRecord> {
        self.load_bundle().players_source().clone()
    }

    /// Replaces the games, keeping the players.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError`] if the bundle cannot be written.
    fn set_games(&self, games: Vec<GameRecord>) -> Result<(), ContentError> {
        let mut bundle = self.load_bundle();
        bundle.set_games(games);
        self.save_bundle(&bundle)
    }

    /// Replaces the players, keeping the games.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError`] if the bundle cannot be written.
    fn set_players(&self, players: Vec<PlayerRecord>) -> Result<(), ContentError> {
        let mut bundle = self.load_bundle();
        bundle.set_players(players);
        self.save_bundle(&bundle)
    }

    /// The effective bundle, for writing to a file.
    fn export_bundle(&self) -> SourceBundle {
        self.load_bundle()
    }

    /// Replaces stored content with an imported document.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError`] if the document is an array, lacks either
    /// list, contains malformed records, or cannot be written.
    fn import_value(&self, value: Value) -> Result<(), ContentError> {
        let bundle = bundle_from_import(value)?;
        self.save_bundle(&bundle)
    }

    /// Parses `text` as JSON and imports it.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError`] if the text is not JSON or the import fails.
    fn import_json(&self, text: &str) -> Result<(), ContentError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| ContentError::new(format!("Import failed: not valid JSON: {}", e)))?;
        self.import_value(value)
    }
}

// ─────────────────────────────────────────────────────────────
//  File-backed repository
// ─────────────────────────────────────────────────────────────

/// Stores the bundle as pretty-printed JSON in a single file.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    /// Creates a repository backed by `path`. The file need not exist.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ContentRepository for JsonFileRepository {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn load_bundle(&self) -> SourceBundle {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No stored bundle, using defaults");
                return default_bundle();
            }
            Err(e) => {
                warn!(error = %e, "Stored bundle unreadable, using defaults");
                return default_bundle();
            }
        };
        parse_stored(&raw).unwrap_or_else(default_bundle)
    }

    #[instrument(skip(self, bundle), fields(path = %self.path.display()))]
    fn save_bundle(&self, bundle: &SourceBundle) -> Result<(), ContentError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&bundle.clone().restamped())?;
        std::fs::write(&self.path, json)?;
        info!(
            games = bundle.games_source().len(),
            players = bundle.players_source().len(),
            "Bundle saved"
        );
        Ok(())
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn reset_to_defaults(&self) -> Result<(), ContentError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                info!("Stored bundle removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ─────────────────────────────────────────────────────────────
//  In-memory repository
// ─────────────────────────────────────────────────────────────

/// Keeps the stored bundle as raw JSON in memory.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    stored: Mutex<Option<String>>,
}

impl MemoryRepository {
    /// Creates an empty repository (defaults apply).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository holding `raw` as if it had been stored earlier.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            stored: Mutex::new(Some(raw.into())),
        }
    }

    /// Whether anything is stored.
    pub fn has_stored(&self) -> bool {
        self.slot().is_some()
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.stored.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ContentRepository for MemoryRepository {
    fn load_bundle(&self) -> SourceBundle {
        match self.slot().as_deref() {
            Some(raw) => parse_stored(raw).unwrap_or_else(default_bundle),
            None => default_bundle(),
        }
    }

    fn save_bundle(&self, bundle: &SourceBundle) -> Result<(), ContentError> {
        let json = serde_json::to_string(&bundle.clone().restamped())?;
        *self.slot() = Some(json);
        debug!("Bundle stored in memory");
        Ok(())
    }

    fn reset_to_defaults(&self) -> Result<(), ContentError> {
        *self.slot() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bundle_parses() {
        let bundle = default_bundle();
        assert_eq!(*bundle.schema_version(), SCHEMA_VERSION);
        assert!(bundle.games_source().len() >= 16);
        assert!(bundle
            .games_source()
            .iter()
            .any(|g| g.id() == "game-immortal-1851"));
        assert!(!bundle.players_source().is_empty());
    }

    #[test]
    fn test_wrong_version_falls_back() {
        let raw = r#"{"schemaVersion":2,"exportedAt":"2025-01-01T00:00:00Z","gamesSource":[],"playersSource":[]}"#;
        assert!(parse_stored(raw).is_none());
    }

    #[test]
    fn test_import_rejects_array() {
        let err = bundle_from_import(serde_json::json!([])).expect_err("array");
        assert_eq!(err.message, IMPORT_ARRAY_MESSAGE);
    }

    #[test]
    fn test_import_requires_both_lists() {
        let err = bundle_from_import(serde_json::json!({"gamesSource": []})).expect_err("shape");
        assert_eq!(err.message, IMPORT_SHAPE_MESSAGE);
    }

    #[test]
    fn test_memory_corruption_uses_defaults() {
        let repo = MemoryRepository::with_raw("{not json");
        assert_eq!(repo.games().len(), default_bundle().games_source().len());
    }
}
