//! Chess Worlds library - content, catalog, feedback relay and terminal play
//!
//! The rules and the level state machine live in `chess_worlds_core`. This
//! crate adds everything around them.
//!
//! # Architecture
//!
//! - **Config**: TOML file plus environment overrides
//! - **Content**: the editable games/players bundle and its storage
//! - **Catalog**: worlds and levels derived from the bundle
//! - **Feedback**: HTTP relay that mails player reports to support
//! - **Session**: a line-oriented terminal front end for one level
//!
//! # Example
//!
//! ```
//! use chess_worlds::{LevelCatalog, MemoryRepository};
//! use chess_worlds_core::{LevelRunner, ShakmatyOracle};
//!
//! let repository = MemoryRepository::new();
//! let catalog = LevelCatalog::from_repository(&repository, ShakmatyOracle::new());
//! let level = catalog.load_level("player-anderssen/game-immortal-1851")?;
//!
//! let runner = LevelRunner::new(ShakmatyOracle::new(), level.definition().clone());
//! assert!(!runner.is_complete());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod config;
mod content;
mod feedback;
mod session;

// Crate-level exports - Configuration
pub use config::{
    AppConfig, ConfigError, DEFAULT_MAX_SCREENSHOT_BYTES, DEFAULT_PORT, MailConfig, TransportKind,
};

// Crate-level exports - Content store and catalog
pub use content::{
    CatalogError, ContentError, ContentRepository, GameRecord, IMPORT_ARRAY_MESSAGE,
    IMPORT_SHAPE_MESSAGE, JsonFileRepository, LevelCatalog, LevelEntry, LoadedLevel,
    MemoryRepository, PlayerRecord, PlayerStats, SCHEMA_VERSION, SourceBundle, World,
    default_bundle, player_overview,
};

// Crate-level exports - Feedback relay
pub use feedback::{
    AppState, Attachment, FeedbackError, FeedbackForm, HEALTH_MESSAGE, MailMessage,
    MailTransport, Mailbox, OutboxTransport, SEND_FAILED_MESSAGE, SUBJECT_PREFIX,
    SendGridTransport, SubmissionError, compose, router, serve, transport_from_config,
};

// Crate-level exports - Terminal session
pub use session::{PlaySession, SessionCommand, SessionOutcome};
