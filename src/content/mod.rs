//! Puzzle content: games, players, the bundle store, and the derived worlds.

mod catalog;
mod error;
mod models;
mod repository;

pub use catalog::{CatalogError, LevelCatalog, LevelEntry, LoadedLevel, World, player_overview};
pub use error::ContentError;
pub use models::{GameRecord, PlayerRecord, PlayerStats, SCHEMA_VERSION, SourceBundle};
pub use repository::{
    ContentRepository, IMPORT_ARRAY_MESSAGE, IMPORT_SHAPE_MESSAGE, JsonFileRepository,
    MemoryRepository, default_bundle,
};
