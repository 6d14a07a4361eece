//! Worlds and levels derived from the content bundle.
//!
//! Each shown player is a world. A world's levels are the shown games in
//! which that player appears, and the human plays the player's historical
//! side. Transcripts are parsed only when a level is loaded.

use super::models::{GameRecord, PlayerRecord, PlayerStats, SourceBundle};
use super::repository::ContentRepository;
use chess_worlds_core::{
    LevelDefinition, LevelError, RulesOracle, ShakmatyOracle, Side, TimeBudget,
};
use derive_getters::Getters;
use derive_more::{Display, Error};
use tracing::{debug, info, instrument, warn};

/// Sort key for players without a world order.
const UNORDERED: u32 = 9999;

/// A level that cannot be produced.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum CatalogError {
    /// No level has this id.
    #[display("Unknown level: {}", _0)]
    UnknownLevel(#[error(not(source))] String),

    /// The level's game could not be turned into a definition.
    #[display("Level {} could not be loaded: {}", id, source)]
    Level {
        /// Level id.
        id: String,
        /// Underlying failure.
        source: LevelError,
    },
}

/// One playable level in a world.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct LevelEntry {
    /// Unique id: `{world id}/{game id}`.
    id: String,
    /// Display title, e.g. "Level 1 – The Immortal Game (1851)".
    title: String,
    /// Pairing shown under the title.
    subtitle: String,
    /// Side the human plays.
    player_side: Side,
    /// The source game.
    game: GameRecord,
}

impl LevelEntry {
    /// Per-move allowance from the game.
    pub fn time_per_move_seconds(&self) -> Option<u32> {
        *self.game.time_per_move_seconds()
    }
}

/// A player's world.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct World {
    /// World id (the player's id).
    id: String,
    /// Display name.
    name: String,
    /// Short blurb.
    description: Option<String>,
    /// Levels in play order.
    levels: Vec<LevelEntry>,
}

/// A level ready to run.
#[derive(Debug, Clone, Getters)]
pub struct LoadedLevel {
    /// Catalog entry.
    entry: LevelEntry,
    /// Parsed move sequence and side.
    definition: LevelDefinition,
    /// Time allowed for scoring.
    budget: TimeBudget,
}

/// Worlds derived from a bundle, plus the oracle used to load levels.
#[derive(Debug, Clone)]
pub struct LevelCatalog<O: RulesOracle = ShakmatyOracle> {
    oracle: O,
    worlds: Vec<World>,
}

impl<O: RulesOracle> LevelCatalog<O> {
    /// Builds the catalog from the repository's effective bundle.
    #[instrument(skip(repository, oracle))]
    pub fn from_repository(repository: &dyn ContentRepository, oracle: O) -> Self {
        Self::from_bundle(&repository.load_bundle(), oracle)
    }

    /// Builds the catalog from a bundle.
    #[instrument(skip(bundle, oracle), fields(games = bundle.games_source().len(), players = bundle.players_source().len()))]
    pub fn from_bundle(bundle: &SourceBundle, oracle: O) -> Self {
        let mut players: Vec<&PlayerRecord> =
            bundle.players_source().iter().filter(|p| *p.show()).collect();
        players.sort_by(|a, b| {
            let ao = a.world_order().unwrap_or(UNORDERED);
            let bo = b.world_order().unwrap_or(UNORDERED);
            ao.cmp(&bo).then_with(|| a.name().cmp(b.name()))
        });

        let worlds: Vec<World> = players
            .into_iter()
            .filter_map(|player| derive_world(player, bundle.games_source()))
            .collect();

        info!(worlds = worlds.len(), "Catalog built");
        Self { oracle, worlds }
    }

    /// Worlds in display order. Worlds without levels are omitted.
    pub fn worlds(&self) -> &[World] {
        &self.worlds
    }

    /// All levels across all worlds.
    pub fn levels(&self) -> impl Iterator<Item = &LevelEntry> {
        self.worlds.iter().flat_map(|w| w.levels.iter())
    }

    /// Finds a level by its id, or by bare game id (first world wins).
    pub fn find_level(&self, id: &str) -> Option<&LevelEntry> {
        self.levels()
            .find(|level| level.id == id)
            .or_else(|| self.levels().find(|level| level.game.id() == id))
    }

    /// Parses the level's transcript into a definition.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownLevel`] for an unknown id and
    /// [`CatalogError::Level`] when the transcript is unusable.
    #[instrument(skip(self))]
    pub fn load_level(&self, id: &str) -> Result<LoadedLevel, CatalogError> {
        let entry = self
            .find_level(id)
            .ok_or_else(|| CatalogError::UnknownLevel(id.to_string()))?;

        let definition =
            LevelDefinition::from_transcript(&self.oracle, entry.game.pgn(), entry.player_side)
                .map_err(|source| {
                    warn!(level = %entry.id, error = %source, "Level failed to load");
                    CatalogError::Level {
                        id: entry.id.clone(),
                        source,
                    }
                })?;
        let budget = TimeBudget::for_level(&definition, entry.time_per_move_seconds());

        debug!(level = %entry.id, plies = definition.len(), "Level loaded");
        Ok(LoadedLevel {
            entry: entry.clone(),
            definition,
            budget,
        })
    }

    /// Loads every level, returning the ones that fail.
    #[instrument(skip(self))]
    pub fn validate_all(&self) -> Vec<CatalogError> {
        let failures: Vec<CatalogError> = self
            .levels()
            .filter_map(|level| self.load_level(&level.id).err())
            .collect();
        info!(failures = failures.len(), "Catalog validated");
        failures
    }

    /// The oracle used for loading.
    pub fn oracle(&self) -> &O {
        &self.oracle
    }
}

fn derive_world(player: &PlayerRecord, games: &[GameRecord]) -> Option<World> {
    let mut matching: Vec<(&GameRecord, Side)> = games
        .iter()
        .filter(|game| *game.show())
        .filter_map(|game| {
            if player.matches_name(game.white()) {
                Some((game, Side::White))
            } else if player.matches_name(game.black()) {
                Some((game, Side::Black))
            } else {
                None
            }
        })
        .collect();
    if matching.is_empty() {
        debug!(player = %player.name(), "No shown games, world omitted");
        return None;
    }
    matching.sort_by_key(|(game, _)| game.year().unwrap_or(i32::MAX));

    let levels = matching
        .into_iter()
        .enumerate()
        .map(|(index, (game, side))| {
            let year = game.year().map(|y| format!(" ({})", y)).unwrap_or_default();
            LevelEntry {
                id: format!("{}/{}", player.id(), game.id()),
                title: format!("Level {} – {}{}", index + 1, game.title(), year),
                subtitle: game
                    .official_name()
                    .clone()
                    .unwrap_or_else(|| format!("{} vs {}", game.white(), game.black())),
                player_side: side,
                game: game.clone(),
            }
        })
        .collect();

    Some(World {
        id: player.id().clone(),
        name: player.world_title(),
        description: player.description().clone(),
        levels,
    })
}

/// Every player with derived counts, in world order, shown or not.
pub fn player_overview(bundle: &SourceBundle) -> Vec<(PlayerRecord, PlayerStats)> {
    let mut players = bundle.players_source().clone();
    players.sort_by(|a, b| {
        let ao = a.world_order().unwrap_or(UNORDERED);
        let bo = b.world_order().unwrap_or(UNORDERED);
        ao.cmp(&bo).then_with(|| a.name().cmp(b.name()))
    });
    players
        .into_iter()
        .map(|player| {
            let stats = PlayerStats::for_player(&player, bundle.games_source());
            (player, stats)
        })
        .collect()
}
