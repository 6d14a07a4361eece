//! Content bundle models: historical games and featured players.

use chrono::{DateTime, Utc};
use derive_getters::Getters;
use derive_new::new;
use serde::{Deserialize, Serialize};

/// Bundle format version understood by this build.
pub const SCHEMA_VERSION: u32 = 1;

/// One historical game as stored in the content bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    /// Stable identifier, also used as the level id.
    id: String,
    /// Era label such as `romantic` or `modern`.
    #[serde(default)]
    era: Option<String>,
    /// Year played.
    #[serde(default)]
    year: Option<i32>,
    /// Date as recorded, possibly partial (`1852-??-??`).
    #[serde(default)]
    date: Option<String>,
    /// Name of the white player.
    #[serde(default)]
    white: String,
    /// Name of the black player.
    #[serde(default)]
    black: String,
    /// Event or venue.
    #[serde(default)]
    event: Option<String>,
    /// Popular name, e.g. "The Immortal Game".
    #[serde(default)]
    nickname: Option<String>,
    /// Formal pairing, e.g. "Anderssen vs Kieseritzky".
    #[serde(default)]
    official_name: Option<String>,
    /// Result token.
    #[serde(default)]
    result: Option<String>,
    /// Whether the game is playable.
    #[serde(default)]
    show: bool,
    /// Per-move allowance for scoring.
    #[serde(default)]
    time_per_move_seconds: Option<u32>,
    /// Short blurb.
    #[serde(default)]
    description: Option<String>,
    /// Movetext of the full game.
    #[serde(default)]
    pgn: String,
}

impl GameRecord {
    /// Creates a shown record with the essential fields.
    pub fn new(
        id: impl Into<String>,
        white: impl Into<String>,
        black: impl Into<String>,
        pgn: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            era: None,
            year: None,
            date: None,
            white: white.into(),
            black: black.into(),
            event: None,
            nickname: None,
            official_name: None,
            result: None,
            show: true,
            time_per_move_seconds: None,
            description: None,
            pgn: pgn.into(),
        }
    }

    /// Sets the era.
    pub fn with_era(mut self, era: impl Into<String>) -> Self {
        self.era = Some(era.into());
        self
    }

    /// Sets the popular name.
    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    /// Sets the per-move allowance.
    pub fn with_time_per_move(mut self, seconds: u32) -> Self {
        self.time_per_move_seconds = Some(seconds);
        self
    }

    /// Sets visibility.
    pub fn with_show(mut self, show: bool) -> Self {
        self.show = show;
        self
    }

    /// Title used for levels: nickname, then official name, then the pairing.
    pub fn title(&self) -> String {
        self.nickname
            .clone()
            .or_else(|| self.official_name.clone())
            .unwrap_or_else(|| format!("{} vs {}", self.white, self.black))
    }
}

/// A featured player; each shown player becomes a world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    /// Stable identifier, also used as the world id.
    id: String,
    /// Canonical name matched against game records.
    name: String,
    /// Position in the world list.
    #[serde(default)]
    world_order: Option<u32>,
    /// Display name of the world.
    #[serde(default)]
    world_name: Option<String>,
    /// Short blurb.
    #[serde(default)]
    description: Option<String>,
    /// Whether the world is playable.
    #[serde(default)]
    show: bool,
    /// Other spellings of the name.
    #[serde(default)]
    aliases: Vec<String>,
    /// Free-form curator notes.
    #[serde(default)]
    notes: String,
}

impl PlayerRecord {
    /// Creates a shown player with no aliases.
    pub fn new(id: impl Into<String>, name: impl Into<String>, world_order: Option<u32>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            world_order,
            world_name: None,
            description: None,
            show: true,
            aliases: Vec::new(),
            notes: String::new(),
        }
    }

    /// Adds an alternative spelling.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Sets visibility.
    pub fn with_show(mut self, show: bool) -> Self {
        self.show = show;
        self
    }

    /// Whether `game_name` refers to this player.
    ///
    /// Comparison is trimmed and case-insensitive, and also accepts aliases.
    pub fn matches_name(&self, game_name: &str) -> bool {
        let wanted = game_name.trim().to_lowercase();
        if wanted.is_empty() {
            return false;
        }
        std::iter::once(&self.name)
            .chain(self.aliases.iter())
            .map(|candidate| candidate.trim().to_lowercase())
            .any(|candidate| !candidate.is_empty() && candidate == wanted)
    }

    /// World title: the configured name or the player's name.
    pub fn world_title(&self) -> String {
        self.world_name.clone().unwrap_or_else(|| self.name.clone())
    }
}

/// Everything the game needs: games plus players, versioned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, new)]
#[serde(rename_all = "camelCase")]
pub struct SourceBundle {
    /// Format version, see [`SCHEMA_VERSION`].
    schema_version: u32,
    /// When the bundle was written.
    exported_at: DateTime<Utc>,
    /// Historical games.
    games_source: Vec<GameRecord>,
    /// Featured players.
    players_source: Vec<PlayerRecord>,
}

impl SourceBundle {
    /// Current-version bundle stamped now.
    pub fn current(games: Vec<GameRecord>, players: Vec<PlayerRecord>) -> Self {
        Self::new(SCHEMA_VERSION, Utc::now(), games, players)
    }

    /// Replaces the games.
    pub fn set_games(&mut self, games: Vec<GameRecord>) {
        self.games_source = games;
    }

    /// Replaces the players.
    pub fn set_players(&mut self, players: Vec<PlayerRecord>) {
        self.players_source = players;
    }

    /// Re-stamps the bundle with the current version and time.
    pub fn restamped(mut self) -> Self {
        self.schema_version = SCHEMA_VERSION;
        self.exported_at = Utc::now();
        self
    }
}

/// Derived per-player counts shown in the players view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    /// Games the player appears in.
    total: usize,
    /// Games played with white.
    as_white: usize,
    /// Games played with black.
    as_black: usize,
    /// Distinct eras, sorted.
    eras: Vec<String>,
}

impl PlayerStats {
    /// Counts `player`'s appearances in `games`, shown or not.
    pub fn for_player(player: &PlayerRecord, games: &[GameRecord]) -> Self {
        let mut stats = Self::default();
        for game in games {
            if player.matches_name(&game.white) {
                stats.as_white += 1;
            } else if player.matches_name(&game.black) {
                stats.as_black += 1;
            } else {
                continue;
            }
            stats.total += 1;
            if let Some(era) = &game.era {
                if !era.is_empty() && !stats.eras.contains(era) {
                    stats.eras.push(era.clone());
                }
            }
        }
        stats.eras.sort();
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_matching_is_trimmed_and_case_insensitive() {
        let player = PlayerRecord::new("p", "Bobby Fischer", Some(4)).with_alias("R. J. Fischer");
        assert!(player.matches_name("  bobby fischer "));
        assert!(player.matches_name("r. j. fischer"));
        assert!(!player.matches_name("Fischer"));
        assert!(!player.matches_name("   "));
    }

    #[test]
    fn test_stats_count_sides_and_eras() {
        let player = PlayerRecord::new("p", "Adolf Anderssen", Some(1));
        let games = vec![
            GameRecord::new("a", "Adolf Anderssen", "X", "1.e4").with_era("romantic"),
            GameRecord::new("b", "Y", "adolf anderssen", "1.e4").with_era("classical"),
            GameRecord::new("c", "Adolf Anderssen", "Z", "1.e4").with_era("romantic"),
            GameRecord::new("d", "Q", "R", "1.e4"),
        ];
        let stats = PlayerStats::for_player(&player, &games);
        assert_eq!(*stats.total(), 3);
        assert_eq!(*stats.as_white(), 2);
        assert_eq!(*stats.as_black(), 1);
        assert_eq!(stats.eras(), &vec!["classical".to_string(), "romantic".to_string()]);
    }

    #[test]
    fn test_game_record_reads_camel_case() {
        let json = r#"{"id":"g","white":"A","black":"B","officialName":"A vs B","timePerMoveSeconds":12,"show":true,"pgn":"1.e4","nickname":null}"#;
        let game: GameRecord = serde_json::from_str(json).expect("parse");
        assert_eq!(game.official_name().as_deref(), Some("A vs B"));
        assert_eq!(*game.time_per_move_seconds(), Some(12));
        assert_eq!(game.title(), "A vs B");
    }
}
