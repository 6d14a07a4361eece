//! Level definitions: a recorded game plus the side the player controls.

use super::invariants::{DefinitionInvariants, InvariantSet};
use super::oracle::RulesOracle;
use super::transcript::TranscriptError;
use super::types::{HistoricalMove, Side};
use derive_getters::Getters;
use derive_more::{Display, Error, From};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Error building a playable level.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error, From)]
pub enum LevelError {
    /// The transcript could not be parsed.
    #[display("Transcript error: {}", _0)]
    Transcript(TranscriptError),

    /// The move sequence breaks a definition invariant.
    #[display("Invalid level definition: {}", _0)]
    #[from(ignore)]
    Invalid(#[error(not(source))] String),
}

/// The fixed historical game assigned to one level.
///
/// Construction does not validate; call [`LevelDefinition::validate`] or build
/// through [`LevelDefinition::from_transcript`] to enforce the invariants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct LevelDefinition {
    /// Every ply of the game, both sides, in order.
    move_sequence: Vec<HistoricalMove>,
    /// Side the human plays.
    player_side: Side,
}

impl LevelDefinition {
    /// Creates a definition from an already-built move sequence.
    #[instrument(skip(move_sequence), fields(plies = move_sequence.len()))]
    pub fn new(move_sequence: Vec<HistoricalMove>, player_side: Side) -> Self {
        Self {
            move_sequence,
            player_side,
        }
    }

    /// Parses a transcript with `oracle` and validates the result.
    ///
    /// # Errors
    ///
    /// Returns [`LevelError::Transcript`] if the text cannot be parsed, or
    /// [`LevelError::Invalid`] if the parsed sequence breaks an invariant.
    #[instrument(skip(oracle, transcript), fields(len = transcript.len()))]
    pub fn from_transcript<O: RulesOracle>(
        oracle: &O,
        transcript: &str,
        player_side: Side,
    ) -> Result<Self, LevelError> {
        let moves = oracle.parse_transcript(transcript)?;
        let definition = Self::new(moves, player_side);
        definition.validate()?;
        info!(
            plies = definition.move_sequence.len(),
            player_moves = definition.player_move_count(),
            "Level definition built"
        );
        Ok(definition)
    }

    /// Checks the definition invariants.
    ///
    /// # Errors
    ///
    /// Returns [`LevelError::Invalid`] listing every violated invariant.
    #[instrument(skip(self))]
    pub fn validate(&self) -> Result<(), LevelError> {
        DefinitionInvariants::check_all(self).map_err(|violations| {
            let descriptions = violations
                .iter()
                .map(|v| v.description.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            warn!(%descriptions, "Level definition rejected");
            LevelError::Invalid(descriptions)
        })?;
        debug!("Level definition valid");
        Ok(())
    }

    /// Number of plies belonging to the player.
    pub fn player_move_count(&self) -> usize {
        self.move_sequence
            .iter()
            .filter(|m| *m.mover() == self.player_side)
            .count()
    }

    /// Total plies in the game.
    pub fn len(&self) -> usize {
        self.move_sequence.len()
    }

    /// Whether the game has no moves at all.
    pub fn is_empty(&self) -> bool {
        self.move_sequence.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::ShakmatyOracle;
    use crate::types::Coord;

    fn sq(s: &str) -> Coord {
        s.parse().expect("valid square")
    }

    #[test]
    fn test_from_transcript_counts_player_moves() {
        let oracle = ShakmatyOracle::new();
        let level = LevelDefinition::from_transcript(&oracle, "1.e4 e5 2.Nf3", Side::Black)
            .expect("valid");
        assert_eq!(level.len(), 3);
        assert_eq!(level.player_move_count(), 1);
    }

    #[test]
    fn test_from_transcript_propagates_parse_errors() {
        let oracle = ShakmatyOracle::new();
        let err = LevelDefinition::from_transcript(&oracle, "", Side::White).expect_err("empty");
        assert_eq!(err, LevelError::Transcript(TranscriptError::Empty));
    }

    #[test]
    fn test_validate_rejects_repeated_mover() {
        let level = LevelDefinition::new(
            vec![
                HistoricalMove::new(0, Side::White, sq("e2"), sq("e4"), None),
                HistoricalMove::new(1, Side::White, sq("d2"), sq("d4"), None),
            ],
            Side::White,
        );
        assert!(matches!(level.validate(), Err(LevelError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_empty_sequence() {
        let level = LevelDefinition::new(Vec::new(), Side::White);
        assert!(level.validate().is_err());
        assert_eq!(level.player_move_count(), 0);
    }
}
