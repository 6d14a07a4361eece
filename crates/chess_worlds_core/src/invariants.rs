//! First-class invariants for level definitions and runners.
//!
//! Invariants are logical properties that must hold for content to be
//! playable and for a runner to be in a consistent state. They are testable
//! independently and composable into sets.

use super::level::LevelDefinition;
use super::oracle::RulesOracle;
use super::runner::LevelRunner;
use super::types::Side;

/// A logical property that must hold for a given state.
pub trait Invariant<S> {
    /// Checks if the invariant holds for the given state.
    fn holds(state: &S) -> bool;

    /// Human-readable description of the invariant.
    fn description() -> &'static str;
}

/// Violation of an invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub description: String,
}

impl InvariantViolation {
    /// Creates a new invariant violation.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// A set of invariants that can be checked together.
///
/// Implementations are provided for tuples.
pub trait InvariantSet<S> {
    /// Checks all invariants in the set, collecting every violation.
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>>;
}

fn check<S, I: Invariant<S>>(state: &S, violations: &mut Vec<InvariantViolation>) {
    if !I::holds(state) {
        violations.push(InvariantViolation::new(I::description()));
    }
}

fn finish(violations: Vec<InvariantViolation>) -> Result<(), Vec<InvariantViolation>> {
    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

impl<S, I1, I2, I3> InvariantSet<S> for (I1, I2, I3)
where
    I1: Invariant<S>,
    I2: Invariant<S>,
    I3: Invariant<S>,
{
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
        let mut violations = Vec::new();
        check::<S, I1>(state, &mut violations);
        check::<S, I2>(state, &mut violations);
        check::<S, I3>(state, &mut violations);
        finish(violations)
    }
}

impl<S, I1, I2> InvariantSet<S> for (I1, I2)
where
    I1: Invariant<S>,
    I2: Invariant<S>,
{
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
        let mut violations = Vec::new();
        check::<S, I1>(state, &mut violations);
        check::<S, I2>(state, &mut violations);
        finish(violations)
    }
}

// ─────────────────────────────────────────────────────────────
//  Definition invariants
// ─────────────────────────────────────────────────────────────

/// Invariant: the game has at least one move.
pub struct NonEmptySequence;

impl Invariant<LevelDefinition> for NonEmptySequence {
    fn holds(level: &LevelDefinition) -> bool {
        !level.is_empty()
    }

    fn description() -> &'static str {
        "Move sequence is non-empty"
    }
}

/// Invariant: white moves first and movers alternate.
pub struct AlternatingMovers;

impl Invariant<LevelDefinition> for AlternatingMovers {
    fn holds(level: &LevelDefinition) -> bool {
        let moves = level.move_sequence();
        if let Some(first) = moves.first() {
            if *first.mover() != Side::White {
                return false;
            }
        }
        moves.windows(2).all(|w| w[0].mover() != w[1].mover())
    }

    fn description() -> &'static str {
        "Movers alternate starting with white"
    }
}

/// Invariant: plies are numbered 0, 1, 2, ... without gaps.
pub struct ContiguousPlies;

impl Invariant<LevelDefinition> for ContiguousPlies {
    fn holds(level: &LevelDefinition) -> bool {
        level
            .move_sequence()
            .iter()
            .enumerate()
            .all(|(index, m)| *m.ply() == index)
    }

    fn description() -> &'static str {
        "Plies are contiguous from zero"
    }
}

/// All definition invariants as a composable set.
pub type DefinitionInvariants = (NonEmptySequence, AlternatingMovers, ContiguousPlies);

// ─────────────────────────────────────────────────────────────
//  Runner invariants
// ─────────────────────────────────────────────────────────────

/// Invariant: `0 <= cursor <= len`.
pub struct CursorInBounds;

impl<O: RulesOracle> Invariant<LevelRunner<O>> for CursorInBounds {
    fn holds(runner: &LevelRunner<O>) -> bool {
        runner.cursor() <= runner.definition().len()
    }

    fn description() -> &'static str {
        "Cursor stays within the move sequence"
    }
}

/// Invariant: an unfinished, unfailed runner waits on one of the player's moves.
pub struct AwaitsPlayerSide;

impl<O: RulesOracle> Invariant<LevelRunner<O>> for AwaitsPlayerSide {
    fn holds(runner: &LevelRunner<O>) -> bool {
        if runner.failed() {
            return true;
        }
        match runner.expected_move() {
            Some(expected) => *expected.mover() == *runner.definition().player_side(),
            None => true,
        }
    }

    fn description() -> &'static str {
        "Next expected move belongs to the player"
    }
}

/// All runner invariants as a composable set.
pub type RunnerInvariants = (CursorInBounds, AwaitsPlayerSide);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::ShakmatyOracle;
    use crate::types::{Coord, HistoricalMove};

    fn sq(s: &str) -> Coord {
        s.parse().expect("valid square")
    }

    #[test]
    fn test_definition_set_holds_for_parsed_game() {
        let oracle = ShakmatyOracle::new();
        let moves = oracle.parse_transcript("1.d4 d5 2.c4 e6").expect("valid");
        let level = LevelDefinition::new(moves, Side::White);
        assert!(DefinitionInvariants::check_all(&level).is_ok());
    }

    #[test]
    fn test_black_first_violates_alternation() {
        let level = LevelDefinition::new(
            vec![HistoricalMove::new(0, Side::Black, sq("e7"), sq("e5"), None)],
            Side::Black,
        );
        assert!(!AlternatingMovers::holds(&level));
        assert!(NonEmptySequence::holds(&level));
    }

    #[test]
    fn test_ply_gap_is_detected() {
        let level = LevelDefinition::new(
            vec![
                HistoricalMove::new(0, Side::White, sq("e2"), sq("e4"), None),
                HistoricalMove::new(2, Side::Black, sq("e7"), sq("e5"), None),
            ],
            Side::White,
        );
        let violations = DefinitionInvariants::check_all(&level).expect_err("gap");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].description, ContiguousPlies::description());
    }

    #[test]
    fn test_runner_set_holds_after_creation() {
        let oracle = ShakmatyOracle::new();
        let moves = oracle.parse_transcript("1.e4 e5 2.Nf3 Nc6").expect("valid");
        let runner = LevelRunner::new(oracle, LevelDefinition::new(moves, Side::Black));
        assert!(RunnerInvariants::check_all(&runner).is_ok());
    }
}
