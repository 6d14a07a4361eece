//! The level runner: replays a historical game and judges the player's moves.
//!
//! A runner owns a [`LevelDefinition`], a cursor into its move sequence and
//! the live position. Opponent plies are played automatically, so between
//! calls the runner always waits on one of the player's moves or is finished.

use super::invariants::{CursorInBounds, Invariant, InvariantSet, RunnerInvariants};
use super::level::LevelDefinition;
use super::oracle::{RulesOracle, ShakmatyOracle};
use super::types::{Coord, HistoricalMove, MoveRequest, PromotionPiece, Side};
use tracing::{debug, info, instrument, warn};

/// Where a runner is in its level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum RunnerPhase {
    /// The next move in the sequence is the player's.
    AwaitingPlayerMove,
    /// Every move of the sequence has been played.
    SequenceComplete,
}

/// Result of one [`LevelRunner::attempt_move`] call.
///
/// Only [`MoveOutcome::Accepted`] moves the position or the cursor.
#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome<P> {
    /// The move matched history and was committed.
    Accepted {
        /// Position after the player's move and any opponent reply.
        position: P,
        /// Whether the sequence is now finished.
        sequence_complete: bool,
        /// The opponent ply played automatically, if any.
        auto_reply: Option<HistoricalMove>,
    },
    /// The level was already finished; nothing happened.
    SequenceComplete,
    /// The next ply belongs to the opponent.
    IllegalTurn {
        /// The ply that should come next.
        expected: HistoricalMove,
    },
    /// The move breaks the rules of chess.
    IllegalMove {
        /// The move history wanted.
        expected: HistoricalMove,
    },
    /// The move is legal but differs from what was played historically.
    WrongMove {
        /// The move history wanted.
        expected: HistoricalMove,
    },
}

impl<P> MoveOutcome<P> {
    /// Whether the move was committed.
    pub fn is_accepted(&self) -> bool {
        matches!(self, MoveOutcome::Accepted { .. })
    }

    /// Whether the level is finished after this outcome.
    pub fn is_sequence_complete(&self) -> bool {
        matches!(
            self,
            MoveOutcome::SequenceComplete
                | MoveOutcome::Accepted {
                    sequence_complete: true,
                    ..
                }
        )
    }

    /// The move history wanted, for rejections.
    pub fn expected(&self) -> Option<&HistoricalMove> {
        match self {
            MoveOutcome::IllegalTurn { expected }
            | MoveOutcome::IllegalMove { expected }
            | MoveOutcome::WrongMove { expected } => Some(expected),
            MoveOutcome::Accepted { .. } | MoveOutcome::SequenceComplete => None,
        }
    }

    /// Short machine-friendly name of the outcome.
    pub fn kind(&self) -> &'static str {
        match self {
            MoveOutcome::Accepted { .. } => "accepted",
            MoveOutcome::SequenceComplete => "sequence_complete",
            MoveOutcome::IllegalTurn { .. } => "illegal_turn",
            MoveOutcome::IllegalMove { .. } => "illegal_move",
            MoveOutcome::WrongMove { .. } => "wrong_move",
        }
    }
}

/// Drives one level: fast-forwards to the player's first move, validates each
/// attempt against history, and auto-plays the opponent.
#[derive(Debug, Clone)]
pub struct LevelRunner<O: RulesOracle = ShakmatyOracle> {
    oracle: O,
    definition: LevelDefinition,
    position: O::Position,
    cursor: usize,
    failed: bool,
}

impl<O: RulesOracle> LevelRunner<O> {
    /// Creates a runner and fast-forwards through opening opponent plies.
    ///
    /// An empty definition yields a runner that is immediately complete. If
    /// the oracle rejects a historical ply during fast-forward the runner
    /// records the failure and stops there.
    #[instrument(skip(oracle, definition), fields(plies = definition.len(), side = %definition.player_side()))]
    pub fn new(oracle: O, definition: LevelDefinition) -> Self {
        let position = oracle.starting_position();
        let mut runner = Self {
            oracle,
            definition,
            position,
            cursor: 0,
            failed: false,
        };
        runner.fast_forward();
        info!(cursor = runner.cursor, failed = runner.failed, "Level runner ready");
        runner
    }

    /// Restores the starting position and fast-forwards again.
    ///
    /// Equivalent to constructing a fresh runner with the same inputs.
    #[instrument(skip(self), fields(cursor = self.cursor))]
    pub fn reset(&mut self) {
        self.position = self.oracle.starting_position();
        self.cursor = 0;
        self.failed = false;
        self.fast_forward();
        debug!(cursor = self.cursor, "Level runner reset");
    }

    fn fast_forward(&mut self) {
        let player_side = *self.definition.player_side();
        while let Some(next) = self.definition.move_sequence().get(self.cursor) {
            if *next.mover() == player_side {
                break;
            }
            match self.oracle.apply_move(&self.position, next.request()) {
                Ok((position, _)) => {
                    self.position = position;
                    self.cursor += 1;
                }
                Err(e) => {
                    warn!(ply = self.cursor, error = %e, "Historical ply rejected during fast-forward");
                    self.failed = true;
                    break;
                }
            }
        }
        debug!(cursor = self.cursor, "Fast-forward finished");
    }

    /// Number of plies in the sequence belonging to the player.
    pub fn player_move_count(&self) -> usize {
        self.definition.player_move_count()
    }

    /// The ply at the cursor, or `None` when the sequence is finished.
    pub fn expected_move(&self) -> Option<&HistoricalMove> {
        self.definition.move_sequence().get(self.cursor)
    }

    /// Current phase.
    pub fn phase(&self) -> RunnerPhase {
        if self.cursor >= self.definition.len() {
            RunnerPhase::SequenceComplete
        } else {
            RunnerPhase::AwaitingPlayerMove
        }
    }

    /// Whether every ply has been played.
    pub fn is_complete(&self) -> bool {
        self.phase() == RunnerPhase::SequenceComplete
    }

    /// Live position.
    pub fn position(&self) -> &O::Position {
        &self.position
    }

    /// Index of the next ply.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Whether an attempt diverged from history or a historical ply was rejected.
    ///
    /// Diagnostic only; it never blocks further attempts.
    pub fn failed(&self) -> bool {
        self.failed
    }

    /// The level being played.
    pub fn definition(&self) -> &LevelDefinition {
        &self.definition
    }

    /// Side the player controls.
    pub fn player_side(&self) -> Side {
        *self.definition.player_side()
    }

    /// The rules oracle.
    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Legal destinations for the piece on `origin`, for highlighting.
    ///
    /// Empty once the level is finished. Only the side to move has legal
    /// moves, so opponent pieces report nothing while the player is to move.
    #[instrument(skip(self, origin), fields(origin = %origin))]
    pub fn legal_destinations(&self, origin: Coord) -> Vec<Coord> {
        if self.is_complete() {
            return Vec::new();
        }
        self.oracle.legal_destinations(&self.position, origin)
    }

    /// Origin and destination of the expected move when it is the player's.
    pub fn hint(&self) -> Option<(Coord, Coord)> {
        self.expected_move()
            .filter(|m| *m.mover() == self.player_side())
            .map(|m| (*m.origin(), *m.destination()))
    }

    /// The position that would follow the expected move, without committing it.
    pub fn preview_expected(&self) -> Option<O::Position> {
        let expected = self.expected_move()?;
        self.oracle
            .apply_move(&self.position, expected.request())
            .ok()
            .map(|(position, _)| position)
    }

    /// Validates the player's move against the rules and against history.
    ///
    /// On acceptance the move is committed, the cursor advances, and the
    /// opponent's next ply (if any) is played automatically. A rejection
    /// only sets the failed flag; position and cursor are left as they were.
    #[instrument(skip(self, origin, destination), fields(cursor = self.cursor, origin = %origin, destination = %destination))]
    pub fn attempt_move(
        &mut self,
        origin: Coord,
        destination: Coord,
        promotion: Option<PromotionPiece>,
    ) -> MoveOutcome<O::Position> {
        let Some(expected) = self.expected_move().cloned() else {
            debug!("Attempt after completion ignored");
            return MoveOutcome::SequenceComplete;
        };

        if *expected.mover() != self.player_side() {
            warn!(expected = %expected, "Next ply belongs to the opponent");
            self.failed = true;
            return MoveOutcome::IllegalTurn { expected };
        }

        let request = MoveRequest::new(origin, destination, promotion);
        let (next_position, played) = match self.oracle.apply_move(&self.position, request) {
            Ok(result) => result,
            Err(e) => {
                debug!(error = %e, "Illegal move");
                self.failed = true;
                return MoveOutcome::IllegalMove { expected };
            }
        };

        let wanted = self.oracle.normalize(&self.position, expected.request());
        if played != wanted {
            debug!(played = %played, wanted = %wanted, "Legal but not historical");
            self.failed = true;
            return MoveOutcome::WrongMove { expected };
        }

        self.position = next_position;
        self.cursor += 1;
        info!(ply = *expected.ply(), "Player move accepted");

        let auto_reply = self.play_opponent_reply();
        let sequence_complete = self.is_complete();
        if sequence_complete {
            info!("Level sequence complete");
        }

        self.check_invariants();
        MoveOutcome::Accepted {
            position: self.position.clone(),
            sequence_complete,
            auto_reply,
        }
    }

    fn play_opponent_reply(&mut self) -> Option<HistoricalMove> {
        let next = self.expected_move()?.clone();
        if *next.mover() == self.player_side() {
            return None;
        }
        match self.oracle.apply_move(&self.position, next.request()) {
            Ok((position, _)) => {
                self.position = position;
                self.cursor += 1;
                debug!(reply = %next, "Opponent reply played");
                Some(next)
            }
            Err(e) => {
                warn!(ply = *next.ply(), error = %e, "Historical reply rejected");
                self.failed = true;
                None
            }
        }
    }

    fn check_invariants(&self) {
        debug_assert!(
            CursorInBounds::holds(self),
            "{}",
            <CursorInBounds as Invariant<Self>>::description()
        );
        if let Err(violations) = RunnerInvariants::check_all(self) {
            for violation in violations {
                warn!(invariant = %violation.description, "Runner invariant violated");
            }
        }
    }
}
