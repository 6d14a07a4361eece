//! Chess Worlds core - historical-game levels as a state machine
//!
//! A level replays a famous game. The player controls one side and must
//! reproduce that side's moves exactly; the other side is played
//! automatically from the record.
//!
//! # Architecture
//!
//! - **Types**: squares, sides, promotion pieces and historical plies
//! - **Oracle**: the chess-rules seam ([`RulesOracle`]) and its shakmaty implementation
//! - **Transcript**: movetext parsing into ply lists
//! - **Level**: a move sequence plus the player's side, with invariants
//! - **Runner**: the move-validation state machine
//! - **Scoring / Reveal**: time budget and the "show me" animation plan
//!
//! # Example
//!
//! ```
//! use chess_worlds_core::{LevelDefinition, LevelRunner, ShakmatyOracle, Side};
//!
//! let oracle = ShakmatyOracle::new();
//! let level = LevelDefinition::from_transcript(&oracle, "1.e4 e5 2.Nf3", Side::Black)?;
//! let mut runner = LevelRunner::new(oracle, level);
//!
//! let outcome = runner.attempt_move("e7".parse()?, "e5".parse()?, None);
//! assert!(outcome.is_accepted());
//! assert!(runner.is_complete());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod invariants;
mod level;
mod oracle;
mod reveal;
mod runner;
mod scoring;
mod transcript;
mod types;

// Crate-level exports - Domain types
pub use types::{Coord, HistoricalMove, MoveRequest, ParseCoordError, PromotionPiece, Side};

// Crate-level exports - Rules oracle
pub use oracle::{ChessPosition, MoveRejected, RulesOracle, ShakmatyOracle};

// Crate-level exports - Transcripts
pub use transcript::{TranscriptError, parse_movetext, san_tokens};

// Crate-level exports - Levels and invariants
pub use invariants::{
    AlternatingMovers, AwaitsPlayerSide, ContiguousPlies, CursorInBounds, DefinitionInvariants,
    Invariant, InvariantSet, InvariantViolation, NonEmptySequence, RunnerInvariants,
};
pub use level::{LevelDefinition, LevelError};

// Crate-level exports - Runner
pub use runner::{LevelRunner, MoveOutcome, RunnerPhase};

// Crate-level exports - Scoring and reveal
pub use reveal::{FLASH, GAP, HOLD, LABEL, RevealFrame, RevealPlan};
pub use scoring::{DEFAULT_SECONDS_PER_MOVE, MAX_SCORE, RunClock, ScoreCard, TimeBudget};
