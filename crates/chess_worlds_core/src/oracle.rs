//! Chess rules oracle: the seam between level logic and chess rules.
//!
//! The level runner never implements chess itself. It asks a [`RulesOracle`]
//! for the starting position, for legal destinations, and to apply a move on
//! a copy of a position. [`ShakmatyOracle`] is the production implementation.

use super::transcript::{self, TranscriptError};
use super::types::{Coord, HistoricalMove, MoveRequest, PromotionPiece, Side};
use derive_more::{Display, Error};
use shakmaty::uci::UciMove;
use shakmaty::{Chess, EnPassantMode, File, Move, Position, Rank, Role, Square};
use std::fmt::Debug;
use tracing::{debug, instrument};

// ─────────────────────────────────────────────────────────────
//  Oracle trait
// ─────────────────────────────────────────────────────────────

/// A move the oracle refused to apply.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum MoveRejected {
    /// The move is not legal chess in the given position.
    #[display("Illegal move: {}", _0)]
    Illegal(#[error(not(source))] MoveRequest),
}

/// General chess-rules capability consumed by the level runner.
pub trait RulesOracle {
    /// Board state. Equality must cover everything that affects later play.
    type Position: Clone + Debug + PartialEq;

    /// The canonical initial layout.
    fn starting_position(&self) -> Self::Position;

    /// Squares the piece on `origin` may legally move to.
    fn legal_destinations(&self, position: &Self::Position, origin: Coord) -> Vec<Coord>;

    /// Applies the promotion rule: a pawn reaching the last rank without a
    /// piece promotes to a queen, and a piece on a non-promoting move is dropped.
    fn normalize(&self, position: &Self::Position, request: MoveRequest) -> MoveRequest;

    /// Plays `request` on a copy of `position`.
    ///
    /// Returns the resulting position together with the move as the oracle
    /// understood it (normalised).
    ///
    /// # Errors
    ///
    /// Returns [`MoveRejected`] when the move is not legal.
    fn apply_move(
        &self,
        position: &Self::Position,
        request: MoveRequest,
    ) -> Result<(Self::Position, MoveRequest), MoveRejected>;

    /// Converts movetext into a ply-ordered move list.
    ///
    /// # Errors
    ///
    /// Returns [`TranscriptError`] when the text is empty or a token cannot be played.
    fn parse_transcript(&self, text: &str) -> Result<Vec<HistoricalMove>, TranscriptError>;
}

// ─────────────────────────────────────────────────────────────
//  Shakmaty-backed position
// ─────────────────────────────────────────────────────────────

/// A standard chess position.
#[derive(Debug, Clone, Default)]
pub struct ChessPosition(Chess);

impl ChessPosition {
    /// Returns the underlying shakmaty position.
    pub fn inner(&self) -> &Chess {
        &self.0
    }

    /// Side to move.
    pub fn turn(&self) -> Side {
        Side::from(self.0.turn())
    }

    /// Piece on `coord` as its owner and FEN letter (uppercase for white).
    pub fn piece_at(&self, coord: Coord) -> Option<(Side, char)> {
        self.0
            .board()
            .piece_at(coord.square())
            .map(|piece| (Side::from(piece.color), piece.char()))
    }

    /// Whether the side to move is in check.
    pub fn is_check(&self) -> bool {
        self.0.is_check()
    }

    /// Whether the side to move is checkmated.
    pub fn is_checkmate(&self) -> bool {
        self.0.is_checkmate()
    }

    /// Renders the board as text, seen from `orientation`'s side.
    pub fn render(&self, orientation: Side) -> String {
        let ranks: Vec<u32> = match orientation {
            Side::White => (0..8).rev().collect(),
            Side::Black => (0..8).collect(),
        };
        let files: Vec<u32> = match orientation {
            Side::White => (0..8).collect(),
            Side::Black => (0..8).rev().collect(),
        };

        let mut out = String::new();
        for rank in &ranks {
            out.push_str(&format!("{} ", rank + 1));
            for file in &files {
                let symbol = Coord::from_indices(*file, *rank)
                    .and_then(|coord| self.piece_at(coord))
                    .map(|(_, c)| c)
                    .unwrap_or('.');
                out.push(symbol);
                out.push(' ');
            }
            out.push('\n');
        }
        out.push_str("  ");
        for file in &files {
            out.push(char::from(b'a' + *file as u8));
            out.push(' ');
        }
        out.push('\n');
        out
    }
}

impl PartialEq for ChessPosition {
    fn eq(&self, other: &Self) -> bool {
        let (a, b) = (&self.0, &other.0);
        a.board() == b.board()
            && a.turn() == b.turn()
            && a.castles().castling_rights() == b.castles().castling_rights()
            && a.ep_square(EnPassantMode::Legal) == b.ep_square(EnPassantMode::Legal)
            && a.halfmoves() == b.halfmoves()
            && a.fullmoves() == b.fullmoves()
    }
}

impl Eq for ChessPosition {}

impl From<Chess> for ChessPosition {
    fn from(chess: Chess) -> Self {
        Self(chess)
    }
}

// ─────────────────────────────────────────────────────────────
//  Shakmaty-backed oracle
// ─────────────────────────────────────────────────────────────

/// Standard-chess oracle built on the `shakmaty` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShakmatyOracle;

impl ShakmatyOracle {
    /// Creates the oracle.
    #[instrument]
    pub fn new() -> Self {
        Self
    }
}

impl RulesOracle for ShakmatyOracle {
    type Position = ChessPosition;

    fn starting_position(&self) -> ChessPosition {
        ChessPosition::default()
    }

    #[instrument(skip(self, position, origin), fields(origin = %origin))]
    fn legal_destinations(&self, position: &ChessPosition, origin: Coord) -> Vec<Coord> {
        let mut destinations: Vec<Coord> = Vec::new();
        for m in position.0.legal_moves() {
            if m.from() != Some(origin.square()) {
                continue;
            }
            if let Some(request) = request_from_move(&m) {
                if !destinations.contains(&request.destination) {
                    destinations.push(request.destination);
                }
            }
        }
        debug!(count = destinations.len(), "Legal destinations computed");
        destinations
    }

    fn normalize(&self, position: &ChessPosition, request: MoveRequest) -> MoveRequest {
        let pawn_on_origin = position
            .0
            .board()
            .piece_at(request.origin.square())
            .is_some_and(|piece| piece.role == Role::Pawn);
        let last_rank = matches!(request.destination.square().rank(), Rank::First | Rank::Eighth);

        let promotion = if pawn_on_origin && last_rank {
            Some(request.promotion.unwrap_or(PromotionPiece::Queen))
        } else {
            None
        };
        MoveRequest {
            promotion,
            ..request
        }
    }

    #[instrument(skip(self, position, request), fields(request = %request))]
    fn apply_move(
        &self,
        position: &ChessPosition,
        request: MoveRequest,
    ) -> Result<(ChessPosition, MoveRequest), MoveRejected> {
        let request = self.normalize(position, request);
        let uci = UciMove::Normal {
            from: request.origin.square(),
            to: request.destination.square(),
            promotion: request.promotion.map(PromotionPiece::to_role),
        };

        let m = uci
            .to_move(&position.0)
            .map_err(|_| MoveRejected::Illegal(request))?;
        let normalized = request_from_move(&m).ok_or(MoveRejected::Illegal(request))?;
        let next = position
            .0
            .clone()
            .play(&m)
            .map_err(|_| MoveRejected::Illegal(request))?;

        debug!(normalized = %normalized, "Move applied");
        Ok((ChessPosition(next), normalized))
    }

    #[instrument(skip(self, text), fields(len = text.len()))]
    fn parse_transcript(&self, text: &str) -> Result<Vec<HistoricalMove>, TranscriptError> {
        transcript::parse_movetext(text)
    }
}

/// Describes a shakmaty move as origin, destination and promotion.
///
/// Castling maps to the king's two-square move so that it compares equal to
/// what a player drags on the board.
pub(crate) fn request_from_move(m: &Move) -> Option<MoveRequest> {
    match m {
        Move::Normal {
            from,
            to,
            promotion,
            ..
        } => Some(MoveRequest::new(
            Coord::from(*from),
            Coord::from(*to),
            promotion.and_then(PromotionPiece::from_role),
        )),
        Move::EnPassant { from, to } => Some(MoveRequest::new(
            Coord::from(*from),
            Coord::from(*to),
            None,
        )),
        Move::Castle { king, rook } => {
            let file = if rook.file() > king.file() {
                File::G
            } else {
                File::C
            };
            Some(MoveRequest::new(
                Coord::from(*king),
                Coord::from(Square::from_coords(file, king.rank())),
                None,
            ))
        }
        Move::Put { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Coord {
        s.parse().expect("valid square")
    }

    #[test]
    fn test_knight_destinations_from_start() {
        let oracle = ShakmatyOracle::new();
        let start = oracle.starting_position();
        let mut dests: Vec<String> = oracle
            .legal_destinations(&start, sq("g1"))
            .iter()
            .map(ToString::to_string)
            .collect();
        dests.sort();
        assert_eq!(dests, vec!["f3", "h3"]);
    }

    #[test]
    fn test_empty_square_has_no_destinations() {
        let oracle = ShakmatyOracle::new();
        let start = oracle.starting_position();
        assert!(oracle.legal_destinations(&start, sq("e4")).is_empty());
    }

    #[test]
    fn test_apply_move_leaves_input_untouched() {
        let oracle = ShakmatyOracle::new();
        let start = oracle.starting_position();
        let (next, normalized) = oracle
            .apply_move(&start, MoveRequest::new(sq("e2"), sq("e4"), None))
            .expect("legal");
        assert_eq!(start, oracle.starting_position());
        assert_ne!(next, start);
        assert_eq!(normalized, MoveRequest::new(sq("e2"), sq("e4"), None));
        assert_eq!(next.turn(), Side::Black);
    }

    #[test]
    fn test_apply_move_rejects_illegal() {
        let oracle = ShakmatyOracle::new();
        let start = oracle.starting_position();
        let result = oracle.apply_move(&start, MoveRequest::new(sq("g1"), sq("g3"), None));
        assert!(matches!(result, Err(MoveRejected::Illegal(_))));
    }

    #[test]
    fn test_normalize_drops_promotion_on_ordinary_move() {
        let oracle = ShakmatyOracle::new();
        let start = oracle.starting_position();
        let normalized = oracle.normalize(
            &start,
            MoveRequest::new(sq("e2"), sq("e4"), Some(PromotionPiece::Knight)),
        );
        assert_eq!(normalized.promotion, None);
    }

    #[test]
    fn test_render_orients_for_black() {
        let oracle = ShakmatyOracle::new();
        let start = oracle.starting_position();
        let white_view = start.render(Side::White);
        let black_view = start.render(Side::Black);
        assert!(white_view.starts_with("8 r n b q k b n r"));
        assert!(black_view.starts_with("1 R N B K Q B N R"));
        assert!(black_view.ends_with("  h g f e d c b a \n"));
    }
}
