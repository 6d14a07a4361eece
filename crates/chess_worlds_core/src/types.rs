//! Core domain types for historical-game levels.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use shakmaty::{Color, File, Rank, Role, Square};
use std::str::FromStr;
use tracing::instrument;

// ─────────────────────────────────────────────────────────────
//  Side
// ─────────────────────────────────────────────────────────────

/// Side to move.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Side {
    /// First player (moves first).
    White,
    /// Second player.
    Black,
}

impl Side {
    /// Returns the other side.
    pub fn opponent(self) -> Self {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    /// Converts to the shakmaty color.
    pub fn to_color(self) -> Color {
        match self {
            Side::White => Color::White,
            Side::Black => Color::Black,
        }
    }
}

impl From<Color> for Side {
    fn from(color: Color) -> Self {
        match color {
            Color::White => Side::White,
            Color::Black => Side::Black,
        }
    }
}

// ─────────────────────────────────────────────────────────────
//  Coord
// ─────────────────────────────────────────────────────────────

/// A board square in algebraic form (`a1`..`h8`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Coord(Square);

impl Coord {
    /// Creates a coordinate from zero-based file and rank indices.
    pub fn from_indices(file: u32, rank: u32) -> Option<Self> {
        if file < 8 && rank < 8 {
            Some(Self(Square::from_coords(File::new(file), Rank::new(rank))))
        } else {
            None
        }
    }

    /// Zero-based file index (`a` = 0).
    pub fn file_index(self) -> u32 {
        self.0.file() as u32
    }

    /// Zero-based rank index (`1` = 0).
    pub fn rank_index(self) -> u32 {
        self.0.rank() as u32
    }

    /// File letter.
    pub fn file_char(self) -> char {
        self.0.file().char()
    }

    /// Rank digit.
    pub fn rank_char(self) -> char {
        self.0.rank().char()
    }

    /// Returns the underlying shakmaty square.
    pub fn square(self) -> Square {
        self.0
    }
}

impl From<Square> for Coord {
    fn from(square: Square) -> Self {
        Self(square)
    }
}

impl std::fmt::Display for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A string that is not a square name.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("Invalid square: {:?}", input)]
pub struct ParseCoordError {
    /// The rejected input.
    pub input: String,
}

impl FromStr for Coord {
    type Err = ParseCoordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        trimmed
            .to_ascii_lowercase()
            .parse::<Square>()
            .map(Self)
            .map_err(|_| ParseCoordError {
                input: trimmed.to_string(),
            })
    }
}

impl TryFrom<String> for Coord {
    type Error = ParseCoordError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Coord> for String {
    fn from(coord: Coord) -> Self {
        coord.to_string()
    }
}

// ─────────────────────────────────────────────────────────────
//  Promotion
// ─────────────────────────────────────────────────────────────

/// Piece a pawn may promote to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum PromotionPiece {
    /// Queen (the default when a promotion is not specified).
    #[serde(rename = "q")]
    #[strum(serialize = "q")]
    Queen,
    /// Rook.
    #[serde(rename = "r")]
    #[strum(serialize = "r")]
    Rook,
    /// Bishop.
    #[serde(rename = "b")]
    #[strum(serialize = "b")]
    Bishop,
    /// Knight.
    #[serde(rename = "n")]
    #[strum(serialize = "n")]
    Knight,
}

impl PromotionPiece {
    /// Converts to the shakmaty role.
    pub fn to_role(self) -> Role {
        match self {
            PromotionPiece::Queen => Role::Queen,
            PromotionPiece::Rook => Role::Rook,
            PromotionPiece::Bishop => Role::Bishop,
            PromotionPiece::Knight => Role::Knight,
        }
    }

    /// Converts from a shakmaty role; pawns and kings are not promotion targets.
    pub fn from_role(role: Role) -> Option<Self> {
        match role {
            Role::Queen => Some(PromotionPiece::Queen),
            Role::Rook => Some(PromotionPiece::Rook),
            Role::Bishop => Some(PromotionPiece::Bishop),
            Role::Knight => Some(PromotionPiece::Knight),
            Role::Pawn | Role::King => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────
//  Moves
// ─────────────────────────────────────────────────────────────

/// A move as submitted to the rules oracle: squares plus optional promotion.
///
/// Castling is always expressed as the king's two-square move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoveRequest {
    /// Square the piece leaves.
    pub origin: Coord,
    /// Square the piece lands on.
    pub destination: Coord,
    /// Promotion piece, if any.
    pub promotion: Option<PromotionPiece>,
}

impl MoveRequest {
    /// Creates a new move request.
    #[instrument]
    pub fn new(origin: Coord, destination: Coord, promotion: Option<PromotionPiece>) -> Self {
        Self {
            origin,
            destination,
            promotion,
        }
    }
}

impl std::fmt::Display for MoveRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.origin, self.destination)?;
        if let Some(piece) = self.promotion {
            write!(f, "{}", piece)?;
        }
        Ok(())
    }
}

/// One ply of a recorded game.
///
/// `notation` is a display label only; validation never reads it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Getters)]
pub struct HistoricalMove {
    /// Zero-based position in the sequence.
    ply: usize,
    /// Side that played the move.
    mover: Side,
    /// Square the piece left.
    origin: Coord,
    /// Square the piece landed on.
    destination: Coord,
    /// Promotion piece, present only for promotions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    promotion: Option<PromotionPiece>,
    /// Human-readable label such as `Nf3`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notation: Option<String>,
}

impl HistoricalMove {
    /// Creates a historical move without a display label.
    #[instrument]
    pub fn new(
        ply: usize,
        mover: Side,
        origin: Coord,
        destination: Coord,
        promotion: Option<PromotionPiece>,
    ) -> Self {
        Self {
            ply,
            mover,
            origin,
            destination,
            promotion,
            notation: None,
        }
    }

    /// Attaches a display label.
    pub fn with_notation(mut self, notation: impl Into<String>) -> Self {
        self.notation = Some(notation.into());
        self
    }

    /// The move as an oracle request.
    pub fn request(&self) -> MoveRequest {
        MoveRequest::new(self.origin, self.destination, self.promotion)
    }

    /// Display label without check or mate marks, falling back to the destination square.
    pub fn label(&self) -> String {
        match &self.notation {
            Some(text) => text.trim_end_matches(['+', '#']).to_string(),
            None => self.destination.to_string(),
        }
    }
}

impl std::fmt::Display for HistoricalMove {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.notation {
            Some(text) => write!(f, "{} {} ({})", self.ply, text, self.request()),
            None => write!(f, "{} {}", self.ply, self.request()),
        }
    }
}
