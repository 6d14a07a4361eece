//! Movetext parsing for historical game transcripts.
//!
//! Accepts PGN-style movetext as found in game collections: optional tag
//! pairs, move numbers, comments, variations, NAGs, annotation glyphs and a
//! result token. Only the mainline SAN moves are kept.

use super::oracle::request_from_move;
use super::types::{HistoricalMove, Side};
use derive_more::{Display, Error};
use shakmaty::san::SanPlus;
use shakmaty::{Chess, Position};
use tracing::{debug, instrument, warn};

const RESULT_TOKENS: [&str; 4] = ["1-0", "0-1", "1/2-1/2", "*"];

/// Movetext that cannot be turned into a move sequence.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum TranscriptError {
    /// No moves were found.
    #[display("Transcript contains no moves")]
    Empty,

    /// A token is not valid SAN.
    #[display("Unreadable move {:?} at ply {}", token, ply)]
    UnknownToken {
        /// Ply the token would have occupied.
        ply: usize,
        /// The offending token.
        token: String,
    },

    /// A token is valid SAN but not legal in the position reached.
    #[display("Illegal move {:?} at ply {}", token, ply)]
    IllegalMove {
        /// Ply the token would have occupied.
        ply: usize,
        /// The offending token.
        token: String,
    },
}

/// Splits movetext into mainline SAN tokens.
///
/// Check and mate marks are kept; annotation glyphs are removed and digit
/// castling (`0-0`) is rewritten to letter castling.
#[instrument(skip(text), fields(len = text.len()))]
pub fn san_tokens(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars();
    let mut variation_depth = 0usize;

    while let Some(c) = chars.next() {
        match c {
            '{' => {
                flush(&mut current, &mut tokens, variation_depth);
                for inner in chars.by_ref() {
                    if inner == '}' {
                        break;
                    }
                }
            }
            ';' => {
                flush(&mut current, &mut tokens, variation_depth);
                for inner in chars.by_ref() {
                    if inner == '\n' {
                        break;
                    }
                }
            }
            '[' => {
                flush(&mut current, &mut tokens, variation_depth);
                for inner in chars.by_ref() {
                    if inner == ']' {
                        break;
                    }
                }
            }
            '(' => {
                flush(&mut current, &mut tokens, variation_depth);
                variation_depth += 1;
            }
            ')' => {
                flush(&mut current, &mut tokens, variation_depth);
                variation_depth = variation_depth.saturating_sub(1);
            }
            c if c.is_whitespace() => flush(&mut current, &mut tokens, variation_depth),
            c => current.push(c),
        }
    }
    flush(&mut current, &mut tokens, variation_depth);

    debug!(count = tokens.len(), "Movetext tokenized");
    tokens
}

fn flush(current: &mut String, tokens: &mut Vec<String>, variation_depth: usize) {
    if current.is_empty() {
        return;
    }
    let raw = std::mem::take(current);
    if variation_depth > 0 {
        return;
    }
    if let Some(token) = clean_token(&raw) {
        tokens.push(token);
    }
}

/// Strips move numbers and glyphs; returns `None` for non-move tokens.
fn clean_token(raw: &str) -> Option<String> {
    if RESULT_TOKENS.contains(&raw) || raw.starts_with('$') {
        return None;
    }

    // "12." / "12..." / "12.e4"
    let without_number = raw.trim_start_matches(|c: char| c.is_ascii_digit());
    let body = if without_number.len() < raw.len() && without_number.starts_with('.') {
        without_number.trim_start_matches('.')
    } else {
        raw
    };

    let body = body.trim_end_matches(['!', '?']);
    if body.is_empty() || RESULT_TOKENS.contains(&body) {
        return None;
    }

    let body = if body.starts_with("0-0") {
        body.replace('0', "O")
    } else {
        body.to_string()
    };
    Some(body)
}

/// Parses movetext into historical moves, validating each against the rules.
///
/// # Errors
///
/// Returns [`TranscriptError::Empty`] when there are no moves, or the first
/// token that cannot be read or played.
#[instrument(skip(text), fields(len = text.len()))]
pub fn parse_movetext(text: &str) -> Result<Vec<HistoricalMove>, TranscriptError> {
    let tokens = san_tokens(text);
    if tokens.is_empty() {
        warn!("Transcript has no moves");
        return Err(TranscriptError::Empty);
    }

    let mut position = Chess::default();
    let mut moves = Vec::with_capacity(tokens.len());

    for (ply, token) in tokens.into_iter().enumerate() {
        let san: SanPlus = match token.parse() {
            Ok(san) => san,
            Err(_) => {
                warn!(ply, token = %token, "Unreadable SAN");
                return Err(TranscriptError::UnknownToken { ply, token });
            }
        };

        let m = match san.san.to_move(&position) {
            Ok(m) => m,
            Err(_) => {
                warn!(ply, token = %token, "SAN not legal in position");
                return Err(TranscriptError::IllegalMove { ply, token });
            }
        };

        let Some(request) = request_from_move(&m) else {
            return Err(TranscriptError::IllegalMove { ply, token });
        };

        let mover = Side::from(position.turn());
        moves.push(
            HistoricalMove::new(
                ply,
                mover,
                request.origin,
                request.destination,
                request.promotion,
            )
            .with_notation(token.clone()),
        );

        position = match position.play(&m) {
            Ok(next) => next,
            Err(_) => return Err(TranscriptError::IllegalMove { ply, token }),
        };
    }

    debug!(plies = moves.len(), "Transcript parsed");
    Ok(moves)
}
