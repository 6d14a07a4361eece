//! "Show me" reveal of the move history expected.
//!
//! After a rejected attempt the player can ask to see the right move. The
//! reveal sweeps the files from `a` up to the destination file, then the
//! ranks from `1` up to the destination rank along that file, then shows
//! the move label over the destination square. The runner is restarted
//! afterwards by the caller.

use super::oracle::RulesOracle;
use super::runner::LevelRunner;
use super::types::{Coord, HistoricalMove};
use std::time::Duration;
use tracing::{debug, instrument};

/// How long each file or rank stays lit.
pub const FLASH: Duration = Duration::from_millis(260);
/// Dark pause between two flashes.
pub const GAP: Duration = Duration::from_millis(90);
/// Pause after the sweep, before the label appears.
pub const HOLD: Duration = Duration::from_millis(200);
/// How long the move label stays up.
pub const LABEL: Duration = Duration::from_millis(1300);

/// One step of the reveal animation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealFrame {
    /// A whole file is lit, its letter drawn on the destination rank.
    File {
        /// File letter.
        file: char,
        /// Zero-based file index.
        column: u32,
        /// Rank index the letter is drawn on.
        row: u32,
    },
    /// A whole rank is lit, its digit drawn on the destination file.
    Rank {
        /// Rank digit.
        rank: char,
        /// File index the digit is drawn on.
        column: u32,
        /// Zero-based rank index.
        row: u32,
    },
    /// Nothing lit.
    Gap,
    /// Sweep finished, file and rank marks held.
    Hold,
    /// The move label over the destination square.
    Label {
        /// Label text, e.g. `Nf6`.
        text: String,
        /// Destination file index.
        column: u32,
        /// Destination rank index.
        row: u32,
    },
}

impl RevealFrame {
    /// How long the frame is shown.
    pub fn duration(&self) -> Duration {
        match self {
            RevealFrame::File { .. } | RevealFrame::Rank { .. } => FLASH,
            RevealFrame::Gap => GAP,
            RevealFrame::Hold => HOLD,
            RevealFrame::Label { .. } => LABEL,
        }
    }
}

/// Everything needed to show the expected move.
#[derive(Debug, Clone, PartialEq)]
pub struct RevealPlan<P> {
    expected: HistoricalMove,
    position_after: Option<P>,
    frames: Vec<RevealFrame>,
}

impl<P> RevealPlan<P> {
    /// Builds the reveal for the runner's expected move.
    ///
    /// Returns `None` when the level is finished.
    #[instrument(skip(runner), fields(cursor = runner.cursor()))]
    pub fn for_runner<O>(runner: &LevelRunner<O>) -> Option<Self>
    where
        O: RulesOracle<Position = P>,
    {
        let expected = runner.expected_move()?.clone();
        let position_after = runner.preview_expected();
        let frames = sweep(*expected.destination(), expected.label());
        debug!(frames = frames.len(), expected = %expected, "Reveal planned");
        Some(Self {
            expected,
            position_after,
            frames,
        })
    }

    /// The move being revealed.
    pub fn expected(&self) -> &HistoricalMove {
        &self.expected
    }

    /// Squares to highlight: origin then destination.
    pub fn highlight(&self) -> (Coord, Coord) {
        (*self.expected.origin(), *self.expected.destination())
    }

    /// Position with the expected move played, when the oracle accepts it.
    pub fn position_after(&self) -> Option<&P> {
        self.position_after.as_ref()
    }

    /// Animation frames in order.
    pub fn frames(&self) -> &[RevealFrame] {
        &self.frames
    }

    /// Total animation time.
    pub fn total_duration(&self) -> Duration {
        self.frames.iter().map(RevealFrame::duration).sum()
    }

    /// Closing message.
    pub fn message(&self) -> String {
        format!("The right move was {}!", self.expected.label())
    }
}

fn sweep(destination: Coord, label: String) -> Vec<RevealFrame> {
    let target_file = destination.file_index();
    let target_rank = destination.rank_index();
    let mut frames = Vec::new();

    for column in 0..=target_file {
        frames.push(RevealFrame::File {
            file: char::from(b'a' + column as u8),
            column,
            row: target_rank,
        });
        if column < target_file {
            frames.push(RevealFrame::Gap);
        }
    }

    for row in 0..=target_rank {
        frames.push(RevealFrame::Rank {
            rank: char::from(b'1' + row as u8),
            column: target_file,
            row,
        });
        if row < target_rank {
            frames.push(RevealFrame::Gap);
        }
    }

    frames.push(RevealFrame::Hold);
    frames.push(RevealFrame::Label {
        text: label,
        column: target_file,
        row: target_rank,
    });
    frames
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Coord {
        s.parse().expect("valid square")
    }

    #[test]
    fn test_sweep_to_a1_is_minimal() {
        let frames = sweep(sq("a1"), "Ra1".to_string());
        assert_eq!(frames.len(), 4);
        assert_eq!(frames[0], RevealFrame::File { file: 'a', column: 0, row: 0 });
        assert_eq!(frames[1], RevealFrame::Rank { rank: '1', column: 0, row: 0 });
        assert_eq!(frames[2], RevealFrame::Hold);
    }

    #[test]
    fn test_sweep_to_c3_counts_gaps() {
        let frames = sweep(sq("c3"), "Nc3".to_string());
        let files = frames.iter().filter(|f| matches!(f, RevealFrame::File { .. })).count();
        let ranks = frames.iter().filter(|f| matches!(f, RevealFrame::Rank { .. })).count();
        let gaps = frames.iter().filter(|f| **f == RevealFrame::Gap).count();
        assert_eq!((files, ranks, gaps), (3, 3, 4));
        let last = frames.last().expect("label");
        assert_eq!(
            *last,
            RevealFrame::Label {
                text: "Nc3".to_string(),
                column: 2,
                row: 2
            }
        );
    }

    #[test]
    fn test_frame_durations() {
        let total: Duration = sweep(sq("b2"), "b2".to_string())
            .iter()
            .map(RevealFrame::duration)
            .sum();
        // 2 files + 2 ranks, 2 gaps, hold, label
        assert_eq!(total, FLASH * 4 + GAP * 2 + HOLD + LABEL);
    }
}
