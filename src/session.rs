//! Terminal play session for a single level.
//!
//! Reads commands line by line, drives a [`LevelRunner`], and writes the
//! board and feedback as plain text. Generic over the reader and writer so
//! tests can script a whole game.

use anyhow::Result;
use chess_worlds_core::{
    ChessPosition, Coord, LevelRunner, MoveOutcome, PromotionPiece, RevealPlan, RunClock,
    ScoreCard, ShakmatyOracle, TimeBudget,
};
use std::io::{BufRead, Write};
use tracing::{debug, info, instrument};

/// One line of player input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Attempt a move.
    Move {
        /// Square moved from.
        origin: Coord,
        /// Square moved to.
        destination: Coord,
        /// Promotion piece, if typed.
        promotion: Option<PromotionPiece>,
    },
    /// Show where the expected move goes.
    Hint,
    /// Reveal the expected move and restart.
    Show,
    /// Start the level over.
    Restart,
    /// List legal destinations from a square.
    Moves(Coord),
    /// Print the board again.
    Board,
    /// Print the command list.
    Help,
    /// Leave the session.
    Quit,
}

impl SessionCommand {
    /// Parses a line; `None` if it is not a command.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim().to_lowercase();
        let mut words = line.split_whitespace();
        let first = words.next()?;

        let command = match first {
            "quit" | "exit" | "q" => SessionCommand::Quit,
            "hint" => SessionCommand::Hint,
            "show" => SessionCommand::Show,
            "restart" | "reset" => SessionCommand::Restart,
            "board" => SessionCommand::Board,
            "help" | "?" => SessionCommand::Help,
            "moves" => SessionCommand::Moves(words.next()?.parse().ok()?),
            _ => {
                let compact: String = line.chars().filter(|c| !c.is_whitespace()).collect();
                return parse_move(&compact);
            }
        };
        words.next().is_none().then_some(command)
    }
}

fn parse_move(text: &str) -> Option<SessionCommand> {
    if !text.is_ascii() || !(4..=5).contains(&text.len()) {
        return None;
    }
    let origin = text[0..2].parse().ok()?;
    let destination = text[2..4].parse().ok()?;
    let promotion = match text.get(4..) {
        Some("") | None => None,
        Some(piece) => Some(piece.parse().ok()?),
    };
    Some(SessionCommand::Move {
        origin,
        destination,
        promotion,
    })
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    /// The player finished the level.
    Completed(ScoreCard),
    /// The player quit or input ended.
    Abandoned,
}

const HELP: &str = "Commands: e2e4 | e2 e4 | e7e8q | hint | show | restart | moves e2 | board | quit";

/// Interactive text session around one level.
pub struct PlaySession<R, W> {
    title: String,
    runner: LevelRunner<ShakmatyOracle>,
    budget: TimeBudget,
    clock: RunClock,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PlaySession<R, W> {
    /// Creates a session.
    pub fn new(
        title: impl Into<String>,
        runner: LevelRunner<ShakmatyOracle>,
        budget: TimeBudget,
        input: R,
        output: W,
    ) -> Self {
        Self {
            title: title.into(),
            runner,
            budget,
            clock: RunClock::default(),
            input,
            output,
        }
    }

    /// The runner, for inspection after a session.
    pub fn runner(&self) -> &LevelRunner<ShakmatyOracle> {
        &self.runner
    }

    /// Consumes the session and returns the writer.
    pub fn into_output(self) -> W {
        self.output
    }

    /// Runs until the level is complete, the player quits, or input ends.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or writing fails.
    #[instrument(skip(self), fields(title = %self.title, side = %self.runner.player_side()))]
    pub fn run(&mut self) -> Result<SessionOutcome> {
        writeln!(
            self.output,
            "{}\nYou play {}. {} moves, {}s allowed.\n{}",
            self.title,
            self.runner.player_side(),
            self.runner.player_move_count(),
            self.budget.limit().as_secs(),
            HELP
        )?;

        if self.runner.is_complete() {
            writeln!(self.output, "This level has no moves to play.")?;
            return Ok(SessionOutcome::Abandoned);
        }
        self.print_board()?;

        let mut line = String::new();
        loop {
            write!(self.output, "> ")?;
            self.output.flush()?;

            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                debug!("Input closed");
                return Ok(SessionOutcome::Abandoned);
            }
            if line.trim().is_empty() {
                continue;
            }

            let Some(command) = SessionCommand::parse(&line) else {
                writeln!(self.output, "Unrecognised input {:?}. {}", line.trim(), HELP)?;
                continue;
            };
            debug!(?command, "Command");

            match command {
                SessionCommand::Quit => return Ok(SessionOutcome::Abandoned),
                SessionCommand::Help => writeln!(self.output, "{}", HELP)?,
                SessionCommand::Board => self.print_board()?,
                SessionCommand::Restart => self.restart("Restarted.")?,
                SessionCommand::Hint => match self.runner.hint() {
                    Some((origin, destination)) => {
                        writeln!(self.output, "Hint: move from {} to {}.", origin, destination)?
                    }
                    None => writeln!(self.output, "No hint available.")?,
                },
                SessionCommand::Show => self.show()?,
                SessionCommand::Moves(origin) => {
                    let targets = self.runner.legal_destinations(origin);
                    if targets.is_empty() {
                        writeln!(self.output, "No legal moves from {}.", origin)?;
                    } else {
                        let list: Vec<String> = targets.iter().map(Coord::to_string).collect();
                        writeln!(self.output, "{}: {}", origin, list.join(" "))?;
                    }
                }
                SessionCommand::Move {
                    origin,
                    destination,
                    promotion,
                } => {
                    if let Some(card) = self.play(origin, destination, promotion)? {
                        return Ok(SessionOutcome::Completed(card));
                    }
                }
            }
        }
    }

    fn play(
        &mut self,
        origin: Coord,
        destination: Coord,
        promotion: Option<PromotionPiece>,
    ) -> Result<Option<ScoreCard>> {
        self.clock.start_if_idle();

        match self.runner.attempt_move(origin, destination, promotion) {
            MoveOutcome::Accepted {
                position,
                sequence_complete,
                auto_reply,
            } => {
                writeln!(self.output, "Correct!")?;
                if let Some(reply) = auto_reply {
                    writeln!(self.output, "Opponent plays {}.", reply.label())?;
                }
                self.write_position(&position)?;
                if sequence_complete {
                    let card = self.budget.card(self.clock.stop());
                    info!(score = *card.score(), "Level complete");
                    writeln!(self.output, "Level complete! {}", card)?;
                    return Ok(Some(card));
                }
            }
            MoveOutcome::SequenceComplete => {
                writeln!(self.output, "The level is already complete.")?;
            }
            MoveOutcome::IllegalTurn { .. } => {
                writeln!(self.output, "It is not your turn.")?;
            }
            MoveOutcome::IllegalMove { .. } => {
                writeln!(self.output, "That move is illegal.")?;
            }
            MoveOutcome::WrongMove { .. } => {
                writeln!(
                    self.output,
                    "Legal, but not what was played. The clock is still running; try again, or type 'show'."
                )?;
            }
        }
        Ok(None)
    }

    fn show(&mut self) -> Result<()> {
        match RevealPlan::for_runner(&self.runner) {
            Some(plan) => {
                let (origin, destination) = plan.highlight();
                writeln!(self.output, "{} ({} to {})", plan.message(), origin, destination)?;
                if let Some(after) = plan.position_after() {
                    self.write_position(after)?;
                }
                self.restart("Starting over.")
            }
            None => {
                writeln!(self.output, "Nothing to show.")?;
                Ok(())
            }
        }
    }

    fn restart(&mut self, note: &str) -> Result<()> {
        self.runner.reset();
        self.clock.stop();
        writeln!(self.output, "{}", note)?;
        self.print_board()
    }

    fn print_board(&mut self) -> Result<()> {
        let position = self.runner.position().clone();
        self.write_position(&position)
    }

    fn write_position(&mut self, position: &ChessPosition) -> Result<()> {
        write!(self.output, "{}", position.render(self.runner.player_side()))?;
        if position.is_checkmate() {
            writeln!(self.output, "Checkmate.")?;
        } else if position.is_check() {
            writeln!(self.output, "Check.")?;
        }
        Ok(())
    }
}
