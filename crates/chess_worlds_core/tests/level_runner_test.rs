//! Behavioural tests for the level runner against real chess rules.

use chess_worlds_core::{
    Coord, HistoricalMove, InvariantSet, LevelDefinition, LevelRunner, MoveOutcome,
    PromotionPiece, RevealFrame, RevealPlan, RulesOracle, RunnerInvariants, RunnerPhase,
    ShakmatyOracle, Side,
};

const IMMORTAL_GAME: &str = "
1.e4 e5 2.f4 exf4 3.Bc4 Qh4+ 4.Kf1 b5 5.Bxb5 Nf6
6.Nf3 Qh6 7.d3 Nh5 8.Nh4 Qg5 9.Nf5 c6 10.g4 Nf6
11.Rg1 cxb5 12.h4 Qg6 13.h5 Qg5 14.Qf3 Ng8 15.Bxf4
Qf6 16.Nc3 Bc5 17.Nd5 Qxb2 18.Bd6 Qxa1+ 19.Ke2 Bxg1
20.e5 Na6 21.Nxg7+ Kd8 22.Qf6+ Nxf6 23.Be7+ 1-0
";

const PROMOTION_RACE: &str = "1.a4 h5 2.a5 h4 3.a6 h3 4.axb7 hxg2 5.bxa8=Q gxh1=Q";

fn sq(s: &str) -> Coord {
    s.parse().expect("valid square")
}

fn ply(index: usize, mover: Side, from: &str, to: &str) -> HistoricalMove {
    HistoricalMove::new(index, mover, sq(from), sq(to), None)
}

fn runner_for(moves: Vec<HistoricalMove>, side: Side) -> LevelRunner {
    LevelRunner::new(ShakmatyOracle::new(), LevelDefinition::new(moves, side))
}

fn runner_from_transcript(transcript: &str, side: Side) -> LevelRunner {
    let oracle = ShakmatyOracle::new();
    let definition =
        LevelDefinition::from_transcript(&oracle, transcript, side).expect("valid transcript");
    LevelRunner::new(oracle, definition)
}

/// Plays every player ply in order, returning the position after each.
fn play_through(runner: &mut LevelRunner) -> Vec<chess_worlds_core::ChessPosition> {
    let mut positions = Vec::new();
    while let Some(expected) = runner.expected_move().cloned() {
        let outcome =
            runner.attempt_move(*expected.origin(), *expected.destination(), *expected.promotion());
        assert!(outcome.is_accepted(), "ply {} rejected: {:?}", expected.ply(), outcome);
        positions.push(runner.position().clone());
    }
    positions
}

fn knight_opening() -> Vec<HistoricalMove> {
    vec![
        ply(0, Side::White, "g1", "f3"),
        ply(1, Side::Black, "g8", "f6"),
        ply(2, Side::White, "d2", "d4"),
    ]
}

// ─────────────────────────────────────────────────────────────
//  Scenarios
// ─────────────────────────────────────────────────────────────

#[test]
fn test_second_player_level_fast_forwards() {
    let runner = runner_for(
        vec![ply(0, Side::White, "e2", "e4"), ply(1, Side::Black, "e7", "e5")],
        Side::Black,
    );

    assert_eq!(runner.cursor(), 1);
    assert_eq!(runner.phase(), RunnerPhase::AwaitingPlayerMove);
    assert_eq!(runner.position().piece_at(sq("e4")), Some((Side::White, 'P')));
    assert_eq!(runner.position().piece_at(sq("e2")), None);

    let expected = runner.expected_move().expect("black to move");
    assert_eq!(*expected.ply(), 1);
    assert_eq!(*expected.origin(), sq("e7"));
    assert_eq!(*expected.destination(), sq("e5"));
}

#[test]
fn test_correct_move_triggers_auto_reply() {
    let mut runner = runner_for(knight_opening(), Side::White);

    let outcome = runner.attempt_move(sq("g1"), sq("f3"), None);
    match outcome {
        MoveOutcome::Accepted {
            sequence_complete,
            auto_reply,
            ..
        } => {
            assert!(!sequence_complete);
            let reply = auto_reply.expect("black replies");
            assert_eq!(*reply.destination(), sq("f6"));
        }
        other => panic!("expected acceptance, got {:?}", other),
    }

    assert_eq!(runner.cursor(), 2);
    assert_eq!(runner.position().piece_at(sq("f3")), Some((Side::White, 'N')));
    assert_eq!(runner.position().piece_at(sq("f6")), Some((Side::Black, 'n')));
    assert_eq!(runner.position().turn(), Side::White);
}

#[test]
fn test_wrong_move_preserves_state() {
    let mut runner = runner_for(knight_opening(), Side::White);
    let before = runner.position().clone();

    let outcome = runner.attempt_move(sq("g1"), sq("h3"), None);

    assert!(matches!(outcome, MoveOutcome::WrongMove { .. }));
    assert_eq!(outcome.expected().map(|m| *m.destination()), Some(sq("f3")));
    assert_eq!(runner.cursor(), 0);
    assert_eq!(runner.position(), &before);
    assert_eq!(runner.position(), &ShakmatyOracle::new().starting_position());
    assert!(runner.failed());
}

#[test]
fn test_illegal_move_preserves_state() {
    let mut runner = runner_for(knight_opening(), Side::White);
    let before = runner.position().clone();

    let outcome = runner.attempt_move(sq("g1"), sq("g3"), None);

    assert!(matches!(outcome, MoveOutcome::IllegalMove { .. }));
    assert_eq!(runner.cursor(), 0);
    assert_eq!(runner.position(), &before);
    assert!(runner.failed());
}

#[test]
fn test_completion_on_last_move() {
    let mut runner = runner_for(
        vec![ply(0, Side::White, "e2", "e4"), ply(1, Side::Black, "e7", "e5")],
        Side::Black,
    );

    let outcome = runner.attempt_move(sq("e7"), sq("e5"), None);

    assert!(outcome.is_sequence_complete());
    assert!(matches!(
        outcome,
        MoveOutcome::Accepted {
            sequence_complete: true,
            auto_reply: None,
            ..
        }
    ));
    assert!(runner.is_complete());
    assert_eq!(runner.expected_move(), None);
}

#[test]
fn test_attempt_after_completion_is_a_no_op() {
    let mut runner = runner_for(vec![ply(0, Side::White, "e2", "e4")], Side::White);
    runner.attempt_move(sq("e2"), sq("e4"), None);
    let position = runner.position().clone();

    let outcome = runner.attempt_move(sq("e7"), sq("e5"), None);

    assert_eq!(outcome, MoveOutcome::SequenceComplete);
    assert_eq!(runner.position(), &position);
    assert!(!runner.failed());
}

#[test]
fn test_empty_sequence_is_immediately_complete() {
    let mut runner = runner_for(Vec::new(), Side::White);
    assert!(runner.is_complete());
    assert_eq!(runner.cursor(), 0);
    assert_eq!(runner.player_move_count(), 0);
    assert_eq!(runner.attempt_move(sq("e2"), sq("e4"), None), MoveOutcome::SequenceComplete);
}

#[test]
fn test_corrupt_history_sets_failed_during_fast_forward() {
    // e2-e5 is not a legal first move.
    let mut runner = runner_for(
        vec![ply(0, Side::White, "e2", "e5"), ply(1, Side::Black, "e7", "e6")],
        Side::Black,
    );
    assert!(runner.failed());
    assert_eq!(runner.cursor(), 0);

    let outcome = runner.attempt_move(sq("e7"), sq("e6"), None);
    assert!(matches!(outcome, MoveOutcome::IllegalTurn { .. }));
    assert_eq!(runner.cursor(), 0);
}

#[test]
fn test_non_alternating_history_reports_illegal_turn() {
    let mut runner = runner_for(
        vec![
            ply(0, Side::White, "e2", "e4"),
            ply(1, Side::Black, "e7", "e5"),
            ply(2, Side::Black, "d7", "d5"),
        ],
        Side::White,
    );
    let outcome = runner.attempt_move(sq("e2"), sq("e4"), None);
    assert!(outcome.is_accepted());
    // The reply consumed ply 1; ply 2 belongs to black again.
    assert_eq!(runner.cursor(), 2);

    let outcome = runner.attempt_move(sq("d2"), sq("d4"), None);
    assert!(matches!(outcome, MoveOutcome::IllegalTurn { .. }));
    assert!(runner.failed());
}

// ─────────────────────────────────────────────────────────────
//  Properties
// ─────────────────────────────────────────────────────────────

#[test]
fn test_replay_is_deterministic() {
    let mut first = runner_from_transcript(IMMORTAL_GAME, Side::White);
    let mut second = runner_from_transcript(IMMORTAL_GAME, Side::White);
    assert_eq!(play_through(&mut first), play_through(&mut second));
}

#[test]
fn test_completion_happens_exactly_at_the_end() {
    let mut runner = runner_from_transcript(IMMORTAL_GAME, Side::Black);
    let total = runner.definition().len();
    assert_eq!(total, 45);
    assert_eq!(runner.player_move_count(), 22);

    while let Some(expected) = runner.expected_move().cloned() {
        let outcome = runner.attempt_move(*expected.origin(), *expected.destination(), None);
        assert_eq!(outcome.is_sequence_complete(), runner.cursor() == total);
    }
    assert!(runner.is_complete());
    assert!(!runner.failed());
    assert!(runner.position().is_check());
}

#[test]
fn test_auto_reply_advances_by_two() {
    let mut runner = runner_from_transcript(IMMORTAL_GAME, Side::White);
    let total = runner.definition().len();

    while let Some(expected) = runner.expected_move().cloned() {
        let before = runner.cursor();
        let outcome = runner.attempt_move(*expected.origin(), *expected.destination(), None);
        let MoveOutcome::Accepted { auto_reply, .. } = outcome else {
            panic!("ply {} rejected", before);
        };
        let advanced = runner.cursor() - before;
        if before + 1 < total {
            assert_eq!(advanced, 2);
            assert!(auto_reply.is_some());
        } else {
            assert_eq!(advanced, 1);
            assert!(auto_reply.is_none());
        }
    }
}

#[test]
fn test_rejections_never_move_the_position() {
    let mut runner = runner_from_transcript(IMMORTAL_GAME, Side::White);
    for _ in 0..5 {
        let expected = runner.expected_move().cloned().expect("moves left");
        let before = runner.position().clone();
        let cursor = runner.cursor();

        // Moving the piece back onto its own square is never legal.
        let illegal = runner.attempt_move(*expected.origin(), *expected.origin(), None);
        assert!(!illegal.is_accepted());
        assert_eq!(runner.position(), &before);
        assert_eq!(runner.cursor(), cursor);

        runner.attempt_move(*expected.origin(), *expected.destination(), None);
    }
}

#[test]
fn test_reset_matches_fresh_runner() {
    let mut played = runner_from_transcript(IMMORTAL_GAME, Side::Black);
    let mut fresh = runner_from_transcript(IMMORTAL_GAME, Side::Black);

    for _ in 0..4 {
        let expected = played.expected_move().cloned().expect("moves left");
        played.attempt_move(*expected.origin(), *expected.destination(), None);
    }
    played.attempt_move(sq("a7"), sq("a8"), None);
    assert!(played.failed());

    played.reset();
    assert!(!played.failed());
    assert_eq!(played.cursor(), fresh.cursor());
    assert_eq!(played.position(), fresh.position());
    assert_eq!(played.player_move_count(), fresh.player_move_count());

    assert_eq!(play_through(&mut played), play_through(&mut fresh));
    assert_eq!(played.cursor(), fresh.cursor());
}

#[test]
fn test_invariants_hold_through_a_full_game() {
    let mut runner = runner_from_transcript(IMMORTAL_GAME, Side::White);
    assert!(RunnerInvariants::check_all(&runner).is_ok());
    while let Some(expected) = runner.expected_move().cloned() {
        runner.attempt_move(*expected.origin(), *expected.destination(), None);
        assert!(RunnerInvariants::check_all(&runner).is_ok());
    }
}

// ─────────────────────────────────────────────────────────────
//  Promotion and castling
// ─────────────────────────────────────────────────────────────

#[test]
fn test_promotion_defaults_to_queen() {
    let mut runner = runner_from_transcript(PROMOTION_RACE, Side::White);
    for _ in 0..4 {
        let expected = runner.expected_move().cloned().expect("moves left");
        assert!(runner
            .attempt_move(*expected.origin(), *expected.destination(), None)
            .is_accepted());
    }

    let expected = runner.expected_move().cloned().expect("promotion");
    assert_eq!(*expected.promotion(), Some(PromotionPiece::Queen));

    let outcome = runner.attempt_move(sq("b7"), sq("a8"), None);
    let MoveOutcome::Accepted {
        sequence_complete,
        auto_reply,
        ..
    } = outcome
    else {
        panic!("promotion rejected");
    };
    assert!(sequence_complete);
    assert_eq!(*auto_reply.expect("black promotes").promotion(), Some(PromotionPiece::Queen));
    assert_eq!(runner.position().piece_at(sq("a8")), Some((Side::White, 'Q')));
    assert_eq!(runner.position().piece_at(sq("h1")), Some((Side::Black, 'q')));
}

#[test]
fn test_underpromotion_is_a_wrong_move() {
    let mut runner = runner_from_transcript(PROMOTION_RACE, Side::Black);
    for _ in 0..4 {
        let expected = runner.expected_move().cloned().expect("moves left");
        runner.attempt_move(*expected.origin(), *expected.destination(), None);
    }
    let before = runner.position().clone();

    let outcome = runner.attempt_move(sq("g2"), sq("h1"), Some(PromotionPiece::Knight));
    assert!(matches!(outcome, MoveOutcome::WrongMove { .. }));
    assert_eq!(runner.position(), &before);

    let outcome = runner.attempt_move(sq("g2"), sq("h1"), Some(PromotionPiece::Queen));
    assert!(outcome.is_sequence_complete());
}

#[test]
fn test_castling_is_played_as_king_move() {
    let mut runner = runner_from_transcript(
        "1.e4 e5 2.Nf3 Nc6 3.Bc4 Bc5 4.O-O Nf6",
        Side::White,
    );
    for _ in 0..3 {
        let expected = runner.expected_move().cloned().expect("moves left");
        runner.attempt_move(*expected.origin(), *expected.destination(), None);
    }
    let outcome = runner.attempt_move(sq("e1"), sq("g1"), None);
    assert!(outcome.is_sequence_complete());
    assert_eq!(runner.position().piece_at(sq("g1")), Some((Side::White, 'K')));
    assert_eq!(runner.position().piece_at(sq("f1")), Some((Side::White, 'R')));
}

// ─────────────────────────────────────────────────────────────
//  Hints and reveal
// ─────────────────────────────────────────────────────────────

#[test]
fn test_reveal_after_wrong_move() {
    let mut runner = runner_for(knight_opening(), Side::White);
    runner.attempt_move(sq("b1"), sq("c3"), None);

    let plan = RevealPlan::for_runner(&runner).expect("move to reveal");
    assert_eq!(plan.highlight(), (sq("g1"), sq("f3")));
    assert_eq!(plan.message(), "The right move was f3!");
    assert_eq!(
        plan.position_after().and_then(|p| p.piece_at(sq("f3"))),
        Some((Side::White, 'N'))
    );
    // files a..f, ranks 1..3
    let files = plan
        .frames()
        .iter()
        .filter(|f| matches!(f, RevealFrame::File { .. }))
        .count();
    let ranks = plan
        .frames()
        .iter()
        .filter(|f| matches!(f, RevealFrame::Rank { .. }))
        .count();
    assert_eq!((files, ranks), (6, 3));
    assert_eq!(runner.cursor(), 0);
}

#[test]
fn test_reveal_uses_notation_without_check_mark() {
    let mut runner = runner_from_transcript("1.e4 e5 2.Qh5 Nc6 3.Bc4 Nf6 4.Qxf7#", Side::White);
    for _ in 0..3 {
        let expected = runner.expected_move().cloned().expect("moves left");
        runner.attempt_move(*expected.origin(), *expected.destination(), None);
    }
    let plan = RevealPlan::for_runner(&runner).expect("mate to reveal");
    assert_eq!(plan.message(), "The right move was Qxf7!");
}

#[test]
fn test_legal_destinations_follow_the_board() {
    let runner = runner_for(knight_opening(), Side::White);
    let mut targets: Vec<String> = runner
        .legal_destinations(sq("b1"))
        .iter()
        .map(ToString::to_string)
        .collect();
    targets.sort();
    assert_eq!(targets, vec!["a3", "c3"]);
    assert!(runner.legal_destinations(sq("b8")).is_empty());
    assert_eq!(runner.hint(), Some((sq("g1"), sq("f3"))));
}
