//! FEN/X-FEN round-trip tests across a representative spread of positions:
//! standard chess, Chess960, mid-game, and endgame.

use pretty_assertions::assert_eq;
use zugzwang_core::chess::options;
use zugzwang_core::chess::position::Position;

fn check(fen: &str) {
    let position =
        Position::try_from(fen).unwrap_or_else(|_| panic!("parsing legal position: {fen}"));
    assert_eq!(position.to_fen(true), fen);
}

#[test]
fn starting_position() {
    check("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
}

#[test]
fn midgame_positions() {
    check("2r3r1/p3k3/1p3pp1/1B5p/5P2/2P1p1P1/PP4KP/3R4 w - - 0 34");
    check("rnbqk1nr/p3bppp/1p2p3/2ppP3/3P4/P7/1PP1NPPP/R1BQKBNR w KQkq c6 0 7");
    check("r2qkb1r/1pp1pp1p/p1np1np1/1B6/3PP1b1/2N1BN2/PPP2PPP/R2QK2R w KQkq - 0 7");
    check("r1b1qrk1/ppp2pbp/n2p1np1/4p1B1/2PPP3/2NB1N1P/PP3PP1/R2QK2R w KQ e6 0 9");
}

#[test]
fn endgame_positions() {
    check("r3k3/5p2/2p5/p7/P3r3/2N2n2/1PP2P2/2K2B2 w q - 0 24");
    check("8/8/8/8/2P5/3k4/8/KB6 b - c3 0 1");
}

#[test]
fn no_castling_rights() {
    check("4k3/8/8/8/8/8/8/4K3 w - - 5 10");
}

#[test]
fn chess960_shredder_fen() {
    options::set_chess960(true);
    // Black's only right is king-side, and the h8 rook is the outermost
    // rook on that side, so this round-trips as `k`, not a file letter.
    check("bq4kr/p3bpp1/3ppn1p/1P1n3P/P2P4/2N4R/1P3PP1/B1Q1NBK1 b k - 0 13");
    options::set_chess960(false);
}

#[test]
fn chess960_non_outermost_rook_uses_file_letter() {
    options::set_chess960(true);
    // White has two queen-side rooks (b1, d1); the right refers to d1, which
    // is not the outermost one (b1 is), so the minimal-form rule must emit
    // its file letter `D`, not `Q`.
    check("4k3/8/8/8/8/8/8/1R1RK3 w D - 0 1");
    options::set_chess960(false);
}

#[test]
fn four_field_fen_defaults_clocks() {
    let position = Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -")
        .expect("four-field FEN is accepted");
    assert_eq!(
        position.to_fen(true),
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
    );
}

#[test]
fn rejects_wrong_rank_count() {
    assert!(Position::from_fen("8/8/8/8/8/8/8 w - - 0 1").is_err());
}

#[test]
fn rejects_missing_king() {
    assert!(Position::from_fen("8/8/8/8/8/8/8/4k3 w - - 0 1").is_err());
}

#[test]
fn rejects_duplicate_kings() {
    assert!(Position::from_fen("8/8/8/8/8/8/4K3/3KK3 w - - 0 1").is_err());
}

#[test]
fn rejects_en_passant_on_wrong_rank() {
    assert!(
        Position::from_fen("rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e3 0 1")
            .is_err()
    );
}

#[test]
fn rejects_en_passant_without_adjacent_pawn() {
    assert!(Position::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq d3 0 1")
        .is_err());
}

#[test]
fn trims_whitespace_and_strips_prefix() {
    assert!(Position::try_from(
        "  fen rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1\n"
    )
    .is_ok());
    assert!(Position::try_from(
        "epd rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -"
    )
    .is_ok());
}
