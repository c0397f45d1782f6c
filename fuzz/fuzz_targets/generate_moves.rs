#![no_main]
use itertools::Itertools;
use libfuzzer_sys::fuzz_target;
use shakmaty::{CastlingMode, Chess, Position as ShakmatyPosition};
use zugzwang_core::chess::core::{CastleSide, MoveList, Square};
use zugzwang_core::chess::position::Position;

fuzz_target!(|data: &[u8]| {
    let input = match std::str::from_utf8(data) {
        Ok(input) => input,
        Err(_) => return,
    };
    let position = match Position::from_fen(input) {
        Ok(position) => position,
        Err(_) => return,
    };
    let shakmaty_setup: shakmaty::fen::Fen = input
        .parse()
        .expect("when we parsed a valid position it should be accepted by shakmaty");
    let shakmaty_position: Result<Chess, _> = shakmaty_setup.into_position(CastlingMode::Standard);
    let Ok(shakmaty_position) = shakmaty_position else {
        return;
    };

    let mover = position.us();
    let mut candidates = MoveList::new();
    position.pseudo_legal_moves(&mut candidates);
    let legal: Vec<String> = candidates
        .into_iter()
        .filter_map(|candidate| {
            let mut next = position.clone();
            if !next.make_move(candidate) || next.is_checked(mover) {
                return None;
            }
            Some(candidate)
        })
        .map(|mv| {
            if mv.is_castle() {
                let home = mv.start().rank();
                let king_dest_file = if mv.castle_side() == Some(CastleSide::KingSide) {
                    6
                } else {
                    2
                };
                format!("{}{}", mv.start(), Square::new(king_dest_file, home))
            } else {
                mv.to_string()
            }
        })
        .sorted()
        .collect();

    let expected: Vec<String> = shakmaty_position
        .legal_moves()
        .iter()
        .map(|m| m.to_uci(CastlingMode::Standard).to_string())
        .sorted()
        .collect();

    assert_eq!(legal, expected, "fen: {input}");
});
