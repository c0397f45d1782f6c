#![no_main]
use libfuzzer_sys::fuzz_target;
use zugzwang_core::chess::position::Position;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(position) = Position::from_fen(input) {
            // A position we parsed must round-trip back to a FEN that
            // re-parses to a structurally identical position.
            let refen = position.to_fen(true);
            let reparsed = Position::from_fen(&refen).expect("our own FEN output re-parses");
            assert!(position.is_same_position(&reparsed));
        }
    }
});
