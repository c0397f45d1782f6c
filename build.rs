//! Generates the Zobrist key table consumed by `src/chess/zobrist.rs`.
//!
//! The keys are drawn from a PRNG seeded with a fixed constant, not
//! `rand::thread_rng()`: two processes built from the same source must
//! compute the same hash for the same position, so the seed has to be
//! reproducible across builds and machines.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Arbitrary but fixed; changing it changes every hash this crate has ever
/// produced, so it is not meant to be rotated casually.
const ZOBRIST_SEED: u64 = 0x9E37_79B9_7F4A_7C15;

fn array64(rng: &mut StdRng) -> [u64; 64] {
    std::array::from_fn(|_| rng.gen())
}

fn main() {
    let mut rng = StdRng::seed_from_u64(ZOBRIST_SEED);

    // Indexed [army][piece kind][square], army 0 = White, 1 = Black, piece
    // kind order matches `chess::core::PieceKind`'s discriminants
    // (Pawn, Knight, Bishop, Rook, Queen, King).
    let piece_square_keys: [[[u64; 64]; 6]; 2] =
        std::array::from_fn(|_| std::array::from_fn(|_| array64(&mut rng)));
    let castle_keys: [u64; 4] = array64(&mut rng)[..4].try_into().unwrap();
    let en_passant_file_keys: [u64; 8] = array64(&mut rng)[..8].try_into().unwrap();
    let side_to_move_key: u64 = rng.gen();

    let contents = format!(
        "pub(crate) const PIECE_SQUARE_KEYS: [[[u64; 64]; 6]; 2] = {piece_square_keys:?};\n\
         pub(crate) const CASTLE_KEYS: [u64; 4] = {castle_keys:?};\n\
         pub(crate) const EN_PASSANT_FILE_KEYS: [u64; 8] = {en_passant_file_keys:?};\n\
         pub(crate) const SIDE_TO_MOVE_KEY: u64 = {side_to_move_key};\n"
    );

    let out_dir = std::env::var_os("OUT_DIR").unwrap();
    let dest_path = std::path::Path::new(&out_dir).join("zobrist_keys.rs");
    std::fs::write(dest_path, contents).unwrap();
}
