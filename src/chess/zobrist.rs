//! [Zobrist hashing]: a process-wide table of pseudo-random 64-bit values,
//! one per (piece kind, color, square), one per castle right, one per
//! en-passant file, and one for side-to-move. A position's hash is the xor
//! of all entries that apply to it.
//!
//! The table is generated at build time from a *fixed* PRNG seed (see
//! `build.rs`), not from system entropy: two processes built from the same
//! source must compute the same hash for the same position, so the keys
//! have to be reproducible across builds and machines, not merely stable
//! within a single run.
//!
//! [Zobrist hashing]: https://www.chessprogramming.org/Zobrist_Hashing

use crate::chess::core::{CastleRights, PieceKind, Player, Square};

/// A Zobrist key is a 64-bit integer.
pub type Key = u64;

include!(concat!(env!("OUT_DIR"), "/zobrist_keys.rs"));

/// The key contributed by `kind` belonging to `army` sitting on `square`.
pub(super) fn piece_key(army: Player, kind: PieceKind, square: Square) -> Key {
    debug_assert!(square.is_valid());
    debug_assert_ne!(kind, PieceKind::Unknown);
    let army_index = match army {
        Player::White => 0,
        Player::Black => 1,
    };
    PIECE_SQUARE_KEYS[army_index][kind.index() as usize][square.index() as usize]
}

const CASTLE_RIGHT_FLAGS: [CastleRights; 4] = [
    CastleRights::WHITE_KING_SIDE,
    CastleRights::WHITE_QUEEN_SIDE,
    CastleRights::BLACK_KING_SIDE,
    CastleRights::BLACK_QUEEN_SIDE,
];

/// The xor of the keys for every right present in `rights`.
pub(super) fn castle_rights_key(rights: CastleRights) -> Key {
    let mut key = 0;
    for (index, &flag) in CASTLE_RIGHT_FLAGS.iter().enumerate() {
        if rights.contains(flag) {
            key ^= CASTLE_KEYS[index];
        }
    }
    key
}

/// The key for an en-passant target on the given file (`0..8`).
pub(super) fn en_passant_key(file: u8) -> Key {
    debug_assert!(file < 8);
    EN_PASSANT_FILE_KEYS[file as usize]
}

/// The key toggled when it is Black to move (White contributes no key, by
/// convention -- it is the identity element for this component).
pub(super) const fn side_to_move_key() -> Key {
    SIDE_TO_MOVE_KEY
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn piece_key_is_deterministic() {
        let square = Square::try_from("e4").unwrap();
        assert_eq!(
            piece_key(Player::White, PieceKind::Knight, square),
            piece_key(Player::White, PieceKind::Knight, square)
        );
    }

    #[test]
    fn distinct_squares_differ() {
        let e4 = Square::try_from("e4").unwrap();
        let e5 = Square::try_from("e5").unwrap();
        assert_ne!(
            piece_key(Player::White, PieceKind::Knight, e4),
            piece_key(Player::White, PieceKind::Knight, e5)
        );
    }

    #[test]
    fn castle_rights_key_empty_is_zero() {
        assert_eq!(castle_rights_key(CastleRights::empty()), 0);
    }

    #[test]
    fn castle_rights_key_xor_is_order_independent() {
        let both = CastleRights::WHITE_KING_SIDE | CastleRights::BLACK_QUEEN_SIDE;
        assert_eq!(
            castle_rights_key(both),
            castle_rights_key(CastleRights::BLACK_QUEEN_SIDE | CastleRights::WHITE_KING_SIDE)
        );
    }
}
