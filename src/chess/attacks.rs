//! Attack tables: given a piece kind, a from-square, and the occupancy of
//! the board, the bitboard of squares that piece attacks, ignoring
//! king-in-check legality and castling (both are [`Position`]'s job).
//!
//! Leaper attacks (king, knight, pawn) are looked up from tables computed
//! once behind a [`OnceLock`] and shared read-only for the life of the
//! process. Slider attacks (rook, bishop, queen) are computed on demand by
//! scanning each ray to its first blocker -- simple, branch-light, and
//! needs no magic numbers or target-feature detection.
//!
//! [`Position`]: crate::chess::position::Position

use std::sync::OnceLock;

use crate::chess::bitboard::Bitboard;
use crate::chess::core::{Player, Square};

const KING_DELTAS: [(i8, i8); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

const KNIGHT_DELTAS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

const ROOK_DIRECTIONS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

fn leaper_table(deltas: &[(i8, i8)]) -> [Bitboard; 64] {
    let mut table = [Bitboard::empty(); 64];
    for (index, entry) in table.iter_mut().enumerate() {
        let square = Square::from_index(u8::try_from(index).expect("index < 64"));
        let mut attacks = Bitboard::empty();
        for &(df, dr) in deltas {
            if let Some(target) = square.shift(df, dr) {
                attacks.set(target);
            }
        }
        *entry = attacks;
    }
    table
}

fn king_table() -> &'static [Bitboard; 64] {
    static TABLE: OnceLock<[Bitboard; 64]> = OnceLock::new();
    TABLE.get_or_init(|| leaper_table(&KING_DELTAS))
}

fn knight_table() -> &'static [Bitboard; 64] {
    static TABLE: OnceLock<[Bitboard; 64]> = OnceLock::new();
    TABLE.get_or_init(|| leaper_table(&KNIGHT_DELTAS))
}

fn pawn_attack_table(player: Player) -> &'static [Bitboard; 64] {
    static WHITE: OnceLock<[Bitboard; 64]> = OnceLock::new();
    static BLACK: OnceLock<[Bitboard; 64]> = OnceLock::new();
    let (deltas, table): (&[(i8, i8)], &OnceLock<[Bitboard; 64]>) = match player {
        Player::White => (&[(-1, 1), (1, 1)], &WHITE),
        Player::Black => (&[(-1, -1), (1, -1)], &BLACK),
    };
    table.get_or_init(|| leaper_table(deltas))
}

/// Squares attacked by a king on `square`.
#[must_use]
pub fn king_attacks(square: Square) -> Bitboard {
    king_table()[square.index() as usize]
}

/// Squares attacked by a knight on `square`.
#[must_use]
pub fn knight_attacks(square: Square) -> Bitboard {
    knight_table()[square.index() as usize]
}

/// Squares a `player`'s pawn on `square` attacks diagonally (capture
/// squares, including en-passant once the caller treats the en-passant
/// target as occupied by the enemy).
#[must_use]
pub fn pawn_attacks(player: Player, square: Square) -> Bitboard {
    pawn_attack_table(player)[square.index() as usize]
}

/// The square directly ahead of `square` for a pawn push by `player`, or
/// [`None`] at the edge of the board. Does not check occupancy; the caller
/// ([`Position::generate_pawn_moves`](crate::chess::position)) decides
/// whether the push is blocked.
#[must_use]
pub fn pawn_single_push(player: Player, square: Square) -> Option<Square> {
    let delta = match player {
        Player::White => 1,
        Player::Black => -1,
    };
    square.shift(0, delta)
}

/// The square two ranks ahead of `square` for a pawn push by `player`, only
/// defined (returns `Some`) when `square` is on that player's home rank.
#[must_use]
pub fn pawn_double_push(player: Player, square: Square) -> Option<Square> {
    let home_rank = match player {
        Player::White => 1,
        Player::Black => 6,
    };
    if square.rank() != home_rank {
        return None;
    }
    let delta = match player {
        Player::White => 2,
        Player::Black => -2,
    };
    square.shift(0, delta)
}

fn slide(square: Square, occupied: Bitboard, directions: &[(i8, i8)]) -> Bitboard {
    let mut attacks = Bitboard::empty();
    for &(df, dr) in directions {
        let mut current = square;
        loop {
            let Some(next) = current.shift(df, dr) else {
                break;
            };
            attacks.set(next);
            if occupied.is_set(next) {
                break;
            }
            current = next;
        }
    }
    attacks
}

/// Squares a rook on `square` attacks, given board `occupied`-ancy. Rays
/// extend until and including the first blocker in each direction.
#[must_use]
pub fn rook_attacks(square: Square, occupied: Bitboard) -> Bitboard {
    slide(square, occupied, &ROOK_DIRECTIONS)
}

/// Squares a bishop on `square` attacks, given board `occupied`-ancy.
#[must_use]
pub fn bishop_attacks(square: Square, occupied: Bitboard) -> Bitboard {
    slide(square, occupied, &BISHOP_DIRECTIONS)
}

/// Squares a queen on `square` attacks: the union of rook and bishop
/// attacks from the same square.
#[must_use]
pub fn queen_attacks(square: Square, occupied: Bitboard) -> Bitboard {
    rook_attacks(square, occupied) | bishop_attacks(square, occupied)
}

/// The squares between (and including) `from` and `to` when they are
/// aligned on a rank, file or diagonal; empty otherwise. Used by castle- and
/// pin-legality checks.
#[must_use]
pub fn ray(from: Square, to: Square) -> Bitboard {
    if from == to {
        return Bitboard::from(from);
    }
    let file_delta = i8::try_from(to.file()).unwrap() - i8::try_from(from.file()).unwrap();
    let rank_delta = i8::try_from(to.rank()).unwrap() - i8::try_from(from.rank()).unwrap();
    if file_delta != 0 && rank_delta != 0 && file_delta.abs() != rank_delta.abs() {
        return Bitboard::empty();
    }
    let step = |delta: i8| -> i8 {
        match delta.cmp(&0) {
            std::cmp::Ordering::Greater => 1,
            std::cmp::Ordering::Less => -1,
            std::cmp::Ordering::Equal => 0,
        }
    };
    let (df, dr) = (step(file_delta), step(rank_delta));
    let mut result = Bitboard::from(from);
    let mut current = from;
    loop {
        let Some(next) = current.shift(df, dr) else {
            break;
        };
        result.set(next);
        if next == to {
            break;
        }
        current = next;
    }
    result
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn king_attacks_corner() {
        let a1 = Square::try_from("a1").unwrap();
        assert_eq!(king_attacks(a1).count(), 3);
    }

    #[test]
    fn knight_attacks_center() {
        let d4 = Square::try_from("d4").unwrap();
        assert_eq!(knight_attacks(d4).count(), 8);
    }

    #[test]
    fn pawn_attacks_direction() {
        let e4 = Square::try_from("e4").unwrap();
        let white = pawn_attacks(Player::White, e4);
        assert!(white.is_set(Square::try_from("d5").unwrap()));
        assert!(white.is_set(Square::try_from("f5").unwrap()));
        let black = pawn_attacks(Player::Black, e4);
        assert!(black.is_set(Square::try_from("d3").unwrap()));
        assert!(black.is_set(Square::try_from("f3").unwrap()));
    }

    #[test]
    fn rook_attacks_blocked() {
        let a1 = Square::try_from("a1").unwrap();
        let occupied = Bitboard::with_squares(&[Square::try_from("a4").unwrap()]);
        let attacks = rook_attacks(a1, occupied);
        assert!(attacks.is_set(Square::try_from("a4").unwrap()));
        assert!(!attacks.is_set(Square::try_from("a5").unwrap()));
        assert!(attacks.is_set(Square::try_from("h1").unwrap()));
    }

    #[test]
    fn ray_between_aligned_squares() {
        let a1 = Square::try_from("a1").unwrap();
        let d1 = Square::try_from("d1").unwrap();
        let between = ray(a1, d1);
        assert!(between.is_set(Square::try_from("b1").unwrap()));
        assert!(between.is_set(Square::try_from("c1").unwrap()));
        assert!(between.is_set(a1));
        assert!(between.is_set(d1));
        assert_eq!(between.count(), 4);
    }

    #[test]
    fn ray_unaligned_is_empty() {
        let a1 = Square::try_from("a1").unwrap();
        let b3 = Square::try_from("b3").unwrap();
        assert!(ray(a1, b3).is_empty());
    }
}
