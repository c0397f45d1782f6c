//! [`Position`]: the mutable chess position -- piece placement, castling
//! rights, en-passant target, clocks, side to move. Exposes FEN I/O,
//! [`Position::make_move`], pseudo-legal move enumeration, check/castle
//! legality, Zobrist hash, material count, and the dead-position predicate.
//!
//! [Chess Position]: https://www.chessprogramming.org/Chess_Position

use std::fmt::{self, Write as _};

use anyhow::{bail, Context};

use crate::chess::attacks;
use crate::chess::bitboard::{Bitboard, Board, BitboardSet};
use crate::chess::core::{CastleRights, CastleSide, Move, MoveList, Piece, PieceKind, Player, Square};
use crate::chess::options;
use crate::chess::zobrist;

/// An external collaborator that accepts candidate moves as they are
/// generated, without requiring [`Position::pseudo_legal_moves`] to
/// allocate its own container. [`MoveList`] implements this for
/// convenience.
pub trait PotentialSink {
    fn generate_potential(&mut self, potential_move: Move);
}

impl PotentialSink for MoveList {
    fn generate_potential(&mut self, potential_move: Move) {
        self.push(potential_move);
    }
}

/// A chess position: piece placement plus the state needed to apply and
/// validate moves (castling rights, en-passant target, clocks, side to
/// move) and to recognize it again later (Zobrist hash, for repetition).
#[derive(Clone)]
pub struct Position {
    board: Board,
    /// File (0-7) the king-side castling rook starts on. 7 in standard
    /// chess; arbitrary in Chess960.
    file_of_kings_rook: u8,
    /// File (0-7) the queen-side castling rook starts on. 0 in standard
    /// chess; arbitrary in Chess960.
    file_of_queens_rook: u8,
    castle_rights: CastleRights,
    en_passant_target: Square,
    half_move_clock: u16,
    /// Plies since the game started (ply 0 is the starting position).
    half_move_number: u16,
    active_army: Player,
    last_move: Move,
    /// Cached repetition count; -1 when not known to the caller. The core
    /// never sets this itself (see [`crate::chess::history`]); it exists so
    /// a search collaborator has somewhere to cache the result without a
    /// side table.
    repetitions: i32,
    hash: zobrist::Key,
}

impl Position {
    /// The starting position of standard chess.
    ///
    /// ```
    /// use zugzwang_core::chess::position::Position;
    ///
    /// assert_eq!(
    ///     Position::starting().to_fen(true),
    ///     "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
    /// );
    /// ```
    #[must_use]
    pub fn starting() -> Self {
        let mut position = Self {
            board: Board::starting(),
            file_of_kings_rook: 7,
            file_of_queens_rook: 0,
            castle_rights: CastleRights::all(),
            en_passant_target: Square::INVALID,
            half_move_clock: 0,
            half_move_number: 0,
            active_army: Player::White,
            last_move: Move::default(),
            repetitions: -1,
            hash: 0,
        };
        position.hash = position.compute_hash();
        position
    }

    /// Parses the six-field FEN (or the four-field EPD-style prefix, clocks
    /// defaulting to `0 1`). See [`Self::try_from`] for a variant that also
    /// strips a `fen `/`epd ` prefix and surrounding whitespace.
    pub fn from_fen(input: &str) -> anyhow::Result<Self> {
        let mut parts = input.split(' ');

        let placement = parts.next().context("missing piece placement")?;
        let board = parse_placement(placement)?;

        let side_char = parts
            .next()
            .context("missing side to move")?
            .chars()
            .next()
            .context("empty side to move")?;
        let active_army = Player::try_from(side_char)?;

        let castling_field = parts.next().context("missing castling rights")?;
        let (castle_rights, file_of_kings_rook, file_of_queens_rook) =
            parse_castle_rights(castling_field, &board)?;

        let en_passant_target = match parts.next() {
            Some("-") | None => Square::INVALID,
            Some(value) => Square::try_from(value)?,
        };

        let half_move_clock = match parts.next() {
            Some(value) => value.parse().context("invalid half-move clock")?,
            None => 0,
        };
        let half_move_number = match parts.next() {
            Some(value) => {
                let full_moves: u16 = value.parse().context("invalid full-move number")?;
                if full_moves == 0 {
                    bail!("full-move number cannot be 0");
                }
                (full_moves - 1) * 2 + u16::from(active_army == Player::Black)
            }
            None => u16::from(active_army == Player::Black),
        };

        if parts.next().is_some() {
            bail!("trailing FEN fields");
        }

        let mut position = Self {
            board,
            file_of_kings_rook,
            file_of_queens_rook,
            castle_rights,
            en_passant_target,
            half_move_clock,
            half_move_number,
            active_army,
            last_move: Move::default(),
            repetitions: -1,
            hash: 0,
        };
        position.hash = position.compute_hash();
        validate(&position)?;
        Ok(position)
    }

    /// The inverse of [`Self::from_fen`]. `include_clocks` controls whether
    /// the half-move clock and full-move number trail the position.
    #[must_use]
    pub fn to_fen(&self, include_clocks: bool) -> String {
        let mut result = self.board.to_string();
        let _ = write!(result, " {} ", self.active_army);
        let _ = write!(result, "{} ", self.format_castle_rights());
        let _ = write!(result, "{}", self.en_passant_target);
        if include_clocks {
            let _ = write!(
                result,
                " {} {}",
                self.half_move_clock,
                self.full_move_number()
            );
        }
        result
    }

    const fn full_move_number(&self) -> u16 {
        self.half_move_number / 2 + 1
    }

    fn format_castle_rights(&self) -> String {
        if self.castle_rights.is_empty() {
            return "-".to_string();
        }
        let mut result = String::new();
        for (army, side, letter) in [
            (Player::White, CastleSide::KingSide, 'K'),
            (Player::White, CastleSide::QueenSide, 'Q'),
            (Player::Black, CastleSide::KingSide, 'k'),
            (Player::Black, CastleSide::QueenSide, 'q'),
        ] {
            if !self.castle_rights.contains(CastleRights::for_side(army, side)) {
                continue;
            }
            let rook_file = match side {
                CastleSide::KingSide => self.file_of_kings_rook,
                CastleSide::QueenSide => self.file_of_queens_rook,
            };
            let Some(king_square) = self.pieces(army).king.iter().next() else {
                continue;
            };
            let is_outermost = outermost_rook_file(
                self.pieces(army),
                home_rank(army),
                king_square.file(),
                side == CastleSide::KingSide,
            ) == Some(rook_file);
            if is_outermost {
                result.push(letter);
            } else {
                let file_letter = (b'A' + rook_file) as char;
                result.push(if army == Player::White {
                    file_letter
                } else {
                    file_letter.to_ascii_lowercase()
                });
            }
        }
        result
    }

    /// The army to move.
    #[must_use]
    pub const fn us(&self) -> Player {
        self.active_army
    }

    /// The army not to move.
    #[must_use]
    pub fn them(&self) -> Player {
        self.active_army.opposite()
    }

    /// The cached repetition count a search collaborator has stashed on
    /// this position, or `-1` if none has been computed yet. The core
    /// itself never sets this to anything but `-1` (see
    /// [`Self::set_repetitions`]); it resets to `-1` on every
    /// [`Self::make_move`] since a cached count for the parent position
    /// says nothing about the child.
    #[must_use]
    pub const fn repetitions(&self) -> i32 {
        self.repetitions
    }

    /// Stashes `count` as the repetition count for this exact position, for
    /// a search collaborator to avoid recomputing
    /// [`crate::chess::history::History::repetition_count`] on every visit.
    pub fn set_repetitions(&mut self, count: i32) {
        self.repetitions = count;
    }

    fn pieces(&self, army: Player) -> &BitboardSet {
        match army {
            Player::White => &self.board.white_pieces,
            Player::Black => &self.board.black_pieces,
        }
    }

    fn pieces_mut(&mut self, army: Player) -> &mut BitboardSet {
        match army {
            Player::White => &mut self.board.white_pieces,
            Player::Black => &mut self.board.black_pieces,
        }
    }

    fn occupancy(&self, army: Player) -> Bitboard {
        self.pieces(army).all()
    }

    fn occupied_squares(&self) -> Bitboard {
        self.occupancy(Player::White) | self.occupancy(Player::Black)
    }

    /// The piece sitting on `square`, if any. A linear scan across piece
    /// kinds; fine for FEN emission and debugging, not for a movegen hot
    /// path.
    #[must_use]
    pub fn at(&self, square: Square) -> Option<Piece> {
        self.board.at(square)
    }

    /// The Zobrist hash of the position (see [`crate::chess::zobrist`]).
    #[must_use]
    pub const fn hash(&self) -> zobrist::Key {
        self.hash
    }

    fn compute_hash(&self) -> zobrist::Key {
        let mut key = 0;
        if self.active_army == Player::Black {
            key ^= zobrist::side_to_move_key();
        }
        key ^= zobrist::castle_rights_key(self.castle_rights);
        if self.en_passant_target.is_valid() {
            key ^= zobrist::en_passant_key(self.en_passant_target.file());
        }
        for square in self.occupied_squares().iter() {
            let piece = self.at(square).expect("occupied square has a piece");
            key ^= zobrist::piece_key(piece.owner, piece.kind, square);
        }
        key
    }

    /// Sum of {Q:9, R:5, B:3, N:3, P:1} over `army`'s pieces. Feeds an
    /// evaluator; the rules engine itself does not consult it.
    #[must_use]
    pub fn material_score(&self, army: Player) -> i32 {
        let pieces = self.pieces(army);
        9 * i32::try_from(pieces.queens.count()).unwrap_or(i32::MAX)
            + 5 * i32::try_from(pieces.rooks.count()).unwrap_or(i32::MAX)
            + 3 * i32::try_from(pieces.bishops.count()).unwrap_or(i32::MAX)
            + 3 * i32::try_from(pieces.knights.count()).unwrap_or(i32::MAX)
            + i32::try_from(pieces.pawns.count()).unwrap_or(i32::MAX)
    }

    /// True when no sequence of legal moves can produce checkmate: no
    /// queens, rooks or pawns remain, and at most 3 pieces are on the
    /// board (covers K-vs-K, K+B-vs-K, K+N-vs-K). Does not recognize
    /// same-colored-bishops or other higher-material dead positions --
    /// see the open question in `DESIGN.md`.
    #[must_use]
    pub fn is_dead_position(&self) -> bool {
        let white = self.pieces(Player::White);
        let black = self.pieces(Player::Black);
        if !white.queens.is_empty()
            || !black.queens.is_empty()
            || !white.rooks.is_empty()
            || !black.rooks.is_empty()
            || !white.pawns.is_empty()
            || !black.pawns.is_empty()
        {
            return false;
        }
        self.occupied_squares().count() <= 3
    }

    /// Structural equality over every field that defines a chess position:
    /// piece placement, castling rights and rook files, en-passant target,
    /// and side to move. Used by [`crate::chess::history::History`] for
    /// threefold-repetition detection, rather than comparing hashes alone.
    #[must_use]
    pub fn is_same_position(&self, other: &Self) -> bool {
        self.board == other.board
            && self.castle_rights == other.castle_rights
            && self.file_of_kings_rook == other.file_of_kings_rook
            && self.file_of_queens_rook == other.file_of_queens_rook
            && self.en_passant_target == other.en_passant_target
            && self.active_army == other.active_army
    }

    fn attacked_squares(&self, attacker: Player, occupied: Bitboard) -> Bitboard {
        let pieces = self.pieces(attacker);
        let mut attacked = Bitboard::empty();
        for square in pieces.king.iter() {
            attacked |= attacks::king_attacks(square);
        }
        for square in pieces.queens.iter() {
            attacked |= attacks::queen_attacks(square, occupied);
        }
        for square in pieces.rooks.iter() {
            attacked |= attacks::rook_attacks(square, occupied);
        }
        for square in pieces.bishops.iter() {
            attacked |= attacks::bishop_attacks(square, occupied);
        }
        for square in pieces.knights.iter() {
            attacked |= attacks::knight_attacks(square);
        }
        for square in pieces.pawns.iter() {
            attacked |= attacks::pawn_attacks(attacker, square);
        }
        attacked
    }

    /// Whether `army`'s king is attacked by the opposing army. As a side
    /// effect, mirroring the source's own convenience, records the result
    /// onto [`Self::last_move`]'s check flag.
    pub fn is_checked(&mut self, army: Player) -> bool {
        let occupied = self.occupied_squares();
        let enemy_attacks = self.attacked_squares(army.opposite(), occupied);
        let result = (self.pieces(army).king & enemy_attacks).count() > 0;
        self.last_move.set_check(result);
        result
    }

    /// A pure flag read: does `army` still hold the right to castle `side`?
    #[must_use]
    pub fn is_castle_available(&self, army: Player, side: CastleSide) -> bool {
        self.castle_rights.contains(CastleRights::for_side(army, side))
    }

    /// The six castling conditions (generalized to Chess960): the right is
    /// available, the rook is still on its starting square, the squares
    /// strictly between king and rook are empty, the squares either piece
    /// traverses are empty (aside from their own current squares), and the
    /// king's transit squares (inclusive) are not attacked. The rook's
    /// transit squares being attacked does not prevent castling.
    #[must_use]
    pub fn is_castle_legal(&self, army: Player, side: CastleSide) -> bool {
        if !self.is_castle_available(army, side) {
            return false;
        }
        let home = home_rank(army);
        let rook_file = match side {
            CastleSide::KingSide => self.file_of_kings_rook,
            CastleSide::QueenSide => self.file_of_queens_rook,
        };
        let rook_square = Square::new(rook_file, home);
        if !self.pieces(army).rooks.is_set(rook_square) {
            return false;
        }
        let Some(king_square) = self.pieces(army).king.iter().next() else {
            return false;
        };

        let occupied = self.occupied_squares();
        let current = Bitboard::from(king_square) | Bitboard::from(rook_square);

        let between = attacks::ray(king_square, rook_square) & !current;
        if (between & occupied).count() > 0 {
            return false;
        }

        let (king_dest_file, rook_dest_file) = match side {
            CastleSide::KingSide => (6, 5),
            CastleSide::QueenSide => (2, 3),
        };
        let king_path = attacks::ray(king_square, Square::new(king_dest_file, home));
        let rook_path = attacks::ray(rook_square, Square::new(rook_dest_file, home));
        let transit = (king_path | rook_path) & !current;
        if (transit & occupied).count() > 0 {
            return false;
        }

        let enemy_attacks = self.attacked_squares(army.opposite(), occupied);
        if (king_path & enemy_attacks).count() > 0 {
            return false;
        }

        true
    }

    fn castle_move(&self, army: Player, side: CastleSide) -> Option<Move> {
        let king_square = self.pieces(army).king.iter().next()?;
        let home = home_rank(army);
        let rook_file = match side {
            CastleSide::KingSide => self.file_of_kings_rook,
            CastleSide::QueenSide => self.file_of_queens_rook,
        };
        let mut castle = Move::new(king_square, Square::new(rook_file, home), PieceKind::King);
        castle.set_castle(side);
        Some(castle)
    }

    /// Writes every pseudo-legal move (obeying piece movement rules and not
    /// landing on a friendly-occupied square, but possibly leaving the
    /// mover's own king in check) into `sink`. The caller is responsible
    /// for filtering out moves that leave the mover in check, by applying
    /// the move to a copy and calling [`Self::is_checked`].
    pub fn pseudo_legal_moves(&self, sink: &mut dyn PotentialSink) {
        let army = self.active_army;
        let enemy = army.opposite();
        let our_occupancy = self.occupancy(army);
        let their_occupancy = self.occupancy(enemy);
        let occupied = our_occupancy | their_occupancy;
        let pieces = self.pieces(army);

        if let Some(king_square) = pieces.king.iter().next() {
            for to in (attacks::king_attacks(king_square) & !our_occupancy).iter() {
                sink.generate_potential(Move::new(king_square, to, PieceKind::King));
            }
        }
        for from in pieces.knights.iter() {
            for to in (attacks::knight_attacks(from) & !our_occupancy).iter() {
                sink.generate_potential(Move::new(from, to, PieceKind::Knight));
            }
        }
        for from in pieces.rooks.iter() {
            for to in (attacks::rook_attacks(from, occupied) & !our_occupancy).iter() {
                sink.generate_potential(Move::new(from, to, PieceKind::Rook));
            }
        }
        for from in pieces.bishops.iter() {
            for to in (attacks::bishop_attacks(from, occupied) & !our_occupancy).iter() {
                sink.generate_potential(Move::new(from, to, PieceKind::Bishop));
            }
        }
        for from in pieces.queens.iter() {
            for to in (attacks::queen_attacks(from, occupied) & !our_occupancy).iter() {
                sink.generate_potential(Move::new(from, to, PieceKind::Queen));
            }
        }
        self.generate_pawn_moves(army, occupied, their_occupancy, sink);
        for side in [CastleSide::KingSide, CastleSide::QueenSide] {
            if self.is_castle_legal(army, side) {
                if let Some(castle) = self.castle_move(army, side) {
                    sink.generate_potential(castle);
                }
            }
        }
    }

    fn generate_pawn_moves(
        &self,
        army: Player,
        occupied: Bitboard,
        their_occupancy: Bitboard,
        sink: &mut dyn PotentialSink,
    ) {
        let pawns = self.pieces(army).pawns;
        let promotion_rank = match army {
            Player::White => 7,
            Player::Black => 0,
        };
        let ep_target = self.en_passant_target;

        for from in pawns.iter() {
            let attack_targets = attacks::pawn_attacks(army, from);
            let mut captures = attack_targets & their_occupancy;
            if ep_target.is_valid() && attack_targets.is_set(ep_target) {
                captures.set(ep_target);
            }
            for to in captures.iter() {
                push_pawn_move(from, to, to == ep_target, promotion_rank, sink);
            }

            if let Some(single) = attacks::pawn_single_push(army, from) {
                if !occupied.is_set(single) {
                    push_pawn_move(from, single, false, promotion_rank, sink);
                    if let Some(double) = attacks::pawn_double_push(army, from) {
                        if !occupied.is_set(double) {
                            sink.generate_potential(Move::new(from, double, PieceKind::Pawn));
                        }
                    }
                }
            }
        }
    }

    fn fill_move(&self, mv: &mut Move) -> bool {
        let army = self.active_army;
        let home = home_rank(army);

        if mv.is_castle() && !mv.end().is_valid() {
            let Some(side) = mv.castle_side() else {
                return false;
            };
            let king_dest_file = match side {
                CastleSide::KingSide => 6,
                CastleSide::QueenSide => 2,
            };
            *mv = mv.with_end(Square::new(king_dest_file, home));
        }

        if !mv.start().is_valid() {
            return false;
        }

        if mv.piece() == PieceKind::Unknown {
            let Some(piece) = self.at(mv.start()) else {
                return false;
            };
            if piece.owner != army {
                return false;
            }
            *mv = mv.with_piece(piece.kind);
        }

        if !mv.end().is_valid() {
            return false;
        }

        if mv.piece() == PieceKind::Pawn
            && (mv.end().rank() == 0 || mv.end().rank() == 7)
            && mv.promotion().is_none()
        {
            *mv = mv.with_promotion(PieceKind::Queen);
        }

        if mv.piece() == PieceKind::Pawn
            && self.en_passant_target.is_valid()
            && mv.end() == self.en_passant_target
        {
            mv.set_en_passant(true);
        }

        if mv.piece() == PieceKind::King
            && !mv.is_castle()
            && mv.start().rank() == home
            && mv.end().rank() == home
        {
            let delta = i16::from(mv.end().file()) - i16::from(mv.start().file());
            if delta == 2 {
                mv.set_castle(CastleSide::KingSide);
            } else if delta == -2 {
                mv.set_castle(CastleSide::QueenSide);
            } else if options::chess960() {
                if let Some(occupant) = self.at(mv.end()) {
                    if occupant.owner == army && occupant.kind == PieceKind::Rook {
                        if mv.end().file() == self.file_of_kings_rook {
                            mv.set_castle(CastleSide::KingSide);
                        } else if mv.end().file() == self.file_of_queens_rook {
                            mv.set_castle(CastleSide::QueenSide);
                        }
                    }
                }
            }
        }

        true
    }

    /// Fills in any unspecified fields of `next_move` (see the five rules
    /// in the source's fill-in step) and applies it. Returns `false`
    /// without mutating the position if the move cannot be filled in
    /// (`MalformedMove`); the core does not detect moves that leave the
    /// mover in check (`IllegalMove`) -- that is the search collaborator's
    /// job, via [`Self::is_checked`].
    pub fn make_move(&mut self, mut next_move: Move) -> bool {
        if !self.fill_move(&mut next_move) {
            return false;
        }
        self.apply_move(next_move);
        true
    }

    fn clear_square(&mut self, army: Player, kind: PieceKind, square: Square) {
        self.pieces_mut(army).bitboard_for_mut(kind).clear(square);
        self.hash ^= zobrist::piece_key(army, kind, square);
    }

    fn set_square(&mut self, army: Player, kind: PieceKind, square: Square) {
        self.pieces_mut(army).bitboard_for_mut(kind).set(square);
        self.hash ^= zobrist::piece_key(army, kind, square);
    }

    fn remove_castle_right(&mut self, army: Player, side: CastleSide) {
        let flag = CastleRights::for_side(army, side);
        if self.castle_rights.contains(flag) {
            self.castle_rights.remove(flag);
            self.hash ^= zobrist::castle_rights_key(flag);
        }
    }

    fn remove_castle_right_on_rook_square(&mut self, army: Player, square: Square) {
        if square.rank() != home_rank(army) {
            return;
        }
        if square.file() == self.file_of_kings_rook {
            self.remove_castle_right(army, CastleSide::KingSide);
        }
        if square.file() == self.file_of_queens_rook {
            self.remove_castle_right(army, CastleSide::QueenSide);
        }
    }

    fn apply_move(&mut self, mv: Move) {
        let army = self.active_army;
        let enemy = army.opposite();

        if self.en_passant_target.is_valid() {
            self.hash ^= zobrist::en_passant_key(self.en_passant_target.file());
        }
        self.en_passant_target = Square::INVALID;

        let is_pawn_move = mv.piece() == PieceKind::Pawn;
        if is_pawn_move {
            let delta = i16::from(mv.end().rank()) - i16::from(mv.start().rank());
            if delta.abs() == 2 {
                let behind_rank = u8::try_from(i16::from(mv.start().rank()) + delta / 2)
                    .expect("pawn double push stays on the board");
                self.en_passant_target = Square::new(mv.start().file(), behind_rank);
                self.hash ^= zobrist::en_passant_key(mv.start().file());
            }
        }

        if mv.piece() == PieceKind::King {
            self.remove_castle_right(army, CastleSide::KingSide);
            self.remove_castle_right(army, CastleSide::QueenSide);
        } else if mv.piece() == PieceKind::Rook {
            self.remove_castle_right_on_rook_square(army, mv.start());
        }

        let mut captured = false;
        if mv.is_en_passant() {
            let captured_square = Square::new(mv.end().file(), mv.start().rank());
            self.clear_square(enemy, PieceKind::Pawn, captured_square);
            captured = true;
        } else if let Some(victim) = self.at(mv.end()) {
            if victim.owner == enemy {
                self.clear_square(enemy, victim.kind, mv.end());
                if victim.kind == PieceKind::Rook {
                    self.remove_castle_right_on_rook_square(enemy, mv.end());
                }
                captured = true;
            }
        }

        if is_pawn_move || captured {
            self.half_move_clock = 0;
        } else {
            self.half_move_clock += 1;
        }

        if let Some(side) = mv.castle_side() {
            let home = home_rank(army);
            let rook_file = match side {
                CastleSide::KingSide => self.file_of_kings_rook,
                CastleSide::QueenSide => self.file_of_queens_rook,
            };
            let king_from = mv.start();
            let rook_from = Square::new(rook_file, home);
            let (king_to_file, rook_to_file) = match side {
                CastleSide::KingSide => (6, 5),
                CastleSide::QueenSide => (2, 3),
            };
            let king_to = Square::new(king_to_file, home);
            let rook_to = Square::new(rook_to_file, home);

            self.clear_square(army, PieceKind::King, king_from);
            self.clear_square(army, PieceKind::Rook, rook_from);
            self.set_square(army, PieceKind::King, king_to);
            self.set_square(army, PieceKind::Rook, rook_to);
        } else if let Some(promotion) = mv.promotion() {
            self.clear_square(army, PieceKind::Pawn, mv.start());
            self.set_square(army, promotion, mv.end());
        } else {
            self.clear_square(army, mv.piece(), mv.start());
            self.set_square(army, mv.piece(), mv.end());
        }

        self.repetitions = -1;
        self.hash ^= zobrist::side_to_move_key();
        self.active_army = enemy;
        self.half_move_number += 1;

        let mut last_move = mv;
        last_move.set_capture(captured);
        self.last_move = last_move;
    }

    /// True when the half-move clock has reached 100, the fifty-move-rule
    /// draw claim threshold.
    #[must_use]
    pub const fn halfmove_clock_expired(&self) -> bool {
        self.half_move_clock >= 100
    }
}

const fn home_rank(army: Player) -> u8 {
    match army {
        Player::White => 0,
        Player::Black => 7,
    }
}

fn push_pawn_move(
    from: Square,
    to: Square,
    en_passant: bool,
    promotion_rank: u8,
    sink: &mut dyn PotentialSink,
) {
    if to.rank() == promotion_rank {
        for promotion in [
            PieceKind::Queen,
            PieceKind::Knight,
            PieceKind::Rook,
            PieceKind::Bishop,
        ] {
            sink.generate_potential(Move::new(from, to, PieceKind::Pawn).with_promotion(promotion));
        }
        return;
    }
    let mut mv = Move::new(from, to, PieceKind::Pawn);
    mv.set_en_passant(en_passant);
    sink.generate_potential(mv);
}

fn parse_placement(placement: &str) -> anyhow::Result<Board> {
    let mut board = Board::empty();
    let ranks: Vec<&str> = placement.split('/').collect();
    if ranks.len() != 8 {
        bail!("expected 8 ranks, got {}", ranks.len());
    }
    for (rank_from_top, rank_fen) in ranks.iter().enumerate() {
        let rank = 7 - u8::try_from(rank_from_top).expect("rank_from_top < 8");
        let mut file = 0u8;
        for symbol in rank_fen.chars() {
            if file > 7 {
                bail!("rank {rank_fen} has too many files");
            }
            if let Some(digit) = symbol.to_digit(10) {
                if digit == 0 {
                    bail!("increment cannot be 0");
                }
                file += u8::try_from(digit).expect("digit < 10");
                continue;
            }
            let piece =
                Piece::try_from(symbol).with_context(|| format!("in rank {rank_fen}"))?;
            let square = Square::new(file, rank);
            let pieces = match piece.owner {
                Player::White => &mut board.white_pieces,
                Player::Black => &mut board.black_pieces,
            };
            pieces.bitboard_for_mut(piece.kind).set(square);
            file += 1;
        }
        if file != 8 {
            bail!("rank {rank_fen} should have exactly 8 files, got {file}");
        }
    }
    Ok(board)
}

fn outermost_rook_file(
    pieces: &BitboardSet,
    home_rank: u8,
    king_file: u8,
    kingside: bool,
) -> Option<u8> {
    let candidates = pieces
        .rooks
        .iter()
        .filter(|square| square.rank() == home_rank)
        .map(Square::file);
    if kingside {
        candidates.filter(|&file| file > king_file).max()
    } else {
        candidates.filter(|&file| file < king_file).min()
    }
}

fn parse_castle_rights(field: &str, board: &Board) -> anyhow::Result<(CastleRights, u8, u8)> {
    let mut rights = CastleRights::empty();
    let mut file_of_kings_rook = 7u8;
    let mut file_of_queens_rook = 0u8;
    if field == "-" {
        return Ok((rights, file_of_kings_rook, file_of_queens_rook));
    }
    for ch in field.chars() {
        let army = if ch.is_ascii_uppercase() {
            Player::White
        } else {
            Player::Black
        };
        let pieces = match army {
            Player::White => &board.white_pieces,
            Player::Black => &board.black_pieces,
        };
        let home = home_rank(army);
        let king_square = pieces
            .king
            .iter()
            .next()
            .with_context(|| format!("missing {army} king while parsing castling rights"))?;
        let king_file = king_square.file();
        let (side, rook_file) = match ch.to_ascii_uppercase() {
            'K' => {
                let file = outermost_rook_file(pieces, home, king_file, true)
                    .with_context(|| format!("no rook to the king-side of {army}'s king"))?;
                (CastleSide::KingSide, file)
            }
            'Q' => {
                let file = outermost_rook_file(pieces, home, king_file, false)
                    .with_context(|| format!("no rook to the queen-side of {army}'s king"))?;
                (CastleSide::QueenSide, file)
            }
            upper @ 'A'..='H' => {
                let file = upper as u8 - b'A';
                let side = if file > king_file {
                    CastleSide::KingSide
                } else {
                    CastleSide::QueenSide
                };
                (side, file)
            }
            _ => bail!("unrecognized castling character {ch}"),
        };
        rights |= CastleRights::for_side(army, side);
        match side {
            CastleSide::KingSide => file_of_kings_rook = rook_file,
            CastleSide::QueenSide => file_of_queens_rook = rook_file,
        }
    }
    Ok((rights, file_of_kings_rook, file_of_queens_rook))
}

fn validate(position: &Position) -> anyhow::Result<()> {
    if position.pieces(Player::White).king.count() != 1 {
        bail!(
            "expected 1 white king, got {}",
            position.pieces(Player::White).king.count()
        );
    }
    if position.pieces(Player::Black).king.count() != 1 {
        bail!(
            "expected 1 black king, got {}",
            position.pieces(Player::Black).king.count()
        );
    }
    if position.pieces(Player::White).pawns.count() > 8 {
        bail!("expected <= 8 white pawns");
    }
    if position.pieces(Player::Black).pawns.count() > 8 {
        bail!("expected <= 8 black pawns");
    }
    let backranks = Bitboard::with_squares(
        &(0..8)
            .flat_map(|file| [Square::new(file, 0), Square::new(file, 7)])
            .collect::<Vec<_>>(),
    );
    if !((position.pieces(Player::White).pawns | position.pieces(Player::Black).pawns)
        & backranks)
        .is_empty()
    {
        bail!("pawns cannot be placed on back ranks");
    }
    if !(position.occupancy(Player::White) & position.occupancy(Player::Black)).is_empty() {
        bail!("white and black occupy the same square");
    }
    if position.en_passant_target.is_valid() {
        validate_en_passant(position)?;
    }
    Ok(())
}

/// `en_passant_target`, when set, must sit on rank 3 (White just
/// double-pushed, Black to move) or rank 6 (Black just double-pushed, White
/// to move), with the double-pushed pawn sitting adjacent to it.
fn validate_en_passant(position: &Position) -> anyhow::Result<()> {
    let target = position.en_passant_target;
    let (expected_rank, pusher, pawn_rank) = match position.active_army {
        Player::Black => (2, Player::White, 3),
        Player::White => (5, Player::Black, 4),
    };
    if target.rank() != expected_rank {
        bail!(
            "expected en-passant target on rank {}, got rank {}",
            expected_rank + 1,
            target.rank() + 1
        );
    }
    let pawn_square = Square::new(target.file(), pawn_rank);
    if !position.pieces(pusher).pawns.is_set(pawn_square) {
        bail!("en-passant target is not adjacent to a just-pushed pawn");
    }
    Ok(())
}

impl TryFrom<&str> for Position {
    type Error = anyhow::Error;

    /// Trims whitespace and an optional `fen `/`epd ` prefix before
    /// parsing, for inputs coming from an untrusted source (e.g. a UCI
    /// front-end).
    fn try_from(input: &str) -> anyhow::Result<Self> {
        let input = input.trim();
        for prefix in ["fen ", "epd "] {
            if let Some(stripped) = input.strip_prefix(prefix) {
                return Self::from_fen(stripped);
            }
        }
        Self::from_fen(input)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_fen(true))
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..8).rev() {
            for file in 0..8 {
                let symbol = self
                    .at(Square::new(file, rank))
                    .map_or('.', Piece::algebraic_symbol);
                write!(f, "{symbol}")?;
                if file != 7 {
                    write!(f, " ")?;
                }
            }
            writeln!(f)?;
        }
        writeln!(f, "Side to move: {}", self.active_army)?;
        writeln!(f, "Castling rights: {}", self.format_castle_rights())?;
        writeln!(f, "En passant: {}", self.en_passant_target)?;
        write!(f, "FEN: {self}")
    }
}

/// [Perft] (**per**formance **t**esting): the number of leaf nodes reached
/// by exhaustively playing out legal moves to `depth`. Used to validate
/// move generation against known-good counts (see `tests/` and `benches/`).
///
/// [Perft]: https://www.chessprogramming.org/Perft
#[must_use]
pub fn perft(position: &Position, depth: u8) -> u64 {
    if depth == 0 {
        return 1;
    }
    let mover = position.active_army;
    let mut candidates = MoveList::new();
    position.pseudo_legal_moves(&mut candidates);
    let mut nodes = 0;
    for candidate in candidates {
        let mut next = position.clone();
        if !next.make_move(candidate) {
            continue;
        }
        if next.is_checked(mover) {
            continue;
        }
        nodes += if depth == 1 { 1 } else { perft(&next, depth - 1) };
    }
    nodes
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::chess::options;

    #[test]
    fn starting_position_round_trip() {
        let position = Position::starting();
        assert_eq!(
            position.to_fen(true),
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
        );
        assert_eq!(position.us(), Player::White);
    }

    #[test]
    fn starting_position_move_count() {
        let position = Position::starting();
        let mut moves = MoveList::new();
        position.pseudo_legal_moves(&mut moves);
        assert_eq!(moves.len(), 20);
    }

    #[test]
    fn perft_starting_position() {
        let position = Position::starting();
        assert_eq!(perft(&position, 1), 20);
    }

    #[test]
    fn perft_kiwipete() {
        let position = Position::from_fen(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        )
        .unwrap();
        assert_eq!(perft(&position, 1), 48);
    }

    #[test]
    fn castle_through_check() {
        let position = Position::from_fen("4k3/6q1/8/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
        assert!(position.is_castle_available(Player::White, CastleSide::KingSide));
        assert!(!position.is_castle_legal(Player::White, CastleSide::KingSide));
        assert!(position.is_castle_legal(Player::White, CastleSide::QueenSide));
    }

    #[test]
    fn chess960_castle_king_captures_rook() {
        options::set_chess960(true);
        let mut position = Position::from_fen(
            "bq4kr/p3bpp1/3ppn1p/1P1n3P/P2P4/2N4R/1P3PP1/B1Q1NBK1 b k - 0 13",
        )
        .unwrap();
        let start = Square::try_from("g8").unwrap();
        let end = Square::try_from("h8").unwrap();
        let mv = Move::new(start, end, PieceKind::Unknown);
        assert!(position.make_move(mv));
        assert_eq!(
            position.to_fen(true),
            "bq3rk1/p3bpp1/3ppn1p/1P1n3P/P2P4/2N4R/1P3PP1/B1Q1NBK1 w - - 1 14"
        );
        options::set_chess960(false);
    }

    #[test]
    fn double_push_blocked() {
        let position =
            Position::from_fen("4k3/8/8/8/4p3/8/4P3/4K3 w - - 0 1").unwrap();
        let mut moves = MoveList::new();
        position.pseudo_legal_moves(&mut moves);
        let e2 = Square::try_from("e2").unwrap();
        let e4 = Square::try_from("e4").unwrap();
        assert!(!moves.iter().any(|mv| mv.start() == e2 && mv.end() == e4));
    }

    #[test]
    fn dead_position_king_and_bishop() {
        let position = Position::from_fen("4k3/8/8/8/8/8/8/4K2B w - - 0 1").unwrap();
        assert!(position.is_dead_position());
    }

    #[test]
    fn not_dead_position_king_and_rook() {
        let position = Position::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 0 1").unwrap();
        assert!(!position.is_dead_position());
    }

    #[test]
    fn fen_round_trip_after_move() {
        let mut position = Position::starting();
        let mut moves = MoveList::new();
        position.pseudo_legal_moves(&mut moves);
        let e2 = Square::try_from("e2").unwrap();
        let e4 = Square::try_from("e4").unwrap();
        let mv = *moves
            .iter()
            .find(|mv| mv.start() == e2 && mv.end() == e4)
            .unwrap();
        assert!(position.make_move(mv));
        assert_eq!(
            position.to_fen(true),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"
        );
    }
}
