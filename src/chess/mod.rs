//! Implementation of the chess environment: board representation, move
//! generation and the rules of standard chess and Chess960.

pub mod attacks;
pub mod bitboard;
pub mod core;
pub mod history;
pub mod options;
pub mod position;
pub mod zobrist;
