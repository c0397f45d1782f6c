//! Process-wide configuration. The only recognized option is
//! `UCI_Chess960`, the conventional name engines use to expose this switch
//! over the UCI protocol -- a layer above this crate, hence the option
//! lives here as a plain flag rather than anything UCI-aware.
//!
//! Read with [`Ordering::Relaxed`]: the flag is only ever written between
//! games, when no core operation (FEN parse, `make_move`, move generation)
//! is in flight, so there is no other memory access to order against.

use std::sync::atomic::{AtomicBool, Ordering};

static CHESS960: AtomicBool = AtomicBool::new(false);

/// Enables or disables Chess960 (Shredder-FEN castling notation, king-
/// captures-rook castle recognition during `make_move` fill-in).
pub fn set_chess960(enabled: bool) {
    CHESS960.store(enabled, Ordering::Relaxed);
}

/// Whether Chess960 handling is currently enabled.
#[must_use]
pub fn chess960() -> bool {
    CHESS960.load(Ordering::Relaxed)
}
