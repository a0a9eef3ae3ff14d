//! Decorative particle scenes drawn as braille on a terminal.
//!
//! A [`view::View`] owns a [`view::Scene`] (the [`starfield::StarField`] or
//! the [`bigbang::BigBang`] sequence) and the [`canvas::Canvas`] it draws
//! into; [`term::Presenter`] puts that canvas on screen.

pub mod bigbang;
pub mod canvas;
pub mod color;
pub mod logging;
pub mod particle;
pub mod starfield;
pub mod term;
pub mod view;

pub use bigbang::{BigBang, Phase};
pub use canvas::Canvas;
pub use starfield::{StarField, Theme};
pub use view::{Scene, View};

/// Seed from the clock when the user didn't pick one.
pub fn clock_seed() -> u64 {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    nanos ^ 0x9E37_79B9_7F4A_7C15
}
