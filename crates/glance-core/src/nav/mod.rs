//! Navigation logic for the viewer.
//!
//! [`cursor`] computes next/previous targets over a list snapshot and
//! re-resolves the active entry when the list shrinks.

pub mod cursor;

pub use cursor::{Bounds, FallbackPolicy, Resolution};
