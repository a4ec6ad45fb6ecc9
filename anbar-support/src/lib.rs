//! # Anbar Support
//!
//! Shared utilities for the anbar container crates.
//!
//! Currently this is the suggestion machinery used to render
//! "did you mean?" hints in error messages.

pub mod hints;

pub use hints::closest_matches;
