//! Trait seam for game implementations.
//!
//! Games implement `GameVariant` (record shape, roster, reset) and
//! `Simulation` (prepare + driver loop). The store and the arena only talk
//! to games through these traits.

pub mod engine;

pub use engine::{require_participants, GameKind, GameVariant, Simulation};
