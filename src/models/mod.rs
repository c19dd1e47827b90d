//! Model families.
//!
//! Identifiers are classified once into a tagged `ModelCall` so every engine
//! backend dispatches exhaustively on the family instead of re-reading names.

pub mod model;

pub use model::*;
