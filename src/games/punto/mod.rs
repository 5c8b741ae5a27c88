//! Punto: place numbered tiles, cover weaker ones, align four to win.

pub mod board;
pub mod movegen;
pub mod render;
pub mod rules;
pub mod types;

pub use board::{Board, BoundingBox};
pub use movegen::legal_moves;
pub use rules::{can_place, validate_placement, PlacementError, WIN_RUN_LENGTH};
pub use types::{Alignment, ContinuationCell, Direction, PlayerId, Position, Tile};
