//! Punto: rules engine, match state machine and computer strategies.

pub mod engine;
pub mod games;
