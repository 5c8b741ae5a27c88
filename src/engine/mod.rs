pub mod models;
pub mod game;
pub mod input;
pub mod simulator;
pub mod arena;
pub mod bot_strategy;
pub mod bot_profiles;
pub mod remote;
