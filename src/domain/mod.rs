//! Core domain types and logic.

pub mod price;
pub mod daily_move;
pub mod bias;
pub mod decision;
pub mod lot;
pub mod portfolio;
pub mod simulation;
pub mod analysis;
pub mod metrics;
pub mod sweep;
pub mod config_validation;
pub mod error;
