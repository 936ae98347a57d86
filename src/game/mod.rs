//! The game session engine.

pub mod error;
pub mod ledger;
pub mod matcher;
pub mod round;
pub mod session;
