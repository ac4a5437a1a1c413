//! Matching Engine Service
//!
//! Continuous limit-order matching for an item exchange. Every item has its
//! own two-sided book with price-time priority; incoming orders cross
//! against the best opposite orders and any remainder rests.
//!
//! **Key Invariants:**
//! - Price-time priority strictly enforced
//! - Fills execute at the resting order's price
//! - Conservation of quantity
//! - A failed storage commit leaves books and registry untouched

pub mod book;
pub mod matching;
pub mod clock;
pub mod config;
pub mod registry;
pub mod engine;

pub use config::{ConfigError, EngineConfig, SelfTradePolicy};
pub use engine::{MatchingEngine, SubmitResult};
pub use registry::OrderRegistry;
