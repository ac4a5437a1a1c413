//! Types library for the item exchange
//!
//! This library provides the core type definitions shared by the matching
//! engine and the storage adapters, so that both sides of the storage
//! boundary agree on what an order and a fill look like.
//!
//! # Modules
//! - `ids`: Unique identifiers (OrderId, FillId, UserId, ItemId)
//! - `numeric`: Price and quantity newtypes
//! - `order`: Order lifecycle types
//! - `fill`: Match execution records
//! - `filter`: Order query criteria
//! - `storage`: Storage adapter contract
//! - `errors`: Error taxonomy

// Public modules
pub mod ids;
pub mod numeric;
pub mod order;
pub mod fill;
pub mod filter;
pub mod storage;
pub mod errors;

