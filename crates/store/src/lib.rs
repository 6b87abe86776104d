//! Order store boundary — where raw order documents come from.
//!
//! Fetch failures are returned as [`StoreError`] values; callers decide how
//! to degrade.

pub mod error;
pub mod file;
pub mod memory;
pub mod source;

pub use error::{StoreError, StoreResult};
pub use file::{load_restaurants, JsonFileOrderStore};
pub use memory::{MemoryOrderStore, Restaurant};
pub use source::{fetch_with_timeout, OrderSource};
