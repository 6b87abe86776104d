pub mod config;
pub mod context;
pub mod error;
pub mod loyalty;
pub mod order;

pub use config::AppConfig;
pub use context::{RequestContext, StoreFilter};
pub use error::{DineError, DineResult};
pub use order::{Order, OrderDocument};
