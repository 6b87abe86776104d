#![warn(clippy::unwrap_used)]

pub mod error;
pub mod geo_proxy;
pub mod loyalty_rest;
pub mod order_rest;
pub mod restaurant_rest;
pub mod rest;
pub mod server;

pub use error::ApiError;
pub use rest::AppState;
pub use server::ApiServer;
