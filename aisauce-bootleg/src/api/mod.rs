//! HTTP API handlers for the bootleg server

pub mod downloads;
pub mod health;

pub use downloads::download_routes;
pub use health::health_routes;
