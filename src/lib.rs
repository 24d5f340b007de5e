pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod fare;
pub mod models;
pub mod observability;
pub mod session;
pub mod state;
pub mod store;
