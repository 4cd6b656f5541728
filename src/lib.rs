// src/lib.rs

pub mod cache;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod reports;
pub mod routes;
pub mod session;
pub mod state;
pub mod store;
pub mod utils;
pub mod wizard;

pub use routes::create_router;
