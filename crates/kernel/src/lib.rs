//! Book catalog kernel library.
//!
//! Category resolution, curated lists, search and usage counters over a
//! pluggable store, plus the HTTP routes exposing them. The server binary is
//! `catalog`.

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;

pub use config::Config;
pub use state::AppState;
