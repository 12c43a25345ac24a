//! Nearby job board: in-memory listings, AI-assisted discovery of places that
//! might be hiring, and a JSON API over the session state.

pub mod apply;
pub mod cli;
pub mod core;
pub mod discovery;
pub mod environment;
pub mod state;
pub mod types;
pub mod utils;
pub mod web;

pub use environment::AppConfig;
pub use state::AppState;
pub use types::{Job, JobDraft, LocationData, UserRole};
