// src/core/mod.rs
//! Collaborator adapters: the generative service and the position capability

pub mod gemini_client;
pub mod location;

pub use gemini_client::{GeminiClient, GenerativeService};
pub use location::{acquire_location, PositionSource};
