// src/discovery/mod.rs
//! Generative-service backed features: nearby opportunities and employer descriptions

pub mod description;
pub mod opportunities;

pub use description::DescriptionWriter;
pub use opportunities::{merge_external_jobs, OpportunityFinder};
