pub mod gemini;
pub mod job;

pub use job::{Job, JobDraft, LocationData, UserRole};
