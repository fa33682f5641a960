//! Agent Module - Core of the Learning Path Assistant
//!
//! Architecture:
//! - Types: domain entities with construction-time validation
//! - Planner: deterministic plan generation and unlock progression
//! - Profile: flat-file JSON persistence of per-user progress
//! - Quiz: attempt scoring, feedback tiers, generation collaborator seam
//! - Resources: resource-search collaborator seam with curated fallback
//! - Tools: named tool dispatch for the conversational driver
//! - Memory: persistent activity timeline for observability

pub mod memory;
pub mod planner;
pub mod profile;
pub mod quiz;
pub mod resources;
pub mod tools;
pub mod types;

pub use memory::*;
pub use planner::*;
pub use profile::*;
pub use quiz::*;
pub use resources::*;
pub use tools::*;
pub use types::*;
