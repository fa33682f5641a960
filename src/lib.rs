//! Learning Agent Backend
//!
//! A personalized learning-path assistant with:
//! - Deterministic plan generation and module unlock progression
//! - Structured quiz generation and evaluation with feedback tiers
//! - Durable per-user progress profiles
//! - Named tool dispatch for a conversational driver
//! - Activity timeline for observability

pub mod agent;
pub mod api;
pub mod config;

pub use agent::*;
pub use api::*;
pub use config::*;
