//! CodeGuru Context Companion gateway.
//!
//! Authenticates callers, gates features on startup flags, and dispatches
//! translation and test-generation requests to Amazon Bedrock and Amazon Q
//! Business through long-lived clients with bounded call timeouts.

pub mod backends;
pub mod config;
pub mod error;
pub mod handlers;
pub mod pool;
pub mod security;
pub mod services;
pub mod startup;

pub use startup::AppState;
