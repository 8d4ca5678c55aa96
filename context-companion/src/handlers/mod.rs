//! HTTP handlers.

pub mod auth;
pub mod features;
pub mod health;
