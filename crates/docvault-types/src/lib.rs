//! Docvault Types - Shared domain types
//!
//! This crate contains domain types used across the docvault auth subsystem:
//! - User identity and roles
//! - Session and reset-token identifiers and claims

pub mod session;
pub mod user;

pub use session::*;
pub use user::*;
