//! Utility helpers shared across client modules.
//!
//! SYSTEM CONTEXT
//! ==============
//! Utility modules isolate environment concerns (durable storage, routing,
//! input checks) from page and state logic to improve reuse and testability.

pub mod auth;
pub mod persistence;
pub mod validate;
