//! Application state owned by the client.
//!
//! SYSTEM CONTEXT
//! ==============
//! State modules hold the data pages and guards read; mutation goes through
//! the owning type so persistence and observers stay consistent.

pub mod auth;
pub mod settings;
