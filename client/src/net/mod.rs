//! Networking modules for the hosted auth + database provider.
//!
//! SYSTEM CONTEXT
//! ==============
//! `provider` defines the seams the rest of the crate depends on, `supabase`
//! implements them over HTTP, and `types` defines the shared wire schema.

pub mod provider;
pub mod supabase;
pub mod types;

#[cfg(test)]
pub(crate) mod fake;
