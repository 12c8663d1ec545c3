//! Client-side session, routing, and provider access for userapp.
//!
//! ARCHITECTURE
//! ============
//! `state::auth::SessionStore` is the single authority for who is signed in.
//! It talks to the hosted auth provider through the `net::provider` traits,
//! persists the signed-in identity through `util::persistence`, and publishes
//! every state change to observers such as `util::auth::RouteGuard`.
//!
//! `pages` holds route-scoped orchestration (validation, submit flows, view
//! models). Rendering lives outside this crate.

pub mod config;
pub mod net;
pub mod pages;
pub mod state;
pub mod util;
