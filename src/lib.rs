//! lms_portal: client core of the multi-tenant learning portal
//!
//! Resolves the tenant from the hostname, keeps the signed-in session, and
//! decides which layout and page a request path mounts.
//!
//! This lib exposes the resolver, session holder, route gate and the HTTP
//! client they share.

pub mod error;
pub mod config;
pub mod models;
pub mod store;
// Bearer-token helpers (JWT claims peeking)
pub mod auth;
pub mod api;
pub mod tenant;
pub mod session;
pub mod gate;
// Explicit context object tying tenant + session to the gate
pub mod portal;

pub use error::{PortalError, PortalResult};
pub use portal::{HttpPortal, Portal};
