//! Router Module Index
//!
//! Splits the API routes by access level so that authentication is applied
//! explicitly at the router layer, plus the path builders used for links.

/// Prefix every API route is nested under.
pub const API_PREFIX: &str = "/api";

/// Routes accessible to anonymous clients (read-only).
pub mod public;

/// Routes protected by the `require_auth` middleware.
pub mod authenticated;

/// Builders for the URLs handed back to clients.
pub mod paths;
