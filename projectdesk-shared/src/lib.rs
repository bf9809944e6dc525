//! # ProjectDesk Shared Library
//!
//! This crate contains the data model, persistence helpers and the
//! authentication/authorization primitives used by the ProjectDesk API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their queries
//! - `auth`: Password hashing, access tokens and role permissions
//! - `db`: Connection pool, migrations and demo seeding

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the ProjectDesk shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
