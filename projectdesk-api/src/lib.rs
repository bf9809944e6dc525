//! # ProjectDesk API Server Library
//!
//! REST/JSON backend for managing clients, projects and tasks, with bearer
//! token authentication and role based permissions.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Request extractors with JSON rejections
//! - `middleware`: Authentication and permission interceptors
//! - `routes`: API route handlers
//! - `validation`: Per-field validation errors

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod validation;
