/// Request interceptors for the API server
///
/// - `auth`: bearer token authentication and per-route permission checks

pub mod auth;
