/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Login and logout
/// - `clients`: Client CRUD (bearer token and permission required)
/// - `projects`: Project CRUD with filtering
/// - `tasks`: Task CRUD with filtering
/// - `admin`: Permission cache reload

pub mod admin;
pub mod auth;
pub mod clients;
pub mod health;
pub mod projects;
pub mod tasks;

use axum::{http::StatusCode, Json};
use serde::Serialize;

/// Success envelope carrying a record or a list of records
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub message: String,
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    pub fn new(message: impl Into<String>, data: T) -> Json<Self> {
        Json(Self {
            message: message.into(),
            data,
        })
    }

    /// 201 Created with the new record
    pub fn created(message: impl Into<String>, data: T) -> (StatusCode, Json<Self>) {
        (StatusCode::CREATED, Self::new(message, data))
    }
}

/// Envelope for responses without a payload, such as deletes
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

/// Query string value, with an empty string treated as absent
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
