//! HTTP API handlers and response envelope

pub mod auth;
pub mod health;
pub mod trends;
pub mod users;

use serde::Serialize;

/// Pagination block attached to list responses
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

/// Uniform response envelope for every endpoint
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<PageMeta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: &str, data: T) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            data: Some(data),
            meta: None,
        }
    }

    pub fn ok_paginated(message: &str, data: T, meta: PageMeta) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            data: Some(data),
            meta: Some(meta),
        }
    }
}
