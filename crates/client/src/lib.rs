//! HTTP client for the remote workspace platform.
//!
//! The engine crates never touch this directly — they see the collaborator
//! traits from `baseops-core`. This crate supplies the production
//! implementations:
//! - Tenant token fetch with in-process caching
//! - JSON request helpers with bounded exponential-backoff retry
//! - Records API (list/fetch-all/batch create/batch update)
//! - Documents API (create + append markdown as blocks)

pub mod blocks;
pub mod client;
pub mod docs;
pub mod records;

pub use client::ApiClient;
pub use docs::Docs;
pub use records::Bitable;

use baseops_core::BaseopsError;
use thiserror::Error;

/// Errors from remote API calls.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Http {
        status: reqwest::StatusCode,
        body: String,
    },

    /// Platform envelope carried a non-zero code.
    #[error("platform error {code} on {path}: {msg}")]
    Api {
        code: i64,
        path: String,
        msg: String,
    },

    #[error("auth error: {0}")]
    Auth(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<ApiError> for BaseopsError {
    fn from(e: ApiError) -> Self {
        BaseopsError::Remote(e.to_string())
    }
}
