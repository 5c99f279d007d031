//! Resource fetcher port
//!
//! The pull side of the protocol: arbitrary method + path + body against
//! the resource endpoint, returning decoded JSON or a structured error.
//! The domain defines the interface; the HTTP crate provides the
//! implementation, and tests substitute canned-response stubs.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

use crate::error::FetchError;

/// Result type for fetcher operations
pub type FetchResult<T> = Result<T, FetchError>;

/// HTTP method of a resource request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Get the wire representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pull access to the remote resource endpoint
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    /// Perform a request and decode the JSON response body
    ///
    /// `params` are appended as query parameters. Non-success responses
    /// surface as [`FetchError`], never as a raw body.
    async fn request(
        &self,
        method: Method,
        path: &str,
        params: &[(String, String)],
        body: Option<Value>,
    ) -> FetchResult<Value>;

    /// Convenience GET without parameters or body
    async fn get(&self, path: &str) -> FetchResult<Value> {
        self.request(Method::Get, path, &[], None).await
    }
}
