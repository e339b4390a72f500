//! Billing API access
//!
//! [`BillingApi`] is the seam between the step runner and the network: the
//! runner only ever sees parsed JSON or a classified [`ApiError`].

mod client;
mod request;

use async_trait::async_trait;

use crate::common::ApiError;

pub use client::HttpClient;
pub use request::{ApiRequest, Method, ResourceId};

/// Something that can execute billing API requests
#[async_trait]
pub trait BillingApi: Send + Sync {
    /// Base URL requests are resolved against
    fn base_url(&self) -> &str;

    /// Execute one request
    ///
    /// Returns the parsed body of a 2xx response. Non-2xx responses map to
    /// [`ApiError::Response`], everything else to [`ApiError::Transport`].
    async fn send(&self, request: &ApiRequest) -> Result<serde_json::Value, ApiError>;
}
