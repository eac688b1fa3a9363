//! Access to the device-management API. [ManagementApi] is the seam between the report and the
//! network; [client::JamfClient] is the realization used outside of tests.

pub mod client;
pub mod xml;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::UsageWindow;

/// Raw answer of the API. Statuses are interpreted by the caller, because a failed inventory
/// request and a failed usage request mean different things for the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    #[cfg(test)]
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ManagementApi: Send + Sync {
    /// Computers that report `application` as installed.
    async fn computers_with_application(&self, application: &str) -> Result<ApiResponse>;

    /// Application usage logged by a single computer during `window`.
    async fn application_usage(
        &self,
        serial_number: &str,
        window: &UsageWindow,
    ) -> Result<ApiResponse>;
}
