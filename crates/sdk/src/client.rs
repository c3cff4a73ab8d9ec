//! Turnstile Client Implementation

use crate::error::{Result, SdkError};
use crate::types::{AckResponse, QueueStatusResponse, RegisterEntranceResponse, StatsResponse};
use jsonrpsee::core::client::ClientT;
use jsonrpsee::core::params::ObjectParams;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use std::time::Duration;

/// Turnstile admission daemon client
///
/// # Example
///
/// ```no_run
/// use turnstile_sdk::TurnstileClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = TurnstileClient::connect("http://127.0.0.1:9640").await?;
/// # Ok(())
/// # }
/// ```
pub struct TurnstileClient {
    client: HttpClient,
}

impl TurnstileClient {
    /// Connect to the Turnstile daemon
    ///
    /// # Arguments
    ///
    /// * `url` - RPC endpoint URL (e.g., `http://127.0.0.1:9640`)
    pub async fn connect(url: impl AsRef<str>) -> Result<Self> {
        let url = url.as_ref();

        let client = HttpClientBuilder::default()
            .request_timeout(Duration::from_secs(30))
            .build(url)
            .map_err(|e| SdkError::Connection(format!("Failed to create client: {}", e)))?;

        Ok(Self { client })
    }

    /// Register for the entrance queue.
    ///
    /// Pass `None` for anonymous traffic; the daemon mints a token that must
    /// be echoed back on every later `entrance_status` call.
    pub async fn register_entrance(
        &self,
        user_id: Option<&str>,
    ) -> Result<RegisterEntranceResponse> {
        let mut params = ObjectParams::new();
        if let Some(id) = user_id {
            params.insert("user_id", id)?;
        }
        let response = self.client.request("entrance.register.v1", params).await?;
        Ok(response)
    }

    /// Poll the entrance queue position for a token.
    pub async fn entrance_status(&self, token: &str) -> Result<QueueStatusResponse> {
        let mut params = ObjectParams::new();
        params.insert("token", token)?;
        let response = self.client.request("entrance.status.v1", params).await?;
        Ok(response)
    }

    /// Register for the order queue with an authenticated user id.
    pub async fn register_order(&self, user_id: &str) -> Result<AckResponse> {
        let mut params = ObjectParams::new();
        params.insert("user_id", user_id)?;
        let response = self.client.request("order.register.v1", params).await?;
        Ok(response)
    }

    /// Poll the order queue position; renews the lease while admitted.
    pub async fn order_status(&self, user_id: &str) -> Result<QueueStatusResponse> {
        let mut params = ObjectParams::new();
        params.insert("user_id", user_id)?;
        let response = self.client.request("order.status.v1", params).await?;
        Ok(response)
    }

    /// Release the order slot once the protected action is finished.
    ///
    /// Idempotent - releasing an unknown or already-released id succeeds.
    pub async fn release_order(&self, user_id: &str) -> Result<AckResponse> {
        let mut params = ObjectParams::new();
        params.insert("user_id", user_id)?;
        let response = self.client.request("order.release.v1", params).await?;
        Ok(response)
    }

    /// Fetch per-queue occupancy statistics.
    pub async fn stats(&self) -> Result<StatsResponse> {
        let params = ObjectParams::new();
        let response = self.client.request("admin.stats.v1", params).await?;
        Ok(response)
    }
}
