//! RPC Method Handlers
//!
//! Implements identity resolution and queue dispatch for each JSON-RPC
//! method. `allowed: true` in a status payload is the sole admission signal
//! the downstream order-creation endpoint should trust.

use crate::error::{throttled, to_rpc_error};
use crate::rate_limiter::RateLimiter;
use crate::types::{
    AckResponse, EntranceStatusRequest, OrderStatusRequest, QueueStats, QueueStatusResponse,
    RegisterEntranceRequest, RegisterEntranceResponse, RegisterOrderRequest, ReleaseOrderRequest,
    StatsRequest, StatsResponse,
};
use jsonrpsee::types::ErrorObjectOwned;
use std::sync::Arc;
use turnstile_core::application::AdmissionQueue;
use turnstile_core::domain::PromotionPolicy;
use turnstile_core::error::AppError;
use turnstile_core::port::TokenProvider;

/// RPC Handler with injected dependencies
pub struct AdmissionHandler {
    entrance: Arc<AdmissionQueue>,
    order: Arc<AdmissionQueue>,
    token_provider: Arc<dyn TokenProvider>,
    rate_limiter: Arc<RateLimiter>,
    start_time: std::time::Instant,
}

impl AdmissionHandler {
    pub fn new(
        entrance: Arc<AdmissionQueue>,
        order: Arc<AdmissionQueue>,
        token_provider: Arc<dyn TokenProvider>,
    ) -> Self {
        // Default: 200 burst, 100 req/sec (configurable via env)
        let max_burst: u32 = std::env::var("TURNSTILE_RATE_LIMIT_BURST")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(200);

        let rate_per_sec: u32 = std::env::var("TURNSTILE_RATE_LIMIT_RATE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(100);

        Self {
            entrance,
            order,
            token_provider,
            rate_limiter: Arc::new(RateLimiter::new(max_burst, rate_per_sec)),
            start_time: std::time::Instant::now(),
        }
    }

    /// entrance.register.v1
    ///
    /// Authenticated callers pass their stable id (repeat registration
    /// collapses to one slot); anonymous callers get a minted token back.
    pub async fn register_entrance(
        &self,
        params: RegisterEntranceRequest,
    ) -> Result<RegisterEntranceResponse, ErrorObjectOwned> {
        if !self.rate_limiter.check().await {
            return Err(throttled());
        }

        let token = match params.user_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => self.token_provider.generate_token(),
        };

        self.entrance
            .register(&token)
            .await
            .map_err(to_rpc_error)?;

        Ok(RegisterEntranceResponse { token })
    }

    /// entrance.status.v1
    pub async fn entrance_status(
        &self,
        params: EntranceStatusRequest,
    ) -> Result<QueueStatusResponse, ErrorObjectOwned> {
        let token = require_identity(&params.token, "token")?;

        let status = self.entrance.status(token).await.map_err(to_rpc_error)?;
        Ok(status.into())
    }

    /// order.register.v1
    pub async fn register_order(
        &self,
        params: RegisterOrderRequest,
    ) -> Result<AckResponse, ErrorObjectOwned> {
        if !self.rate_limiter.check().await {
            return Err(throttled());
        }

        let user_id = require_identity(&params.user_id, "user_id")?;

        self.order.register(user_id).await.map_err(to_rpc_error)?;

        Ok(AckResponse {
            user_id: user_id.to_string(),
            acknowledged: true,
        })
    }

    /// order.status.v1
    pub async fn order_status(
        &self,
        params: OrderStatusRequest,
    ) -> Result<QueueStatusResponse, ErrorObjectOwned> {
        let user_id = require_identity(&params.user_id, "user_id")?;

        let status = self.order.status(user_id).await.map_err(to_rpc_error)?;
        Ok(status.into())
    }

    /// order.release.v1
    ///
    /// Triggered by the order pipeline's "order attempt finished" event;
    /// idempotent for unknown ids.
    pub async fn release_order(
        &self,
        params: ReleaseOrderRequest,
    ) -> Result<AckResponse, ErrorObjectOwned> {
        if !self.rate_limiter.check().await {
            return Err(throttled());
        }

        let user_id = require_identity(&params.user_id, "user_id")?;

        self.order.release(user_id).await.map_err(to_rpc_error)?;

        Ok(AckResponse {
            user_id: user_id.to_string(),
            acknowledged: true,
        })
    }

    /// admin.stats.v1
    pub async fn stats(&self, _params: StatsRequest) -> Result<StatsResponse, ErrorObjectOwned> {
        let (entrance_waiting, entrance_active) =
            self.entrance.counts().await.map_err(to_rpc_error)?;
        let (order_waiting, order_active) = self.order.counts().await.map_err(to_rpc_error)?;

        let order_capacity = match self.order.policy() {
            PromotionPolicy::Capacity { max_capacity } => max_capacity,
            PromotionPolicy::Rate { .. } => 0,
        };

        Ok(StatsResponse {
            entrance: QueueStats {
                policy: self.entrance.policy().to_string(),
                waiting: entrance_waiting,
                active: entrance_active,
            },
            order: QueueStats {
                policy: self.order.policy().to_string(),
                waiting: order_waiting,
                active: order_active,
            },
            order_capacity,
            uptime_seconds: self.start_time.elapsed().as_secs() as i64,
        })
    }
}

fn require_identity<'a>(value: &'a str, field: &str) -> Result<&'a str, ErrorObjectOwned> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(to_rpc_error(AppError::Validation(format!(
            "{} must not be empty",
            field
        ))));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::code;
    use turnstile_core::port::member_store::memory::MemoryMemberStore;
    use turnstile_core::port::time_provider::SystemTimeProvider;

    struct FixedTokenProvider;

    impl TokenProvider for FixedTokenProvider {
        fn generate_token(&self) -> String {
            "minted-token".to_string()
        }
    }

    fn make_queue(name: &str, policy: PromotionPolicy) -> Arc<AdmissionQueue> {
        Arc::new(AdmissionQueue::new(
            name,
            policy,
            Arc::new(MemoryMemberStore::new()),
            Arc::new(MemoryMemberStore::new()),
            Arc::new(SystemTimeProvider),
        ))
    }

    fn make_handler() -> AdmissionHandler {
        AdmissionHandler::new(
            make_queue("entrance", PromotionPolicy::rate(10).unwrap()),
            make_queue("order", PromotionPolicy::capacity(5).unwrap()),
            Arc::new(FixedTokenProvider),
        )
    }

    #[tokio::test]
    async fn test_anonymous_entrance_gets_minted_token() {
        let handler = make_handler();

        let response = handler
            .register_entrance(RegisterEntranceRequest { user_id: None })
            .await
            .unwrap();
        assert_eq!(response.token, "minted-token");

        // The minted token is a live wait-set member
        let status = handler
            .entrance_status(EntranceStatusRequest {
                token: response.token,
            })
            .await
            .unwrap();
        assert_eq!(status.rank, 1);
    }

    #[tokio::test]
    async fn test_authenticated_entrance_keeps_caller_id() {
        let handler = make_handler();

        let response = handler
            .register_entrance(RegisterEntranceRequest {
                user_id: Some("user-42".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(response.token, "user-42");
    }

    #[tokio::test]
    async fn test_order_register_requires_user_id() {
        let handler = make_handler();

        let err = handler
            .register_order(RegisterOrderRequest {
                user_id: "  ".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), code::VALIDATION_ERROR);
    }

    #[tokio::test]
    async fn test_unknown_order_status_is_not_registered() {
        let handler = make_handler();

        let status = handler
            .order_status(OrderStatusRequest {
                user_id: "nobody".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(status.rank, -1);
        assert!(!status.allowed);
    }

    #[tokio::test]
    async fn test_release_unknown_order_is_acknowledged() {
        let handler = make_handler();

        let ack = handler
            .release_order(ReleaseOrderRequest {
                user_id: "nobody".to_string(),
            })
            .await
            .unwrap();
        assert!(ack.acknowledged);
    }

    #[tokio::test]
    async fn test_stats_reports_counts_and_capacity() {
        let handler = make_handler();

        handler
            .register_order(RegisterOrderRequest {
                user_id: "buyer-1".to_string(),
            })
            .await
            .unwrap();

        let stats = handler.stats(StatsRequest {}).await.unwrap();
        assert_eq!(stats.order.waiting, 1);
        assert_eq!(stats.order.active, 0);
        assert_eq!(stats.order_capacity, 5);
    }
}
