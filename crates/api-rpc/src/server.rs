//! JSON-RPC Server
//!
//! Implements the JSON-RPC 2.0 server over localhost TCP.

use crate::handler::AdmissionHandler;
use crate::types::{
    EntranceStatusRequest, OrderStatusRequest, RegisterEntranceRequest, RegisterOrderRequest,
    ReleaseOrderRequest, StatsRequest,
};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::RpcModule;
use std::sync::Arc;
use tracing::info;
use turnstile_core::application::AdmissionQueue;
use turnstile_core::port::TokenProvider;

const DEFAULT_RPC_HOST: &str = "127.0.0.1";
const DEFAULT_RPC_PORT: u16 = 9640;

/// RPC Server Configuration
pub struct RpcServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
        }
    }
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: Arc<AdmissionHandler>,
}

impl RpcServer {
    pub fn new(
        config: RpcServerConfig,
        entrance: Arc<AdmissionQueue>,
        order: Arc<AdmissionQueue>,
        token_provider: Arc<dyn TokenProvider>,
    ) -> Self {
        Self {
            config,
            handler: Arc::new(AdmissionHandler::new(entrance, order, token_provider)),
        }
    }

    /// Start the JSON-RPC server
    ///
    /// Security: only binds to 127.0.0.1 by default (no external access);
    /// the gateway in front of it owns the public surface.
    pub async fn start(self) -> Result<ServerHandle, String> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        info!(
            host = %self.config.host,
            port = %self.config.port,
            "Starting JSON-RPC server"
        );

        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|e| format!("Failed to build server on {}: {}", addr, e))?;

        let mut module = RpcModule::new(());

        // Register methods
        let handler = self.handler.clone();
        module
            .register_async_method("entrance.register.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: RegisterEntranceRequest = params.parse()?;
                    handler.register_entrance(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("entrance.status.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: EntranceStatusRequest = params.parse()?;
                    handler.entrance_status(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("order.register.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: RegisterOrderRequest = params.parse()?;
                    handler.register_order(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("order.status.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: OrderStatusRequest = params.parse()?;
                    handler.order_status(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("order.release.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: ReleaseOrderRequest = params.parse()?;
                    handler.release_order(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("admin.stats.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: StatsRequest = params.parse()?;
                    handler.stats(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        info!("JSON-RPC server started successfully");

        let handle = server.start(module);
        Ok(handle)
    }
}
