//! Turnstile SDK - Rust Client Library
//!
//! Provides a convenient client for the Turnstile admission daemon. The
//! typical flow for the order pipeline: register, poll until `allowed`,
//! perform the protected action, then release.
//!
//! # Example
//!
//! ```no_run
//! use turnstile_sdk::TurnstileClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect to daemon
//!     let client = TurnstileClient::connect("http://127.0.0.1:9640").await?;
//!
//!     // Join the order queue
//!     client.register_order("user-42").await?;
//!
//!     // Poll until admitted
//!     loop {
//!         let status = client.order_status("user-42").await?;
//!         if status.allowed {
//!             break;
//!         }
//!         tokio::time::sleep(std::time::Duration::from_secs(1)).await;
//!     }
//!
//!     // ... submit the order, then free the slot
//!     client.release_order("user-42").await?;
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod types;

pub use client::TurnstileClient;
pub use error::{Result, SdkError};
pub use types::{
    AckResponse, QueueStats, QueueStatusResponse, RegisterEntranceResponse, StatsResponse,
};
