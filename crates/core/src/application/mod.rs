// Application Layer - Admission use cases and background loops

pub mod queue;
pub mod scheduler;
pub mod shutdown;

pub use queue::AdmissionQueue;
pub use scheduler::{EvictionScheduler, PromotionScheduler};
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};
