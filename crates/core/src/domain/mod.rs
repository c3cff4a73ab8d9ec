// Domain Layer - Admission queue models

pub mod error;
pub mod member;
pub mod policy;

pub use error::DomainError;
pub use member::{MemberState, QueueStatus, Token};
pub use policy::PromotionPolicy;
