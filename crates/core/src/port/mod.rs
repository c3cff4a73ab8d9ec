// Port Layer - Interfaces for external dependencies

pub mod member_store;
pub mod time_provider;
pub mod token_provider;

// Re-exports
pub use member_store::OrderedMemberStore;
pub use time_provider::TimeProvider;
pub use token_provider::TokenProvider;
