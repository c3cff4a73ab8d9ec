// SQLite Infrastructure Layer
// Implements the OrderedMemberStore port over a WAL-mode SQLite pool

pub mod connection;
pub mod member_store;
pub mod migration;

pub use connection::create_pool;
pub use member_store::SqliteMemberStore;
pub use migration::run_migrations;
