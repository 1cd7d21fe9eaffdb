//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **memory**: mutex-guarded in-process repositories for tests and demos
//! - **security**: bcrypt password hashing and HS256 bearer tokens
//! - **files**: attachment storage confined to the upload directory
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod files;
pub mod memory;
pub mod persistence;
pub mod security;
