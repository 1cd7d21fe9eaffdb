//! Backend library modules.
//!
//! The crate follows a hexagonal layout: [`domain`] holds entities, ports and
//! services; [`inbound`] adapts HTTP requests onto the services; [`outbound`]
//! implements the ports for PostgreSQL, memory, credentials and files.

pub mod demo;
pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
