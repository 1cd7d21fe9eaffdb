//! HTTP inbound adapter exposing the `/api/v1` REST surface.

pub mod accounts;
pub mod appointments;
pub mod attachments;
pub mod auth;
pub mod customers;
pub mod error;
pub mod health;
pub mod inventory;
pub mod invoices;
pub mod reports;
pub mod routes;
pub mod schemas;
pub mod state;
pub mod tenants;
#[cfg(test)]
pub mod test_utils;
pub mod users;
pub mod validation;
pub mod vehicles;
pub mod work_orders;

pub use error::ApiResult;
