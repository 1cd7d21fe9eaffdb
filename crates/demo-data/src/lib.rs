//! Deterministic demo shop data for showcasing the garage backend.
//!
//! A JSON seed registry names reproducible datasets. Each seed expands into
//! customers with plausible names, phone numbers and e-mail addresses, and
//! the vehicles they own: make and model from a fixed catalogue, model year,
//! licence plate and a VIN with a valid check digit. The crate does not
//! depend on backend domain types; the backend converts the records at the
//! point of use.
//!
//! # Example
//!
//! ```
//! use demo_data::{SeedRegistry, generate_demo_shop};
//!
//! let json = r#"{
//!     "version": 1,
//!     "seeds": [{"name": "tiny", "seed": 7, "customerCount": 2, "vehiclesPerCustomer": 1}]
//! }"#;
//!
//! let registry = SeedRegistry::from_json(json).expect("valid registry");
//! let seed = registry.find_seed("tiny").expect("seed exists");
//! let shop = generate_demo_shop(seed).expect("generation succeeds");
//!
//! assert_eq!(shop.customers.len(), 2);
//! assert_eq!(shop.vehicle_count(), 2);
//! ```

mod catalogue;
mod error;
mod generator;
mod registry;
mod seed;
mod vin;

pub use error::{GenerationError, RegistryError};
pub use generator::generate_demo_shop;
pub use registry::{DEFAULT_SEED_NAME, MAX_VEHICLES_PER_CUSTOMER, SeedDefinition, SeedRegistry};
pub use seed::{DemoCustomer, DemoShop, DemoVehicle, FuelSeed};
pub use vin::{is_valid_vin, vin_check_digit};
