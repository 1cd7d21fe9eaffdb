//! Startup seeding of a demonstration shop.
//!
//! When enabled and the store holds no tenants, a "Demo Garage" tenant on the
//! enterprise plan is registered and filled with customers and vehicles from
//! the `demo-data` crate. The owner signs in as [`DEMO_OWNER_EMAIL`] with
//! [`DEMO_OWNER_PASSWORD`].

mod seeding;

pub use seeding::{
    DEMO_OWNER_EMAIL, DEMO_OWNER_PASSWORD, DEMO_SLUG, DemoSeedError, DemoSeedOutcome,
    load_registry, seed_demo_shop,
};
