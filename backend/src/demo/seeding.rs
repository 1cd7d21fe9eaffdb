//! Demo shop seeding through the domain services.

use std::path::Path;

use cap_std::{ambient_authority, fs::Dir};
use demo_data::{DemoCustomer, RegistryError, SeedRegistry, generate_demo_shop};
use thiserror::Error;
use tracing::info;

use crate::domain::ports::{RepositoryError, Repositories};
use crate::domain::{
    ChangePlanRequest, CreateCustomerRequest, CreateVehicleRequest, Error, FuelType, OwnerAccount,
    Principal, RegisterTenantRequest, Role, SubscriptionPlan,
};
use crate::inbound::http::state::HttpState;

/// Slug of the seeded tenant.
pub const DEMO_SLUG: &str = "demo-garage";

/// Login of the seeded owner.
pub const DEMO_OWNER_EMAIL: &str = "owner@demo-garage.example";

/// Password of the seeded owner.
pub const DEMO_OWNER_PASSWORD: &str = "demo-garage-owner";

/// Errors raised while seeding the demo shop.
#[derive(Debug, Error)]
pub enum DemoSeedError {
    /// The registry file could not be read.
    #[error("failed to read demo registry at {path}: {source}")]
    RegistryRead {
        /// Path to the registry file.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The registry was invalid or lacked the seed.
    #[error("demo registry error: {0}")]
    Registry(#[from] RegistryError),
    /// The generator could not produce the shop.
    #[error("demo generation error: {0}")]
    Generation(#[from] demo_data::GenerationError),
    /// Counting existing tenants failed.
    #[error("demo store check failed: {0}")]
    Store(#[from] RepositoryError),
    /// A domain service rejected a generated record.
    #[error("demo seeding rejected: {0}")]
    Domain(#[from] Error),
}

/// What seeding did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoSeedOutcome {
    /// The store already held tenants.
    Skipped,
    /// The demo shop was created.
    Applied {
        /// Customers created.
        customers: usize,
        /// Vehicles created.
        vehicles: usize,
    },
}

/// Load a registry from `path`, or the bundled one when `path` is `None`.
///
/// # Errors
///
/// Returns [`DemoSeedError`] when the file cannot be read or parsed.
pub fn load_registry(path: Option<&Path>) -> Result<SeedRegistry, DemoSeedError> {
    let Some(path) = path else {
        return Ok(SeedRegistry::builtin()?);
    };
    let read_error = |source| DemoSeedError::RegistryRead {
        path: path.display().to_string(),
        source,
    };
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path.file_name().ok_or_else(|| {
        read_error(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "registry path must name a file",
        ))
    })?;
    let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(read_error)?;
    let contents = dir.read_to_string(file_name).map_err(read_error)?;
    Ok(SeedRegistry::from_json(&contents)?)
}

/// Register and fill the demo shop unless the store already has tenants.
///
/// # Errors
///
/// Returns [`DemoSeedError`] when the seed is unknown or a service rejects a
/// generated record.
pub async fn seed_demo_shop(
    repos: &Repositories,
    state: &HttpState,
    registry: &SeedRegistry,
    seed_name: &str,
) -> Result<DemoSeedOutcome, DemoSeedError> {
    if repos.tenants.count().await? > 0 {
        info!(reason = "store not empty", "demo seeding skipped");
        return Ok(DemoSeedOutcome::Skipped);
    }
    let seed = registry.find_seed(seed_name)?;
    let shop = generate_demo_shop(seed)?;

    let registration = state
        .tenants
        .register(RegisterTenantRequest {
            name: "Demo Garage".into(),
            slug: DEMO_SLUG.into(),
            owner: OwnerAccount {
                email: DEMO_OWNER_EMAIL.into(),
                password: DEMO_OWNER_PASSWORD.into(),
                first_name: "Demo".into(),
                last_name: "Owner".into(),
            },
        })
        .await?;
    let owner = Principal {
        user_id: registration.user.id,
        tenant_id: registration.tenant.id,
        role: Role::Owner,
    };
    state
        .tenants
        .change_plan(
            &owner,
            ChangePlanRequest {
                plan: SubscriptionPlan::Enterprise,
            },
        )
        .await?;

    let mut vehicles = 0;
    for customer in &shop.customers {
        vehicles += seed_customer(state, &owner, customer).await?;
    }
    info!(
        seed = seed.name(),
        tenant_id = %owner.tenant_id,
        customers = shop.customers.len(),
        vehicles,
        owner = DEMO_OWNER_EMAIL,
        "demo shop seeded"
    );
    Ok(DemoSeedOutcome::Applied {
        customers: shop.customers.len(),
        vehicles,
    })
}

async fn seed_customer(
    state: &HttpState,
    owner: &Principal,
    demo: &DemoCustomer,
) -> Result<usize, DemoSeedError> {
    let customer = state
        .customers
        .create(
            owner,
            CreateCustomerRequest {
                first_name: demo.first_name.clone(),
                last_name: demo.last_name.clone(),
                email: Some(demo.email.clone()),
                phone: demo.phone.clone(),
                address: None,
            },
        )
        .await?;
    for vehicle in &demo.vehicles {
        state
            .vehicles
            .create(
                owner,
                CreateVehicleRequest {
                    customer_id: customer.id,
                    make: vehicle.make.clone(),
                    model: vehicle.model.clone(),
                    year: vehicle.year,
                    vin: Some(vehicle.vin.clone()),
                    license_plate: vehicle.license_plate.clone(),
                    color: Some(vehicle.color.clone()),
                    mileage: vehicle.mileage,
                    engine: None,
                    transmission: None,
                    fuel_type: vehicle.fuel_type.as_str().parse::<FuelType>().ok(),
                },
            )
            .await?;
    }
    Ok(demo.vehicles.len())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;
    use mockable::DefaultClock;

    use super::*;
    use crate::domain::{CustomerFilter, LoginCredentials, WebhookVerifier};
    use crate::inbound::http::state::HttpStatePorts;
    use crate::outbound::files::LocalFileStore;
    use crate::outbound::memory::MemoryStore;
    use crate::outbound::security::{BcryptPasswordHasher, JwtTokenService};
    use pagination::PageRequest;

    fn wiring(uploads: &Path) -> (Repositories, HttpState) {
        let repos = MemoryStore::new().repositories();
        let state = HttpState::new(HttpStatePorts {
            repositories: repos.clone(),
            hasher: Arc::new(BcryptPasswordHasher::with_cost(4)),
            tokens: Arc::new(JwtTokenService::new(b"demo-secret", Duration::hours(1))),
            files: Arc::new(LocalFileStore::new(uploads)),
            webhooks: WebhookVerifier::new(None),
            clock: Arc::new(DefaultClock),
        });
        (repos, state)
    }

    #[tokio::test]
    async fn seeds_an_empty_store_once() {
        let uploads = tempfile::tempdir().expect("upload dir");
        let (repos, state) = wiring(uploads.path());
        let registry = load_registry(None).expect("bundled registry");

        let outcome = seed_demo_shop(&repos, &state, &registry, "single-bay")
            .await
            .expect("seeded");
        assert_eq!(
            outcome,
            DemoSeedOutcome::Applied {
                customers: 3,
                vehicles: 3
            }
        );

        let credentials = LoginCredentials::try_from_parts(DEMO_OWNER_EMAIL, DEMO_OWNER_PASSWORD)
            .expect("credentials");
        let login = state
            .auth
            .login(&credentials)
            .await
            .expect("demo owner can sign in");
        let owner = Principal {
            user_id: login.user.id,
            tenant_id: login.user.tenant_id,
            role: Role::Owner,
        };
        let customers = state
            .customers
            .list(&owner, &CustomerFilter::default(), PageRequest::default())
            .await
            .expect("customers");
        assert_eq!(customers.total, 3);

        let again = seed_demo_shop(&repos, &state, &registry, "single-bay")
            .await
            .expect("second run");
        assert_eq!(again, DemoSeedOutcome::Skipped);
    }

    #[tokio::test]
    async fn unknown_seed_is_reported() {
        let uploads = tempfile::tempdir().expect("upload dir");
        let (repos, state) = wiring(uploads.path());
        let registry = load_registry(None).expect("bundled registry");
        let err = seed_demo_shop(&repos, &state, &registry, "nope")
            .await
            .expect_err("unknown seed");
        assert!(matches!(
            err,
            DemoSeedError::Registry(RegistryError::SeedNotFound { .. })
        ));
    }

    #[test]
    fn missing_registry_file_names_the_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("seeds.json");
        let err = load_registry(Some(&path)).expect_err("file missing");
        assert!(matches!(err, DemoSeedError::RegistryRead { .. }));
    }
}
