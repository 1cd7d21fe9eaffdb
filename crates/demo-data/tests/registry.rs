//! Integration tests for registry loading and shop generation through the
//! public API.

#![expect(
    clippy::expect_used,
    reason = "test code uses expect for clear failure messages"
)]

use std::fs;

use demo_data::{
    DEFAULT_SEED_NAME, RegistryError, SeedRegistry, generate_demo_shop, is_valid_vin,
};
use rstest::rstest;

const VALID_JSON: &str = r#"{
    "version": 1,
    "seeds": [
        {"name": "quiet-garage", "seed": 2024, "customerCount": 4, "vehiclesPerCustomer": 2},
        {"name": "single-bay", "seed": 11, "customerCount": 1}
    ]
}"#;

#[test]
fn loads_registry_from_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("seeds.json");
    fs::write(&path, VALID_JSON).expect("write registry");

    let registry = SeedRegistry::from_file(&path).expect("valid registry");
    assert_eq!(registry.version(), 1);
    assert_eq!(registry.seeds().len(), 2);
}

#[test]
fn missing_file_reports_the_path() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("absent.json");

    let err = SeedRegistry::from_file(&path).expect_err("file is missing");
    assert!(matches!(err, RegistryError::IoError { path: ref p, .. } if p == &path));
}

#[rstest]
#[case("quiet-garage", 4, 8)]
#[case("single-bay", 1, 1)]
fn generated_shops_match_their_seed(
    #[case] name: &str,
    #[case] customers: usize,
    #[case] vehicles: usize,
) {
    let registry = SeedRegistry::from_json(VALID_JSON).expect("valid registry");
    let seed = registry.find_seed(name).expect("seed found");
    let shop = generate_demo_shop(seed).expect("generated");

    assert_eq!(shop.customers.len(), customers);
    assert_eq!(shop.vehicle_count(), vehicles);
    assert!(
        shop.customers
            .iter()
            .flat_map(|c| &c.vehicles)
            .all(|v| is_valid_vin(&v.vin))
    );
}

#[test]
fn bundled_default_seed_generates() {
    let registry = SeedRegistry::builtin().expect("bundled registry");
    let seed = registry.find_seed(DEFAULT_SEED_NAME).expect("default seed");
    let shop = generate_demo_shop(seed).expect("generated");
    assert_eq!(shop.customers.len(), seed.customer_count());
}
