//! Deterministic shop generation from seed definitions.
//!
//! The same seed value always produces identical output: every random draw
//! comes from one `ChaCha8Rng` seeded with [`SeedDefinition::seed`].

use std::collections::BTreeSet;

use fake::Fake;
use fake::faker::name::raw::{FirstName, LastName};
use fake::locales::EN;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::catalogue::{COLORS, CatalogueModel, MODELS, NEWEST_YEAR, OLDEST_YEAR};
use crate::error::GenerationError;
use crate::registry::SeedDefinition;
use crate::seed::{DemoCustomer, DemoShop, DemoVehicle, FuelSeed};
use crate::vin::{VIN_ALPHABET, model_year_code, vin_check_digit};

/// Draws allowed before a unique field gives up.
const MAX_UNIQUE_ATTEMPTS: usize = 64;

/// Plate letters; I, O and Q are avoided to keep plates legible.
const PLATE_LETTERS: &[u8] = b"ABCDEFGHJKLMNPRSTUVWXYZ";

const FALLBACK_MODEL: CatalogueModel = CatalogueModel {
    make: "Toyota",
    wmi: "JTD",
    model: "Corolla",
    fuel: FuelSeed::Gasoline,
};

/// Generate the customers and vehicles described by `seed`.
///
/// Customers get names from the `fake` English locale, a `+1 555` phone
/// number and an `example.com` address. Each owns
/// [`SeedDefinition::vehicles_per_customer`] vehicles with a unique plate
/// and a unique VIN whose check digit is valid.
///
/// # Errors
///
/// Returns [`GenerationError::UniqueValueExhausted`] if a unique plate or VIN
/// cannot be drawn, which only happens for absurdly large seeds.
///
/// # Example
///
/// ```
/// use demo_data::{SeedRegistry, generate_demo_shop, is_valid_vin};
///
/// let registry = SeedRegistry::builtin().expect("bundled registry");
/// let seed = registry.find_seed("single-bay").expect("seed");
/// let shop = generate_demo_shop(seed).expect("generated");
///
/// assert_eq!(shop, generate_demo_shop(seed).expect("generated"));
/// assert!(
///     shop.customers
///         .iter()
///         .flat_map(|c| &c.vehicles)
///         .all(|v| is_valid_vin(&v.vin))
/// );
/// ```
pub fn generate_demo_shop(seed: &SeedDefinition) -> Result<DemoShop, GenerationError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed.seed());
    let mut plates = BTreeSet::new();
    let mut vins = BTreeSet::new();
    let mut customers = Vec::with_capacity(seed.customer_count());

    for ordinal in 1..=seed.customer_count() {
        let mut customer = generate_customer(&mut rng, ordinal);
        for _ in 0..seed.vehicles_per_customer() {
            let vehicle = generate_vehicle(&mut rng, &mut plates, &mut vins)?;
            customer.vehicles.push(vehicle);
        }
        customers.push(customer);
    }

    Ok(DemoShop {
        seed_name: seed.name().to_owned(),
        customers,
    })
}

fn generate_customer(rng: &mut ChaCha8Rng, ordinal: usize) -> DemoCustomer {
    let first_name: String = FirstName(EN).fake_with_rng(rng);
    let last_name: String = LastName(EN).fake_with_rng(rng);
    // The ordinal keeps addresses distinct when names repeat.
    let email = format!(
        "{}.{}{ordinal}@example.com",
        mailbox_part(&first_name),
        mailbox_part(&last_name)
    );
    let phone = format!(
        "+1 555 {:03} {:04}",
        rng.random_range(200..1000_u32),
        rng.random_range(0..10_000_u32)
    );

    DemoCustomer {
        first_name,
        last_name,
        email,
        phone,
        vehicles: Vec::new(),
    }
}

fn mailbox_part(name: &str) -> String {
    let part: String = name
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if part.is_empty() {
        "customer".to_owned()
    } else {
        part
    }
}

fn generate_vehicle(
    rng: &mut ChaCha8Rng,
    plates: &mut BTreeSet<String>,
    vins: &mut BTreeSet<String>,
) -> Result<DemoVehicle, GenerationError> {
    let model = MODELS.choose(rng).unwrap_or(&FALLBACK_MODEL);
    let year = rng.random_range(OLDEST_YEAR..=NEWEST_YEAR);
    let age = u32::try_from(NEWEST_YEAR - year + 1).unwrap_or(1);
    let mileage = age.saturating_mul(rng.random_range(6_000..=14_000_u32));
    let color = COLORS.choose(rng).copied().unwrap_or("Silver");
    let license_plate = draw_unique(rng, plates, "licensePlate", draw_plate)?;
    let vin = draw_unique(rng, vins, "vin", |rng| draw_vin(rng, model.wmi, year))?;

    Ok(DemoVehicle {
        make: model.make.to_owned(),
        model: model.model.to_owned(),
        year,
        vin,
        license_plate,
        color: color.to_owned(),
        mileage,
        fuel_type: model.fuel,
    })
}

fn draw_unique(
    rng: &mut ChaCha8Rng,
    taken: &mut BTreeSet<String>,
    field: &'static str,
    mut draw: impl FnMut(&mut ChaCha8Rng) -> String,
) -> Result<String, GenerationError> {
    for _ in 0..MAX_UNIQUE_ATTEMPTS {
        let candidate = draw(rng);
        if taken.insert(candidate.clone()) {
            return Ok(candidate);
        }
    }
    Err(GenerationError::UniqueValueExhausted {
        field,
        max_attempts: MAX_UNIQUE_ATTEMPTS,
    })
}

fn pick_byte(rng: &mut ChaCha8Rng, alphabet: &[u8]) -> char {
    char::from(alphabet.choose(rng).copied().unwrap_or(b'0'))
}

/// Three letters then four digits, e.g. `KTR4821`.
fn draw_plate(rng: &mut ChaCha8Rng) -> String {
    let letters: String = (0..3).map(|_| pick_byte(rng, PLATE_LETTERS)).collect();
    format!("{letters}{:04}", rng.random_range(0..10_000_u32))
}

/// Manufacturer prefix, five descriptor characters, check digit, model year,
/// plant code and a six digit serial.
fn draw_vin(rng: &mut ChaCha8Rng, wmi: &str, year: i32) -> String {
    let mut chars: Vec<char> = wmi.chars().collect();
    chars.extend((0..5).map(|_| pick_byte(rng, VIN_ALPHABET)));
    chars.push('0');
    chars.push(model_year_code(year).unwrap_or('A'));
    chars.push(pick_byte(rng, VIN_ALPHABET));
    chars.extend((0..6).map(|_| pick_byte(rng, b"0123456789")));

    let draft: String = chars.iter().collect();
    if let (Some(check), Some(slot)) = (vin_check_digit(&draft), chars.get_mut(8)) {
        *slot = check;
    }
    chars.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;
    use crate::registry::SeedRegistry;
    use crate::vin::is_valid_vin;

    const TEST_REGISTRY_JSON: &str = r#"{
        "version": 1,
        "seeds": [
            {"name": "test-seed", "seed": 42, "customerCount": 10, "vehiclesPerCustomer": 2},
            {"name": "small-seed", "seed": 123, "customerCount": 2, "vehiclesPerCustomer": 1},
            {"name": "no-cars", "seed": 5, "customerCount": 3, "vehiclesPerCustomer": 0}
        ]
    }"#;

    #[fixture]
    fn registry() -> SeedRegistry {
        SeedRegistry::from_json(TEST_REGISTRY_JSON).expect("valid test registry")
    }

    fn shop(registry: &SeedRegistry, name: &str) -> DemoShop {
        let seed = registry.find_seed(name).expect("seed found");
        generate_demo_shop(seed).expect("generation succeeds")
    }

    #[rstest]
    #[case("test-seed", 10, 20)]
    #[case("small-seed", 2, 2)]
    #[case("no-cars", 3, 0)]
    fn generates_requested_counts(
        registry: SeedRegistry,
        #[case] name: &str,
        #[case] customers: usize,
        #[case] vehicles: usize,
    ) {
        let shop = shop(&registry, name);
        assert_eq!(shop.seed_name, name);
        assert_eq!(shop.customers.len(), customers);
        assert_eq!(shop.vehicle_count(), vehicles);
    }

    #[rstest]
    fn generation_is_deterministic(registry: SeedRegistry) {
        assert_eq!(shop(&registry, "test-seed"), shop(&registry, "test-seed"));
    }

    #[rstest]
    fn different_seeds_produce_different_shops(registry: SeedRegistry) {
        let a = shop(&registry, "test-seed");
        let b = shop(&registry, "small-seed");
        assert_ne!(a.customers.first(), b.customers.first());
    }

    #[rstest]
    fn vehicles_are_well_formed_and_unique(registry: SeedRegistry) {
        let shop = shop(&registry, "test-seed");
        let vehicles: Vec<&DemoVehicle> = shop.customers.iter().flat_map(|c| &c.vehicles).collect();

        let plates: BTreeSet<&str> = vehicles.iter().map(|v| v.license_plate.as_str()).collect();
        let vins: BTreeSet<&str> = vehicles.iter().map(|v| v.vin.as_str()).collect();
        assert_eq!(plates.len(), vehicles.len());
        assert_eq!(vins.len(), vehicles.len());

        for vehicle in vehicles {
            assert!(is_valid_vin(&vehicle.vin), "{}", vehicle.vin);
            assert_eq!(vehicle.license_plate.len(), 7);
            assert!((OLDEST_YEAR..=NEWEST_YEAR).contains(&vehicle.year));
            assert!(vehicle.mileage >= 6_000);
            assert!(
                MODELS
                    .iter()
                    .any(|m| m.make == vehicle.make && m.model == vehicle.model && m.fuel == vehicle.fuel_type),
                "{} {} is not in the catalogue",
                vehicle.make,
                vehicle.model
            );
        }
    }

    #[rstest]
    fn contact_details_fit_backend_rules(registry: SeedRegistry) {
        for customer in shop(&registry, "test-seed").customers {
            assert!(customer.email.ends_with("@example.com"));
            assert_eq!(customer.email, customer.email.to_lowercase());
            assert!((7..=20).contains(&customer.phone.len()));
            assert!(
                customer
                    .phone
                    .chars()
                    .all(|c| c.is_ascii_digit() || " +-()".contains(c))
            );
            assert!(!customer.first_name.trim().is_empty());
        }
    }

    #[test]
    fn drawn_vins_carry_the_year_code() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let vin = draw_vin(&mut rng, "1HG", 2019);
        assert!(vin.starts_with("1HG"));
        assert_eq!(vin.chars().nth(9), Some('K'));
        assert!(is_valid_vin(&vin));
    }

    #[test]
    fn draw_unique_gives_up_when_values_repeat() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut taken = BTreeSet::from(["SAME".to_owned()]);
        let result = draw_unique(&mut rng, &mut taken, "licensePlate", |_| "SAME".to_owned());
        assert_eq!(
            result,
            Err(GenerationError::UniqueValueExhausted {
                field: "licensePlate",
                max_attempts: MAX_UNIQUE_ATTEMPTS,
            })
        );
    }

    #[rstest]
    #[case("O'Brien", "obrien")]
    #[case("Ada", "ada")]
    #[case("'", "customer")]
    fn mailbox_parts_are_ascii(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(mailbox_part(name), expected);
    }
}
