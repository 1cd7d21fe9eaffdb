//! Seed registry types and JSON parsing.
//!
//! A registry names reproducible datasets. The crate ships one under
//! `fixtures/seeds.json`, available through [`SeedRegistry::builtin`].

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::RegistryError;

/// Current supported registry version.
const SUPPORTED_VERSION: u32 = 1;

/// Largest accepted `vehiclesPerCustomer`.
pub const MAX_VEHICLES_PER_CUSTOMER: usize = 5;

/// Seed used when the caller names none.
pub const DEFAULT_SEED_NAME: &str = "quiet-garage";

const BUILTIN_REGISTRY: &str = include_str!("../fixtures/seeds.json");

/// A validated set of named seed definitions.
///
/// # Example
///
/// ```
/// use demo_data::SeedRegistry;
///
/// let json = r#"{
///     "version": 1,
///     "seeds": [{"name": "test", "seed": 42, "customerCount": 5, "vehiclesPerCustomer": 2}]
/// }"#;
///
/// let registry = SeedRegistry::from_json(json).expect("valid registry");
/// assert_eq!(registry.seeds().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedRegistry {
    version: u32,
    seeds: Vec<SeedDefinition>,
}

impl SeedRegistry {
    /// Parse a registry from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when the JSON is malformed, the version is
    /// unsupported, the seed list is empty, a name repeats or a seed asks
    /// for more than [`MAX_VEHICLES_PER_CUSTOMER`] vehicles.
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let raw: RawSeedRegistry =
            serde_json::from_str(json).map_err(|e| RegistryError::ParseError {
                message: e.to_string(),
            })?;

        Self::from_raw(raw)
    }

    /// Load a registry from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, RegistryError> {
        let contents = fs::read_to_string(path).map_err(|e| RegistryError::IoError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        Self::from_json(&contents)
    }

    /// The registry bundled with the crate.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] only if the bundled fixture is invalid.
    pub fn builtin() -> Result<Self, RegistryError> {
        Self::from_json(BUILTIN_REGISTRY)
    }

    fn from_raw(raw: RawSeedRegistry) -> Result<Self, RegistryError> {
        if raw.version != SUPPORTED_VERSION {
            return Err(RegistryError::UnsupportedVersion {
                expected: SUPPORTED_VERSION,
                actual: raw.version,
            });
        }
        if raw.seeds.is_empty() {
            return Err(RegistryError::EmptySeeds);
        }

        let mut names = BTreeSet::new();
        let mut seeds = Vec::with_capacity(raw.seeds.len());
        for seed in raw.seeds {
            if !names.insert(seed.name.clone()) {
                return Err(RegistryError::DuplicateSeed { name: seed.name });
            }
            if seed.vehicles_per_customer > MAX_VEHICLES_PER_CUSTOMER {
                return Err(RegistryError::TooManyVehicles {
                    name: seed.name,
                    requested: seed.vehicles_per_customer,
                    max: MAX_VEHICLES_PER_CUSTOMER,
                });
            }
            seeds.push(SeedDefinition {
                name: seed.name,
                seed: seed.seed,
                customer_count: seed.customer_count,
                vehicles_per_customer: seed.vehicles_per_customer,
            });
        }

        Ok(Self {
            version: raw.version,
            seeds,
        })
    }

    /// Returns the registry version.
    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// Returns all seed definitions.
    #[must_use]
    pub fn seeds(&self) -> &[SeedDefinition] {
        &self.seeds
    }

    /// Find a seed definition by name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::SeedNotFound`] if no seed has that name.
    pub fn find_seed(&self, name: &str) -> Result<&SeedDefinition, RegistryError> {
        self.seeds
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| RegistryError::SeedNotFound {
                name: name.to_owned(),
            })
    }
}

/// A named, reproducible dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedDefinition {
    name: String,
    seed: u64,
    customer_count: usize,
    vehicles_per_customer: usize,
}

impl SeedDefinition {
    /// Returns the seed name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the RNG seed value.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Returns the number of customers to generate.
    #[must_use]
    pub const fn customer_count(&self) -> usize {
        self.customer_count
    }

    /// Returns the number of vehicles each customer owns.
    #[must_use]
    pub const fn vehicles_per_customer(&self) -> usize {
        self.vehicles_per_customer
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSeedRegistry {
    version: u32,
    seeds: Vec<RawSeedDefinition>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSeedDefinition {
    name: String,
    seed: u64,
    customer_count: usize,
    #[serde(default = "default_vehicles_per_customer")]
    vehicles_per_customer: usize,
}

const fn default_vehicles_per_customer() -> usize {
    1
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn builtin_registry_contains_the_default_seed() {
        let registry = SeedRegistry::builtin().expect("bundled registry parses");
        let seed = registry
            .find_seed(DEFAULT_SEED_NAME)
            .expect("default seed present");
        assert!(seed.customer_count() > 0);
    }

    #[test]
    fn vehicles_per_customer_defaults_to_one() {
        let registry = SeedRegistry::from_json(
            r#"{"version": 1, "seeds": [{"name": "a", "seed": 1, "customerCount": 2}]}"#,
        )
        .expect("valid registry");
        let seed = registry.find_seed("a").expect("seed found");
        assert_eq!(seed.vehicles_per_customer(), 1);
    }

    #[rstest]
    #[case::unsupported_version(
        r#"{"version": 2, "seeds": [{"name": "a", "seed": 1, "customerCount": 1}]}"#,
        RegistryError::UnsupportedVersion { expected: 1, actual: 2 }
    )]
    #[case::empty_seeds(r#"{"version": 1, "seeds": []}"#, RegistryError::EmptySeeds)]
    #[case::duplicate(
        r#"{"version": 1, "seeds": [
            {"name": "a", "seed": 1, "customerCount": 1},
            {"name": "a", "seed": 2, "customerCount": 1}
        ]}"#,
        RegistryError::DuplicateSeed { name: "a".to_owned() }
    )]
    #[case::fleet(
        r#"{"version": 1, "seeds": [{"name": "fleet", "seed": 1, "customerCount": 1, "vehiclesPerCustomer": 6}]}"#,
        RegistryError::TooManyVehicles { name: "fleet".to_owned(), requested: 6, max: 5 }
    )]
    fn rejects_invalid_registry(#[case] json: &str, #[case] expected: RegistryError) {
        assert_eq!(SeedRegistry::from_json(json), Err(expected));
    }

    #[rstest]
    #[case::malformed_json("not valid json")]
    #[case::missing_count(r#"{"version": 1, "seeds": [{"name": "a", "seed": 1}]}"#)]
    fn rejects_json_with_parse_error(#[case] json: &str) {
        assert!(matches!(
            SeedRegistry::from_json(json),
            Err(RegistryError::ParseError { .. })
        ));
    }
}
