//! Generated record types.
//!
//! These mirror the backend's create requests without depending on them.

use serde::{Deserialize, Serialize};

/// Fuel type of a generated vehicle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FuelSeed {
    /// Petrol engines.
    #[default]
    Gasoline,
    /// Diesel engines.
    Diesel,
    /// Petrol-electric hybrids.
    Hybrid,
    /// Battery electric.
    Electric,
}

impl FuelSeed {
    /// Lower-case wire name, matching the backend's fuel type values.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gasoline => "gasoline",
            Self::Diesel => "diesel",
            Self::Hybrid => "hybrid",
            Self::Electric => "electric",
        }
    }
}

/// A generated vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoVehicle {
    /// Manufacturer, e.g. `Toyota`.
    pub make: String,
    /// Model name, e.g. `Corolla`.
    pub model: String,
    /// Model year.
    pub year: i32,
    /// 17 character VIN with a valid check digit.
    pub vin: String,
    /// Upper-case licence plate, unique within the dataset.
    pub license_plate: String,
    /// Paint colour.
    pub color: String,
    /// Odometer reading in miles.
    pub mileage: u32,
    /// Fuel type.
    pub fuel_type: FuelSeed,
}

/// A generated customer and the vehicles they own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoCustomer {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Lower-case address under `example.com`.
    pub email: String,
    /// Phone number in `+1 555 NNN NNNN` form.
    pub phone: String,
    /// Vehicles owned by the customer.
    pub vehicles: Vec<DemoVehicle>,
}

/// Everything generated for one seed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoShop {
    /// Name of the seed the shop was generated from.
    pub seed_name: String,
    /// Generated customers in generation order.
    pub customers: Vec<DemoCustomer>,
}

impl DemoShop {
    /// Total number of vehicles across all customers.
    #[must_use]
    pub fn vehicle_count(&self) -> usize {
        self.customers.iter().map(|c| c.vehicles.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fuel_names_match_serde() {
        for fuel in [
            FuelSeed::Gasoline,
            FuelSeed::Diesel,
            FuelSeed::Hybrid,
            FuelSeed::Electric,
        ] {
            let json = serde_json::to_string(&fuel).expect("serialize");
            assert_eq!(json, format!("\"{}\"", fuel.as_str()));
        }
    }

    #[test]
    fn vehicle_serializes_to_camel_case() {
        let vehicle = DemoVehicle {
            make: "Toyota".to_owned(),
            model: "Corolla".to_owned(),
            year: 2019,
            vin: "1HGCM82633A004352".to_owned(),
            license_plate: "ABC1234".to_owned(),
            color: "Silver".to_owned(),
            mileage: 42_000,
            fuel_type: FuelSeed::Gasoline,
        };
        let json = serde_json::to_string(&vehicle).expect("serialize");
        assert!(json.contains("licensePlate"));
        assert!(json.contains("fuelType"));
    }
}
