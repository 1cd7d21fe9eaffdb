//! Customer vehicles.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::text_enum::text_enum;
use super::validation::{self, FieldError};
use super::{CustomerId, TenantId, VehicleId};

/// Earliest accepted model year.
pub const MIN_YEAR: i32 = 1900;

text_enum! {
    /// Propulsion type.
    pub enum FuelType {
        Gasoline => "gasoline",
        Diesel => "diesel",
        Hybrid => "hybrid",
        Electric => "electric",
        Other => "other",
    }
}

/// A vehicle owned by a customer.
///
/// ## Invariants
/// - `vin`, when present, is 17 upper-case characters and unique per tenant.
/// - `license_plate` is upper-case without whitespace and unique per tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: VehicleId,
    pub tenant_id: TenantId,
    pub customer_id: CustomerId,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub vin: Option<String>,
    pub license_plate: String,
    pub color: Option<String>,
    pub mileage: u32,
    pub engine: Option<String>,
    pub transmission: Option<String>,
    pub fuel_type: FuelType,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when registering a vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateVehicleRequest {
    pub customer_id: CustomerId,
    #[schema(example = "Toyota")]
    pub make: String,
    #[schema(example = "Corolla")]
    pub model: String,
    #[schema(example = 2019)]
    pub year: i32,
    #[schema(example = "1HGCM82633A004352")]
    pub vin: Option<String>,
    #[schema(example = "ABC123")]
    pub license_plate: String,
    pub color: Option<String>,
    #[serde(default)]
    pub mileage: u32,
    pub engine: Option<String>,
    pub transmission: Option<String>,
    pub fuel_type: Option<FuelType>,
}

/// Partial vehicle update. Blank optional strings clear the field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVehicleRequest {
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub vin: Option<String>,
    pub license_plate: Option<String>,
    pub color: Option<String>,
    pub engine: Option<String>,
    pub transmission: Option<String>,
    pub fuel_type: Option<FuelType>,
}

/// Filters for listing vehicles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VehicleFilter {
    pub customer_id: Option<CustomerId>,
    /// Case-insensitive substring over plate, VIN, make and model.
    pub search: Option<String>,
}

fn year(value: i32, now: DateTime<Utc>) -> Result<i32, FieldError> {
    let max = now.year() + 1;
    if !(MIN_YEAR..=max).contains(&value) {
        return Err(FieldError::new(
            "year",
            "out_of_range",
            format!("must be between {MIN_YEAR} and {max}"),
        ));
    }
    Ok(value)
}

fn optional_vin(value: Option<&str>) -> Result<Option<String>, FieldError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => validation::vin("vin", v).map(Some),
        None => Ok(None),
    }
}

impl Vehicle {
    /// Validate `request` into a new active vehicle.
    pub fn create(
        tenant_id: TenantId,
        request: CreateVehicleRequest,
        now: DateTime<Utc>,
    ) -> Result<Self, FieldError> {
        Ok(Self {
            id: VehicleId::random(),
            tenant_id,
            customer_id: request.customer_id,
            make: validation::text("make", &request.make, 1, 50)?,
            model: validation::text("model", &request.model, 1, 50)?,
            year: year(request.year, now)?,
            vin: optional_vin(request.vin.as_deref())?,
            license_plate: validation::license_plate("licensePlate", &request.license_plate)?,
            color: validation::optional_text("color", request.color.as_deref(), 30)?,
            mileage: request.mileage,
            engine: validation::optional_text("engine", request.engine.as_deref(), 50)?,
            transmission: validation::optional_text(
                "transmission",
                request.transmission.as_deref(),
                50,
            )?,
            fuel_type: request.fuel_type.unwrap_or(FuelType::Gasoline),
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a partial update.
    pub fn apply(&mut self, patch: UpdateVehicleRequest, now: DateTime<Utc>) -> Result<(), FieldError> {
        let mut next = self.clone();
        if let Some(make) = patch.make {
            next.make = validation::text("make", &make, 1, 50)?;
        }
        if let Some(model) = patch.model {
            next.model = validation::text("model", &model, 1, 50)?;
        }
        if let Some(value) = patch.year {
            next.year = year(value, now)?;
        }
        if let Some(vin) = patch.vin {
            next.vin = optional_vin(Some(&vin))?;
        }
        if let Some(plate) = patch.license_plate {
            next.license_plate = validation::license_plate("licensePlate", &plate)?;
        }
        if let Some(color) = patch.color {
            next.color = validation::optional_text("color", Some(&color), 30)?;
        }
        if let Some(engine) = patch.engine {
            next.engine = validation::optional_text("engine", Some(&engine), 50)?;
        }
        if let Some(transmission) = patch.transmission {
            next.transmission = validation::optional_text("transmission", Some(&transmission), 50)?;
        }
        if let Some(fuel_type) = patch.fuel_type {
            next.fuel_type = fuel_type;
        }
        next.updated_at = now;
        *self = next;
        Ok(())
    }

    /// Record a new odometer reading. Readings never go backwards.
    pub fn record_mileage(&mut self, mileage: u32, now: DateTime<Utc>) -> Result<(), FieldError> {
        if mileage < self.mileage {
            return Err(FieldError::new(
                "mileage",
                "mileage_decreased",
                format!("must not be lower than the recorded {}", self.mileage),
            ));
        }
        self.mileage = mileage;
        self.updated_at = now;
        Ok(())
    }

    /// Case-insensitive substring match on plate, VIN, make and model.
    pub fn matches(&self, needle: &str) -> bool {
        let upper = needle.to_uppercase();
        let lower = needle.to_lowercase();
        self.license_plate.contains(&upper)
            || self.vin.as_deref().is_some_and(|v| v.contains(&upper))
            || self.make.to_lowercase().contains(&lower)
            || self.model.to_lowercase().contains(&lower)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn request() -> CreateVehicleRequest {
        CreateVehicleRequest {
            customer_id: CustomerId::random(),
            make: "Toyota".into(),
            model: "Corolla".into(),
            year: 2019,
            vin: Some("1hgcm82633a004352".into()),
            license_plate: "abc 123".into(),
            color: None,
            mileage: 42_000,
            engine: None,
            transmission: None,
            fuel_type: None,
        }
    }

    #[rstest]
    fn create_normalises_identifiers(request: CreateVehicleRequest) {
        let vehicle = Vehicle::create(TenantId::random(), request, Utc::now()).expect("valid");
        assert_eq!(vehicle.vin.as_deref(), Some("1HGCM82633A004352"));
        assert_eq!(vehicle.license_plate, "ABC123");
        assert_eq!(vehicle.fuel_type, FuelType::Gasoline);
    }

    #[rstest]
    #[case(1899)]
    #[case(Utc::now().year() + 2)]
    fn create_rejects_out_of_range_years(mut request: CreateVehicleRequest, #[case] value: i32) {
        request.year = value;
        let err = Vehicle::create(TenantId::random(), request, Utc::now()).expect_err("bad year");
        assert_eq!(err.field(), "year");
    }

    #[rstest]
    fn next_model_year_is_accepted(mut request: CreateVehicleRequest) {
        request.year = Utc::now().year() + 1;
        assert!(Vehicle::create(TenantId::random(), request, Utc::now()).is_ok());
    }

    #[rstest]
    fn mileage_never_decreases(request: CreateVehicleRequest) {
        let mut vehicle = Vehicle::create(TenantId::random(), request, Utc::now()).expect("valid");
        vehicle.record_mileage(42_000, Utc::now()).expect("same reading is fine");
        vehicle.record_mileage(43_500, Utc::now()).expect("increase");
        let err = vehicle.record_mileage(43_000, Utc::now()).expect_err("decrease");
        assert_eq!(err.code(), "mileage_decreased");
        assert_eq!(vehicle.mileage, 43_500);
    }

    #[rstest]
    #[case("abc1", true)]
    #[case("a0043", true)]
    #[case("corol", true)]
    #[case("honda", false)]
    fn search_matches(request: CreateVehicleRequest, #[case] needle: &str, #[case] expected: bool) {
        let vehicle = Vehicle::create(TenantId::random(), request, Utc::now()).expect("valid");
        assert_eq!(vehicle.matches(needle), expected);
    }
}
