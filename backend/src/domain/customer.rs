//! Customers of a repair shop.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::validation::{self, FieldError};
use super::{CustomerId, Note, TenantId, UserId};

/// Postal address. Every part is optional free text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

impl Address {
    fn normalised(self) -> Result<Option<Self>, FieldError> {
        let address = Self {
            street: validation::optional_text("address.street", self.street.as_deref(), 200)?,
            city: validation::optional_text("address.city", self.city.as_deref(), 100)?,
            state: validation::optional_text("address.state", self.state.as_deref(), 100)?,
            postal_code: validation::optional_text(
                "address.postalCode",
                self.postal_code.as_deref(),
                20,
            )?,
            country: validation::optional_text("address.country", self.country.as_deref(), 100)?,
        };
        Ok((address != Self::default()).then_some(address))
    }
}

/// A person or business bringing vehicles to the shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: CustomerId,
    pub tenant_id: TenantId,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: String,
    pub address: Option<Address>,
    pub notes: Vec<Note>,
    pub is_active: bool,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when creating a customer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerRequest {
    #[schema(example = "Jane")]
    pub first_name: String,
    #[schema(example = "Doe")]
    pub last_name: String,
    pub email: Option<String>,
    #[schema(example = "+1 555 010 2030")]
    pub phone: String,
    pub address: Option<Address>,
}

/// Partial customer update. A blank `email` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomerRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<Address>,
}

/// Filters for listing customers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerFilter {
    /// Case-insensitive substring over name, email and phone.
    pub search: Option<String>,
}

impl Customer {
    /// Validate `request` into a new active customer.
    pub fn create(
        tenant_id: TenantId,
        request: CreateCustomerRequest,
        created_by: UserId,
        now: DateTime<Utc>,
    ) -> Result<Self, FieldError> {
        Ok(Self {
            id: CustomerId::random(),
            tenant_id,
            first_name: validation::text("firstName", &request.first_name, 1, 50)?,
            last_name: validation::text("lastName", &request.last_name, 1, 50)?,
            email: validation::optional_email("email", request.email.as_deref())?,
            phone: validation::phone("phone", &request.phone)?,
            address: request.address.map(Address::normalised).transpose()?.flatten(),
            notes: Vec::new(),
            is_active: true,
            created_by,
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a partial update.
    pub fn apply(&mut self, patch: UpdateCustomerRequest, now: DateTime<Utc>) -> Result<(), FieldError> {
        let mut next = self.clone();
        if let Some(first) = patch.first_name {
            next.first_name = validation::text("firstName", &first, 1, 50)?;
        }
        if let Some(last) = patch.last_name {
            next.last_name = validation::text("lastName", &last, 1, 50)?;
        }
        if let Some(email) = patch.email {
            next.email = validation::optional_email("email", Some(&email))?;
        }
        if let Some(phone) = patch.phone {
            next.phone = validation::phone("phone", &phone)?;
        }
        if let Some(address) = patch.address {
            next.address = address.normalised()?;
        }
        next.updated_at = now;
        *self = next;
        Ok(())
    }

    /// Case-insensitive substring match on name, email and phone.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        let full_name = format!("{} {}", self.first_name, self.last_name).to_lowercase();
        full_name.contains(&needle)
            || self.email.as_deref().is_some_and(|e| e.contains(&needle))
            || self.phone.to_lowercase().contains(&needle)
    }
}
