//! Strongly typed record identifiers.
//!
//! Every aggregate is keyed by a UUID v4. Wrapping each key in its own type
//! keeps a `CustomerId` from being passed where a `VehicleId` is expected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a new random identifier.
            #[must_use]
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Access the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }
    };
}

define_id!(
    /// Identifier of a tenant (repair shop organisation).
    TenantId
);
define_id!(
    /// Identifier of a user account.
    UserId
);
define_id!(
    /// Identifier of a customer record.
    CustomerId
);
define_id!(
    /// Identifier of a vehicle record.
    VehicleId
);
define_id!(
    /// Identifier of a work order.
    WorkOrderId
);
define_id!(
    /// Identifier of an appointment.
    AppointmentId
);
define_id!(
    /// Identifier of an invoice.
    InvoiceId
);
define_id!(
    /// Identifier of a payment.
    PaymentId
);
define_id!(
    /// Identifier of an inventory item.
    InventoryItemId
);
define_id!(
    /// Identifier of a stored report snapshot.
    ReportId
);
define_id!(
    /// Identifier of an embedded line, note, attachment or stock movement.
    LineId
);
