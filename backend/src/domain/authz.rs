//! Roles, permissions and the authenticated principal.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::text_enum::text_enum;
use super::{Error, TenantId, UserId};

text_enum! {
    /// Role of a user inside their tenant.
    pub enum Role {
        Owner => "owner",
        Admin => "admin",
        Manager => "manager",
        Technician => "technician",
        Receptionist => "receptionist",
    }
}

text_enum! {
    /// A `resource:action` capability.
    pub enum Permission {
        TenantManage => "tenant:manage",
        UsersManage => "users:manage",
        CustomersRead => "customers:read",
        CustomersWrite => "customers:write",
        VehiclesRead => "vehicles:read",
        VehiclesWrite => "vehicles:write",
        WorkOrdersRead => "work_orders:read",
        WorkOrdersWrite => "work_orders:write",
        WorkOrdersAssign => "work_orders:assign",
        WorkOrdersStatus => "work_orders:status",
        AppointmentsRead => "appointments:read",
        AppointmentsWrite => "appointments:write",
        BillingRead => "billing:read",
        BillingWrite => "billing:write",
        InventoryRead => "inventory:read",
        InventoryWrite => "inventory:write",
        ReportsRead => "reports:read",
    }
}

impl Role {
    /// Whether the role grants `permission`.
    pub fn grants(self, permission: Permission) -> bool {
        use Permission as P;
        match self {
            Self::Owner => true,
            Self::Admin => permission != P::TenantManage,
            Self::Manager => !matches!(permission, P::TenantManage | P::UsersManage),
            Self::Technician => matches!(
                permission,
                P::CustomersRead
                    | P::VehiclesRead
                    | P::WorkOrdersRead
                    | P::WorkOrdersStatus
                    | P::AppointmentsRead
                    | P::InventoryRead
            ),
            Self::Receptionist => matches!(
                permission,
                P::CustomersRead
                    | P::CustomersWrite
                    | P::VehiclesRead
                    | P::VehiclesWrite
                    | P::WorkOrdersRead
                    | P::WorkOrdersWrite
                    | P::AppointmentsRead
                    | P::AppointmentsWrite
                    | P::BillingRead
                    | P::BillingWrite
            ),
        }
    }

    /// Every permission the role grants.
    pub fn permissions(self) -> Vec<Permission> {
        Permission::ALL
            .iter()
            .copied()
            .filter(|permission| self.grants(*permission))
            .collect()
    }
}

/// The authenticated user behind a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub user_id: UserId,
    pub tenant_id: TenantId,
    pub role: Role,
}

impl Principal {
    /// Fail with `forbidden` unless the principal's role grants `permission`.
    pub fn require(&self, permission: Permission) -> Result<(), Error> {
        if self.role.grants(permission) {
            return Ok(());
        }
        Err(Error::forbidden(format!("missing permission {permission}"))
            .with_details(json!({ "permission": permission.as_str() })))
    }
}
