//! Tenants, users, customers and vehicles.

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use crate::domain::ports::{
    CustomerRepository, RepositoryError, TenantRepository, UserRepository, VehicleRepository,
};
use crate::domain::{
    Customer, CustomerFilter, CustomerId, Tenant, TenantId, User, UserId, Vehicle, VehicleFilter,
    VehicleId,
};

use super::{MemoryStore, Tables, paged};

fn vehicle_clash(tables: &Tables, vehicle: &Vehicle) -> Option<&'static str> {
    tables
        .vehicles
        .values()
        .filter(|v| v.id != vehicle.id && v.tenant_id == vehicle.tenant_id && v.is_active)
        .find_map(|v| {
            if v.license_plate == vehicle.license_plate {
                Some("license_plate")
            } else if v.vin.is_some() && v.vin == vehicle.vin {
                Some("vin")
            } else {
                None
            }
        })
}

#[async_trait]
impl TenantRepository for MemoryStore {
    async fn insert(&self, tenant: &Tenant) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        if tables.tenants.values().any(|t| t.slug == tenant.slug) {
            return Err(RepositoryError::duplicate("slug"));
        }
        tables.tenants.insert(tenant.id, tenant.clone());
        Ok(())
    }

    async fn update(&self, tenant: &Tenant) -> Result<(), RepositoryError> {
        self.lock()?.tenants.insert(tenant.id, tenant.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: TenantId) -> Result<Option<Tenant>, RepositoryError> {
        Ok(self.lock()?.tenants.get(&id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Tenant>, RepositoryError> {
        Ok(self
            .lock()?
            .tenants
            .values()
            .find(|t| t.slug == slug)
            .cloned())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(self.lock()?.tenants.len() as u64)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert(&self, user: &User) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(RepositoryError::duplicate("email"));
        }
        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        if tables
            .users
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(RepositoryError::duplicate("email"));
        }
        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .lock()?
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn list(
        &self,
        tenant_id: TenantId,
        page: PageRequest,
    ) -> Result<Page<User>, RepositoryError> {
        let tables = self.lock()?;
        let mut users: Vec<User> = tables
            .users
            .values()
            .filter(|u| u.tenant_id == tenant_id)
            .cloned()
            .collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.email.cmp(&b.email)));
        Ok(paged(&users, page))
    }

    async fn count_active(&self, tenant_id: TenantId) -> Result<u64, RepositoryError> {
        Ok(self
            .lock()?
            .users
            .values()
            .filter(|u| u.tenant_id == tenant_id && u.is_active)
            .count() as u64)
    }
}

#[async_trait]
impl CustomerRepository for MemoryStore {
    async fn insert(&self, customer: &Customer) -> Result<(), RepositoryError> {
        self.lock()?.customers.insert(customer.id, customer.clone());
        Ok(())
    }

    async fn update(&self, customer: &Customer) -> Result<(), RepositoryError> {
        self.lock()?.customers.insert(customer.id, customer.clone());
        Ok(())
    }

    async fn find(
        &self,
        tenant_id: TenantId,
        id: CustomerId,
    ) -> Result<Option<Customer>, RepositoryError> {
        Ok(self
            .lock()?
            .customers
            .get(&id)
            .filter(|c| c.tenant_id == tenant_id && c.is_active)
            .cloned())
    }

    async fn list(
        &self,
        tenant_id: TenantId,
        filter: &CustomerFilter,
        page: PageRequest,
    ) -> Result<Page<Customer>, RepositoryError> {
        let tables = self.lock()?;
        let mut customers: Vec<Customer> = tables
            .customers
            .values()
            .filter(|c| c.tenant_id == tenant_id && c.is_active)
            .filter(|c| filter.search.as_deref().is_none_or(|needle| c.matches(needle)))
            .cloned()
            .collect();
        customers.sort_by(|a, b| {
            a.last_name
                .cmp(&b.last_name)
                .then_with(|| a.first_name.cmp(&b.first_name))
                .then(a.id.cmp(&b.id))
        });
        Ok(paged(&customers, page))
    }

    async fn count_active(&self, tenant_id: TenantId) -> Result<u64, RepositoryError> {
        Ok(self
            .lock()?
            .customers
            .values()
            .filter(|c| c.tenant_id == tenant_id && c.is_active)
            .count() as u64)
    }
}

#[async_trait]
impl VehicleRepository for MemoryStore {
    async fn insert(&self, vehicle: &Vehicle) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        if let Some(field) = vehicle_clash(&tables, vehicle) {
            return Err(RepositoryError::duplicate(field));
        }
        tables.vehicles.insert(vehicle.id, vehicle.clone());
        Ok(())
    }

    async fn update(&self, vehicle: &Vehicle) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        if vehicle.is_active {
            if let Some(field) = vehicle_clash(&tables, vehicle) {
                return Err(RepositoryError::duplicate(field));
            }
        }
        tables.vehicles.insert(vehicle.id, vehicle.clone());
        Ok(())
    }

    async fn find(
        &self,
        tenant_id: TenantId,
        id: VehicleId,
    ) -> Result<Option<Vehicle>, RepositoryError> {
        Ok(self
            .lock()?
            .vehicles
            .get(&id)
            .filter(|v| v.tenant_id == tenant_id && v.is_active)
            .cloned())
    }

    async fn list(
        &self,
        tenant_id: TenantId,
        filter: &VehicleFilter,
        page: PageRequest,
    ) -> Result<Page<Vehicle>, RepositoryError> {
        let tables = self.lock()?;
        let mut vehicles: Vec<Vehicle> = tables
            .vehicles
            .values()
            .filter(|v| v.tenant_id == tenant_id && v.is_active)
            .filter(|v| filter.customer_id.is_none_or(|id| v.customer_id == id))
            .filter(|v| filter.search.as_deref().is_none_or(|needle| v.matches(needle)))
            .cloned()
            .collect();
        vehicles.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(paged(&vehicles, page))
    }

    async fn count_active(&self, tenant_id: TenantId) -> Result<u64, RepositoryError> {
        Ok(self
            .lock()?
            .vehicles
            .values()
            .filter(|v| v.tenant_id == tenant_id && v.is_active)
            .count() as u64)
    }
}
