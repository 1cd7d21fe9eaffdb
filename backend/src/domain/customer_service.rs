//! Customer records.

use std::sync::Arc;

use mockable::Clock;
use pagination::{Page, PageRequest};
use serde_json::json;
use tracing::info;

use super::ports::Repositories;
use super::tenant_service::UsageGuard;
use super::{
    AddNoteRequest, CreateCustomerRequest, Customer, CustomerFilter, CustomerId, Error,
    LimitedResource, Note, Permission, Principal, UpdateCustomerRequest, lookup,
};

/// Customer operations.
#[derive(Clone)]
pub struct CustomerService {
    repos: Repositories,
    usage: UsageGuard,
    clock: Arc<dyn Clock>,
}

impl CustomerService {
    /// Create the service.
    pub fn new(repos: Repositories, usage: UsageGuard, clock: Arc<dyn Clock>) -> Self {
        Self {
            repos,
            usage,
            clock,
        }
    }

    /// Register a customer.
    pub async fn create(
        &self,
        principal: &Principal,
        request: CreateCustomerRequest,
    ) -> Result<Customer, Error> {
        principal.require(Permission::CustomersWrite)?;
        let customer = Customer::create(
            principal.tenant_id,
            request,
            principal.user_id,
            self.clock.utc(),
        )?;
        self.usage
            .ensure_capacity(principal.tenant_id, LimitedResource::Customers)
            .await?;
        self.repos.customers.insert(&customer).await?;
        info!(tenant_id = %customer.tenant_id, customer_id = %customer.id, "customer created");
        Ok(customer)
    }

    /// Fetch one customer.
    pub async fn get(&self, principal: &Principal, id: CustomerId) -> Result<Customer, Error> {
        principal.require(Permission::CustomersRead)?;
        lookup::customer(&self.repos, principal.tenant_id, id).await
    }

    /// Page through customers, optionally filtered by a search term.
    pub async fn list(
        &self,
        principal: &Principal,
        filter: &CustomerFilter,
        page: PageRequest,
    ) -> Result<Page<Customer>, Error> {
        principal.require(Permission::CustomersRead)?;
        Ok(self
            .repos
            .customers
            .list(principal.tenant_id, filter, page)
            .await?)
    }

    /// Apply a partial update.
    pub async fn update(
        &self,
        principal: &Principal,
        id: CustomerId,
        patch: UpdateCustomerRequest,
    ) -> Result<Customer, Error> {
        principal.require(Permission::CustomersWrite)?;
        let mut customer = lookup::customer(&self.repos, principal.tenant_id, id).await?;
        customer.apply(patch, self.clock.utc())?;
        self.repos.customers.update(&customer).await?;
        Ok(customer)
    }

    /// Soft delete a customer without open work orders.
    pub async fn delete(&self, principal: &Principal, id: CustomerId) -> Result<(), Error> {
        principal.require(Permission::CustomersWrite)?;
        let mut customer = lookup::customer(&self.repos, principal.tenant_id, id).await?;
        let open = self
            .repos
            .work_orders
            .count_open_for_customer(principal.tenant_id, id)
            .await?;
        if open > 0 {
            return Err(Error::conflict("customer has open work orders")
                .with_details(json!({ "openWorkOrders": open })));
        }
        customer.is_active = false;
        customer.updated_at = self.clock.utc();
        self.repos.customers.update(&customer).await?;
        info!(tenant_id = %customer.tenant_id, customer_id = %customer.id, "customer deleted");
        Ok(())
    }

    /// Append a note to the customer record.
    pub async fn add_note(
        &self,
        principal: &Principal,
        id: CustomerId,
        request: &AddNoteRequest,
    ) -> Result<Customer, Error> {
        principal.require(Permission::CustomersWrite)?;
        let mut customer = lookup::customer(&self.repos, principal.tenant_id, id).await?;
        let now = self.clock.utc();
        customer.notes.push(Note::new(principal.user_id, &request.body, now)?);
        customer.updated_at = now;
        self.repos.customers.update(&customer).await?;
        Ok(customer)
    }
}

#[cfg(test)]
#[path = "customer_service_tests.rs"]
mod tests;
