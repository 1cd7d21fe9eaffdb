//! PostgreSQL-backed `CustomerRepository` and `VehicleRepository`.

use async_trait::async_trait;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use pagination::{Page, PageRequest};

use crate::domain::ports::{CustomerRepository, RepositoryError, VehicleRepository};
use crate::domain::{
    Customer, CustomerFilter, CustomerId, TenantId, UserId, Vehicle, VehicleFilter, VehicleId,
};

use super::column_codecs::{
    contains_pattern, from_json, page_window, parse_text, to_count, to_json, to_u32,
};
use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{CustomerRow, VehicleRow};
use super::pool::DbPool;
use super::schema::{customers, vehicles};

/// Diesel-backed implementation of the customer repository port.
#[derive(Clone)]
pub struct DieselCustomerRepository {
    pool: DbPool,
}

impl DieselCustomerRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn customer_to_row(customer: &Customer) -> Result<CustomerRow, RepositoryError> {
    let address = customer
        .address
        .as_ref()
        .map(|address| to_json(address, "address"))
        .transpose()?;
    Ok(CustomerRow {
        id: *customer.id.as_uuid(),
        tenant_id: *customer.tenant_id.as_uuid(),
        first_name: customer.first_name.clone(),
        last_name: customer.last_name.clone(),
        email: customer.email.clone(),
        phone: customer.phone.clone(),
        address,
        notes: to_json(&customer.notes, "notes")?,
        is_active: customer.is_active,
        created_by: *customer.created_by.as_uuid(),
        created_at: customer.created_at,
        updated_at: customer.updated_at,
    })
}

fn row_to_customer(row: CustomerRow) -> Result<Customer, RepositoryError> {
    Ok(Customer {
        id: CustomerId::from_uuid(row.id),
        tenant_id: TenantId::from_uuid(row.tenant_id),
        first_name: row.first_name,
        last_name: row.last_name,
        email: row.email,
        phone: row.phone,
        address: row
            .address
            .map(|value| from_json(value, "address"))
            .transpose()?,
        notes: from_json(row.notes, "notes")?,
        is_active: row.is_active,
        created_by: UserId::from_uuid(row.created_by),
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn active_customers<'a>(
    tenant_id: TenantId,
    filter: &CustomerFilter,
) -> customers::BoxedQuery<'a, Pg> {
    let mut query = customers::table
        .filter(customers::tenant_id.eq(*tenant_id.as_uuid()))
        .filter(customers::is_active.eq(true))
        .into_boxed();
    if let Some(needle) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = contains_pattern(needle);
        query = query.filter(
            customers::first_name
                .concat(" ")
                .concat(customers::last_name)
                .ilike(pattern.clone())
                .or(customers::email.assume_not_null().ilike(pattern.clone()))
                .or(customers::phone.ilike(pattern)),
        );
    }
    query
}

#[async_trait]
impl CustomerRepository for DieselCustomerRepository {
    async fn insert(&self, customer: &Customer) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = customer_to_row(customer)?;
        diesel::insert_into(customers::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn update(&self, customer: &Customer) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = customer_to_row(customer)?;
        diesel::update(customers::table.find(row.id))
            .set(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find(
        &self,
        tenant_id: TenantId,
        id: CustomerId,
    ) -> Result<Option<Customer>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = customers::table
            .filter(customers::id.eq(id.as_uuid()))
            .filter(customers::tenant_id.eq(tenant_id.as_uuid()))
            .filter(customers::is_active.eq(true))
            .select(CustomerRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_customer).transpose()
    }

    async fn list(
        &self,
        tenant_id: TenantId,
        filter: &CustomerFilter,
        page: PageRequest,
    ) -> Result<Page<Customer>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (offset, limit) = page_window(page);
        let total: i64 = active_customers(tenant_id, filter)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let rows: Vec<CustomerRow> = active_customers(tenant_id, filter)
            .order((
                customers::last_name.asc(),
                customers::first_name.asc(),
                customers::id.asc(),
            ))
            .offset(offset)
            .limit(limit)
            .select(CustomerRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let items = rows
            .into_iter()
            .map(row_to_customer)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, page, to_count(total)))
    }

    async fn count_active(&self, tenant_id: TenantId) -> Result<u64, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = active_customers(tenant_id, &CustomerFilter::default())
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(to_count(total))
    }
}

/// Diesel-backed implementation of the vehicle repository port.
#[derive(Clone)]
pub struct DieselVehicleRepository {
    pool: DbPool,
}

impl DieselVehicleRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn vehicle_to_row(vehicle: &Vehicle) -> VehicleRow {
    VehicleRow {
        id: *vehicle.id.as_uuid(),
        tenant_id: *vehicle.tenant_id.as_uuid(),
        customer_id: *vehicle.customer_id.as_uuid(),
        make: vehicle.make.clone(),
        model: vehicle.model.clone(),
        year: vehicle.year,
        vin: vehicle.vin.clone(),
        license_plate: vehicle.license_plate.clone(),
        color: vehicle.color.clone(),
        mileage: i64::from(vehicle.mileage),
        engine: vehicle.engine.clone(),
        transmission: vehicle.transmission.clone(),
        fuel_type: vehicle.fuel_type.as_str().to_owned(),
        is_active: vehicle.is_active,
        created_at: vehicle.created_at,
        updated_at: vehicle.updated_at,
    }
}

fn row_to_vehicle(row: VehicleRow) -> Result<Vehicle, RepositoryError> {
    Ok(Vehicle {
        id: VehicleId::from_uuid(row.id),
        tenant_id: TenantId::from_uuid(row.tenant_id),
        customer_id: CustomerId::from_uuid(row.customer_id),
        make: row.make,
        model: row.model,
        year: row.year,
        vin: row.vin,
        license_plate: row.license_plate,
        color: row.color,
        mileage: to_u32(row.mileage, "mileage")?,
        engine: row.engine,
        transmission: row.transmission,
        fuel_type: parse_text(&row.fuel_type, "fuel_type")?,
        is_active: row.is_active,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn active_vehicles<'a>(
    tenant_id: TenantId,
    filter: &VehicleFilter,
) -> vehicles::BoxedQuery<'a, Pg> {
    let mut query = vehicles::table
        .filter(vehicles::tenant_id.eq(*tenant_id.as_uuid()))
        .filter(vehicles::is_active.eq(true))
        .into_boxed();
    if let Some(customer_id) = filter.customer_id {
        query = query.filter(vehicles::customer_id.eq(*customer_id.as_uuid()));
    }
    if let Some(needle) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = contains_pattern(needle);
        query = query.filter(
            vehicles::license_plate
                .ilike(pattern.clone())
                .or(vehicles::vin.assume_not_null().ilike(pattern.clone()))
                .or(vehicles::make.ilike(pattern.clone()))
                .or(vehicles::model.ilike(pattern)),
        );
    }
    query
}

#[async_trait]
impl VehicleRepository for DieselVehicleRepository {
    async fn insert(&self, vehicle: &Vehicle) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(vehicles::table)
            .values(&vehicle_to_row(vehicle))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn update(&self, vehicle: &Vehicle) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(vehicles::table.find(vehicle.id.as_uuid()))
            .set(&vehicle_to_row(vehicle))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find(
        &self,
        tenant_id: TenantId,
        id: VehicleId,
    ) -> Result<Option<Vehicle>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = vehicles::table
            .filter(vehicles::id.eq(id.as_uuid()))
            .filter(vehicles::tenant_id.eq(tenant_id.as_uuid()))
            .filter(vehicles::is_active.eq(true))
            .select(VehicleRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_vehicle).transpose()
    }

    async fn list(
        &self,
        tenant_id: TenantId,
        filter: &VehicleFilter,
        page: PageRequest,
    ) -> Result<Page<Vehicle>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (offset, limit) = page_window(page);
        let total: i64 = active_vehicles(tenant_id, filter)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let rows: Vec<VehicleRow> = active_vehicles(tenant_id, filter)
            .order((vehicles::created_at.asc(), vehicles::id.asc()))
            .offset(offset)
            .limit(limit)
            .select(VehicleRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let items = rows
            .into_iter()
            .map(row_to_vehicle)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, page, to_count(total)))
    }

    async fn count_active(&self, tenant_id: TenantId) -> Result<u64, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = active_vehicles(tenant_id, &VehicleFilter::default())
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(to_count(total))
    }
}
