//! Workshop calendar: booking, rescheduling and conversion into work orders.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::Clock;
use pagination::{Page, PageRequest};
use serde_json::json;
use tracing::{info, warn};

use super::ports::Repositories;
use super::validation::FieldError;
use super::work_order_service::WorkOrderService;
use super::{
    Appointment, AppointmentFilter, AppointmentId, AppointmentStatusRequest,
    ConvertAppointmentRequest, CreateAppointmentRequest, CreateWorkOrderRequest, CustomerId,
    Error, Permission, Principal, RescheduleAppointmentRequest, TenantId, UserId, VehicleId,
    WorkOrder, WorkOrderId, lookup,
};

/// Appointment operations.
#[derive(Clone)]
pub struct AppointmentService {
    repos: Repositories,
    work_orders: WorkOrderService,
    clock: Arc<dyn Clock>,
}

impl AppointmentService {
    /// Create the service. Conversions open work orders through
    /// `work_orders`, so its rules and plan limits apply.
    pub fn new(repos: Repositories, work_orders: WorkOrderService, clock: Arc<dyn Clock>) -> Self {
        Self {
            repos,
            work_orders,
            clock,
        }
    }

    async fn appointment(
        &self,
        tenant_id: TenantId,
        id: AppointmentId,
    ) -> Result<Appointment, Error> {
        self.repos
            .appointments
            .find(tenant_id, id)
            .await?
            .filter(|appointment| appointment.is_active)
            .ok_or_else(|| Error::not_found(format!("appointment {id} not found")))
    }

    async fn check_vehicle(
        &self,
        tenant_id: TenantId,
        customer_id: CustomerId,
        vehicle_id: VehicleId,
    ) -> Result<(), Error> {
        let vehicle = lookup::reference(
            lookup::vehicle(&self.repos, tenant_id, vehicle_id).await,
            "vehicleId",
        )?;
        if vehicle.customer_id != customer_id {
            return Err(FieldError::new(
                "vehicleId",
                "vehicle_customer_mismatch",
                "vehicle does not belong to the customer",
            )
            .into());
        }
        Ok(())
    }

    /// Fail when the technician already has a slot-holding booking that
    /// intersects `[start, end)`.
    async fn ensure_free(
        &self,
        tenant_id: TenantId,
        technician_id: Option<UserId>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude: Option<AppointmentId>,
    ) -> Result<(), Error> {
        let Some(technician_id) = technician_id else {
            return Ok(());
        };
        let candidates = self
            .repos
            .appointments
            .find_for_technician(tenant_id, technician_id, start, end)
            .await?;
        let clash = candidates.into_iter().find(|other| {
            Some(other.id) != exclude
                && other.is_active
                && other.status.occupies_slot()
                && other.overlaps(start, end)
        });
        match clash {
            Some(other) => Err(Error::conflict("technician is already booked for this slot")
                .with_details(json!({
                    "conflictingAppointmentId": other.id,
                    "startsAt": other.starts_at,
                    "endsAt": other.ends_at(),
                }))),
            None => Ok(()),
        }
    }

    /// Book an appointment.
    pub async fn create(
        &self,
        principal: &Principal,
        request: CreateAppointmentRequest,
    ) -> Result<Appointment, Error> {
        principal.require(Permission::AppointmentsWrite)?;
        let tenant_id = principal.tenant_id;
        let appointment = Appointment::book(tenant_id, request, principal.user_id, self.clock.utc())?;

        lookup::reference(
            lookup::customer(&self.repos, tenant_id, appointment.customer_id).await,
            "customerId",
        )?;
        if let Some(vehicle_id) = appointment.vehicle_id {
            self.check_vehicle(tenant_id, appointment.customer_id, vehicle_id)
                .await?;
        }
        if let Some(technician_id) = appointment.technician_id {
            lookup::reference(
                lookup::user(&self.repos, tenant_id, technician_id).await,
                "technicianId",
            )?;
        }
        self.ensure_free(
            tenant_id,
            appointment.technician_id,
            appointment.starts_at,
            appointment.ends_at(),
            None,
        )
        .await?;

        self.repos.appointments.insert(&appointment).await?;
        info!(
            tenant_id = %tenant_id,
            appointment_id = %appointment.id,
            starts_at = %appointment.starts_at,
            "appointment booked"
        );
        Ok(appointment)
    }

    /// Fetch one appointment.
    pub async fn get(
        &self,
        principal: &Principal,
        id: AppointmentId,
    ) -> Result<Appointment, Error> {
        principal.require(Permission::AppointmentsRead)?;
        self.appointment(principal.tenant_id, id).await
    }

    /// Page through appointments ordered by start time.
    pub async fn list(
        &self,
        principal: &Principal,
        filter: &AppointmentFilter,
        page: PageRequest,
    ) -> Result<Page<Appointment>, Error> {
        principal.require(Permission::AppointmentsRead)?;
        Ok(self
            .repos
            .appointments
            .list(principal.tenant_id, filter, page)
            .await?)
    }

    /// Move a scheduled or confirmed appointment.
    pub async fn reschedule(
        &self,
        principal: &Principal,
        id: AppointmentId,
        request: RescheduleAppointmentRequest,
    ) -> Result<Appointment, Error> {
        principal.require(Permission::AppointmentsWrite)?;
        let mut appointment = self.appointment(principal.tenant_id, id).await?;
        appointment.reschedule(&request, self.clock.utc())?;
        self.ensure_free(
            principal.tenant_id,
            appointment.technician_id,
            appointment.starts_at,
            appointment.ends_at(),
            Some(appointment.id),
        )
        .await?;
        self.repos.appointments.update(&appointment).await?;
        Ok(appointment)
    }

    /// Move the appointment along its status table.
    pub async fn change_status(
        &self,
        principal: &Principal,
        id: AppointmentId,
        request: AppointmentStatusRequest,
    ) -> Result<Appointment, Error> {
        principal.require(Permission::AppointmentsWrite)?;
        let mut appointment = self.appointment(principal.tenant_id, id).await?;
        appointment.transition(request.status, self.clock.utc())?;
        self.repos.appointments.update(&appointment).await?;
        Ok(appointment)
    }

    /// Open a work order for the appointment and link the two.
    pub async fn convert(
        &self,
        principal: &Principal,
        id: AppointmentId,
        request: ConvertAppointmentRequest,
    ) -> Result<(Appointment, WorkOrder), Error> {
        principal.require(Permission::AppointmentsWrite)?;
        principal.require(Permission::WorkOrdersWrite)?;
        let appointment = self.appointment(principal.tenant_id, id).await?;

        // Dry run so a refused link never leaves an orphaned work order.
        let mut linked = appointment.clone();
        linked.link_work_order(WorkOrderId::random(), self.clock.utc())?;

        let vehicle_id = request
            .vehicle_id
            .or(appointment.vehicle_id)
            .ok_or_else(|| {
                FieldError::new(
                    "vehicleId",
                    "required",
                    "appointment has no vehicle; supply vehicleId",
                )
            })?;
        let description = request.description.unwrap_or_else(|| {
            match appointment.notes.as_deref() {
                Some(notes) => format!("{}: {notes}", appointment.service_type),
                None => appointment.service_type.clone(),
            }
        });
        let order = self
            .work_orders
            .create(
                principal,
                CreateWorkOrderRequest {
                    customer_id: appointment.customer_id,
                    vehicle_id,
                    assigned_to: appointment.technician_id,
                    priority: request.priority,
                    description,
                    mileage_in: None,
                    estimated_completion: None,
                },
            )
            .await?;

        linked.work_order_id = Some(order.id);
        if let Err(err) = self.repos.appointments.update(&linked).await {
            warn!(
                appointment_id = %linked.id,
                work_order_id = %order.id,
                error = %err,
                "work order opened but appointment link was not saved"
            );
            return Err(err.into());
        }
        info!(
            appointment_id = %linked.id,
            number = %order.number,
            "appointment converted to work order"
        );
        Ok((linked, order))
    }

    /// Soft delete.
    pub async fn delete(&self, principal: &Principal, id: AppointmentId) -> Result<(), Error> {
        principal.require(Permission::AppointmentsWrite)?;
        let mut appointment = self.appointment(principal.tenant_id, id).await?;
        appointment.is_active = false;
        appointment.updated_at = self.clock.utc();
        self.repos.appointments.update(&appointment).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "appointment_service_tests.rs"]
mod tests;
