//! Workshop appointments.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use super::text_enum::text_enum;
use super::validation::{self, FieldError};
use super::{AppointmentId, CustomerId, Error, Priority, TenantId, UserId, VehicleId, WorkOrderId};

text_enum! {
    /// Lifecycle status of an appointment.
    pub enum AppointmentStatus {
        Scheduled => "scheduled",
        Confirmed => "confirmed",
        InProgress => "in_progress",
        Completed => "completed",
        Cancelled => "cancelled",
        NoShow => "no_show",
    }
}

impl AppointmentStatus {
    /// Statuses reachable from `self` in one step.
    pub const fn allowed_targets(self) -> &'static [AppointmentStatus] {
        use AppointmentStatus as S;
        match self {
            S::Scheduled => &[S::Confirmed, S::Cancelled, S::NoShow, S::InProgress],
            S::Confirmed => &[S::InProgress, S::Cancelled, S::NoShow],
            S::InProgress => &[S::Completed],
            S::Completed | S::Cancelled | S::NoShow => &[],
        }
    }

    /// Whether an appointment in this status occupies its time slot.
    pub const fn occupies_slot(self) -> bool {
        !matches!(self, Self::Cancelled | Self::NoShow)
    }

    /// Whether the appointment may still be moved.
    pub const fn is_reschedulable(self) -> bool {
        matches!(self, Self::Scheduled | Self::Confirmed)
    }
}

/// A booked slot in the workshop calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: AppointmentId,
    pub tenant_id: TenantId,
    pub customer_id: CustomerId,
    pub vehicle_id: Option<VehicleId>,
    pub technician_id: Option<UserId>,
    pub starts_at: DateTime<Utc>,
    pub duration_minutes: u32,
    pub service_type: String,
    pub notes: Option<String>,
    pub status: AppointmentStatus,
    pub work_order_id: Option<WorkOrderId>,
    pub is_active: bool,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for booking an appointment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    pub customer_id: CustomerId,
    pub vehicle_id: Option<VehicleId>,
    pub technician_id: Option<UserId>,
    pub starts_at: DateTime<Utc>,
    #[schema(example = 60)]
    pub duration_minutes: u32,
    #[schema(example = "Annual service")]
    pub service_type: String,
    pub notes: Option<String>,
}

/// Request body for moving an appointment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleAppointmentRequest {
    pub starts_at: DateTime<Utc>,
    pub duration_minutes: Option<u32>,
}

/// Request body for an appointment status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentStatusRequest {
    pub status: AppointmentStatus,
}

/// Request body for converting an appointment into a work order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConvertAppointmentRequest {
    /// Required when the appointment has no vehicle.
    pub vehicle_id: Option<VehicleId>,
    /// Defaults to the appointment's service type and notes.
    pub description: Option<String>,
    pub priority: Option<Priority>,
}

/// Filters for listing appointments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppointmentFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub technician_id: Option<UserId>,
    pub status: Option<AppointmentStatus>,
}

fn duration(value: u32) -> Result<u32, FieldError> {
    if !(15..=480).contains(&value) {
        return Err(FieldError::new(
            "durationMinutes",
            "out_of_range",
            "must be between 15 and 480",
        ));
    }
    Ok(value)
}

impl Appointment {
    /// Validate `request` into a scheduled appointment.
    pub fn book(
        tenant_id: TenantId,
        request: CreateAppointmentRequest,
        created_by: UserId,
        now: DateTime<Utc>,
    ) -> Result<Self, FieldError> {
        Ok(Self {
            id: AppointmentId::random(),
            tenant_id,
            customer_id: request.customer_id,
            vehicle_id: request.vehicle_id,
            technician_id: request.technician_id,
            starts_at: request.starts_at,
            duration_minutes: duration(request.duration_minutes)?,
            service_type: validation::text("serviceType", &request.service_type, 1, 100)?,
            notes: validation::optional_text("notes", request.notes.as_deref(), 2_000)?,
            status: AppointmentStatus::Scheduled,
            work_order_id: None,
            is_active: true,
            created_by,
            created_at: now,
            updated_at: now,
        })
    }

    /// End of the booked slot.
    pub fn ends_at(&self) -> DateTime<Utc> {
        self.starts_at + Duration::minutes(i64::from(self.duration_minutes))
    }

    /// Whether the booked slot intersects `[start, end)`.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.starts_at < end && start < self.ends_at()
    }

    /// Move the appointment. Only scheduled or confirmed bookings move.
    pub fn reschedule(
        &mut self,
        request: &RescheduleAppointmentRequest,
        now: DateTime<Utc>,
    ) -> Result<(), Error> {
        if !self.status.is_reschedulable() {
            return Err(Error::conflict(format!(
                "appointment cannot be rescheduled while {}",
                self.status
            ))
            .with_details(json!({ "status": self.status.as_str() })));
        }
        if let Some(minutes) = request.duration_minutes {
            self.duration_minutes = duration(minutes)?;
        }
        self.starts_at = request.starts_at;
        self.updated_at = now;
        Ok(())
    }

    /// Status change following the transition table.
    pub fn transition(&mut self, to: AppointmentStatus, now: DateTime<Utc>) -> Result<(), Error> {
        if !self.status.allowed_targets().contains(&to) {
            let allowed: Vec<&str> = self
                .status
                .allowed_targets()
                .iter()
                .map(|s| s.as_str())
                .collect();
            return Err(Error::conflict(format!(
                "cannot move appointment from {} to {to}",
                self.status
            ))
            .with_details(json!({
                "from": self.status.as_str(),
                "to": to.as_str(),
                "allowed": allowed,
            })));
        }
        self.status = to;
        self.updated_at = now;
        Ok(())
    }

    /// Link the work order created from this appointment.
    pub fn link_work_order(&mut self, work_order_id: WorkOrderId, now: DateTime<Utc>) -> Result<(), Error> {
        if self.work_order_id.is_some() {
            return Err(Error::conflict("appointment already has a work order"));
        }
        self.transition(AppointmentStatus::InProgress, now)?;
        self.work_order_id = Some(work_order_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use chrono::TimeZone;
    use rstest::{fixture, rstest};

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, hour, minute, 0)
            .single()
            .expect("valid timestamp")
    }

    #[fixture]
    fn appointment() -> Appointment {
        Appointment::book(
            TenantId::random(),
            CreateAppointmentRequest {
                customer_id: CustomerId::random(),
                vehicle_id: None,
                technician_id: Some(UserId::random()),
                starts_at: at(9, 0),
                duration_minutes: 60,
                service_type: "Oil change".into(),
                notes: None,
            },
            UserId::random(),
            at(8, 0),
        )
        .expect("valid appointment")
    }

    #[rstest]
    #[case(at(8, 0), at(9, 0), false)]
    #[case(at(8, 30), at(9, 30), true)]
    #[case(at(9, 15), at(9, 45), true)]
    #[case(at(10, 0), at(11, 0), false)]
    fn overlap_is_half_open(
        appointment: Appointment,
        #[case] start: DateTime<Utc>,
        #[case] end: DateTime<Utc>,
        #[case] expected: bool,
    ) {
        assert_eq!(appointment.overlaps(start, end), expected);
    }

    #[rstest]
    #[case(14)]
    #[case(481)]
    fn duration_bounds(#[case] minutes: u32) {
        let err = duration(minutes).expect_err("out of range");
        assert_eq!(err.field(), "durationMinutes");
    }

    #[rstest]
    fn transitions_follow_table(mut appointment: Appointment) {
        appointment
            .transition(AppointmentStatus::Confirmed, at(8, 5))
            .expect("confirm");
        let err = appointment
            .transition(AppointmentStatus::Completed, at(8, 6))
            .expect_err("must start first");
        assert_eq!(err.code(), ErrorCode::Conflict);
        appointment
            .transition(AppointmentStatus::NoShow, at(9, 30))
            .expect("no show");
        assert!(!appointment.status.occupies_slot());
    }

    #[rstest]
    fn completed_appointments_cannot_move(mut appointment: Appointment) {
        appointment
            .transition(AppointmentStatus::InProgress, at(9, 0))
            .expect("start");
        let err = appointment
            .reschedule(
                &RescheduleAppointmentRequest {
                    starts_at: at(11, 0),
                    duration_minutes: None,
                },
                at(9, 1),
            )
            .expect_err("in progress");
        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[rstest]
    fn linking_a_work_order_starts_the_appointment(mut appointment: Appointment) {
        let work_order_id = WorkOrderId::random();
        appointment
            .link_work_order(work_order_id, at(9, 0))
            .expect("link");
        assert_eq!(appointment.status, AppointmentStatus::InProgress);
        assert_eq!(appointment.work_order_id, Some(work_order_id));
        assert!(appointment.link_work_order(WorkOrderId::random(), at(9, 1)).is_err());
    }
}
