//! Work orders: the unit of repair work tracked through a status lifecycle.
//!
//! The aggregate owns every rule that can be checked without other records:
//! the status table, workflow ordering, line locking and totals. Services
//! load the referenced customer, vehicle, technician and inventory records.

mod lines;
mod status;
mod workflow;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

pub use lines::{AddPartLineRequest, AddServiceLineRequest, PartLine, ServiceLine};
pub use status::{StatusChange, WorkOrderStatus};
pub use workflow::{
    StepAction, StepStatus, WorkflowStep, WorkflowStepKey, apply_step_action, default_workflow,
    pending_required,
};

use super::text_enum::text_enum;
use super::validation::{self, FieldError};
use super::{
    Attachment, CustomerId, Error, InventoryItemId, LineId, Note, TenantId, Totals, UserId,
    VehicleId, WorkOrderId,
};

text_enum! {
    /// Scheduling urgency.
    pub enum Priority {
        Low => "low",
        Normal => "normal",
        High => "high",
        Urgent => "urgent",
    }
}

/// Format a work-order number such as `WO-202405-0007`.
pub fn work_order_number(now: DateTime<Utc>, sequence: u32) -> String {
    format!("WO-{:04}{:02}-{sequence:04}", now.year(), now.month())
}

/// A repair job for one vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrder {
    pub id: WorkOrderId,
    pub tenant_id: TenantId,
    #[schema(example = "WO-202405-0007")]
    pub number: String,
    pub customer_id: CustomerId,
    pub vehicle_id: VehicleId,
    pub assigned_to: Option<UserId>,
    pub status: WorkOrderStatus,
    pub priority: Priority,
    pub description: String,
    pub mileage_in: Option<u32>,
    pub services: Vec<ServiceLine>,
    pub parts: Vec<PartLine>,
    pub totals: Totals,
    pub notes: Vec<Note>,
    pub attachments: Vec<Attachment>,
    pub status_history: Vec<StatusChange>,
    pub workflow: Vec<WorkflowStep>,
    pub estimated_completion: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for opening a work order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkOrderRequest {
    pub customer_id: CustomerId,
    pub vehicle_id: VehicleId,
    pub assigned_to: Option<UserId>,
    pub priority: Option<Priority>,
    #[schema(example = "Grinding noise when braking")]
    pub description: String,
    pub mileage_in: Option<u32>,
    pub estimated_completion: Option<DateTime<Utc>>,
}

/// Partial update of the descriptive fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWorkOrderRequest {
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub mileage_in: Option<u32>,
    pub estimated_completion: Option<DateTime<Utc>>,
}

/// Request body for a manual status change.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangeStatusRequest {
    pub status: WorkOrderStatus,
    pub reason: Option<String>,
}

/// Request body for assigning (or clearing) the technician.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignTechnicianRequest {
    pub technician_id: Option<UserId>,
}

/// Request body for a workflow step operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowActionRequest {
    pub action: StepAction,
}

/// Filters for listing work orders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkOrderFilter {
    pub status: Option<WorkOrderStatus>,
    pub assigned_to: Option<UserId>,
    pub customer_id: Option<CustomerId>,
    pub vehicle_id: Option<VehicleId>,
}

impl WorkOrderFilter {
    /// Whether `order` passes every set filter.
    pub fn matches(&self, order: &WorkOrder) -> bool {
        self.status.is_none_or(|s| order.status == s)
            && self.assigned_to.is_none_or(|id| order.assigned_to == Some(id))
            && self.customer_id.is_none_or(|id| order.customer_id == id)
            && self.vehicle_id.is_none_or(|id| order.vehicle_id == id)
    }
}

impl WorkOrder {
    /// Open a pending work order with the default workflow.
    ///
    /// References in `request` must already be checked by the caller.
    pub fn open(
        tenant_id: TenantId,
        number: String,
        request: CreateWorkOrderRequest,
        created_by: UserId,
        now: DateTime<Utc>,
    ) -> Result<Self, FieldError> {
        let description = validation::text("description", &request.description, 1, 2_000)?;
        Ok(Self {
            id: WorkOrderId::random(),
            tenant_id,
            number,
            customer_id: request.customer_id,
            vehicle_id: request.vehicle_id,
            assigned_to: request.assigned_to,
            status: WorkOrderStatus::Pending,
            priority: request.priority.unwrap_or(Priority::Normal),
            description,
            mileage_in: request.mileage_in,
            services: Vec::new(),
            parts: Vec::new(),
            totals: Totals::default(),
            notes: Vec::new(),
            attachments: Vec::new(),
            status_history: vec![StatusChange {
                from: None,
                to: WorkOrderStatus::Pending,
                changed_by: created_by,
                reason: None,
                at: now,
            }],
            workflow: default_workflow(),
            estimated_completion: request.estimated_completion,
            completed_at: None,
            is_active: true,
            created_by,
            created_at: now,
            updated_at: now,
        })
    }

    fn locked(&self, what: &str) -> Error {
        Error::conflict(format!(
            "{what} cannot change while work order is {}",
            self.status
        ))
        .with_details(json!({ "status": self.status.as_str() }))
    }

    /// Fail once the order is invoiced or cancelled.
    pub fn ensure_not_terminal(&self) -> Result<(), Error> {
        if self.status.is_terminal() {
            return Err(self.locked("work order"));
        }
        Ok(())
    }

    /// Fail once the order is completed, invoiced or cancelled.
    pub fn ensure_lines_editable(&self) -> Result<(), Error> {
        if self.status.locks_lines() {
            return Err(self.locked("lines"));
        }
        Ok(())
    }

    /// Apply a partial update of the descriptive fields.
    pub fn update_details(
        &mut self,
        patch: UpdateWorkOrderRequest,
        now: DateTime<Utc>,
    ) -> Result<(), Error> {
        self.ensure_not_terminal()?;
        if let Some(description) = patch.description {
            self.description = validation::text("description", &description, 1, 2_000)?;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(mileage) = patch.mileage_in {
            self.mileage_in = Some(mileage);
        }
        if let Some(eta) = patch.estimated_completion {
            self.estimated_completion = Some(eta);
        }
        self.updated_at = now;
        Ok(())
    }

    /// Set or clear the assigned technician.
    pub fn assign(&mut self, technician: Option<UserId>, now: DateTime<Utc>) -> Result<(), Error> {
        self.ensure_not_terminal()?;
        self.assigned_to = technician;
        self.updated_at = now;
        Ok(())
    }

    fn record_status(
        &mut self,
        to: WorkOrderStatus,
        by: UserId,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) {
        self.status_history.push(StatusChange {
            from: Some(self.status),
            to,
            changed_by: by,
            reason,
            at: now,
        });
        self.status = to;
        self.updated_at = now;
    }

    fn check_transition(&self, to: WorkOrderStatus) -> Result<(), Error> {
        if self.status.can_transition_to(to) {
            return Ok(());
        }
        let allowed: Vec<&str> = self
            .status
            .allowed_targets()
            .iter()
            .map(|s| s.as_str())
            .collect();
        Err(Error::conflict(format!(
            "cannot move work order from {} to {to}",
            self.status
        ))
        .with_details(json!({
            "from": self.status.as_str(),
            "to": to.as_str(),
            "allowed": allowed,
        })))
    }

    /// Manual status change following the transition table.
    ///
    /// `invoiced` is reserved for invoice generation. Completing requires
    /// every required workflow step to be finished.
    pub fn transition(
        &mut self,
        to: WorkOrderStatus,
        by: UserId,
        reason: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(), Error> {
        if to == WorkOrderStatus::Invoiced {
            return Err(Error::conflict("work orders are invoiced by generating an invoice")
                .with_details(json!({ "from": self.status.as_str(), "to": to.as_str() })));
        }
        self.check_transition(to)?;
        let reason = validation::optional_text("reason", reason, 500)?;

        match to {
            WorkOrderStatus::Completed => {
                let pending = pending_required(&self.workflow);
                if !pending.is_empty() {
                    let keys: Vec<&str> = pending.iter().map(|k| k.as_str()).collect();
                    return Err(Error::conflict("required workflow steps are not finished")
                        .with_details(json!({ "pendingSteps": keys })));
                }
                self.completed_at = Some(now);
            }
            WorkOrderStatus::InProgress if self.status == WorkOrderStatus::Completed => {
                self.completed_at = None;
            }
            _ => {}
        }
        self.record_status(to, by, reason, now);
        Ok(())
    }

    /// Move a completed order to `invoiced`.
    pub fn mark_invoiced(&mut self, by: UserId, now: DateTime<Utc>) -> Result<(), Error> {
        self.check_transition(WorkOrderStatus::Invoiced)?;
        self.record_status(WorkOrderStatus::Invoiced, by, None, now);
        Ok(())
    }

    /// Apply a workflow step action.
    ///
    /// Starting or completing a step on a pending order moves the order to
    /// `in_progress` and records the change in the history.
    pub fn apply_step(
        &mut self,
        key: WorkflowStepKey,
        action: StepAction,
        by: UserId,
        now: DateTime<Utc>,
    ) -> Result<(), Error> {
        self.ensure_not_terminal()?;
        apply_step_action(&mut self.workflow, key, action, by, now)?;
        if action != StepAction::Skip && self.status == WorkOrderStatus::Pending {
            self.record_status(
                WorkOrderStatus::InProgress,
                by,
                Some(format!("workflow step {key} started")),
                now,
            );
        }
        self.updated_at = now;
        Ok(())
    }

    /// Recompute totals from the current lines.
    pub fn recalculate(&mut self, tax_rate_bps: u32) {
        let labor = self.services.iter().map(|l| l.total_cents).sum();
        let parts = self.parts.iter().map(|l| l.total_cents).sum();
        self.totals = Totals::compute(labor, parts, tax_rate_bps);
    }

    /// Append a service line.
    pub fn add_service(
        &mut self,
        line: ServiceLine,
        tax_rate_bps: u32,
        now: DateTime<Utc>,
    ) -> Result<(), Error> {
        self.ensure_lines_editable()?;
        self.services.push(line);
        self.recalculate(tax_rate_bps);
        self.updated_at = now;
        Ok(())
    }

    /// Remove a service line by id.
    pub fn remove_service(
        &mut self,
        line_id: LineId,
        tax_rate_bps: u32,
        now: DateTime<Utc>,
    ) -> Result<ServiceLine, Error> {
        self.ensure_lines_editable()?;
        let index = self
            .services
            .iter()
            .position(|l| l.id == line_id)
            .ok_or_else(|| Error::not_found(format!("service line {line_id} not found")))?;
        let line = self.services.remove(index);
        self.recalculate(tax_rate_bps);
        self.updated_at = now;
        Ok(line)
    }

    /// Append a part line.
    pub fn add_part(
        &mut self,
        line: PartLine,
        tax_rate_bps: u32,
        now: DateTime<Utc>,
    ) -> Result<(), Error> {
        self.ensure_lines_editable()?;
        self.parts.push(line);
        self.recalculate(tax_rate_bps);
        self.updated_at = now;
        Ok(())
    }

    /// Remove a part line by id.
    pub fn remove_part(
        &mut self,
        line_id: LineId,
        tax_rate_bps: u32,
        now: DateTime<Utc>,
    ) -> Result<PartLine, Error> {
        self.ensure_lines_editable()?;
        let index = self
            .parts
            .iter()
            .position(|l| l.id == line_id)
            .ok_or_else(|| Error::not_found(format!("part line {line_id} not found")))?;
        let line = self.parts.remove(index);
        self.recalculate(tax_rate_bps);
        self.updated_at = now;
        Ok(line)
    }

    /// Inventory reservations held by the part lines.
    pub fn reserved_stock(&self) -> Vec<(InventoryItemId, u32)> {
        self.parts
            .iter()
            .filter_map(|l| l.inventory_item_id.map(|id| (id, l.quantity)))
            .collect()
    }

    /// Total labour across all service lines, in hundredths of an hour.
    pub fn labor_hundredths(&self) -> u64 {
        self.services.iter().map(|l| u64::from(l.labor_hundredths)).sum()
    }

    /// Append a note.
    pub fn add_note(&mut self, note: Note) {
        self.updated_at = note.created_at;
        self.notes.push(note);
    }

    /// Record attachment metadata.
    pub fn add_attachment(&mut self, attachment: Attachment) -> Result<(), Error> {
        self.ensure_not_terminal()?;
        self.updated_at = attachment.uploaded_at;
        self.attachments.push(attachment);
        Ok(())
    }

    /// Only pending or cancelled orders may be deleted.
    pub fn ensure_deletable(&self) -> Result<(), Error> {
        if matches!(
            self.status,
            WorkOrderStatus::Pending | WorkOrderStatus::Cancelled
        ) {
            return Ok(());
        }
        Err(Error::conflict(format!(
            "work order cannot be deleted while {}",
            self.status
        ))
        .with_details(json!({ "status": self.status.as_str() })))
    }
}
