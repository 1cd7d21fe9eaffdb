//! Work-order orchestration: lifecycle, lines with stock reservation, notes
//! and attachments.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::Clock;
use pagination::{Page, PageRequest};
use serde_json::json;
use tracing::{info, warn};

use super::attachment::{check_content_type, sanitise_file_name};
use super::ports::{FileStore, Repositories};
use super::tenant_service::UsageGuard;
use super::validation::FieldError;
use super::work_order::work_order_number;
use super::{
    AddNoteRequest, AddPartLineRequest, AddServiceLineRequest, AssignTechnicianRequest,
    Attachment, ChangeStatusRequest, CreateWorkOrderRequest, Error, InventoryItem,
    InventoryItemId, LimitedResource, LineId, MAX_ATTACHMENT_BYTES, MovementReason, Note,
    PartLine, Permission, Principal, ServiceLine, StockChange, StockUpdate, TenantId,
    UpdateWorkOrderRequest, UserId, WorkOrder, WorkOrderFilter, WorkOrderId, WorkOrderStatus,
    WorkflowActionRequest, WorkflowStepKey, lookup,
};

/// An uploaded file on its way to a work order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Work-order operations.
#[derive(Clone)]
pub struct WorkOrderService {
    repos: Repositories,
    usage: UsageGuard,
    files: Arc<dyn FileStore>,
    clock: Arc<dyn Clock>,
}

impl WorkOrderService {
    /// Create the service.
    pub fn new(
        repos: Repositories,
        usage: UsageGuard,
        files: Arc<dyn FileStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repos,
            usage,
            files,
            clock,
        }
    }

    async fn technician(
        &self,
        tenant_id: TenantId,
        id: Option<UserId>,
        field: &str,
    ) -> Result<(), Error> {
        if let Some(id) = id {
            lookup::reference(lookup::user(&self.repos, tenant_id, id).await, field)?;
        }
        Ok(())
    }

    async fn tax_rate(&self, tenant_id: TenantId) -> Result<(u32, i64), Error> {
        let tenant = lookup::tenant(&self.repos, tenant_id).await?;
        Ok((tenant.settings.tax_rate_bps, tenant.settings.labor_rate_cents))
    }

    /// Open a work order for a customer's vehicle.
    pub async fn create(
        &self,
        principal: &Principal,
        request: CreateWorkOrderRequest,
    ) -> Result<WorkOrder, Error> {
        principal.require(Permission::WorkOrdersWrite)?;
        let tenant_id = principal.tenant_id;
        let now = self.clock.utc();
        let mut order = WorkOrder::open(tenant_id, String::new(), request, principal.user_id, now)?;

        lookup::reference(
            lookup::customer(&self.repos, tenant_id, order.customer_id).await,
            "customerId",
        )?;
        let vehicle = lookup::reference(
            lookup::vehicle(&self.repos, tenant_id, order.vehicle_id).await,
            "vehicleId",
        )?;
        if vehicle.customer_id != order.customer_id {
            return Err(FieldError::new(
                "vehicleId",
                "vehicle_customer_mismatch",
                "vehicle does not belong to the customer",
            )
            .into());
        }
        self.technician(tenant_id, order.assigned_to, "assignedTo")
            .await?;
        self.usage
            .ensure_capacity(tenant_id, LimitedResource::WorkOrders)
            .await?;

        let period = now.format("%Y%m").to_string();
        let sequence = self.repos.work_orders.next_sequence(tenant_id, &period).await?;
        order.number = work_order_number(now, sequence);
        self.repos.work_orders.insert(&order).await?;
        info!(tenant_id = %tenant_id, number = %order.number, "work order created");
        Ok(order)
    }

    /// Fetch one work order.
    pub async fn get(&self, principal: &Principal, id: WorkOrderId) -> Result<WorkOrder, Error> {
        principal.require(Permission::WorkOrdersRead)?;
        lookup::work_order(&self.repos, principal.tenant_id, id).await
    }

    /// Page through work orders, newest first.
    pub async fn list(
        &self,
        principal: &Principal,
        filter: &WorkOrderFilter,
        page: PageRequest,
    ) -> Result<Page<WorkOrder>, Error> {
        principal.require(Permission::WorkOrdersRead)?;
        Ok(self
            .repos
            .work_orders
            .list(principal.tenant_id, filter, page)
            .await?)
    }

    /// Update descriptive fields.
    pub async fn update(
        &self,
        principal: &Principal,
        id: WorkOrderId,
        patch: UpdateWorkOrderRequest,
    ) -> Result<WorkOrder, Error> {
        principal.require(Permission::WorkOrdersWrite)?;
        let mut order = lookup::work_order(&self.repos, principal.tenant_id, id).await?;
        let read_at = order.updated_at;
        order.update_details(patch, self.clock.utc())?;
        self.repos.work_orders.update(&order, read_at).await?;
        Ok(order)
    }

    /// Set or clear the assigned technician.
    pub async fn assign(
        &self,
        principal: &Principal,
        id: WorkOrderId,
        request: AssignTechnicianRequest,
    ) -> Result<WorkOrder, Error> {
        principal.require(Permission::WorkOrdersAssign)?;
        let mut order = lookup::work_order(&self.repos, principal.tenant_id, id).await?;
        let read_at = order.updated_at;
        self.technician(principal.tenant_id, request.technician_id, "technicianId")
            .await?;
        order.assign(request.technician_id, self.clock.utc())?;
        self.repos.work_orders.update(&order, read_at).await?;
        Ok(order)
    }

    /// Move the order along the status table.
    ///
    /// Cancelling returns every reserved part to stock.
    pub async fn change_status(
        &self,
        principal: &Principal,
        id: WorkOrderId,
        request: ChangeStatusRequest,
    ) -> Result<WorkOrder, Error> {
        principal.require(Permission::WorkOrdersStatus)?;
        let mut order = lookup::work_order(&self.repos, principal.tenant_id, id).await?;
        let read_at = order.updated_at;
        let from = order.status;
        let now = self.clock.utc();
        order.transition(
            request.status,
            principal.user_id,
            request.reason.as_deref(),
            now,
        )?;
        self.repos.work_orders.update(&order, read_at).await?;
        if order.status == WorkOrderStatus::Cancelled {
            self.release_all(&order, principal.user_id, now).await?;
        }
        info!(
            tenant_id = %order.tenant_id,
            number = %order.number,
            from = %from,
            to = %order.status,
            "work order status changed"
        );
        Ok(order)
    }

    /// Start, complete or skip a workflow step.
    pub async fn apply_step(
        &self,
        principal: &Principal,
        id: WorkOrderId,
        key: WorkflowStepKey,
        request: WorkflowActionRequest,
    ) -> Result<WorkOrder, Error> {
        principal.require(Permission::WorkOrdersStatus)?;
        let mut order = lookup::work_order(&self.repos, principal.tenant_id, id).await?;
        let read_at = order.updated_at;
        order.apply_step(key, request.action, principal.user_id, self.clock.utc())?;
        self.repos.work_orders.update(&order, read_at).await?;
        Ok(order)
    }

    /// Add labour. The tenant's labour rate applies unless one is given.
    pub async fn add_service(
        &self,
        principal: &Principal,
        id: WorkOrderId,
        request: AddServiceLineRequest,
    ) -> Result<WorkOrder, Error> {
        principal.require(Permission::WorkOrdersWrite)?;
        let mut order = lookup::work_order(&self.repos, principal.tenant_id, id).await?;
        let read_at = order.updated_at;
        let (tax_rate, labor_rate) = self.tax_rate(principal.tenant_id).await?;
        let line = ServiceLine::new(
            &request.description,
            request.labor_hundredths,
            request.rate_cents.unwrap_or(labor_rate),
        )?;
        order.add_service(line, tax_rate, self.clock.utc())?;
        self.repos.work_orders.update(&order, read_at).await?;
        Ok(order)
    }

    /// Remove a service line.
    pub async fn remove_service(
        &self,
        principal: &Principal,
        id: WorkOrderId,
        line_id: LineId,
    ) -> Result<WorkOrder, Error> {
        principal.require(Permission::WorkOrdersWrite)?;
        let mut order = lookup::work_order(&self.repos, principal.tenant_id, id).await?;
        let read_at = order.updated_at;
        let (tax_rate, _) = self.tax_rate(principal.tenant_id).await?;
        order.remove_service(line_id, tax_rate, self.clock.utc())?;
        self.repos.work_orders.update(&order, read_at).await?;
        Ok(order)
    }

    async fn stocked_item(
        &self,
        tenant_id: TenantId,
        id: InventoryItemId,
    ) -> Result<InventoryItem, Error> {
        let item = self
            .repos
            .inventory
            .find(tenant_id, id)
            .await?
            .filter(|item| item.is_active)
            .ok_or_else(|| Error::not_found(format!("inventory item {id} not found")));
        lookup::reference(item, "inventoryItemId")
    }

    async fn move_stock(
        &self,
        order: &WorkOrder,
        item_id: InventoryItemId,
        delta: i64,
        by: UserId,
        now: DateTime<Utc>,
    ) -> Result<StockUpdate, Error> {
        let change = StockChange {
            tenant_id: order.tenant_id,
            item_id,
            delta,
            reason: MovementReason::WorkOrder,
            reference: Some(order.number.clone()),
            created_by: by,
            at: now,
        };
        Ok(self.repos.inventory.apply_stock_change(&change).await?)
    }

    async fn release(
        &self,
        order: &WorkOrder,
        item_id: InventoryItemId,
        quantity: u32,
        by: UserId,
        now: DateTime<Utc>,
    ) -> Result<(), Error> {
        let update = self
            .move_stock(order, item_id, i64::from(quantity), by, now)
            .await?;
        if !matches!(update, StockUpdate::Applied(_)) {
            warn!(
                number = %order.number,
                item_id = %item_id,
                "inventory item vanished before its reserved stock was returned"
            );
        }
        Ok(())
    }

    async fn release_all(
        &self,
        order: &WorkOrder,
        by: UserId,
        now: DateTime<Utc>,
    ) -> Result<(), Error> {
        for (item_id, quantity) in order.reserved_stock() {
            self.release(order, item_id, quantity, by, now).await?;
        }
        Ok(())
    }

    /// Add a part. Stocked parts are taken from inventory immediately.
    pub async fn add_part(
        &self,
        principal: &Principal,
        id: WorkOrderId,
        request: AddPartLineRequest,
    ) -> Result<WorkOrder, Error> {
        principal.require(Permission::WorkOrdersWrite)?;
        let mut order = lookup::work_order(&self.repos, principal.tenant_id, id).await?;
        let read_at = order.updated_at;
        order.ensure_lines_editable()?;
        let (tax_rate, _) = self.tax_rate(principal.tenant_id).await?;
        let now = self.clock.utc();

        let line = match request.inventory_item_id {
            Some(item_id) => {
                let item = self.stocked_item(principal.tenant_id, item_id).await?;
                PartLine::new(
                    Some(item_id),
                    request.name.as_deref().unwrap_or(&item.name),
                    request.quantity,
                    request.unit_price_cents.unwrap_or(item.unit_price_cents),
                )?
            }
            None => PartLine::new(
                None,
                request.name.as_deref().unwrap_or_default(),
                request.quantity,
                request.unit_price_cents.ok_or_else(|| {
                    FieldError::new("unitPriceCents", "required", "required for unstocked parts")
                })?,
            )?,
        };

        if let Some(item_id) = line.inventory_item_id {
            let requested = i64::from(line.quantity);
            match self
                .move_stock(&order, item_id, -requested, principal.user_id, now)
                .await?
            {
                StockUpdate::Applied(_) => {}
                StockUpdate::Insufficient { available } => {
                    return Err(Error::conflict("insufficient stock").with_details(json!({
                        "inventoryItemId": item_id,
                        "available": available,
                        "requested": requested,
                    })));
                }
                StockUpdate::NotFound => {
                    return Err(FieldError::new(
                        "inventoryItemId",
                        "unknown_reference",
                        "inventoryItemId does not reference an active record",
                    )
                    .into());
                }
            }
        }

        let reserved = line.inventory_item_id.map(|item_id| (item_id, line.quantity));
        order.add_part(line, tax_rate, now)?;
        if let Err(err) = self.repos.work_orders.update(&order, read_at).await {
            if let Some((item_id, quantity)) = reserved {
                self.release(&order, item_id, quantity, principal.user_id, now)
                    .await?;
            }
            return Err(err.into());
        }
        Ok(order)
    }

    /// Remove a part line, restocking stocked parts.
    pub async fn remove_part(
        &self,
        principal: &Principal,
        id: WorkOrderId,
        line_id: LineId,
    ) -> Result<WorkOrder, Error> {
        principal.require(Permission::WorkOrdersWrite)?;
        let mut order = lookup::work_order(&self.repos, principal.tenant_id, id).await?;
        let read_at = order.updated_at;
        let (tax_rate, _) = self.tax_rate(principal.tenant_id).await?;
        let now = self.clock.utc();
        let line = order.remove_part(line_id, tax_rate, now)?;
        self.repos.work_orders.update(&order, read_at).await?;
        if let Some(item_id) = line.inventory_item_id {
            self.release(&order, item_id, line.quantity, principal.user_id, now)
                .await?;
        }
        Ok(order)
    }

    /// Append a note.
    pub async fn add_note(
        &self,
        principal: &Principal,
        id: WorkOrderId,
        request: &AddNoteRequest,
    ) -> Result<WorkOrder, Error> {
        principal.require(Permission::WorkOrdersWrite)?;
        let mut order = lookup::work_order(&self.repos, principal.tenant_id, id).await?;
        let read_at = order.updated_at;
        order.add_note(Note::new(principal.user_id, &request.body, self.clock.utc())?);
        self.repos.work_orders.update(&order, read_at).await?;
        Ok(order)
    }

    /// Soft delete a pending or cancelled order.
    ///
    /// Parts still reserved by a pending order go back to stock.
    pub async fn delete(&self, principal: &Principal, id: WorkOrderId) -> Result<(), Error> {
        principal.require(Permission::WorkOrdersWrite)?;
        let mut order = lookup::work_order(&self.repos, principal.tenant_id, id).await?;
        let read_at = order.updated_at;
        order.ensure_deletable()?;
        let now = self.clock.utc();
        let was_pending = order.status == WorkOrderStatus::Pending;
        order.is_active = false;
        order.updated_at = now;
        self.repos.work_orders.update(&order, read_at).await?;
        if was_pending {
            self.release_all(&order, principal.user_id, now).await?;
        }
        info!(tenant_id = %order.tenant_id, number = %order.number, "work order deleted");
        Ok(())
    }

    /// Store an uploaded file and record it on the order.
    pub async fn upload_attachment(
        &self,
        principal: &Principal,
        id: WorkOrderId,
        upload: AttachmentUpload,
    ) -> Result<Attachment, Error> {
        principal.require(Permission::WorkOrdersWrite)?;
        if upload.bytes.is_empty() {
            return Err(FieldError::new("file", "required", "file is empty").into());
        }
        if upload.bytes.len() > MAX_ATTACHMENT_BYTES {
            return Err(FieldError::new("file", "too_large", "file exceeds 10 MiB").into());
        }
        check_content_type(&upload.content_type)?;
        let mut order = lookup::work_order(&self.repos, principal.tenant_id, id).await?;
        let read_at = order.updated_at;
        order.ensure_not_terminal()?;

        let attachment = Attachment {
            id: LineId::random(),
            work_order_id: order.id,
            file_name: sanitise_file_name(&upload.file_name),
            content_type: upload.content_type,
            size_bytes: u64::try_from(upload.bytes.len()).unwrap_or(u64::MAX),
            uploaded_by: principal.user_id,
            uploaded_at: self.clock.utc(),
        };
        self.files
            .put(order.tenant_id, &attachment_key(&attachment), upload.bytes)
            .await?;
        order.add_attachment(attachment.clone())?;
        self.repos.work_orders.update(&order, read_at).await?;
        Ok(attachment)
    }

    /// Load an attachment's metadata and bytes.
    pub async fn download_attachment(
        &self,
        principal: &Principal,
        id: WorkOrderId,
        attachment_id: LineId,
    ) -> Result<(Attachment, Vec<u8>), Error> {
        principal.require(Permission::WorkOrdersRead)?;
        let order = lookup::work_order(&self.repos, principal.tenant_id, id).await?;
        let attachment = order
            .attachments
            .into_iter()
            .find(|a| a.id == attachment_id)
            .ok_or_else(|| Error::not_found(format!("attachment {attachment_id} not found")))?;
        let bytes = self
            .files
            .get(order.tenant_id, &attachment_key(&attachment))
            .await?;
        Ok((attachment, bytes))
    }
}

fn attachment_key(attachment: &Attachment) -> String {
    format!("{}/{}", attachment.work_order_id, attachment.id)
}

#[cfg(test)]
#[path = "work_order_service_tests.rs"]
mod tests;
