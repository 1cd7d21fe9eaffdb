//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Nested value
//! collections (work-order lines, notes, history, invoice lines) live in
//! JSONB columns; closed enumerations are stored as their wire names.

diesel::table! {
    /// Repair shop organisations.
    tenants (id) {
        id -> Uuid,
        name -> Varchar,
        /// Globally unique URL-safe handle.
        slug -> Varchar,
        plan -> Varchar,
        subscription_status -> Varchar,
        /// `TenantSettings` document.
        settings -> Jsonb,
        is_active -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Staff accounts. `email` is unique across tenants.
    users (id) {
        id -> Uuid,
        tenant_id -> Uuid,
        email -> Varchar,
        password_hash -> Varchar,
        first_name -> Varchar,
        last_name -> Varchar,
        role -> Varchar,
        is_active -> Bool,
        last_login_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    customers (id) {
        id -> Uuid,
        tenant_id -> Uuid,
        first_name -> Varchar,
        last_name -> Varchar,
        email -> Nullable<Varchar>,
        phone -> Varchar,
        address -> Nullable<Jsonb>,
        notes -> Jsonb,
        is_active -> Bool,
        created_by -> Uuid,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    vehicles (id) {
        id -> Uuid,
        tenant_id -> Uuid,
        customer_id -> Uuid,
        make -> Varchar,
        model -> Varchar,
        year -> Int4,
        vin -> Nullable<Varchar>,
        license_plate -> Varchar,
        color -> Nullable<Varchar>,
        mileage -> Int8,
        engine -> Nullable<Varchar>,
        transmission -> Nullable<Varchar>,
        fuel_type -> Varchar,
        is_active -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    work_orders (id) {
        id -> Uuid,
        tenant_id -> Uuid,
        number -> Varchar,
        customer_id -> Uuid,
        vehicle_id -> Uuid,
        assigned_to -> Nullable<Uuid>,
        status -> Varchar,
        priority -> Varchar,
        description -> Text,
        mileage_in -> Nullable<Int8>,
        services -> Jsonb,
        parts -> Jsonb,
        totals -> Jsonb,
        notes -> Jsonb,
        attachments -> Jsonb,
        status_history -> Jsonb,
        workflow -> Jsonb,
        estimated_completion -> Nullable<Timestamptz>,
        completed_at -> Nullable<Timestamptz>,
        is_active -> Bool,
        created_by -> Uuid,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Last issued work-order sequence per tenant and `YYYYMM` period.
    work_order_counters (tenant_id, period) {
        tenant_id -> Uuid,
        period -> Varchar,
        last_value -> Int4,
    }
}

diesel::table! {
    appointments (id) {
        id -> Uuid,
        tenant_id -> Uuid,
        customer_id -> Uuid,
        vehicle_id -> Nullable<Uuid>,
        technician_id -> Nullable<Uuid>,
        starts_at -> Timestamptz,
        /// Derived from `starts_at + duration_minutes`; indexed for overlap checks.
        ends_at -> Timestamptz,
        duration_minutes -> Int4,
        service_type -> Varchar,
        notes -> Nullable<Text>,
        status -> Varchar,
        work_order_id -> Nullable<Uuid>,
        is_active -> Bool,
        created_by -> Uuid,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    invoices (id) {
        id -> Uuid,
        tenant_id -> Uuid,
        number -> Varchar,
        /// One invoice per work order.
        work_order_id -> Uuid,
        customer_id -> Uuid,
        lines -> Jsonb,
        subtotal_cents -> Int8,
        tax_rate_bps -> Int4,
        tax_cents -> Int8,
        total_cents -> Int8,
        amount_paid_cents -> Int8,
        status -> Varchar,
        issued_at -> Timestamptz,
        due_at -> Timestamptz,
        is_active -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Last issued invoice sequence per tenant and year.
    invoice_counters (tenant_id, year) {
        tenant_id -> Uuid,
        year -> Int4,
        last_value -> Int4,
    }
}

diesel::table! {
    payments (id) {
        id -> Uuid,
        tenant_id -> Uuid,
        invoice_id -> Uuid,
        amount_cents -> Int8,
        method -> Varchar,
        reference -> Nullable<Varchar>,
        status -> Varchar,
        /// Payment provider event id; unique when present.
        provider_event_id -> Nullable<Varchar>,
        received_at -> Timestamptz,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    inventory_items (id) {
        id -> Uuid,
        tenant_id -> Uuid,
        sku -> Varchar,
        name -> Varchar,
        category -> Nullable<Varchar>,
        quantity_on_hand -> Int8,
        reorder_level -> Int8,
        unit_cost_cents -> Int8,
        unit_price_cents -> Int8,
        supplier -> Nullable<Varchar>,
        location -> Nullable<Varchar>,
        is_active -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only stock ledger.
    stock_movements (id) {
        id -> Uuid,
        tenant_id -> Uuid,
        item_id -> Uuid,
        delta -> Int8,
        reason -> Varchar,
        reference -> Nullable<Varchar>,
        quantity_after -> Int8,
        created_by -> Uuid,
        occurred_at -> Timestamptz,
    }
}

diesel::table! {
    reports (id) {
        id -> Uuid,
        tenant_id -> Uuid,
        kind -> Varchar,
        parameters -> Jsonb,
        data -> Jsonb,
        generated_by -> Uuid,
        generated_at -> Timestamptz,
    }
}
