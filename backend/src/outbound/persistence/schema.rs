//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Masses are
//! stored as whole kilograms in `BIGINT` columns.

diesel::table! {
    /// Registered users; `email` is unique.
    users (id) {
        id -> Int8,
        email -> Varchar,
        display_name -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Products with their estimator inputs and derived estimate.
    products (id) {
        id -> Int8,
        owner_id -> Int8,
        name -> Varchar,
        description -> Text,
        category -> Nullable<Varchar>,
        /// Validated estimator inputs as camelCase JSON.
        inputs -> Jsonb,
        estimated_emissions_kg -> Int8,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Offset projects; `0 <= remaining_kg <= tonnes_kg` is enforced by a
    /// CHECK constraint.
    offsets (id) {
        id -> Int8,
        project_name -> Varchar,
        description -> Text,
        location -> Nullable<Varchar>,
        source_url -> Text,
        price_per_tonne_cents -> Int8,
        tonnes_kg -> Int8,
        remaining_kg -> Int8,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Allocation ledger.
    offset_allocations (id) {
        id -> Int8,
        product_id -> Int8,
        offset_id -> Int8,
        quantity_kg -> Int8,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(products -> users (owner_id));
diesel::joinable!(offset_allocations -> products (product_id));
diesel::joinable!(offset_allocations -> offsets (offset_id));

diesel::allow_tables_to_appear_in_same_query!(users, products, offsets, offset_allocations);
