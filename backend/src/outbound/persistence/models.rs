//! Internal Diesel row structs.
//!
//! These types never leave the persistence layer; the `into_domain` helpers
//! re-validate every row so a hand-edited database cannot smuggle invalid
//! values into the domain.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::domain::offsets::{
    AllocationEntryId, NewOffset, NewOffsetFields, Offset, OffsetAllocationEntry, OffsetId,
};
use crate::domain::{DisplayName, EmailAddress, Product, ProductDetails, ProductId, User, UserId};

use super::diesel_helpers::{kilograms_from_db, parse_record_id};
use super::schema::{offset_allocations, offsets, products, users};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: i64,
    pub email: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

impl UserRow {
    pub(crate) fn into_domain(self) -> Result<User, String> {
        let email = EmailAddress::new(&self.email).map_err(|err| err.to_string())?;
        let display_name = DisplayName::new(&self.display_name).map_err(|err| err.to_string())?;
        Ok(User::new(
            parse_record_id::<UserId>(self.id)?,
            email,
            display_name,
            self.created_at,
        ))
    }
}

/// Insertable struct for registering users.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub email: &'a str,
    pub display_name: &'a str,
}

/// Row struct for reading from the products table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ProductRow {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub description: String,
    pub category: Option<String>,
    pub inputs: serde_json::Value,
    pub estimated_emissions_kg: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductRow {
    pub(crate) fn into_domain(self) -> Result<Product, String> {
        let details = ProductDetails::new(&self.name, &self.description, self.category.as_deref())
            .map_err(|err| err.to_string())?;
        let inputs = serde_json::from_value(self.inputs)
            .map_err(|err| format!("stored inputs are invalid: {err}"))?;
        Ok(Product {
            id: parse_record_id::<ProductId>(self.id)?,
            owner_id: parse_record_id::<UserId>(self.owner_id)?,
            details,
            inputs,
            estimated_emissions: kilograms_from_db(self.estimated_emissions_kg)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Insertable struct for creating products.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = products)]
pub(crate) struct NewProductRow<'a> {
    pub owner_id: i64,
    pub name: &'a str,
    pub description: &'a str,
    pub category: Option<&'a str>,
    pub inputs: serde_json::Value,
    pub estimated_emissions_kg: i64,
}

/// Row struct for reading from the offsets table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = offsets)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct OffsetRow {
    pub id: i64,
    pub project_name: String,
    pub description: String,
    pub location: Option<String>,
    pub source_url: String,
    pub price_per_tonne_cents: i64,
    pub tonnes_kg: i64,
    pub remaining_kg: i64,
    pub created_at: DateTime<Utc>,
}

impl OffsetRow {
    pub(crate) fn into_domain(self) -> Result<Offset, String> {
        let details = NewOffset::try_from_fields(NewOffsetFields {
            project_name: &self.project_name,
            description: &self.description,
            location: self.location.as_deref(),
            source_url: &self.source_url,
            price_per_tonne_cents: self.price_per_tonne_cents,
            tonnes: kilograms_from_db(self.tonnes_kg)?,
        })
        .map_err(|err| err.to_string())?;
        Offset::new(
            parse_record_id::<OffsetId>(self.id)?,
            details,
            kilograms_from_db(self.remaining_kg)?,
            self.created_at,
        )
        .map_err(|err| err.to_string())
    }
}

/// Insertable struct for registering offsets.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = offsets)]
pub(crate) struct NewOffsetRow<'a> {
    pub project_name: &'a str,
    pub description: &'a str,
    pub location: Option<&'a str>,
    pub source_url: &'a str,
    pub price_per_tonne_cents: i64,
    pub tonnes_kg: i64,
    pub remaining_kg: i64,
}

/// Row struct for reading the allocation ledger.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = offset_allocations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AllocationRow {
    pub id: i64,
    pub product_id: i64,
    pub offset_id: i64,
    pub quantity_kg: i64,
    pub created_at: DateTime<Utc>,
}

impl AllocationRow {
    pub(crate) fn into_domain(self) -> Result<OffsetAllocationEntry, String> {
        Ok(OffsetAllocationEntry {
            id: parse_record_id::<AllocationEntryId>(self.id)?,
            product_id: parse_record_id::<ProductId>(self.product_id)?,
            offset_id: parse_record_id::<OffsetId>(self.offset_id)?,
            quantity: kilograms_from_db(self.quantity_kg)?,
            created_at: self.created_at,
        })
    }
}

/// Insertable struct for ledger rows.
#[derive(Debug, Clone, Copy, Insertable)]
#[diesel(table_name = offset_allocations)]
pub(crate) struct NewAllocationRow {
    pub product_id: i64,
    pub offset_id: i64,
    pub quantity_kg: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CarbonMass;

    #[test]
    fn negative_masses_are_rejected() {
        let row = AllocationRow {
            id: 1,
            product_id: 1,
            offset_id: 1,
            quantity_kg: -5,
            created_at: Utc::now(),
        };
        assert!(row.into_domain().is_err());
    }

    #[test]
    fn offset_rows_round_trip_through_validation() {
        let row = OffsetRow {
            id: 3,
            project_name: "Mangroves".into(),
            description: String::new(),
            location: Some("Kenya".into()),
            source_url: "https://registry.example.org/3".into(),
            price_per_tonne_cents: 1_200,
            tonnes_kg: 5_000,
            remaining_kg: 2_000,
            created_at: Utc::now(),
        };
        let offset = row.into_domain().expect("valid row");
        assert_eq!(offset.remaining(), CarbonMass::from_whole_tonnes(2));
        assert_eq!(offset.allocated(), CarbonMass::from_whole_tonnes(3));
    }

    #[test]
    fn offset_rows_with_excess_remaining_are_rejected() {
        let row = OffsetRow {
            id: 3,
            project_name: "Mangroves".into(),
            description: String::new(),
            location: None,
            source_url: "https://registry.example.org/3".into(),
            price_per_tonne_cents: 0,
            tonnes_kg: 1_000,
            remaining_kg: 2_000,
            created_at: Utc::now(),
        };
        assert!(row.into_domain().is_err());
    }
}
