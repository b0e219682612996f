//! PostgreSQL-backed `ProductRepository`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::emissions::EmissionInputs;
use crate::domain::ports::{ProductPersistenceError, ProductRepository};
use crate::domain::{
    CarbonMass, EmissionsSummary, NewProduct, Product, ProductId, UserId,
};

use super::diesel_helpers::{
    collect_rows, is_foreign_key_violation, kilograms_from_db, kilograms_to_db, map_diesel_error,
    map_pool_error, parse_record_id,
};
use super::models::{NewProductRow, ProductRow};
use super::pool::DbPool;
use super::schema::{offset_allocations, products};

/// Diesel-backed product repository.
#[derive(Clone)]
pub struct DieselProductRepository {
    pool: DbPool,
}

impl DieselProductRepository {
    /// Create a repository over the given pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn inputs_to_json(inputs: &EmissionInputs) -> Result<serde_json::Value, ProductPersistenceError> {
    serde_json::to_value(inputs)
        .map_err(|err| ProductPersistenceError::query(format!("failed to encode inputs: {err}")))
}

type SummaryColumns = (i64, i64, i64, chrono::DateTime<Utc>);

fn summary_from_row(
    (id, owner_id, estimated_kg, updated_at): SummaryColumns,
    allocated: &HashMap<i64, i64>,
) -> Result<EmissionsSummary, String> {
    let offset = allocated
        .get(&id)
        .map_or(Ok(CarbonMass::ZERO), |kg| kilograms_from_db(*kg))?;
    Ok(EmissionsSummary {
        product_id: parse_record_id::<ProductId>(id)?,
        owner_id: parse_record_id::<UserId>(owner_id)?,
        estimated: kilograms_from_db(estimated_kg)?,
        offset,
        updated_at,
    })
}

#[async_trait]
impl ProductRepository for DieselProductRepository {
    async fn create(&self, product: &NewProduct) -> Result<Product, ProductPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewProductRow {
            owner_id: product.owner_id.get(),
            name: product.details.name(),
            description: product.details.description(),
            category: product.details.category(),
            inputs: inputs_to_json(&product.inputs)?,
            estimated_emissions_kg: kilograms_to_db(product.estimated_emissions),
        };

        let stored: ProductRow = diesel::insert_into(products::table)
            .values(&row)
            .returning(ProductRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|err| {
                if is_foreign_key_violation(&err) {
                    ProductPersistenceError::missing_owner(product.owner_id.get())
                } else {
                    map_diesel_error(err)
                }
            })?;

        stored.into_domain().map_err(ProductPersistenceError::query)
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, ProductPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<ProductRow> = products::table
            .find(id.get())
            .select(ProductRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(ProductRow::into_domain)
            .transpose()
            .map_err(ProductPersistenceError::query)
    }

    async fn list(&self, owner: Option<UserId>) -> Result<Vec<Product>, ProductPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = products::table
            .select(ProductRow::as_select())
            .order_by(products::id.asc())
            .into_boxed();
        if let Some(owner_id) = owner {
            query = query.filter(products::owner_id.eq(owner_id.get()));
        }
        let rows: Vec<ProductRow> = query.load(&mut conn).await.map_err(map_diesel_error)?;

        collect_rows(rows.into_iter().map(ProductRow::into_domain))
    }

    async fn update_estimate(
        &self,
        id: ProductId,
        inputs: &EmissionInputs,
        estimate: CarbonMass,
    ) -> Result<Option<Product>, ProductPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<ProductRow> = diesel::update(products::table.find(id.get()))
            .set((
                products::inputs.eq(inputs_to_json(inputs)?),
                products::estimated_emissions_kg.eq(kilograms_to_db(estimate)),
                products::updated_at.eq(Utc::now()),
            ))
            .returning(ProductRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(ProductRow::into_domain)
            .transpose()
            .map_err(ProductPersistenceError::query)
    }

    async fn list_emissions(
        &self,
        owner: Option<UserId>,
    ) -> Result<Vec<EmissionsSummary>, ProductPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = products::table
            .select((
                products::id,
                products::owner_id,
                products::estimated_emissions_kg,
                products::updated_at,
            ))
            .order_by(products::id.asc())
            .into_boxed();
        if let Some(owner_id) = owner {
            query = query.filter(products::owner_id.eq(owner_id.get()));
        }
        let rows: Vec<SummaryColumns> = query.load(&mut conn).await.map_err(map_diesel_error)?;

        let ids: Vec<i64> = rows.iter().map(|row| row.0).collect();
        let ledger: Vec<(i64, i64)> = offset_allocations::table
            .filter(offset_allocations::product_id.eq_any(&ids))
            .select((offset_allocations::product_id, offset_allocations::quantity_kg))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let mut allocated: HashMap<i64, i64> = HashMap::new();
        for (product_id, quantity_kg) in ledger {
            let total = allocated.entry(product_id).or_default();
            *total = total.saturating_add(quantity_kg);
        }

        collect_rows(rows.into_iter().map(|row| summary_from_row(row, &allocated)))
    }
}
