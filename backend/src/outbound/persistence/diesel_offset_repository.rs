//! PostgreSQL-backed `OffsetRepository`.
//!
//! Allocation runs in one transaction: the product row and every candidate
//! offset are locked `FOR UPDATE` before the allocator sees them, decrements
//! are guarded by `remaining_kg >= consumed`, and ledger rows are inserted in
//! the same transaction. Any failure rolls the whole allocation back.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};

use crate::domain::offsets::{
    Allocation, AllocationError, AllocationRequest, NewOffset, Offset, OffsetAllocationEntry,
    OffsetId,
};
use crate::domain::ports::{AllocationCommand, OffsetPersistenceError, OffsetRepository};
use crate::domain::{CarbonMass, ProductId};

use super::diesel_helpers::{
    collect_rows, kilograms_from_db, kilograms_to_db, map_diesel_error, map_pool_error,
};
use super::models::{AllocationRow, NewAllocationRow, NewOffsetRow, OffsetRow};
use super::pool::DbPool;
use super::schema::{offset_allocations, offsets, products};

/// Diesel-backed offset repository.
#[derive(Clone)]
pub struct DieselOffsetRepository {
    pool: DbPool,
}

impl DieselOffsetRepository {
    /// Create a repository over the given pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Failures raised inside the allocation transaction.
#[derive(Debug)]
enum AllocateTxError {
    Diesel(DieselError),
    MissingProduct(i64),
    Rejected(AllocationError),
    Corrupt(String),
    LostUpdate(i64),
}

impl From<DieselError> for AllocateTxError {
    fn from(error: DieselError) -> Self {
        Self::Diesel(error)
    }
}

impl From<AllocateTxError> for OffsetPersistenceError {
    fn from(error: AllocateTxError) -> Self {
        match error {
            AllocateTxError::Diesel(err) => map_diesel_error(err),
            AllocateTxError::MissingProduct(id) => Self::missing_product(id),
            AllocateTxError::Rejected(reason) => Self::rejected(reason),
            AllocateTxError::Corrupt(message) => Self::query(message),
            AllocateTxError::LostUpdate(offset_id) => {
                Self::query(format!("offset {offset_id} changed during allocation"))
            }
        }
    }
}

async fn allocate_in_tx(
    conn: &mut AsyncPgConnection,
    command: AllocationCommand,
) -> Result<Allocation, AllocateTxError> {
    let product_id = command.product_id.get();
    let estimated_kg: i64 = products::table
        .find(product_id)
        .select(products::estimated_emissions_kg)
        .for_update()
        .first(conn)
        .await
        .optional()?
        .ok_or(AllocateTxError::MissingProduct(product_id))?;
    let estimated = kilograms_from_db(estimated_kg).map_err(AllocateTxError::Corrupt)?;

    let ledger: Vec<i64> = offset_allocations::table
        .filter(offset_allocations::product_id.eq(product_id))
        .select(offset_allocations::quantity_kg)
        .load(conn)
        .await?;
    let already_allocated = ledger
        .into_iter()
        .map(kilograms_from_db)
        .sum::<Result<CarbonMass, String>>()
        .map_err(AllocateTxError::Corrupt)?;
    let target = command.target.resolve(estimated, already_allocated);

    let rows: Vec<OffsetRow> = offsets::table
        .filter(offsets::remaining_kg.gt(0))
        .order_by(offsets::id.asc())
        .select(OffsetRow::as_select())
        .for_update()
        .load(conn)
        .await?;
    let mut pool = rows
        .into_iter()
        .map(OffsetRow::into_domain)
        .collect::<Result<Vec<Offset>, String>>()
        .map_err(AllocateTxError::Corrupt)?;

    let allocation = command
        .allocator
        .allocate(
            AllocationRequest {
                target,
                coverage: command.coverage,
            },
            &mut pool,
        )
        .map_err(AllocateTxError::Rejected)?;

    let mut ledger_rows = Vec::with_capacity(allocation.lines.len());
    for line in &allocation.lines {
        let offset_id = line.offset.id().get();
        let consumed = kilograms_to_db(line.consumed);
        let updated = diesel::update(
            offsets::table
                .find(offset_id)
                .filter(offsets::remaining_kg.ge(consumed)),
        )
        .set(offsets::remaining_kg.eq(offsets::remaining_kg - consumed))
        .execute(conn)
        .await?;
        if updated == 0 {
            return Err(AllocateTxError::LostUpdate(offset_id));
        }
        ledger_rows.push(NewAllocationRow {
            product_id,
            offset_id,
            quantity_kg: consumed,
        });
    }

    if !ledger_rows.is_empty() {
        diesel::insert_into(offset_allocations::table)
            .values(&ledger_rows)
            .execute(conn)
            .await?;
    }

    Ok(allocation)
}

#[async_trait]
impl OffsetRepository for DieselOffsetRepository {
    async fn create(&self, offset: &NewOffset) -> Result<Offset, OffsetPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error::<OffsetPersistenceError>)?;
        let tonnes = kilograms_to_db(offset.tonnes());
        let price = i64::try_from(offset.price_per_tonne_cents())
            .map_err(|_| OffsetPersistenceError::query("price per tonne exceeds BIGINT range"))?;
        let row = NewOffsetRow {
            project_name: offset.project_name(),
            description: offset.description(),
            location: offset.location(),
            source_url: offset.source_url().as_str(),
            price_per_tonne_cents: price,
            tonnes_kg: tonnes,
            remaining_kg: tonnes,
        };

        let stored: OffsetRow = diesel::insert_into(offsets::table)
            .values(&row)
            .returning(OffsetRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error::<OffsetPersistenceError>)?;

        stored.into_domain().map_err(OffsetPersistenceError::query)
    }

    async fn find_by_id(&self, id: OffsetId) -> Result<Option<Offset>, OffsetPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error::<OffsetPersistenceError>)?;
        let row: Option<OffsetRow> = offsets::table
            .find(id.get())
            .select(OffsetRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error::<OffsetPersistenceError>)?;

        row.map(OffsetRow::into_domain)
            .transpose()
            .map_err(OffsetPersistenceError::query)
    }

    async fn list(&self, only_available: bool) -> Result<Vec<Offset>, OffsetPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error::<OffsetPersistenceError>)?;
        let mut query = offsets::table
            .select(OffsetRow::as_select())
            .order_by(offsets::id.asc())
            .into_boxed();
        if only_available {
            query = query.filter(offsets::remaining_kg.gt(0));
        }
        let rows: Vec<OffsetRow> = query
            .load(&mut conn)
            .await
            .map_err(map_diesel_error::<OffsetPersistenceError>)?;

        collect_rows(rows.into_iter().map(OffsetRow::into_domain))
    }

    async fn allocate(
        &self,
        command: AllocationCommand,
    ) -> Result<Allocation, OffsetPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error::<OffsetPersistenceError>)?;
        conn.transaction(|conn| async move { allocate_in_tx(conn, command).await }.scope_boxed())
            .await
            .map_err(OffsetPersistenceError::from)
    }

    async fn list_allocations(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<OffsetAllocationEntry>, OffsetPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error::<OffsetPersistenceError>)?;
        let rows: Vec<AllocationRow> = offset_allocations::table
            .filter(offset_allocations::product_id.eq(product_id.get()))
            .select(AllocationRow::as_select())
            .order_by(offset_allocations::id.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error::<OffsetPersistenceError>)?;

        collect_rows(rows.into_iter().map(AllocationRow::into_domain))
    }
}
