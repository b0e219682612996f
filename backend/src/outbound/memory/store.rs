//! Mutex-guarded store implementing every repository port.
//!
//! A single lock covers users, products, offsets and the ledger, so an
//! allocation observes and updates a consistent snapshot. The lock is never
//! held across an `.await`.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::emissions::EmissionInputs;
use crate::domain::offsets::{
    AllocationEntryId, AllocationRequest, NewOffset, Offset, OffsetAllocationEntry, OffsetId,
    Allocation,
};
use crate::domain::ports::{
    AllocationCommand, OffsetPersistenceError, OffsetRepository, ProductPersistenceError,
    ProductRepository, UserPersistenceError, UserRepository,
};
use crate::domain::{
    CarbonMass, EmissionsSummary, NewProduct, NewUser, Product, ProductId, User, UserId,
};

const POISONED: &str = "in-memory store lock poisoned";

#[derive(Default)]
struct State {
    users: BTreeMap<UserId, User>,
    products: BTreeMap<ProductId, Product>,
    offsets: BTreeMap<OffsetId, Offset>,
    ledger: Vec<OffsetAllocationEntry>,
    last_id: i64,
}

impl State {
    fn next_raw_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn allocated_to(&self, product_id: ProductId) -> CarbonMass {
        self.ledger
            .iter()
            .filter(|entry| entry.product_id == product_id)
            .map(|entry| entry.quantity)
            .sum()
    }

    fn allocation_totals(&self) -> HashMap<ProductId, CarbonMass> {
        let mut totals: HashMap<ProductId, CarbonMass> = HashMap::new();
        for entry in &self.ledger {
            let total = totals.entry(entry.product_id).or_insert(CarbonMass::ZERO);
            *total = total.saturating_add(entry.quantity);
        }
        totals
    }
}

/// Shared in-memory backing store.
///
/// Identifiers come from one counter across all tables, so they are unique
/// and strictly increasing in insertion order.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock<E>(&self, poisoned: impl FnOnce(&'static str) -> E) -> Result<MutexGuard<'_, State>, E> {
        self.state.lock().map_err(|_| poisoned(POISONED))
    }
}

fn owned_by(owner: Option<UserId>, product: &Product) -> bool {
    owner.is_none_or(|owner_id| product.owner_id == owner_id)
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(&self, user: &NewUser) -> Result<User, UserPersistenceError> {
        let mut state = self.lock(UserPersistenceError::connection)?;
        if state.users.values().any(|existing| existing.email() == &user.email) {
            return Err(UserPersistenceError::duplicate_email(user.email.as_ref()));
        }
        let id = UserId::new(state.next_raw_id())
            .map_err(|err| UserPersistenceError::query(err.to_string()))?;
        let stored = User::new(
            id,
            user.email.clone(),
            user.display_name.clone(),
            Utc::now(),
        );
        state.users.insert(id, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserPersistenceError> {
        let state = self.lock(UserPersistenceError::connection)?;
        Ok(state.users.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<User>, UserPersistenceError> {
        let state = self.lock(UserPersistenceError::connection)?;
        Ok(state.users.values().cloned().collect())
    }
}

#[async_trait]
impl ProductRepository for InMemoryStore {
    async fn create(&self, product: &NewProduct) -> Result<Product, ProductPersistenceError> {
        let mut state = self.lock(ProductPersistenceError::connection)?;
        if !state.users.contains_key(&product.owner_id) {
            return Err(ProductPersistenceError::missing_owner(product.owner_id.get()));
        }
        let id = ProductId::new(state.next_raw_id())
            .map_err(|err| ProductPersistenceError::query(err.to_string()))?;
        let now = Utc::now();
        let stored = Product {
            id,
            owner_id: product.owner_id,
            details: product.details.clone(),
            inputs: product.inputs.clone(),
            estimated_emissions: product.estimated_emissions,
            created_at: now,
            updated_at: now,
        };
        state.products.insert(id, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, ProductPersistenceError> {
        let state = self.lock(ProductPersistenceError::connection)?;
        Ok(state.products.get(&id).cloned())
    }

    async fn list(&self, owner: Option<UserId>) -> Result<Vec<Product>, ProductPersistenceError> {
        let state = self.lock(ProductPersistenceError::connection)?;
        Ok(state
            .products
            .values()
            .filter(|product| owned_by(owner, product))
            .cloned()
            .collect())
    }

    async fn update_estimate(
        &self,
        id: ProductId,
        inputs: &EmissionInputs,
        estimate: CarbonMass,
    ) -> Result<Option<Product>, ProductPersistenceError> {
        let mut state = self.lock(ProductPersistenceError::connection)?;
        Ok(state.products.get_mut(&id).map(|product| {
            product.inputs = inputs.clone();
            product.estimated_emissions = estimate;
            product.updated_at = Utc::now();
            product.clone()
        }))
    }

    async fn list_emissions(
        &self,
        owner: Option<UserId>,
    ) -> Result<Vec<EmissionsSummary>, ProductPersistenceError> {
        let state = self.lock(ProductPersistenceError::connection)?;
        let totals = state.allocation_totals();
        Ok(state
            .products
            .values()
            .filter(|product| owned_by(owner, product))
            .map(|product| EmissionsSummary {
                product_id: product.id,
                owner_id: product.owner_id,
                estimated: product.estimated_emissions,
                offset: totals.get(&product.id).copied().unwrap_or(CarbonMass::ZERO),
                updated_at: product.updated_at,
            })
            .collect())
    }
}

#[async_trait]
impl OffsetRepository for InMemoryStore {
    async fn create(&self, offset: &NewOffset) -> Result<Offset, OffsetPersistenceError> {
        let mut state = self.lock(OffsetPersistenceError::connection)?;
        let id = OffsetId::new(state.next_raw_id())
            .map_err(|err| OffsetPersistenceError::query(err.to_string()))?;
        let stored = Offset::new(id, offset.clone(), offset.tonnes(), Utc::now())
            .map_err(|err| OffsetPersistenceError::query(err.to_string()))?;
        state.offsets.insert(id, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: OffsetId) -> Result<Option<Offset>, OffsetPersistenceError> {
        let state = self.lock(OffsetPersistenceError::connection)?;
        Ok(state.offsets.get(&id).cloned())
    }

    async fn list(&self, only_available: bool) -> Result<Vec<Offset>, OffsetPersistenceError> {
        let state = self.lock(OffsetPersistenceError::connection)?;
        Ok(state
            .offsets
            .values()
            .filter(|offset| !only_available || !offset.is_exhausted())
            .cloned()
            .collect())
    }

    async fn allocate(
        &self,
        command: AllocationCommand,
    ) -> Result<Allocation, OffsetPersistenceError> {
        let mut state = self.lock(OffsetPersistenceError::connection)?;
        let estimated = state
            .products
            .get(&command.product_id)
            .map(|product| product.estimated_emissions)
            .ok_or_else(|| OffsetPersistenceError::missing_product(command.product_id.get()))?;
        let target = command
            .target
            .resolve(estimated, state.allocated_to(command.product_id));

        let mut pool: Vec<Offset> = state
            .offsets
            .values()
            .filter(|offset| !offset.is_exhausted())
            .cloned()
            .collect();
        let allocation = command
            .allocator
            .allocate(
                AllocationRequest {
                    target,
                    coverage: command.coverage,
                },
                &mut pool,
            )
            .map_err(OffsetPersistenceError::rejected)?;

        let now = Utc::now();
        for line in &allocation.lines {
            state.offsets.insert(line.offset.id(), line.offset.clone());
            let id = AllocationEntryId::new(state.next_raw_id())
                .map_err(|err| OffsetPersistenceError::query(err.to_string()))?;
            state.ledger.push(OffsetAllocationEntry {
                id,
                product_id: command.product_id,
                offset_id: line.offset.id(),
                quantity: line.consumed,
                created_at: now,
            });
        }
        Ok(allocation)
    }

    async fn list_allocations(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<OffsetAllocationEntry>, OffsetPersistenceError> {
        let state = self.lock(OffsetPersistenceError::connection)?;
        Ok(state
            .ledger
            .iter()
            .filter(|entry| entry.product_id == product_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
