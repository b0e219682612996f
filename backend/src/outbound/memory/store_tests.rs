//! Tests for the in-memory repository adapters.

use std::sync::Arc;

use rstest::{fixture, rstest};

use super::*;
use crate::domain::emissions::{EmissionInputsDraft, MaterialDraft};
use crate::domain::offsets::{
    AllocationError, AllocationTarget, CoverageMode, NewOffsetFields, OffsetAllocator,
};
use crate::domain::ProductDetails;

fn inputs() -> EmissionInputs {
    EmissionInputs::try_from(EmissionInputsDraft {
        materials: Some(vec![MaterialDraft {
            material: Some("steel".into()),
            mass_kg: Some(1.0),
        }]),
        energy_kwh: Some(0.0),
        transport: None,
    })
    .expect("valid inputs")
}

#[fixture]
fn store() -> Arc<InMemoryStore> {
    Arc::new(InMemoryStore::new())
}

async fn seed_user(store: &InMemoryStore, email: &str) -> User {
    let user = NewUser::try_from_parts(email, "Ada").expect("valid user");
    UserRepository::create(store, &user).await.expect("stored")
}

async fn seed_product(store: &InMemoryStore, owner: UserId, tonnes: u64) -> Product {
    let product = NewProduct {
        owner_id: owner,
        details: ProductDetails::new("Kettle", "", None).expect("details"),
        inputs: inputs(),
        estimated_emissions: CarbonMass::from_whole_tonnes(tonnes),
    };
    ProductRepository::create(store, &product)
        .await
        .expect("stored")
}

async fn seed_offset(store: &InMemoryStore, tonnes: u64, price: i64) -> Offset {
    let offset = NewOffset::try_from_fields(NewOffsetFields {
        project_name: "Peatland restoration",
        description: "",
        location: None,
        source_url: "https://registry.example.org/projects/1",
        price_per_tonne_cents: price,
        tonnes: CarbonMass::from_whole_tonnes(tonnes),
    })
    .expect("valid offset");
    OffsetRepository::create(store, &offset)
        .await
        .expect("stored")
}

fn command(product_id: ProductId, tonnes: u64, coverage: CoverageMode) -> AllocationCommand {
    AllocationCommand {
        product_id,
        target: AllocationTarget::Exact(CarbonMass::from_whole_tonnes(tonnes)),
        coverage,
        allocator: OffsetAllocator::default(),
    }
}

#[rstest]
#[tokio::test]
async fn duplicate_emails_are_rejected(store: Arc<InMemoryStore>) {
    seed_user(&store, "ada@example.com").await;
    let duplicate = NewUser::try_from_parts("ADA@example.com", "Other").expect("valid");

    let err = UserRepository::create(store.as_ref(), &duplicate)
        .await
        .expect_err("duplicate");
    assert_eq!(err, UserPersistenceError::duplicate_email("ada@example.com"));
}

#[rstest]
#[tokio::test]
async fn products_require_an_existing_owner(store: Arc<InMemoryStore>) {
    let product = NewProduct {
        owner_id: UserId::new(404).expect("id"),
        details: ProductDetails::new("Kettle", "", None).expect("details"),
        inputs: inputs(),
        estimated_emissions: CarbonMass::ZERO,
    };

    let err = ProductRepository::create(store.as_ref(), &product)
        .await
        .expect_err("missing owner");
    assert_eq!(err, ProductPersistenceError::missing_owner(404_i64));
}

#[rstest]
#[tokio::test]
async fn products_can_be_filtered_by_owner(store: Arc<InMemoryStore>) {
    let ada = seed_user(&store, "ada@example.com").await;
    let bob = seed_user(&store, "bob@example.com").await;
    seed_product(&store, ada.id(), 1).await;
    let bobs = seed_product(&store, bob.id(), 2).await;

    let all = ProductRepository::list(store.as_ref(), None).await.expect("list");
    let filtered = ProductRepository::list(store.as_ref(), Some(bob.id()))
        .await
        .expect("list");
    assert_eq!(all.len(), 2);
    assert_eq!(filtered, vec![bobs]);
}

#[rstest]
#[tokio::test]
async fn allocation_updates_offsets_and_the_ledger(store: Arc<InMemoryStore>) {
    let owner = seed_user(&store, "ada@example.com").await;
    let product = seed_product(&store, owner.id(), 6).await;
    let offset = seed_offset(&store, 10, 1_500).await;

    let allocation = store
        .allocate(AllocationCommand {
            target: AllocationTarget::Outstanding,
            ..command(product.id, 0, CoverageMode::Full)
        })
        .await
        .expect("allocated");
    assert_eq!(allocation.allocated, CarbonMass::from_whole_tonnes(6));
    assert_eq!(allocation.cost_cents, 9_000);

    let stored = OffsetRepository::find_by_id(store.as_ref(), offset.id())
        .await
        .expect("find")
        .expect("present");
    assert_eq!(stored.remaining(), CarbonMass::from_whole_tonnes(4));

    let ledger = store.list_allocations(product.id).await.expect("ledger");
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].offset_id, offset.id());

    let summaries = store.list_emissions(None).await.expect("summaries");
    assert_eq!(summaries[0].offset, CarbonMass::from_whole_tonnes(6));
    assert!(summaries[0].outstanding().is_zero());
}

#[rstest]
#[tokio::test]
async fn outstanding_target_excludes_previous_allocations(store: Arc<InMemoryStore>) {
    let owner = seed_user(&store, "ada@example.com").await;
    let product = seed_product(&store, owner.id(), 5).await;
    seed_offset(&store, 20, 100).await;
    store
        .allocate(command(product.id, 2, CoverageMode::Full))
        .await
        .expect("first");

    let second = store
        .allocate(AllocationCommand {
            target: AllocationTarget::Outstanding,
            ..command(product.id, 0, CoverageMode::Full)
        })
        .await
        .expect("second");
    assert_eq!(second.requested, CarbonMass::from_whole_tonnes(3));
}

#[rstest]
#[tokio::test]
async fn rejected_allocations_leave_state_untouched(store: Arc<InMemoryStore>) {
    let owner = seed_user(&store, "ada@example.com").await;
    let product = seed_product(&store, owner.id(), 8).await;
    let offset = seed_offset(&store, 5, 100).await;

    let err = store
        .allocate(command(product.id, 8, CoverageMode::Full))
        .await
        .expect_err("insufficient");
    assert_eq!(
        err,
        OffsetPersistenceError::rejected(AllocationError::InsufficientSupply {
            requested: CarbonMass::from_whole_tonnes(8),
            available: CarbonMass::from_whole_tonnes(5),
        })
    );
    let stored = OffsetRepository::find_by_id(store.as_ref(), offset.id())
        .await
        .expect("find")
        .expect("present");
    assert_eq!(stored.remaining(), CarbonMass::from_whole_tonnes(5));
    assert!(store.list_allocations(product.id).await.expect("ledger").is_empty());
}

#[rstest]
#[tokio::test]
async fn unknown_products_cannot_be_allocated(store: Arc<InMemoryStore>) {
    let err = store
        .allocate(command(ProductId::new(77).expect("id"), 1, CoverageMode::Partial))
        .await
        .expect_err("missing product");
    assert_eq!(err, OffsetPersistenceError::missing_product(77_i64));
}

#[rstest]
#[tokio::test]
async fn available_listing_skips_exhausted_offsets(store: Arc<InMemoryStore>) {
    let owner = seed_user(&store, "ada@example.com").await;
    let product = seed_product(&store, owner.id(), 2).await;
    let spent = seed_offset(&store, 2, 100).await;
    let fresh = seed_offset(&store, 3, 100).await;
    store
        .allocate(command(product.id, 2, CoverageMode::Full))
        .await
        .expect("allocated");

    let available = OffsetRepository::list(store.as_ref(), true).await.expect("list");
    let everything = OffsetRepository::list(store.as_ref(), false).await.expect("list");
    assert_eq!(
        available.iter().map(Offset::id).collect::<Vec<_>>(),
        vec![fresh.id()]
    );
    assert!(everything.iter().any(|offset| offset.id() == spent.id()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_allocations_never_oversubscribe_an_offset() {
    let store = Arc::new(InMemoryStore::new());
    let owner = seed_user(&store, "ada@example.com").await;
    let offset = seed_offset(&store, 10, 100).await;
    let mut products = Vec::new();
    for _ in 0..8 {
        products.push(seed_product(&store, owner.id(), 3).await);
    }

    let handles: Vec<_> = products
        .iter()
        .map(|product| {
            let store = Arc::clone(&store);
            let product_id = product.id;
            tokio::spawn(async move {
                store
                    .allocate(command(product_id, 3, CoverageMode::Partial))
                    .await
            })
        })
        .collect();
    let mut allocated = CarbonMass::ZERO;
    for handle in handles {
        let allocation = handle.await.expect("task").expect("partial never rejects");
        allocated = allocated.saturating_add(allocation.allocated);
    }

    let stored = OffsetRepository::find_by_id(store.as_ref(), offset.id())
        .await
        .expect("find")
        .expect("present");
    assert_eq!(allocated, CarbonMass::from_whole_tonnes(10));
    assert!(stored.remaining().is_zero());
    let ledger_total: CarbonMass = {
        let mut total = CarbonMass::ZERO;
        for product in &products {
            for entry in store.list_allocations(product.id).await.expect("ledger") {
                total = total.saturating_add(entry.quantity);
            }
        }
        total
    };
    assert_eq!(ledger_total, stored.allocated());
}
