//! Offset allocation through `DieselOffsetRepository` against embedded
//! PostgreSQL: row locking under concurrent draw-downs, all-or-nothing
//! rejection and the ledger join behind emissions summaries.

#[path = "support/pg_cluster.rs"]
mod pg_cluster;

use carbontrack::domain::emissions::{EmissionInputs, EmissionInputsDraft, MaterialDraft};
use carbontrack::domain::offsets::{
    AllocationError, AllocationPolicy, AllocationTarget, CoverageMode, NewOffset,
    NewOffsetFields, Offset, OffsetAllocator,
};
use carbontrack::domain::ports::{
    AllocationCommand, OffsetPersistenceError, OffsetRepository, ProductRepository,
    UserRepository,
};
use carbontrack::domain::{CarbonMass, NewProduct, NewUser, Product, ProductDetails, ProductId};
use carbontrack::outbound::persistence::{
    DieselOffsetRepository, DieselProductRepository, DieselUserRepository,
};
use pg_cluster::{PgContext, pg_context};
use rstest::{fixture, rstest};

struct Repositories {
    users: DieselUserRepository,
    products: DieselProductRepository,
    offsets: DieselOffsetRepository,
}

impl Repositories {
    fn new(context: &PgContext) -> Self {
        Self {
            users: DieselUserRepository::new(context.pool.clone()),
            products: DieselProductRepository::new(context.pool.clone()),
            offsets: DieselOffsetRepository::new(context.pool.clone()),
        }
    }

    async fn seed_products(&self, count: usize, estimate: CarbonMass) -> Vec<Product> {
        let owner = self
            .users
            .create(&NewUser::try_from_parts("owner@example.com", "Owner").expect("user"))
            .await
            .expect("owner stored");
        let mut products = Vec::with_capacity(count);
        for n in 0..count {
            let product = NewProduct {
                owner_id: owner.id(),
                details: ProductDetails::new(format!("Frame {n}"), "", None).expect("details"),
                inputs: steel_inputs(),
                estimated_emissions: estimate,
            };
            products.push(self.products.create(&product).await.expect("product stored"));
        }
        products
    }

    async fn seed_offset(&self, name: &str, price_per_tonne_cents: u64, tonnes: u64) -> Offset {
        let offset = NewOffset::try_from_fields(NewOffsetFields {
            project_name: name,
            description: "",
            location: None,
            source_url: "https://registry.example.org/projects/1",
            price_per_tonne_cents,
            tonnes: CarbonMass::from_whole_tonnes(tonnes),
        })
        .expect("offset");
        self.offsets.create(&offset).await.expect("offset stored")
    }
}

fn steel_inputs() -> EmissionInputs {
    EmissionInputs::try_from(EmissionInputsDraft {
        materials: Some(vec![MaterialDraft {
            material: Some("steel".into()),
            mass_kg: Some(1000.0),
        }]),
        energy_kwh: Some(0.0),
        transport: None,
    })
    .expect("valid inputs")
}

fn command(
    product_id: ProductId,
    target: AllocationTarget,
    coverage: CoverageMode,
) -> AllocationCommand {
    AllocationCommand {
        product_id,
        target,
        coverage,
        allocator: OffsetAllocator::new(AllocationPolicy::OldestFirst),
    }
}

#[fixture]
fn context() -> Option<PgContext> {
    pg_context(6)
}

#[rstest]
fn concurrent_allocations_never_overdraw_an_offset(context: Option<PgContext>) {
    let Some(context) = context else {
        return;
    };
    let repos = Repositories::new(&context);

    context.runtime.block_on(async {
        let products = repos
            .seed_products(12, CarbonMass::from_whole_tonnes(1))
            .await;
        let offset = repos.seed_offset("Mangroves", 1000, 10).await;

        let mut tasks = Vec::new();
        for product in products {
            let offsets = repos.offsets.clone();
            tasks.push(tokio::spawn(async move {
                offsets
                    .allocate(command(
                        product.id,
                        AllocationTarget::Outstanding,
                        CoverageMode::Full,
                    ))
                    .await
            }));
        }

        let mut granted = CarbonMass::ZERO;
        let mut rejected = 0;
        for task in tasks {
            match task.await.expect("task") {
                Ok(allocation) => granted = granted.saturating_add(allocation.allocated),
                Err(OffsetPersistenceError::Rejected { .. }) => rejected += 1,
                Err(other) => panic!("unexpected failure: {other}"),
            }
        }
        assert_eq!(granted, CarbonMass::from_whole_tonnes(10));
        assert_eq!(rejected, 2);

        let stored = repos
            .offsets
            .find_by_id(offset.id())
            .await
            .expect("lookup")
            .expect("offset exists");
        assert!(stored.is_exhausted());
        assert_eq!(stored.allocated(), CarbonMass::from_whole_tonnes(10));
    });
}

#[rstest]
fn rejected_full_coverage_leaves_offsets_and_ledger_untouched(context: Option<PgContext>) {
    let Some(context) = context else {
        return;
    };
    let repos = Repositories::new(&context);

    context.runtime.block_on(async {
        let products = repos.seed_products(1, CarbonMass::from_whole_tonnes(8)).await;
        let product_id = products[0].id;
        let first = repos.seed_offset("Peatland", 1200, 3).await;
        let second = repos.seed_offset("Forest", 800, 2).await;

        let err = repos
            .offsets
            .allocate(command(product_id, AllocationTarget::Outstanding, CoverageMode::Full))
            .await
            .expect_err("supply is short");
        assert_eq!(
            err,
            OffsetPersistenceError::rejected(AllocationError::InsufficientSupply {
                requested: CarbonMass::from_whole_tonnes(8),
                available: CarbonMass::from_whole_tonnes(5),
            })
        );

        for offset in [&first, &second] {
            let stored = repos
                .offsets
                .find_by_id(offset.id())
                .await
                .expect("lookup")
                .expect("offset exists");
            assert_eq!(stored.remaining(), offset.tonnes());
        }
        let ledger = repos
            .offsets
            .list_allocations(product_id)
            .await
            .expect("ledger");
        assert!(ledger.is_empty());
    });
}

#[rstest]
fn partial_allocations_feed_the_emissions_summary(context: Option<PgContext>) {
    let Some(context) = context else {
        return;
    };
    let repos = Repositories::new(&context);

    context.runtime.block_on(async {
        let products = repos.seed_products(1, CarbonMass::from_whole_tonnes(8)).await;
        let product_id = products[0].id;
        let first = repos.seed_offset("Peatland", 1200, 3).await;
        let second = repos.seed_offset("Forest", 800, 2).await;

        let allocation = repos
            .offsets
            .allocate(command(product_id, AllocationTarget::Outstanding, CoverageMode::Partial))
            .await
            .expect("partial allocation");
        assert_eq!(allocation.allocated, CarbonMass::from_whole_tonnes(5));
        assert_eq!(allocation.shortfall, CarbonMass::from_whole_tonnes(3));
        assert_eq!(allocation.cost_cents, 5200);

        let ledger = repos
            .offsets
            .list_allocations(product_id)
            .await
            .expect("ledger");
        let drawn: Vec<_> = ledger
            .iter()
            .map(|entry| (entry.offset_id, entry.quantity))
            .collect();
        assert_eq!(
            drawn,
            vec![
                (first.id(), CarbonMass::from_whole_tonnes(3)),
                (second.id(), CarbonMass::from_whole_tonnes(2)),
            ]
        );

        let available = repos.offsets.list(true).await.expect("offsets");
        assert!(available.is_empty());

        let summaries = repos.products.list_emissions(None).await.expect("summaries");
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].offset, CarbonMass::from_whole_tonnes(5));
        assert_eq!(summaries[0].outstanding(), CarbonMass::from_whole_tonnes(3));

        let again = repos
            .offsets
            .allocate(command(product_id, AllocationTarget::Outstanding, CoverageMode::Partial))
            .await
            .expect("nothing left to draw");
        assert_eq!(again.requested, CarbonMass::from_whole_tonnes(3));
        assert!(again.lines.is_empty());
    });
}

#[rstest]
fn unknown_products_are_reported(context: Option<PgContext>) {
    let Some(context) = context else {
        return;
    };
    let repos = Repositories::new(&context);

    context.runtime.block_on(async {
        repos.seed_offset("Forest", 800, 2).await;
        let missing = ProductId::new(9_999).expect("id");

        let err = repos
            .offsets
            .allocate(command(missing, AllocationTarget::Outstanding, CoverageMode::Partial))
            .await
            .expect_err("product is missing");
        assert_eq!(err, OffsetPersistenceError::missing_product(9_999_i64));
    });
}
