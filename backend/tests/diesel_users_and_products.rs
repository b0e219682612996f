//! `DieselUserRepository` and `DieselProductRepository` against embedded
//! PostgreSQL: constraint violations surface as port errors and stored
//! inputs survive the JSONB round trip.

#[path = "support/pg_cluster.rs"]
mod pg_cluster;

use carbontrack::domain::emissions::{EmissionInputs, EmissionInputsDraft, MaterialDraft};
use carbontrack::domain::ports::{
    ProductPersistenceError, ProductRepository, UserPersistenceError, UserRepository,
};
use carbontrack::domain::{CarbonMass, NewProduct, NewUser, ProductDetails, UserId};
use carbontrack::outbound::persistence::{DieselProductRepository, DieselUserRepository};
use pg_cluster::{PgContext, pg_context};
use rstest::{fixture, rstest};

fn inputs(mass_kg: f64) -> EmissionInputs {
    EmissionInputs::try_from(EmissionInputsDraft {
        materials: Some(vec![MaterialDraft {
            material: Some("aluminium".into()),
            mass_kg: Some(mass_kg),
        }]),
        energy_kwh: Some(12.5),
        transport: None,
    })
    .expect("valid inputs")
}

fn new_product(owner_id: UserId, name: &str) -> NewProduct {
    NewProduct {
        owner_id,
        details: ProductDetails::new(name, "", Some("kitchen")).expect("details"),
        inputs: inputs(2.0),
        estimated_emissions: CarbonMass::from_kilograms(40),
    }
}

#[fixture]
fn context() -> Option<PgContext> {
    pg_context(2)
}

#[rstest]
fn duplicate_emails_are_reported(context: Option<PgContext>) {
    let Some(context) = context else {
        return;
    };
    let users = DieselUserRepository::new(context.pool.clone());

    context.runtime.block_on(async {
        let first = NewUser::try_from_parts("Ada@Example.com", "Ada").expect("user");
        let stored = users.create(&first).await.expect("first insert");
        assert_eq!(stored.email().as_ref(), "ada@example.com");

        let second = NewUser::try_from_parts("ada@example.com", "Another Ada").expect("user");
        let err = users.create(&second).await.expect_err("email is taken");
        assert_eq!(err, UserPersistenceError::duplicate_email("ada@example.com"));

        let listed = users.list().await.expect("list");
        assert_eq!(listed.len(), 1);
        let found = users.find_by_id(stored.id()).await.expect("lookup");
        assert_eq!(found.as_ref().map(|user| user.id()), Some(stored.id()));
    });
}

#[rstest]
fn products_require_an_existing_owner(context: Option<PgContext>) {
    let Some(context) = context else {
        return;
    };
    let products = DieselProductRepository::new(context.pool.clone());

    context.runtime.block_on(async {
        let ghost = UserId::new(4_242).expect("id");
        let err = products
            .create(&new_product(ghost, "Kettle"))
            .await
            .expect_err("owner is missing");
        assert_eq!(err, ProductPersistenceError::missing_owner(4_242_i64));
        assert!(products.list(None).await.expect("list").is_empty());
    });
}

#[rstest]
fn products_round_trip_and_filter_by_owner(context: Option<PgContext>) {
    let Some(context) = context else {
        return;
    };
    let users = DieselUserRepository::new(context.pool.clone());
    let products = DieselProductRepository::new(context.pool.clone());

    context.runtime.block_on(async {
        let ada = users
            .create(&NewUser::try_from_parts("ada@example.com", "Ada").expect("user"))
            .await
            .expect("ada");
        let grace = users
            .create(&NewUser::try_from_parts("grace@example.com", "Grace").expect("user"))
            .await
            .expect("grace");
        let kettle = products
            .create(&new_product(ada.id(), "Kettle"))
            .await
            .expect("kettle");
        products
            .create(&new_product(grace.id(), "Toaster"))
            .await
            .expect("toaster");

        assert_eq!(kettle.inputs, inputs(2.0));
        assert_eq!(kettle.details.category(), Some("kitchen"));

        let owned = products.list(Some(ada.id())).await.expect("filtered");
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].id, kettle.id);

        let updated = products
            .update_estimate(kettle.id, &inputs(20.0), CarbonMass::from_kilograms(400))
            .await
            .expect("update")
            .expect("product exists");
        assert_eq!(updated.inputs, inputs(20.0));
        assert_eq!(updated.estimated_emissions, CarbonMass::from_kilograms(400));
        assert!(updated.updated_at >= kettle.updated_at);

        let summaries = products
            .list_emissions(Some(ada.id()))
            .await
            .expect("summaries");
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].estimated, CarbonMass::from_kilograms(400));
        assert_eq!(summaries[0].offset, CarbonMass::ZERO);
    });
}
