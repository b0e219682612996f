//! End-to-end HTTP tests for users, products and emissions over the
//! in-memory adapters.

#[path = "support/api.rs"]
mod api;

use actix_web::http::StatusCode;
use actix_web::test::TestRequest;
use carbontrack::domain::TRACE_ID_HEADER;
use carbontrack::domain::offsets::AllocationPolicy;
use rstest::rstest;
use serde_json::{Value, json};

fn steel_inputs(mass_kg: f64) -> Value {
    json!({
        "materials": [{ "material": "steel", "massKg": mass_kg }],
        "energyKwh": 0.0,
    })
}

fn create_user(email: &str) -> TestRequest {
    TestRequest::post()
        .uri("/api/v1/users")
        .set_json(json!({ "email": email, "displayName": "Ada Lovelace" }))
}

fn create_product(owner_id: &Value, name: &str, inputs: Value) -> TestRequest {
    TestRequest::post().uri("/api/v1/products").set_json(json!({
        "ownerId": owner_id,
        "name": name,
        "category": "kitchen",
        "inputs": inputs,
    }))
}

#[rstest]
#[actix_web::test]
async fn registration_normalises_email_and_rejects_duplicates() {
    let app = api::init_app(api::http_state(AllocationPolicy::OldestFirst)).await;

    let (status, user) = api::send(&app, create_user("Ada@Example.com")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["email"], "ada@example.com");
    assert_eq!(user["displayName"], "Ada Lovelace");

    let (status, body) = api::send(&app, create_user("ada@example.com")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "conflict");

    let (status, listed) = api::send(&app, TestRequest::get().uri("/api/v1/users")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().map(Vec::len), Some(1));
}

#[rstest]
#[actix_web::test]
async fn invalid_email_names_the_field() {
    let app = api::init_app(api::http_state(AllocationPolicy::OldestFirst)).await;

    let (status, body) = api::send(&app, create_user("not-an-email")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_request");
    assert_eq!(body["details"]["field"], "email");
    assert!(body["traceId"].is_string());
}

#[rstest]
#[actix_web::test]
async fn product_estimate_is_derived_from_inputs() {
    let app = api::init_app(api::http_state(AllocationPolicy::OldestFirst)).await;
    let (_, owner) = api::send(&app, create_user("owner@example.com")).await;

    let (status, product) = api::send(
        &app,
        create_product(&owner["id"], "Bike frame", steel_inputs(100.0)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(product["estimatedEmissionsTonnes"], 0.19);
    assert_eq!(product["inputs"]["materials"][0]["material"], "steel");

    let id = product["id"].as_i64().expect("product id");
    let (status, replaced) = api::send(
        &app,
        TestRequest::put()
            .uri(&format!("/api/v1/products/{id}/inputs"))
            .set_json(steel_inputs(1000.0)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(replaced["estimatedEmissionsTonnes"], 1.9);

    let (status, reestimated) = api::send(
        &app,
        TestRequest::post().uri(&format!("/api/v1/products/{id}/emissions/estimate")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reestimated["estimatedEmissionsTonnes"], 1.9);
    assert_eq!(reestimated["updatedAt"], replaced["updatedAt"]);
}

#[rstest]
#[case(json!({ "materials": [{ "material": "steel", "massKg": 1.0 }] }), "energyKwh", "missing")]
#[case(json!({ "energyKwh": 1.0 }), "materials", "missing")]
#[case(
    json!({ "materials": [{ "material": "steel", "massKg": -1.0 }], "energyKwh": 0.0 }),
    "materials[0].massKg",
    "negative"
)]
#[actix_web::test]
async fn invalid_inputs_are_rejected_with_the_offending_field(
    #[case] inputs: Value,
    #[case] field: &str,
    #[case] reason: &str,
) {
    let app = api::init_app(api::http_state(AllocationPolicy::OldestFirst)).await;
    let (_, owner) = api::send(&app, create_user("owner@example.com")).await;

    let (status, body) = api::send(&app, create_product(&owner["id"], "Kettle", inputs)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], field);
    assert_eq!(body["details"]["reason"], reason);

    let (_, products) = api::send(&app, TestRequest::get().uri("/api/v1/products")).await;
    assert_eq!(products, json!([]));
}

#[rstest]
#[actix_web::test]
async fn products_for_unknown_owners_are_not_found() {
    let app = api::init_app(api::http_state(AllocationPolicy::OldestFirst)).await;

    let (status, body) =
        api::send(&app, create_product(&json!(77), "Kettle", steel_inputs(1.0))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[rstest]
#[actix_web::test]
async fn owner_filter_and_user_products_agree() {
    let app = api::init_app(api::http_state(AllocationPolicy::OldestFirst)).await;
    let (_, ada) = api::send(&app, create_user("ada@example.com")).await;
    let (_, grace) = api::send(&app, create_user("grace@example.com")).await;
    for (owner, name) in [(&ada, "Kettle"), (&grace, "Toaster"), (&ada, "Lamp")] {
        let (status, _) = api::send(&app, create_product(&owner["id"], name, steel_inputs(1.0))).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let ada_id = ada["id"].as_i64().expect("id");
    let (_, filtered) = api::send(
        &app,
        TestRequest::get().uri(&format!("/api/v1/products?ownerId={ada_id}")),
    )
    .await;
    let (_, owned) = api::send(
        &app,
        TestRequest::get().uri(&format!("/api/v1/users/{ada_id}/products")),
    )
    .await;
    let names = |value: &Value| -> Vec<String> {
        value
            .as_array()
            .expect("array")
            .iter()
            .map(|product| product["name"].as_str().expect("name").to_owned())
            .collect()
    };
    assert_eq!(names(&filtered), vec!["Kettle", "Lamp"]);
    assert_eq!(names(&owned), names(&filtered));
}

#[rstest]
#[actix_web::test]
async fn ad_hoc_estimates_store_nothing() {
    let app = api::init_app(api::http_state(AllocationPolicy::OldestFirst)).await;

    let (status, estimate) = api::send(
        &app,
        TestRequest::post()
            .uri("/api/v1/emissions/estimate")
            .set_json(json!({
                "materials": [{ "material": "steel", "massKg": 10.0 }],
                "energyKwh": 0.0,
                "transport": [],
            })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(estimate["estimatedEmissionsTonnes"], 0.019);

    let (_, summaries) = api::send(&app, TestRequest::get().uri("/api/v1/emissions")).await;
    assert_eq!(summaries, json!([]));
}

#[rstest]
#[case(TestRequest::get().uri("/api/v1/users/0"), "invalid_id")]
#[case(TestRequest::get().uri("/api/v1/products/abc"), "malformed_path")]
#[case(TestRequest::get().uri("/api/v1/products?ownerId=x"), "malformed_query")]
#[case(
    TestRequest::post()
        .uri("/api/v1/users")
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json"),
    "malformed_body"
)]
#[actix_web::test]
async fn malformed_requests_share_the_error_shape(#[case] req: TestRequest, #[case] code: &str) {
    let app = api::init_app(api::http_state(AllocationPolicy::OldestFirst)).await;

    let res = actix_web::test::call_service(&app, req.to_request()).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let header = res
        .headers()
        .get(TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .expect("trace-id header");
    let body: Value = actix_web::test::read_body_json(res).await;
    assert_eq!(body["code"], "invalid_request");
    assert_eq!(body["details"]["code"], code);
    assert_eq!(body["traceId"], header.as_str());
}
