//! Tenant boundaries and plan limits observed through the HTTP surface.

mod support;

use actix_web::http::StatusCode;
use actix_web::test;
use serde_json::json;

use support::{Harness, bearer, get_json, post_json, register_shop, send};

#[actix_web::test]
async fn shops_cannot_see_each_others_records() {
    let harness = Harness::new();
    let service = test::init_service(harness.app()).await;
    let north = register_shop(&service, "north-garage").await;
    let south = register_shop(&service, "south-garage").await;

    let (status, customer) = post_json(
        &service,
        &north,
        "/api/v1/customers",
        json!({ "firstName": "Nina", "lastName": "North", "phone": "+1 555 111 2222" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let uri = format!(
        "/api/v1/customers/{}",
        customer["id"].as_str().expect("id")
    );

    let (status, body) = get_json(&service, &south, &uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");

    let (_, listing) = get_json(&service, &south, "/api/v1/customers").await;
    assert_eq!(listing["total"], 0);
    let (_, listing) = get_json(&service, &north, "/api/v1/customers").await;
    assert_eq!(listing["total"], 1);

    // A vehicle may not point at another shop's customer.
    let (status, body) = post_json(
        &service,
        &south,
        "/api/v1/vehicles",
        json!({
            "customerId": customer["id"],
            "make": "Ford",
            "model": "Focus",
            "year": 2015,
            "licensePlate": "SOU1234"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
}

#[actix_web::test]
async fn duplicate_slug_is_a_conflict() {
    let harness = Harness::new();
    let service = test::init_service(harness.app()).await;
    register_shop(&service, "twin-garage").await;

    let (status, body) = send(
        &service,
        test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .set_json(json!({
                "name": "Twin Garage",
                "slug": "twin-garage",
                "owner": {
                    "email": "other@twin.example",
                    "password": "correct horse battery",
                    "firstName": "Tom",
                    "lastName": "Twin"
                }
            }))
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "conflict");
}

#[actix_web::test]
async fn trial_plan_caps_staff_until_upgraded() {
    let harness = Harness::new();
    let service = test::init_service(harness.app()).await;
    let owner = register_shop(&service, "tiny-garage").await;

    let staff = |n: u32| {
        json!({
            "email": format!("tech{n}@tiny.example"),
            "password": "staff-password-1",
            "firstName": "Tess",
            "lastName": "Tech",
            "role": "technician"
        })
    };

    let (status, _) = post_json(&service, &owner, "/api/v1/users", staff(1)).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = post_json(&service, &owner, "/api/v1/users", staff(2)).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED, "{body}");
    assert_eq!(body["code"], "limit_exceeded");

    let (status, _) = send(
        &service,
        test::TestRequest::put()
            .uri("/api/v1/tenant/plan")
            .insert_header(bearer(&owner))
            .set_json(json!({ "plan": "basic" }))
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = post_json(&service, &owner, "/api/v1/users", staff(2)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, usage) = get_json(&service, &owner, "/api/v1/tenant/usage").await;
    assert_eq!(usage["plan"], "basic", "{usage}");
}

#[actix_web::test]
async fn tokens_from_login_reach_the_account() {
    let harness = Harness::new();
    let service = test::init_service(harness.app()).await;
    register_shop(&service, "login-garage").await;

    let (status, login) = send(
        &service,
        test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(json!({
                "email": "owner@login-garage.example",
                "password": "correct horse battery"
            }))
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = login["token"].as_str().expect("token");

    let (status, me) = get_json(&service, token, "/api/v1/auth/me").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "owner@login-garage.example");
    assert_eq!(me["role"], "owner");

    let (status, body) = get_json(&service, "not-a-token", "/api/v1/auth/me").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthorized");
}
