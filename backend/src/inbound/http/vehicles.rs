//! Vehicle handlers.
//!
//! ```text
//! GET    /api/v1/vehicles?customerId=...&search=corolla
//! POST   /api/v1/vehicles
//! GET    /api/v1/vehicles/{id}
//! PATCH  /api/v1/vehicles/{id}
//! DELETE /api/v1/vehicles/{id}
//! PUT    /api/v1/vehicles/{id}/mileage {"mileage":48250}
//! GET    /api/v1/vehicles/{id}/history
//! ```

use actix_web::{HttpResponse, delete, get, patch, post, put, web};
use pagination::Page;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::{
    CreateVehicleRequest, CustomerId, Error, RecordMileageRequest, UpdateVehicleRequest, Vehicle,
    VehicleFilter, VehicleId, WorkOrder,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::schemas::PageSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::page_request;

/// Query parameters for `GET /api/v1/vehicles`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct VehicleListQuery {
    /// Only vehicles owned by this customer.
    pub customer_id: Option<CustomerId>,
    /// Case-insensitive match on plate, VIN, make or model.
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl From<&VehicleListQuery> for VehicleFilter {
    fn from(query: &VehicleListQuery) -> Self {
        Self {
            customer_id: query.customer_id,
            search: query
                .search
                .as_deref()
                .map(str::trim)
                .filter(|term| !term.is_empty())
                .map(str::to_owned),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/vehicles",
    params(VehicleListQuery),
    responses(
        (status = 200, description = "Vehicles", body = PageSchema<Vehicle>),
        (status = 400, description = "Invalid query", body = Error)
    ),
    tags = ["vehicles"],
    operation_id = "listVehicles"
)]
#[get("/vehicles")]
pub async fn list_vehicles(
    state: web::Data<HttpState>,
    principal: Authenticated,
    query: web::Query<VehicleListQuery>,
) -> ApiResult<web::Json<Page<Vehicle>>> {
    let page = page_request(query.page, query.limit)?;
    let filter = VehicleFilter::from(&*query);
    Ok(web::Json(state.vehicles.list(&principal, &filter, page).await?))
}

/// Register a vehicle for an existing customer.
#[utoipa::path(
    post,
    path = "/api/v1/vehicles",
    request_body = CreateVehicleRequest,
    responses(
        (status = 201, description = "Vehicle created", body = Vehicle),
        (status = 400, description = "Invalid request or unknown customer", body = Error),
        (status = 402, description = "Plan vehicle limit reached", body = Error),
        (status = 409, description = "Plate or VIN already registered", body = Error)
    ),
    tags = ["vehicles"],
    operation_id = "createVehicle"
)]
#[post("/vehicles")]
pub async fn create_vehicle(
    state: web::Data<HttpState>,
    principal: Authenticated,
    payload: web::Json<CreateVehicleRequest>,
) -> ApiResult<HttpResponse> {
    let vehicle = state
        .vehicles
        .create(&principal, payload.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(vehicle))
}

#[utoipa::path(
    get,
    path = "/api/v1/vehicles/{id}",
    params(("id" = VehicleId, Path, description = "Vehicle identifier")),
    responses(
        (status = 200, description = "Vehicle", body = Vehicle),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["vehicles"],
    operation_id = "getVehicle"
)]
#[get("/vehicles/{id}")]
pub async fn get_vehicle(
    state: web::Data<HttpState>,
    principal: Authenticated,
    path: web::Path<VehicleId>,
) -> ApiResult<web::Json<Vehicle>> {
    Ok(web::Json(
        state.vehicles.get(&principal, path.into_inner()).await?,
    ))
}

#[utoipa::path(
    patch,
    path = "/api/v1/vehicles/{id}",
    params(("id" = VehicleId, Path, description = "Vehicle identifier")),
    request_body = UpdateVehicleRequest,
    responses(
        (status = 200, description = "Vehicle updated", body = Vehicle),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["vehicles"],
    operation_id = "updateVehicle"
)]
#[patch("/vehicles/{id}")]
pub async fn update_vehicle(
    state: web::Data<HttpState>,
    principal: Authenticated,
    path: web::Path<VehicleId>,
    payload: web::Json<UpdateVehicleRequest>,
) -> ApiResult<web::Json<Vehicle>> {
    let vehicle = state
        .vehicles
        .update(&principal, path.into_inner(), payload.into_inner())
        .await?;
    Ok(web::Json(vehicle))
}

#[utoipa::path(
    delete,
    path = "/api/v1/vehicles/{id}",
    params(("id" = VehicleId, Path, description = "Vehicle identifier")),
    responses(
        (status = 204, description = "Vehicle deleted"),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["vehicles"],
    operation_id = "deleteVehicle"
)]
#[delete("/vehicles/{id}")]
pub async fn delete_vehicle(
    state: web::Data<HttpState>,
    principal: Authenticated,
    path: web::Path<VehicleId>,
) -> ApiResult<HttpResponse> {
    state.vehicles.delete(&principal, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Record an odometer reading; readings never go backwards.
#[utoipa::path(
    put,
    path = "/api/v1/vehicles/{id}/mileage",
    params(("id" = VehicleId, Path, description = "Vehicle identifier")),
    request_body = RecordMileageRequest,
    responses(
        (status = 200, description = "Mileage recorded", body = Vehicle),
        (status = 400, description = "Reading lower than the last one", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["vehicles"],
    operation_id = "recordMileage"
)]
#[put("/vehicles/{id}/mileage")]
pub async fn record_mileage(
    state: web::Data<HttpState>,
    principal: Authenticated,
    path: web::Path<VehicleId>,
    payload: web::Json<RecordMileageRequest>,
) -> ApiResult<web::Json<Vehicle>> {
    let vehicle = state
        .vehicles
        .record_mileage(&principal, path.into_inner(), payload.into_inner())
        .await?;
    Ok(web::Json(vehicle))
}

/// Service history: the vehicle's work orders, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/vehicles/{id}/history",
    params(("id" = VehicleId, Path, description = "Vehicle identifier")),
    responses(
        (status = 200, description = "Work orders for the vehicle", body = [WorkOrder]),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["vehicles"],
    operation_id = "vehicleHistory"
)]
#[get("/vehicles/{id}/history")]
pub async fn vehicle_history(
    state: web::Data<HttpState>,
    principal: Authenticated,
    path: web::Path<VehicleId>,
) -> ApiResult<web::Json<Vec<WorkOrder>>> {
    Ok(web::Json(
        state.vehicles.history(&principal, path.into_inner()).await?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CreateWorkOrderRequest;
    use crate::inbound::http::test_utils::{TestApp, bearer, send};
    use actix_web::http::StatusCode;
    use actix_web::test;
    use rstest::rstest;
    use serde_json::json;

    #[actix_web::test]
    async fn creates_and_filters_by_customer() {
        let app = TestApp::with_shop().await;
        let (customer, _) = app.vehicle().await;
        let other = app.customer().await;
        let token = app.owner_token().to_owned();
        let service = test::init_service(app.app()).await;

        let (status, created) = send(
            &service,
            test::TestRequest::post()
                .uri("/api/v1/vehicles")
                .insert_header(bearer(&token))
                .set_json(json!({
                    "customerId": other.id,
                    "make": "Ford",
                    "model": "Focus",
                    "year": 2015,
                    "licensePlate": "xyz 987",
                    "fuelType": "diesel",
                }))
                .to_request(),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["fuelType"], "diesel");

        let (status, page) = send(
            &service,
            test::TestRequest::get()
                .uri(&format!("/api/v1/vehicles?customerId={}", customer.id))
                .insert_header(bearer(&token))
                .to_request(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["total"], 1);
        assert_eq!(page["items"][0]["make"], "Toyota");
    }

    #[actix_web::test]
    async fn unknown_customer_is_a_bad_reference() {
        let app = TestApp::with_shop().await;
        let token = app.owner_token().to_owned();
        let service = test::init_service(app.app()).await;
        let (status, body) = send(
            &service,
            test::TestRequest::post()
                .uri("/api/v1/vehicles")
                .insert_header(bearer(&token))
                .set_json(json!({
                    "customerId": CustomerId::random(),
                    "make": "Ford",
                    "model": "Focus",
                    "year": 2015,
                    "licensePlate": "XYZ987",
                }))
                .to_request(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"]["code"], "unknown_reference");
    }

    #[rstest]
    #[case(50_000, StatusCode::OK)]
    #[case(42_000, StatusCode::OK)]
    #[case(10, StatusCode::BAD_REQUEST)]
    #[actix_web::test]
    async fn mileage_never_decreases(#[case] mileage: u32, #[case] expected: StatusCode) {
        let app = TestApp::with_shop().await;
        let (_, vehicle) = app.vehicle().await;
        let token = app.owner_token().to_owned();
        let service = test::init_service(app.app()).await;
        let (status, body) = send(
            &service,
            test::TestRequest::put()
                .uri(&format!("/api/v1/vehicles/{}/mileage", vehicle.id))
                .insert_header(bearer(&token))
                .set_json(json!({ "mileage": mileage }))
                .to_request(),
        )
        .await;
        assert_eq!(status, expected);
        if expected == StatusCode::OK {
            assert_eq!(body["mileage"], mileage);
        } else {
            assert_eq!(body["details"]["code"], "mileage_decreased");
        }
    }

    #[actix_web::test]
    async fn history_lists_work_orders() {
        let app = TestApp::with_shop().await;
        let (customer, vehicle) = app.vehicle().await;
        app.state
            .work_orders
            .create(
                &app.owner(),
                CreateWorkOrderRequest {
                    customer_id: customer.id,
                    vehicle_id: vehicle.id,
                    assigned_to: None,
                    priority: None,
                    description: "Brakes squeal".into(),
                    mileage_in: None,
                    estimated_completion: None,
                },
            )
            .await
            .expect("work order");
        let token = app.owner_token().to_owned();
        let service = test::init_service(app.app()).await;
        let (status, history) = send(
            &service,
            test::TestRequest::get()
                .uri(&format!("/api/v1/vehicles/{}/history", vehicle.id))
                .insert_header(bearer(&token))
                .to_request(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(history.as_array().map(Vec::len), Some(1));
        assert_eq!(history[0]["description"], "Brakes squeal");
    }
}
