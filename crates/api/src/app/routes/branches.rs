use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{patch, post},
};

use paytv_infra::billing_service::BillingService;

use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_branch).get(list_branches))
        .route("/:id/price", patch(set_price))
        .route("/:id/activate", post(activate_branch))
        .route("/:id/deactivate", post(deactivate_branch))
}

pub async fn create_branch(
    Extension(services): Extension<Arc<BillingService>>,
    Json(body): Json<dto::CreateBranchRequest>,
) -> axum::response::Response {
    match services.create_branch(&body.name, body.monthly_price) {
        Ok(branch) => (StatusCode::CREATED, Json(branch)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_branches(
    Extension(services): Extension<Arc<BillingService>>,
) -> axum::response::Response {
    match services.list_branches() {
        Ok(items) => (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn set_price(
    Extension(services): Extension<Arc<BillingService>>,
    Path(id): Path<String>,
    Json(body): Json<dto::SetPriceRequest>,
) -> axum::response::Response {
    let id = match dto::parse_branch_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.set_branch_price(&id, body.monthly_price) {
        Ok(branch) => (StatusCode::OK, Json(branch)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn activate_branch(
    Extension(services): Extension<Arc<BillingService>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    set_active(services, id, true)
}

pub async fn deactivate_branch(
    Extension(services): Extension<Arc<BillingService>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    set_active(services, id, false)
}

fn set_active(services: Arc<BillingService>, id: String, active: bool) -> axum::response::Response {
    let id = match dto::parse_branch_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.set_branch_active(&id, active) {
        Ok(branch) => (StatusCode::OK, Json(branch)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
