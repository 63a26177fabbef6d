use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use paytv_infra::billing_service::BillingService;

use crate::app::routes::billing;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(register_subscriber).get(list_subscribers))
        .route("/:id", get(get_subscriber).patch(update_subscriber))
        .route("/:id/activate", post(activate_subscriber))
        .route("/:id/deactivate", post(deactivate_subscriber))
        .route("/:id/status", get(billing::status))
        .route("/:id/window", get(billing::window))
        .route("/:id/payments", post(billing::pay))
}

pub async fn register_subscriber(
    Extension(services): Extension<Arc<BillingService>>,
    Json(body): Json<dto::RegisterSubscriberRequest>,
) -> axum::response::Response {
    let branch_id = match dto::parse_branch_id(&body.branch_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.register_subscriber(&body.name, &branch_id, body.contact.unwrap_or_default()) {
        Ok(subscriber) => (StatusCode::CREATED, Json(subscriber)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_subscribers(
    Extension(services): Extension<Arc<BillingService>>,
) -> axum::response::Response {
    match services.list_subscribers() {
        Ok(items) => (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_subscriber(
    Extension(services): Extension<Arc<BillingService>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match dto::parse_subscriber_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.subscriber(&id) {
        Ok(overview) => (StatusCode::OK, Json(overview)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_subscriber(
    Extension(services): Extension<Arc<BillingService>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateSubscriberRequest>,
) -> axum::response::Response {
    let id = match dto::parse_subscriber_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let branch_id = match body.branch_id.as_deref().map(dto::parse_branch_id).transpose() {
        Ok(branch_id) => branch_id,
        Err(resp) => return resp,
    };
    match services.update_subscriber(&id, body.name, body.contact, branch_id) {
        Ok(subscriber) => (StatusCode::OK, Json(subscriber)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn activate_subscriber(
    Extension(services): Extension<Arc<BillingService>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    set_active(services, id, true)
}

pub async fn deactivate_subscriber(
    Extension(services): Extension<Arc<BillingService>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    set_active(services, id, false)
}

fn set_active(services: Arc<BillingService>, id: String, active: bool) -> axum::response::Response {
    let id = match dto::parse_subscriber_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.set_subscriber_active(&id, active) {
        Ok(subscriber) => (StatusCode::OK, Json(subscriber)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
