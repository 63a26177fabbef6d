use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
};

use paytv_infra::billing_service::BillingService;

use crate::app::{dto, errors};

pub async fn status(
    Extension(services): Extension<Arc<BillingService>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match dto::parse_subscriber_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.status(&id) {
        Ok(verdict) => (StatusCode::OK, Json(verdict)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn window(
    Extension(services): Extension<Arc<BillingService>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match dto::parse_subscriber_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.window(&id) {
        Ok(window) => (StatusCode::OK, Json(window)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn pay(
    Extension(services): Extension<Arc<BillingService>>,
    Path(id): Path<String>,
    Json(body): Json<dto::PaymentBody>,
) -> axum::response::Response {
    let id = match dto::parse_subscriber_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let request = match body.into_request() {
        Ok(request) => request,
        Err(resp) => return resp,
    };
    match services.pay(&id, request) {
        Ok(receipt) => (StatusCode::OK, Json(receipt)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn dashboard(
    Extension(services): Extension<Arc<BillingService>>,
    Query(query): Query<dto::DashboardQuery>,
) -> axum::response::Response {
    let month = match query.month() {
        Ok(month) => month,
        Err(resp) => return resp,
    };
    match services.dashboard(month) {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn sweep(
    Extension(services): Extension<Arc<BillingService>>,
) -> axum::response::Response {
    match services.sweep_overdue() {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
