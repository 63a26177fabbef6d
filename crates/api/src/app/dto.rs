use axum::http::StatusCode;
use serde::Deserialize;

use paytv_billing::{PeriodRef, Shortcut};
use paytv_core::{BillingMonth, BranchId, SubscriberId};
use paytv_infra::billing_service::PaymentRequest;
use paytv_subscribers::ContactInfo;

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateBranchRequest {
    pub name: String,
    pub monthly_price: u64,
}

#[derive(Debug, Deserialize)]
pub struct SetPriceRequest {
    pub monthly_price: u64,
}

#[derive(Debug, Deserialize)]
pub struct RegisterSubscriberRequest {
    pub name: String,
    pub branch_id: String,
    pub contact: Option<ContactInfo>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSubscriberRequest {
    pub name: Option<String>,
    pub contact: Option<ContactInfo>,
    pub branch_id: Option<String>,
}

/// Either `references` (as shown by the window endpoint) or `shortcut`.
#[derive(Debug, Deserialize)]
pub struct PaymentBody {
    pub references: Option<Vec<String>>,
    pub shortcut: Option<Shortcut>,
}

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

// -------------------------
// Mapping helpers
// -------------------------

pub fn parse_branch_id(raw: &str) -> Result<BranchId, axum::response::Response> {
    BranchId::parse(raw).map_err(|_| errors::invalid_id("branch", raw))
}

pub fn parse_subscriber_id(raw: &str) -> Result<SubscriberId, axum::response::Response> {
    SubscriberId::parse(raw).map_err(|_| errors::invalid_id("subscriber", raw))
}

impl PaymentBody {
    /// Decode every reference up front; one malformed reference rejects the batch.
    pub fn into_request(self) -> Result<PaymentRequest, axum::response::Response> {
        match (self.references, self.shortcut) {
            (Some(refs), None) => refs
                .iter()
                .map(|r| r.parse::<PeriodRef>())
                .collect::<Result<Vec<_>, _>>()
                .map(PaymentRequest::References)
                .map_err(|e| {
                    errors::json_error(
                        StatusCode::UNPROCESSABLE_ENTITY,
                        "invalid_selection",
                        e.to_string(),
                    )
                }),
            (None, Some(shortcut)) => Ok(PaymentRequest::Shortcut(shortcut)),
            _ => Err(errors::json_error(
                StatusCode::BAD_REQUEST,
                "validation_error",
                "exactly one of `references` or `shortcut` is required",
            )),
        }
    }
}

impl DashboardQuery {
    pub fn month(&self) -> Result<Option<BillingMonth>, axum::response::Response> {
        match (self.year, self.month) {
            (None, None) => Ok(None),
            (Some(year), Some(month)) => BillingMonth::new(year, month).map(Some).map_err(|e| {
                errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string())
            }),
            _ => Err(errors::json_error(
                StatusCode::BAD_REQUEST,
                "validation_error",
                "`year` and `month` must be given together",
            )),
        }
    }
}
