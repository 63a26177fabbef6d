use axum::{
    Router,
    routing::{get, post},
};

pub mod billing;
pub mod branches;
pub mod subscribers;
pub mod system;

/// Router for every business endpoint.
pub fn router() -> Router {
    Router::new()
        .nest("/branches", branches::router())
        .nest("/subscribers", subscribers::router())
        .route("/dashboard", get(billing::dashboard))
        .route("/billing/sweep", post(billing::sweep))
}
