mod payment;
mod select;
mod upload;

pub use payment::*;
pub use select::*;
pub use upload::*;

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use rusqlite::Connection;
use serde::Serialize;

use crate::config::RateLimitConfig;
use crate::db::{AppState, queries};
use crate::error::Result;
use crate::flow::{self, Step};
use crate::models::{CheckoutSession, CustomerType};
use crate::rate_limit;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct LandingResponse {
    service: &'static str,
    message: &'static str,
}

/// Unconditional landing page; the funnel proper is always entered
/// through a session link.
async fn landing() -> Json<LandingResponse> {
    Json(LandingResponse {
        service: "prepress",
        message: "Open your order link to start the checkout",
    })
}

/// Load the session together with its chosen customer type.
///
/// `None` means the funnel has not been entered properly; callers send
/// the browser back to the type-selection step.
pub(crate) fn session_with_type(
    conn: &Connection,
    session_id: &str,
) -> Result<Option<(CheckoutSession, CustomerType)>> {
    let Some(session) = queries::get_session(conn, session_id)? else {
        return Ok(None);
    };
    let Some(customer_type) = session.customer_type else {
        return Ok(None);
    };
    Ok(Some((session, customer_type)))
}

/// Send the browser back to the start of the funnel.
pub(crate) fn restart(session_id: &str) -> Response {
    Redirect::to(&flow::step_path(Step::SelectType, session_id)).into_response()
}

/// Build the funnel router with per-tier rate limits.
pub fn router(rate_limit: RateLimitConfig) -> Router<AppState> {
    let base = Router::new()
        .route("/", get(landing))
        .route("/health", get(health));

    let steps = Router::new()
        .route("/{session_id}", get(show_select_type))
        .route("/{session_id}/customer-type", post(choose_customer_type))
        .route("/{session_id}/upload", get(show_upload))
        .route("/{session_id}/payment", get(show_payment))
        .route("/{session_id}/payment/pay-now", post(pay_now))
        .route("/{session_id}/payment/pay-later", post(pay_later))
        .route("/{session_id}/confirmation", get(show_confirmation));

    // Uploads carry whole print files; the default body cap is far too
    // small and the per-file ceiling is enforced in the handler instead
    let uploads = Router::new().route(
        "/{session_id}/upload",
        post(submit_upload).layer(DefaultBodyLimit::disable()),
    );

    Router::new()
        .merge(rate_limit::relaxed(base, rate_limit.relaxed_rpm))
        .merge(rate_limit::standard(steps, rate_limit.standard_rpm))
        .merge(rate_limit::strict(uploads, rate_limit.strict_rpm))
}
