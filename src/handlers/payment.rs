//! Final funnel step: pay now at the processor, or record the order for
//! offline invoicing.

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};

use crate::db::{AppState, queries};
use crate::error::{AppError, OptionExt, Result, msg};
use crate::extractors::{Json, Path};
use crate::flow::{self, FlowEvent, Step};
use crate::hooks::PayLaterOutcome;
use crate::models::CustomerType;
use crate::payments;

#[derive(Debug, Serialize)]
pub struct PaymentDescriptor {
    pub session_id: String,
    pub step: &'static str,
    pub customer_type: CustomerType,
    /// Whether a checkout link is already held for pay-now
    pub payment_url_held: bool,
    pub options: &'static [&'static str],
}

/// Payment step page. Requires a chosen customer type; otherwise the
/// browser is sent back to the start of the funnel.
pub async fn show_payment(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Response> {
    let conn = state.db.get()?;
    let Some((session, customer_type)) = super::session_with_type(&conn, &session_id)? else {
        return Ok(super::restart(&session_id));
    };

    Ok(Json(PaymentDescriptor {
        session_id: session.id,
        step: Step::Payment.as_str(),
        customer_type,
        payment_url_held: session.payment_url.is_some(),
        options: &["pay_now", "pay_later"],
    })
    .into_response())
}

/// Hand the browser to the payment processor.
///
/// The link stored at upload time wins; otherwise the pipeline is asked
/// for one; otherwise a fallback is synthesized and the session records
/// that it went out degraded. Navigation proceeds in every case.
pub async fn pay_now(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Response> {
    let conn = state.db.get()?;
    let Some((session, _)) = super::session_with_type(&conn, &session_id)? else {
        return Ok(super::restart(&session_id));
    };

    flow::advance(flow::step_of(&session), FlowEvent::PayNowStarted)?;

    // A degraded stored link is worth one more try at the hook
    let stored = session
        .payment_url
        .as_deref()
        .filter(|_| !session.payment_url_degraded);
    let link = payments::resolve_payment_link(
        &state.hooks,
        &state.processor_base_url,
        &session_id,
        stored,
    )
    .await;

    queries::set_payment_url(&conn, &session_id, link.url(), link.is_degraded())?;
    queries::mark_completed(&conn, &session_id)?;

    Ok(Redirect::to(link.url()).into_response())
}

#[derive(Debug, Deserialize)]
pub struct PayLaterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PayLaterResponse {
    pub success: bool,
    pub order_id: String,
    /// Where the confirmation was addressed
    pub email: String,
    pub message: String,
    pub confirmation_url: String,
}

/// Record the order for offline invoicing instead of paying now.
pub async fn pay_later(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<PayLaterRequest>,
) -> Result<Response> {
    let conn = state.db.get()?;
    let Some((session, _)) = super::session_with_type(&conn, &session_id)? else {
        return Ok(super::restart(&session_id));
    };

    let name = request.name.as_deref().map(str::trim).unwrap_or_default();
    let email = request.email.as_deref().map(str::trim).unwrap_or_default();
    if name.is_empty() || email.is_empty() {
        return Err(AppError::BadRequest(msg::CONTACT_REQUIRED.to_string()));
    }
    let phone = request.phone.as_deref().map(str::trim).unwrap_or_default();

    flow::advance(flow::step_of(&session), FlowEvent::PayLaterRecorded)?;

    let outcome = state
        .hooks
        .submit_pay_later(&session_id, name, email, phone)
        .await?;
    let order_id = match outcome {
        PayLaterOutcome::Accepted { order_id } => order_id,
        PayLaterOutcome::EmailNotFound => {
            return Err(AppError::NotFound(msg::EMAIL_NOT_FOUND.to_string()));
        }
    };

    queries::record_pay_later(&conn, &session_id, &order_id)?;

    tracing::info!(
        session_id = %session_id,
        order_id = %order_id,
        "Pay-later order recorded"
    );

    let confirmation_url = append_query_params(
        &flow::step_path(Step::Done, &session_id),
        &[("order_id", &order_id)],
    );

    Ok(Json(PayLaterResponse {
        success: true,
        order_id,
        email: email.to_string(),
        message: format!("Order saved. We'll send payment details to {}.", email),
        confirmation_url,
    })
    .into_response())
}

#[derive(Debug, Serialize)]
pub struct ConfirmationDescriptor {
    pub session_id: String,
    pub step: &'static str,
    pub order_id: String,
    pub payment_status: &'static str,
}

/// Confirmation page for pay-later orders.
pub async fn show_confirmation(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ConfirmationDescriptor>> {
    let conn = state.db.get()?;
    let session =
        queries::get_session(&conn, &session_id)?.or_not_found(msg::SESSION_NOT_FOUND)?;
    let order_id = session.order_id.or_not_found(msg::ORDER_NOT_RECORDED)?;

    Ok(Json(ConfirmationDescriptor {
        session_id,
        step: Step::Done.as_str(),
        order_id,
        payment_status: "pending",
    }))
}

/// Append query parameters to a URL, handling existing query strings.
fn append_query_params(base_url: &str, params: &[(&str, &str)]) -> String {
    if params.is_empty() {
        return base_url.to_string();
    }

    let query: Vec<String> = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect();
    let separator = if base_url.contains('?') { "&" } else { "?" };

    format!("{}{}{}", base_url, separator, query.join("&"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_query_params_to_bare_url() {
        assert_eq!(
            append_query_params("/s1/confirmation", &[("order_id", "ord-9")]),
            "/s1/confirmation?order_id=ord-9"
        );
    }

    #[test]
    fn test_append_query_params_extends_existing_query() {
        assert_eq!(
            append_query_params("/s1/confirmation?a=1", &[("order_id", "ord 9")]),
            "/s1/confirmation?a=1&order_id=ord%209"
        );
    }
}
