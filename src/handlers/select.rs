//! First funnel step: customer-type selection.

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};

use crate::db::{AppState, queries};
use crate::error::Result;
use crate::extractors::{Json, Path, Query};
use crate::flow::{self, FlowEvent, Step};
use crate::models::CustomerType;
use crate::payments;

#[derive(Debug, Deserialize)]
pub struct SelectQuery {
    /// Design-attachment flag from the funnel link; only honored on the
    /// session's first touch
    pub design: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SelectTypeDescriptor {
    pub session_id: String,
    pub step: &'static str,
    pub design_attached: bool,
    pub customer_types: &'static [&'static str],
}

/// Flag values the funnel links actually use; anything else means no.
fn parse_design_flag(raw: Option<&str>) -> bool {
    matches!(raw, Some("1") | Some("true") | Some("yes"))
}

/// First touch of the funnel. Creates the session row if needed,
/// capturing the design flag from the link at that moment.
pub async fn show_select_type(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(query): Query<SelectQuery>,
) -> Result<Json<SelectTypeDescriptor>> {
    let conn = state.db.get()?;
    let design_attached = parse_design_flag(query.design.as_deref());
    let session = queries::ensure_session(&conn, &session_id, design_attached)?;

    let step = flow::step_of(&session).as_str();
    Ok(Json(SelectTypeDescriptor {
        session_id: session.id,
        step,
        design_attached: session.design_attached,
        customer_types: &["new", "existing"],
    }))
}

#[derive(Debug, Deserialize)]
pub struct ChooseTypeRequest {
    pub customer_type: CustomerType,
}

/// Record the chosen customer type and answer with the next hop.
///
/// With designs already attached there is nothing to upload: new
/// customers go straight to the processor and existing ones to the
/// payment step. Otherwise everyone owes files first.
pub async fn choose_customer_type(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<ChooseTypeRequest>,
) -> Result<Response> {
    let conn = state.db.get()?;
    // A POST without a prior page view still creates the session; the
    // design flag defaults to absent in that case
    let session = queries::ensure_session(&conn, &session_id, false)?;

    let event = FlowEvent::TypeChosen {
        customer_type: request.customer_type,
        design_attached: session.design_attached,
    };
    let (next_step, destination) = flow::advance(flow::step_of(&session), event)?;

    queries::set_customer_type(&conn, &session_id, request.customer_type)?;

    if let Some(path) = flow::local_destination_path(destination, &session_id) {
        return Ok(Redirect::to(&path).into_response());
    }

    // Processor hand-off: designs are attached upstream, so the funnel
    // is already over for this session
    let link = payments::resolve_payment_link(
        &state.hooks,
        &state.processor_base_url,
        &session_id,
        session
            .payment_url
            .as_deref()
            .filter(|_| !session.payment_url_degraded),
    )
    .await;

    queries::set_payment_url(&conn, &session_id, link.url(), link.is_degraded())?;
    if next_step == Step::Done {
        queries::mark_completed(&conn, &session_id)?;
    }

    Ok(Redirect::to(link.url()).into_response())
}
