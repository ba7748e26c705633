//! Second funnel step: file delivery to the order pipeline.

use axum::{
    extract::{Multipart, State},
    response::{IntoResponse, Redirect, Response},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use serde::Serialize;

use crate::db::{AppState, queries};
use crate::error::{AppError, Result, msg};
use crate::extractors::{Json, Path};
use crate::flow::{self, FlowEvent, Step};
use crate::hooks::HookFile;
use crate::models::{self, CustomerType, IncomingFile};
use crate::util::format_file_size;

#[derive(Debug, Serialize)]
pub struct UploadDescriptor {
    pub session_id: String,
    pub step: &'static str,
    pub customer_type: CustomerType,
    /// Content types accepted without a warning
    pub accepted_types: &'static [&'static str],
    /// Extensions that rescue a missing or generic content type
    pub accepted_extensions: &'static [&'static str],
    pub max_file_bytes: u64,
    /// Human form of the ceiling, for picker hints ("50 MB")
    pub max_file_size: String,
}

/// Upload step page. Requires a chosen customer type; otherwise the
/// browser is sent back to the start of the funnel.
pub async fn show_upload(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Response> {
    let conn = state.db.get()?;
    let Some((session, customer_type)) = super::session_with_type(&conn, &session_id)? else {
        return Ok(super::restart(&session_id));
    };

    Ok(Json(UploadDescriptor {
        session_id: session.id,
        step: Step::Upload.as_str(),
        customer_type,
        accepted_types: models::ACCEPTED_TYPES,
        accepted_extensions: models::ACCEPTED_EXTENSIONS,
        max_file_bytes: state.max_file_bytes,
        max_file_size: format_file_size(state.max_file_bytes),
    })
    .into_response())
}

/// Deliver the uploaded batch to the order pipeline.
///
/// Files over the ceiling block the whole batch before anything leaves
/// the building; off-list types are warned about and shipped anyway.
/// The hook call is all-or-nothing, so the session is only touched
/// after it succeeds.
pub async fn submit_upload(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    multipart: Multipart,
) -> Result<Response> {
    let conn = state.db.get()?;
    let Some((session, customer_type)) = super::session_with_type(&conn, &session_id)? else {
        return Ok(super::restart(&session_id));
    };

    // Reject deliveries the funnel position does not allow before
    // reading any bytes
    let (_, destination) = flow::advance(
        flow::step_of(&session),
        FlowEvent::FilesDelivered { customer_type },
    )?;

    let files = read_files(multipart).await?;
    if files.is_empty() {
        return Err(AppError::BadRequest(msg::NO_FILES_SELECTED.to_string()));
    }

    let oversized: Vec<&str> = files
        .iter()
        .filter(|f| f.size() > state.max_file_bytes)
        .map(|f| f.name.as_str())
        .collect();
    if !oversized.is_empty() {
        return Err(AppError::BadRequest(format!(
            "Some files exceed {}: {}",
            format_file_size(state.max_file_bytes),
            oversized.join(", ")
        )));
    }

    let off_list: Vec<&str> = files
        .iter()
        .filter(|f| !models::is_accepted(&f.name, &f.content_type))
        .map(|f| f.name.as_str())
        .collect();
    if !off_list.is_empty() {
        tracing::warn!(
            session_id = %session_id,
            files = %off_list.join(", "),
            "Delivering files outside the accepted print formats"
        );
    }

    let encoded: Vec<HookFile> = files
        .iter()
        .map(|f| HookFile {
            name: f.name.clone(),
            data: BASE64.encode(&f.bytes),
            content_type: f.content_type.clone(),
        })
        .collect();

    let payment_url = state
        .hooks
        .deliver_files(&session_id, customer_type, &encoded)
        .await?;

    queries::record_upload_delivery(&conn, &session_id, &payment_url, files.len() as i64)?;

    tracing::info!(
        session_id = %session_id,
        customer_type = %customer_type,
        file_count = files.len(),
        "Batch delivered to the order pipeline"
    );

    if let Some(path) = flow::local_destination_path(destination, &session_id) {
        Ok(Redirect::to(&path).into_response())
    } else {
        // New customers pay immediately: hand over the delivered link
        queries::mark_completed(&conn, &session_id)?;
        Ok(Redirect::to(&payment_url).into_response())
    }
}

/// Pull every file field out of the multipart form.
async fn read_files(mut multipart: Multipart) -> Result<Vec<IncomingFile>> {
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        // Only file-bearing fields matter; the form has no other inputs
        let Some(name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let bytes = field.bytes().await.map_err(bad_multipart)?;

        files.push(IncomingFile {
            name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    Ok(files)
}

fn bad_multipart(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::BadRequest(format!("Invalid upload: {}", e))
}
