use chrono::Utc;
use rusqlite::{Connection, params};

use crate::error::{AppError, Result};
use crate::models::{CheckoutSession, CustomerType};

use super::from_row::{CHECKOUT_SESSION_COLS, query_one};

fn now() -> i64 {
    Utc::now().timestamp()
}

// ============ Checkout sessions ============

/// Fetch a session, creating the row on first touch.
///
/// The design flag is only captured at creation; later values are
/// ignored so a crafted link cannot flip an in-progress funnel.
pub fn ensure_session(
    conn: &Connection,
    id: &str,
    design_attached: bool,
) -> Result<CheckoutSession> {
    if let Some(existing) = get_session(conn, id)? {
        return Ok(existing);
    }

    let now = now();
    conn.execute(
        "INSERT INTO checkout_sessions (id, design_attached, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO NOTHING",
        params![id, design_attached, now, now],
    )?;

    // Re-read instead of constructing: a concurrent first touch may have won
    get_session(conn, id)?
        .ok_or_else(|| AppError::Internal(format!("Session {} vanished after insert", id)))
}

pub fn get_session(conn: &Connection, id: &str) -> Result<Option<CheckoutSession>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM checkout_sessions WHERE id = ?1",
            CHECKOUT_SESSION_COLS
        ),
        &[&id],
    )
}

/// Record the chosen customer type.
pub fn set_customer_type(
    conn: &Connection,
    id: &str,
    customer_type: CustomerType,
) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE checkout_sessions SET customer_type = ?2, updated_at = ?3 WHERE id = ?1",
        params![id, customer_type.as_str(), now()],
    )?;
    Ok(affected > 0)
}

/// Record a successful batch delivery and the payment URL it returned.
pub fn record_upload_delivery(
    conn: &Connection,
    id: &str,
    payment_url: &str,
    file_count: i64,
) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE checkout_sessions
         SET files_delivered = 1, file_count = ?2, payment_url = ?3,
             payment_url_degraded = 0, updated_at = ?4
         WHERE id = ?1",
        params![id, file_count, payment_url, now()],
    )?;
    Ok(affected > 0)
}

/// Store the checkout link handed to the browser, remembering whether it
/// was delivered by the pipeline or synthesized locally.
pub fn set_payment_url(conn: &Connection, id: &str, url: &str, degraded: bool) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE checkout_sessions
         SET payment_url = ?2, payment_url_degraded = ?3, updated_at = ?4
         WHERE id = ?1",
        params![id, url, degraded, now()],
    )?;
    Ok(affected > 0)
}

pub fn mark_completed(conn: &Connection, id: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE checkout_sessions SET completed = 1, updated_at = ?2 WHERE id = ?1",
        params![id, now()],
    )?;
    Ok(affected > 0)
}

/// Record a pay-later order; the session is finished at that point.
pub fn record_pay_later(conn: &Connection, id: &str, order_id: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE checkout_sessions
         SET order_id = ?2, completed = 1, updated_at = ?3
         WHERE id = ?1",
        params![id, order_id, now()],
    )?;
    Ok(affected > 0)
}

/// Delete sessions untouched for longer than the TTL.
///
/// Completed sessions go too: the funnel is not a durable order store,
/// the pipeline is.
pub fn cleanup_stale_sessions(conn: &Connection, ttl_secs: i64) -> Result<usize> {
    let cutoff = now() - ttl_secs;
    let deleted = conn.execute(
        "DELETE FROM checkout_sessions WHERE updated_at < ?1",
        params![cutoff],
    )?;
    Ok(deleted)
}
