//! Row mapping trait and helpers for reducing boilerplate in queries.

use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::{CheckoutSession, CustomerType};

/// Trait for constructing a type from a database row.
///
/// Implementing this trait allows using the `query_one` helper, reducing
/// repetitive row mapping closures.
pub trait FromRow: Sized {
    /// Construct an instance from a database row.
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

// ============ SQL SELECT Constants ============

pub const CHECKOUT_SESSION_COLS: &str = "id, customer_type, design_attached, payment_url, \
     payment_url_degraded, files_delivered, file_count, completed, order_id, \
     created_at, updated_at";

// ============ FromRow Implementations ============

impl FromRow for CheckoutSession {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        // An unrecognized stored value degrades to "not chosen" rather
        // than failing the whole read
        let customer_type: Option<CustomerType> = row
            .get::<_, Option<String>>(1)?
            .and_then(|s| s.parse().ok());
        Ok(CheckoutSession {
            id: row.get(0)?,
            customer_type,
            design_attached: row.get::<_, i32>(2)? != 0,
            payment_url: row.get(3)?,
            payment_url_degraded: row.get::<_, i32>(4)? != 0,
            files_delivered: row.get::<_, i32>(5)? != 0,
            file_count: row.get(6)?,
            completed: row.get::<_, i32>(7)? != 0,
            order_id: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }
}
