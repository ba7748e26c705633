use rusqlite::Connection;

/// Initialize the database schema.
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Checkout sessions (one row per funnel walk)
        -- The id arrives in the funnel link; the row is created on first
        -- touch and the design flag is frozen at that moment.
        -- File bytes are never stored here, only delivery bookkeeping.
        CREATE TABLE IF NOT EXISTS checkout_sessions (
            id TEXT PRIMARY KEY,
            customer_type TEXT CHECK (customer_type IS NULL OR customer_type IN ('new', 'existing')),
            design_attached INTEGER NOT NULL DEFAULT 0,
            payment_url TEXT,
            payment_url_degraded INTEGER NOT NULL DEFAULT 0,
            files_delivered INTEGER NOT NULL DEFAULT 0,
            file_count INTEGER NOT NULL DEFAULT 0,
            completed INTEGER NOT NULL DEFAULT 0,
            order_id TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_checkout_sessions_updated ON checkout_sessions(updated_at);
        "#,
    )?;
    Ok(())
}
