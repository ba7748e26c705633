use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use std::sync::Arc;
use std::time::Duration;

use prepress::config::Config;
use prepress::db::{AppState, create_pool, init_db, queries};
use prepress::handlers;
use prepress::hooks::{HookClient, HookEndpoints};

#[derive(Parser, Debug)]
#[command(name = "prepress")]
#[command(about = "Checkout funnel for print orders: customer type, file delivery, payment hand-off")]
struct Cli {
    /// Seed demo sessions and print their funnel links on startup (dev mode only)
    #[arg(long)]
    seed: bool,

    /// Delete the database on exit (dev mode only, useful for fresh starts)
    #[arg(long)]
    ephemeral: bool,
}

/// Creates two demo sessions and prints their funnel links, so the flow
/// can be walked without an externally issued link: one plain, one with
/// designs already attached.
fn seed_demo_sessions(state: &AppState, config: &Config) {
    let conn = match state.db.get() {
        Ok(conn) => conn,
        Err(e) => {
            tracing::warn!("Failed to get db connection for seeding: {}", e);
            return;
        }
    };

    let plain = uuid::Uuid::new_v4().to_string();
    let designed = uuid::Uuid::new_v4().to_string();
    let seeded = queries::ensure_session(&conn, &plain, false)
        .and_then(|_| queries::ensure_session(&conn, &designed, true));
    if let Err(e) = seeded {
        tracing::warn!("Failed to seed demo sessions: {}", e);
        return;
    }

    tracing::info!("============================================");
    tracing::info!("DEMO FUNNEL LINKS");
    tracing::info!("{}/{}", config.base_url, plain);
    tracing::info!(
        "{}/{}?design=1  (designs already attached)",
        config.base_url,
        designed
    );
    tracing::info!("============================================");
}

/// Spawns a background task that periodically reaps stale checkout
/// sessions. Runs every 5 minutes; anything untouched past the TTL is
/// deleted.
fn spawn_cleanup_task(state: AppState) {
    tokio::spawn(async move {
        let interval = Duration::from_secs(5 * 60); // 5 minutes

        loop {
            tokio::time::sleep(interval).await;

            match state.db.get() {
                Ok(conn) => {
                    match queries::cleanup_stale_sessions(&conn, state.session_ttl_secs) {
                        Ok(count) => {
                            if count > 0 {
                                tracing::debug!("Reaped {} stale checkout sessions", count);
                            }
                        }
                        Err(e) => {
                            tracing::warn!("Failed to reap stale sessions: {}", e);
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("Failed to get db connection for cleanup: {}", e);
                }
            }
        }
    });

    tracing::info!("Background cleanup task started (runs every 5 minutes)");
}

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "prepress=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }

    // Create database connection pool and schema
    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");
    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }

    let hooks = HookClient::new(HookEndpoints {
        file_upload_url: config.upload_hook_url.clone(),
        payment_link_url: config.payment_link_hook_url.clone(),
        pay_later_url: config.pay_later_hook_url.clone(),
    });

    let state = AppState {
        db: db_pool,
        hooks: Arc::new(hooks),
        base_url: config.base_url.clone(),
        processor_base_url: config.processor_base_url.clone(),
        max_file_bytes: config.max_file_bytes,
        session_ttl_secs: config.session_ttl_secs,
    };

    // Seed demo sessions if --seed flag is passed (only in dev mode)
    if cli.seed {
        if !config.dev_mode {
            tracing::warn!("--seed flag ignored: not in dev mode (set PREPRESS_ENV=dev)");
        } else {
            seed_demo_sessions(&state, &config);
        }
    }

    // Start background reaper for stale sessions
    spawn_cleanup_task(state.clone());

    // The funnel is driven from a browser front end on another origin
    let app = handlers::router(config.rate_limit)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start the server
    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    // Track if we should clean up on exit
    let cleanup_on_exit = cli.ephemeral && config.dev_mode;
    let db_path = config.database_path.clone();

    if cleanup_on_exit {
        tracing::info!("EPHEMERAL MODE: database will be deleted on exit");
    }

    tracing::info!("Prepress server listening on {}", addr);

    // Run server with graceful shutdown
    // Use into_make_service_with_connect_info to enable IP-based rate limiting
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Failed to start server");

    // Cleanup on exit if ephemeral mode
    if cleanup_on_exit {
        tracing::info!("Cleaning up ephemeral database...");
        if let Err(e) = std::fs::remove_file(&db_path) {
            tracing::warn!("Failed to remove {}: {}", db_path, e);
        } else {
            tracing::info!("Removed {}", db_path);
        }
        // Also remove WAL and SHM files if they exist
        let _ = std::fs::remove_file(format!("{}-wal", db_path));
        let _ = std::fs::remove_file(format!("{}-shm", db_path));
        tracing::info!("Ephemeral cleanup complete");
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
