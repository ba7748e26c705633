use std::env;

/// Default per-file ceiling for uploads (50 MB).
pub const DEFAULT_MAX_FILE_BYTES: u64 = 50 * 1024 * 1024;

/// Default session time-to-live (24 hours).
pub const DEFAULT_SESSION_TTL_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    /// Public base URL of this server, used for printed funnel links
    pub base_url: String,
    /// Endpoint that receives uploaded file batches
    pub upload_hook_url: String,
    /// Endpoint that returns the checkout link for a session
    pub payment_link_hook_url: String,
    /// Endpoint that records pay-later orders
    pub pay_later_hook_url: String,
    /// Payment processor base URL, for synthesized fallback links
    pub processor_base_url: String,
    /// Per-file upload ceiling in bytes
    pub max_file_bytes: u64,
    /// Sessions untouched for this long are reaped
    pub session_ttl_secs: i64,
    pub rate_limit: RateLimitConfig,
    pub dev_mode: bool,
}

/// Requests-per-minute tiers for the public endpoints.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub strict_rpm: u32,
    pub standard_rpm: u32,
    pub relaxed_rpm: u32,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("PREPRESS_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let base_url = env::var("BASE_URL")
            .unwrap_or_else(|_| format!("http://{}:{}", host, port));

        // The three hooks usually live under one pipeline base; each can
        // still be pointed elsewhere individually.
        let hook_base = env::var("ORDER_HOOK_BASE_URL")
            .unwrap_or_else(|_| "https://hooks.iprint.example".to_string());
        let hook_base = hook_base.trim_end_matches('/').to_string();

        Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "prepress.db".to_string()),
            base_url,
            upload_hook_url: env::var("UPLOAD_HOOK_URL")
                .unwrap_or_else(|_| format!("{}/webhook/file-upload", hook_base)),
            payment_link_hook_url: env::var("PAYMENT_LINK_HOOK_URL")
                .unwrap_or_else(|_| format!("{}/webhook/get-stripe-url", hook_base)),
            pay_later_hook_url: env::var("PAY_LATER_HOOK_URL")
                .unwrap_or_else(|_| format!("{}/webhook/pay-later", hook_base)),
            processor_base_url: env::var("PROCESSOR_BASE_URL")
                .unwrap_or_else(|_| "https://pay.iprint.example".to_string()),
            max_file_bytes: env::var("MAX_FILE_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_FILE_BYTES),
            session_ttl_secs: env::var("SESSION_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SESSION_TTL_SECS),
            rate_limit: RateLimitConfig {
                strict_rpm: parse_rpm("RATE_LIMIT_STRICT_RPM", 10),
                standard_rpm: parse_rpm("RATE_LIMIT_STANDARD_RPM", 30),
                relaxed_rpm: parse_rpm("RATE_LIMIT_RELAXED_RPM", 60),
            },
            dev_mode,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_rpm(var: &str, default: u32) -> u32 {
    env::var(var)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
