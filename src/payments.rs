//! Payment-link resolution for the processor hand-off.
//!
//! Navigation to the processor never blocks on the pipeline: when no
//! link was delivered and the payment-link hook cannot produce one, a
//! fallback URL is synthesized from the processor base and the session
//! records that it is running degraded.

use crate::hooks::HookClient;

/// A checkout link ready to hand to the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentLink {
    /// Delivered by the pipeline, either during upload or fetched just now
    Delivered(String),
    /// Synthesized locally because the pipeline had no link to give
    Degraded { url: String, reason: String },
}

impl PaymentLink {
    pub fn url(&self) -> &str {
        match self {
            PaymentLink::Delivered(url) => url,
            PaymentLink::Degraded { url, .. } => url,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, PaymentLink::Degraded { .. })
    }
}

/// Build the fallback checkout URL for a session.
pub fn synthesize_pay_url(processor_base_url: &str, session_id: &str) -> String {
    format!(
        "{}/pay/{}",
        processor_base_url.trim_end_matches('/'),
        urlencoding::encode(session_id)
    )
}

/// Resolve the link to hand the browser: the stored one wins, then the
/// payment-link hook, then the synthesized fallback.
pub async fn resolve_payment_link(
    hooks: &HookClient,
    processor_base_url: &str,
    session_id: &str,
    stored: Option<&str>,
) -> PaymentLink {
    if let Some(url) = stored {
        return PaymentLink::Delivered(url.to_string());
    }

    match hooks.fetch_payment_link(session_id).await {
        Ok(url) => PaymentLink::Delivered(url),
        Err(e) => {
            let reason = e.to_string();
            tracing::warn!(
                session_id = %session_id,
                reason = %reason,
                "No payment link available, synthesizing fallback URL"
            );
            PaymentLink::Degraded {
                url: synthesize_pay_url(processor_base_url, session_id),
                reason,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::HookEndpoints;

    fn dead_hooks() -> HookClient {
        // Port 9 (discard) on loopback: connections fail immediately
        HookClient::new(HookEndpoints {
            file_upload_url: "http://127.0.0.1:9/webhook/file-upload".to_string(),
            payment_link_url: "http://127.0.0.1:9/webhook/get-stripe-url".to_string(),
            pay_later_url: "http://127.0.0.1:9/webhook/pay-later".to_string(),
        })
    }

    #[test]
    fn test_synthesized_url_shape() {
        assert_eq!(
            synthesize_pay_url("https://pay.example", "sess-1"),
            "https://pay.example/pay/sess-1"
        );
    }

    #[test]
    fn test_synthesized_url_trims_trailing_slash() {
        assert_eq!(
            synthesize_pay_url("https://pay.example/", "sess-1"),
            "https://pay.example/pay/sess-1"
        );
    }

    #[test]
    fn test_synthesized_url_escapes_the_session_id() {
        assert_eq!(
            synthesize_pay_url("https://pay.example", "sess 1/x"),
            "https://pay.example/pay/sess%201%2Fx"
        );
    }

    #[tokio::test]
    async fn test_stored_link_wins_without_touching_the_hook() {
        let link = resolve_payment_link(
            &dead_hooks(),
            "https://pay.example",
            "sess-1",
            Some("https://pay.example/chk_42"),
        )
        .await;

        assert_eq!(
            link,
            PaymentLink::Delivered("https://pay.example/chk_42".to_string())
        );
        assert!(!link.is_degraded());
    }

    #[tokio::test]
    async fn test_unreachable_hook_degrades_to_synthesized_url() {
        let link =
            resolve_payment_link(&dead_hooks(), "https://pay.example", "sess-1", None).await;

        assert!(link.is_degraded());
        assert_eq!(link.url(), "https://pay.example/pay/sess-1");
        match link {
            PaymentLink::Degraded { reason, .. } => {
                assert!(!reason.is_empty(), "degraded link should record why")
            }
            PaymentLink::Delivered(_) => unreachable!(),
        }
    }
}
