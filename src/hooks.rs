//! Outbound hook clients for the order pipeline.
//!
//! The funnel owns no order data of its own; three JSON-over-HTTP hooks
//! carry everything to the pipeline:
//! - file-upload: receives the encoded batch, replies with a payment URL
//! - payment-link: returns the checkout link for a session
//! - pay-later: records contact details for offline invoicing
//!
//! None of the hooks sign requests, and nothing here retries: a failed
//! call is surfaced to the customer, who re-submits. Requests also carry
//! no timeout, so a slow pipeline run holds the request open rather than
//! failing a batch that is still being processed.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::CustomerType;

/// Endpoint URLs for the three outbound hooks.
#[derive(Debug, Clone)]
pub struct HookEndpoints {
    pub file_upload_url: String,
    pub payment_link_url: String,
    pub pay_later_url: String,
}

/// One encoded file in the upload payload.
#[derive(Debug, Serialize)]
pub struct HookFile {
    pub name: String,
    /// File contents, base64-encoded
    pub data: String,
    #[serde(rename = "type")]
    pub content_type: String,
}

#[derive(Debug, Serialize)]
struct UploadPayload<'a> {
    session_id: &'a str,
    customer_type: CustomerType,
    files: &'a [HookFile],
}

/// Reply from the file-upload hook. The pipeline has answered with
/// either `payment_url` or `stripe_url` over its lifetime; both spellings
/// are accepted.
#[derive(Debug, Deserialize)]
struct UploadReply {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    payment_url: Option<String>,
    #[serde(default)]
    stripe_url: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Serialize)]
struct PaymentLinkPayload<'a> {
    session_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct PaymentLinkReply {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    stripe_url: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct PayLaterPayload<'a> {
    session_id: &'a str,
    customer_name: &'a str,
    customer_email: &'a str,
    customer_phone: &'a str,
    /// Always "pending"; the pipeline flips it when the invoice is paid
    payment_status: &'static str,
}

#[derive(Debug, Deserialize)]
struct PayLaterReply {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    order_id: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Outcome of the pay-later hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayLaterOutcome {
    /// Order recorded; carries the pipeline's order reference, or the
    /// session id when the pipeline did not issue one
    Accepted { order_id: String },
    /// The pipeline does not know this email
    EmailNotFound,
}

/// HTTP client for the outbound order-pipeline hooks.
#[derive(Clone)]
pub struct HookClient {
    http_client: Client,
    endpoints: HookEndpoints,
}

impl HookClient {
    pub fn new(endpoints: HookEndpoints) -> Self {
        Self {
            http_client: Client::new(),
            endpoints,
        }
    }

    /// Deliver an encoded file batch. Returns the payment URL on success.
    ///
    /// The batch succeeds or fails as a whole; the reply has no per-file
    /// acceptance.
    pub async fn deliver_files(
        &self,
        session_id: &str,
        customer_type: CustomerType,
        files: &[HookFile],
    ) -> Result<String> {
        let payload = UploadPayload {
            session_id,
            customer_type,
            files,
        };

        let response = self
            .http_client
            .post(&self.endpoints.file_upload_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    session_id = %session_id,
                    "File-upload hook unreachable"
                );
                AppError::Upstream(format!("Upload failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                body = %body,
                session_id = %session_id,
                "File-upload hook rejected the batch"
            );
            return Err(AppError::Upstream(format!("Upload failed: {}", status)));
        }

        let reply: UploadReply = response.json().await.map_err(|e| {
            tracing::error!(
                error = %e,
                session_id = %session_id,
                "File-upload hook returned invalid JSON"
            );
            AppError::Upstream("Upload failed: invalid response".to_string())
        })?;

        if !reply.success {
            let message = reply
                .message
                .unwrap_or_else(|| "Upload failed".to_string());
            tracing::warn!(
                session_id = %session_id,
                message = %message,
                "File-upload hook reported failure"
            );
            return Err(AppError::Upstream(message));
        }

        reply
            .payment_url
            .or(reply.stripe_url)
            .ok_or(AppError::MissingPaymentUrl)
    }

    /// Ask the pipeline for the checkout link of a session.
    pub async fn fetch_payment_link(&self, session_id: &str) -> Result<String> {
        let payload = PaymentLinkPayload { session_id };

        let response = self
            .http_client
            .post(&self.endpoints.payment_link_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(
                    error = %e,
                    session_id = %session_id,
                    "Payment-link hook unreachable"
                );
                AppError::Upstream(format!("Failed to get payment URL: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                status = %status,
                session_id = %session_id,
                "Payment-link hook returned an error status"
            );
            return Err(AppError::Upstream(format!(
                "Failed to get payment URL: {}",
                status
            )));
        }

        let reply: PaymentLinkReply = response.json().await.map_err(|e| {
            tracing::warn!(
                error = %e,
                session_id = %session_id,
                "Payment-link hook returned invalid JSON"
            );
            AppError::Upstream("Failed to get payment URL: invalid response".to_string())
        })?;

        if !reply.success {
            return Err(AppError::Upstream(
                reply
                    .error
                    .unwrap_or_else(|| "Payment URL not available".to_string()),
            ));
        }

        reply
            .url
            .or(reply.stripe_url)
            .ok_or_else(|| AppError::Upstream("Payment URL not available".to_string()))
    }

    /// Record a pay-later order.
    ///
    /// An unknown email is the one hook failure the form handles
    /// specially; everything else is a plain upstream error.
    pub async fn submit_pay_later(
        &self,
        session_id: &str,
        name: &str,
        email: &str,
        phone: &str,
    ) -> Result<PayLaterOutcome> {
        let payload = PayLaterPayload {
            session_id,
            customer_name: name,
            customer_email: email,
            customer_phone: phone,
            payment_status: "pending",
        };

        let response = self
            .http_client
            .post(&self.endpoints.pay_later_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    session_id = %session_id,
                    "Pay-later hook unreachable"
                );
                AppError::Upstream("Failed to save order. Please try again.".to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                body = %body,
                session_id = %session_id,
                "Pay-later hook returned an error status"
            );
            return Err(AppError::Upstream(
                "Failed to save order. Please try again.".to_string(),
            ));
        }

        let reply: PayLaterReply = response.json().await.map_err(|e| {
            tracing::error!(
                error = %e,
                session_id = %session_id,
                "Pay-later hook returned invalid JSON"
            );
            AppError::Upstream("Failed to save order. Please try again.".to_string())
        })?;

        if !reply.success {
            let error = reply.error.unwrap_or_default();
            if error.to_lowercase().contains("email not found") {
                return Ok(PayLaterOutcome::EmailNotFound);
            }
            tracing::warn!(
                session_id = %session_id,
                error = %error,
                "Pay-later hook reported failure"
            );
            if error.is_empty() {
                return Err(AppError::Upstream(
                    "Failed to save order. Please try again.".to_string(),
                ));
            }
            return Err(AppError::Upstream(error));
        }

        Ok(PayLaterOutcome::Accepted {
            order_id: reply
                .order_id
                .unwrap_or_else(|| session_id.to_string()),
        })
    }
}
