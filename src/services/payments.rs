//! Payment service client
//!
//! The payment provider integration lives in its own service; this client
//! treats it as opaque. Submission needs only a boolean precondition: was
//! the intent approved? Hold timing and capture scheduling are the remote
//! side's concern.

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

use crate::error::ApiError;

#[derive(Clone)]
pub struct PaymentClient {
    client: Client,
    base_url: String,
    token: String,
}

/// Error response from the payment service.
#[derive(Debug, Deserialize)]
struct PaymentErrorResponse {
    message: String,
}

/// Outcome of creating a payment intent.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub intent_id: String,
    pub approved: bool,
}

impl PaymentClient {
    pub fn new(base_url: &str, token: &str, timeout_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        tracing::info!(base_url = base_url, "Payment client initialized");

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    /// Make a POST request to the payment service.
    async fn post<T: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<R, ApiError> {
        let url = format!("{}{}", self.base_url, path);

        debug!(url = %url, "Payment service request");

        let response = self
            .client
            .post(&url)
            .header("X-Internal-Token", &self.token)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Payment service request failed");
                ApiError::Internal(anyhow::anyhow!("Payment service unavailable: {}", e))
            })?;

        let status = response.status();

        if status.is_success() {
            response.json::<R>().await.map_err(|e| {
                error!(error = %e, "Failed to parse payment service response");
                ApiError::Internal(anyhow::anyhow!("Invalid payment service response: {}", e))
            })
        } else {
            let message = response
                .json::<PaymentErrorResponse>()
                .await
                .map(|e| e.message)
                .unwrap_or_else(|_| format!("Payment service error: {}", status));

            match status {
                StatusCode::BAD_REQUEST => Err(ApiError::BadRequest(message)),
                StatusCode::UNAUTHORIZED => {
                    error!("Payment service authentication failed");
                    Err(ApiError::Internal(anyhow::anyhow!("Payment service auth error")))
                }
                _ => {
                    error!(status = %status, message = %message, "Payment service error");
                    Err(ApiError::Internal(anyhow::anyhow!(message)))
                }
            }
        }
    }

    /// Create a payment intent for the quoted total.
    pub async fn create_intent(
        &self,
        amount: Decimal,
        currency: &str,
        payment_method_token: &str,
    ) -> Result<PaymentIntent, ApiError> {
        #[derive(Serialize)]
        struct Request<'a> {
            amount: Decimal,
            currency: &'a str,
            payment_method_token: &'a str,
        }

        self.post(
            "/v1/intents",
            &Request {
                amount,
                currency,
                payment_method_token,
            },
        )
        .await
    }

    /// Capture a previously approved intent.
    pub async fn capture(&self, intent_id: &str) -> Result<bool, ApiError> {
        #[derive(Serialize)]
        struct Empty {}

        #[derive(Deserialize)]
        struct Response {
            captured: bool,
        }

        let response: Response = self
            .post(&format!("/v1/intents/{}/capture", intent_id), &Empty {})
            .await?;

        Ok(response.captured)
    }

    /// Check payment service health.
    pub async fn health_check(&self) -> Result<()> {
        let url = format!("{}/health", self.base_url);

        self.client
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .context("Payment service health check failed")?
            .error_for_status()
            .context("Payment service unhealthy")?;

        Ok(())
    }
}
