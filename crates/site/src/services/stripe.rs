//! Stripe API client and webhook signature verification.
//!
//! The client covers the single call the shop needs: creating a
//! `PaymentIntent` for the zine. Webhook verification implements the
//! `Stripe-Signature` scheme (HMAC-SHA256 over `"{t}.{body}"`).

use std::collections::HashMap;

use hmac::{Hmac, Mac};
use secrecy::ExposeSecret;
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

use fiftymm_core::{Email, MinorUnits, PaymentIntentId, ProductId};

use crate::config::StripeConfig;

/// Stripe API base URL.
const BASE_URL: &str = "https://api.stripe.com/v1";

/// Maximum age of a webhook signature timestamp, in seconds.
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

type HmacSha256 = Hmac<Sha256>;

/// Errors that can occur when interacting with the Stripe API.
#[derive(Debug, Error)]
pub enum StripeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse a response or event payload.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Webhook signature verification failed.
    #[error("Invalid webhook signature: {0}")]
    InvalidSignature(String),
}

/// Response from creating a payment intent. Only the fields the
/// checkout route returns to the browser.
#[derive(Debug, Deserialize)]
pub struct PaymentIntentResponse {
    pub id: PaymentIntentId,
    pub client_secret: String,
}

/// Error body returned by the Stripe API.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

/// Stripe API client.
#[derive(Clone)]
pub struct StripeClient {
    client: reqwest::Client,
    config: StripeConfig,
}

impl StripeClient {
    /// Create a new Stripe API client.
    #[must_use]
    pub fn new(client: reqwest::Client, config: StripeConfig) -> Self {
        Self { client, config }
    }

    /// Create a payment intent for a single unit of the product.
    ///
    /// The product id and name travel in the intent metadata so the
    /// webhook handler can fulfil the order without another lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or Stripe rejects it.
    pub async fn create_payment_intent(
        &self,
        amount: MinorUnits,
        receipt_email: &Email,
        customer_name: &str,
        product_id: &ProductId,
        product_name: &str,
    ) -> Result<PaymentIntentResponse, StripeError> {
        let amount = amount.as_i64().to_string();
        let form: Vec<(&str, &str)> = vec![
            ("amount", &amount),
            ("currency", &self.config.currency),
            ("receipt_email", receipt_email.as_str()),
            ("metadata[product_id]", product_id.as_str()),
            ("metadata[product_name]", product_name),
            ("metadata[customer_name]", customer_name),
            ("automatic_payment_methods[enabled]", "true"),
        ];

        let response = self
            .client
            .post(format!("{BASE_URL}/payment_intents"))
            .bearer_auth(self.config.secret_key.expose_secret())
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ApiErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error.message)
                .unwrap_or_else(|| "unknown Stripe error".to_string());
            return Err(StripeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let intent = response.json::<PaymentIntentResponse>().await?;
        Ok(intent)
    }

    /// Verify a `Stripe-Signature` header against the raw request body
    /// and parse the event.
    ///
    /// # Errors
    ///
    /// Returns [`StripeError::InvalidSignature`] when the header is
    /// malformed, the timestamp is older than the tolerance window, or
    /// the HMAC does not match; [`StripeError::Parse`] when the body is
    /// not a valid event.
    pub fn verify_webhook(
        &self,
        body: &[u8],
        signature_header: &str,
        now_unix: i64,
    ) -> Result<WebhookEvent, StripeError> {
        verify_signature(
            self.config.webhook_secret.expose_secret(),
            body,
            signature_header,
            now_unix,
        )?;
        serde_json::from_slice(body).map_err(|e| StripeError::Parse(e.to_string()))
    }
}

/// Parsed `Stripe-Signature` header.
struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<String>,
}

fn parse_signature_header(header: &str) -> Result<SignatureHeader, StripeError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => {
                timestamp = Some(value.parse::<i64>().map_err(|_| {
                    StripeError::InvalidSignature("non-numeric timestamp".to_string())
                })?);
            }
            "v1" => signatures.push(value.to_string()),
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| StripeError::InvalidSignature("missing timestamp".to_string()))?;
    if signatures.is_empty() {
        return Err(StripeError::InvalidSignature(
            "missing v1 signature".to_string(),
        ));
    }

    Ok(SignatureHeader {
        timestamp,
        signatures,
    })
}

fn verify_signature(
    secret: &str,
    body: &[u8],
    header: &str,
    now_unix: i64,
) -> Result<(), StripeError> {
    let parsed = parse_signature_header(header)?;

    if (now_unix - parsed.timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(StripeError::InvalidSignature(
            "timestamp outside tolerance".to_string(),
        ));
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| StripeError::InvalidSignature("invalid secret length".to_string()))?;
    mac.update(parsed.timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(body);
    let expected = hex::encode(mac.finalize().into_bytes());

    let matched = parsed.signatures.iter().any(|candidate| {
        // Constant-time comparison over equal-length hex digests.
        candidate.len() == expected.len()
            && candidate
                .bytes()
                .zip(expected.bytes())
                .fold(0u8, |acc, (a, b)| acc | (a ^ b))
                == 0
    });

    if matched {
        Ok(())
    } else {
        Err(StripeError::InvalidSignature(
            "signature mismatch".to_string(),
        ))
    }
}

// =============================================================================
// Webhook event payloads
// =============================================================================

/// Stripe webhook event envelope.
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookEventData,
}

#[derive(Debug, Deserialize)]
pub struct WebhookEventData {
    pub object: serde_json::Value,
}

impl WebhookEvent {
    /// Decode the event object as a payment intent.
    ///
    /// # Errors
    ///
    /// Returns [`StripeError::Parse`] if the object is not shaped like one.
    pub fn payment_intent(&self) -> Result<PaymentIntent, StripeError> {
        serde_json::from_value(self.data.object.clone())
            .map_err(|e| StripeError::Parse(e.to_string()))
    }
}

/// The subset of a payment intent the fulfilment path reads.
#[derive(Debug, Deserialize)]
pub struct PaymentIntent {
    pub id: PaymentIntentId,
    pub amount: i64,
    pub receipt_email: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    pub shipping: Option<Shipping>,
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct Shipping {
    pub name: Option<String>,
    pub address: Option<Address>,
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct Address {
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}
