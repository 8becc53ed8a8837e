//! Resend API client for order-confirmation email.
//!
//! Confirmation email is best effort: the webhook handler logs a failure
//! and moves on, since the order is already persisted.

use secrecy::ExposeSecret;
use serde::Serialize;
use thiserror::Error;

use fiftymm_core::{MinorUnits, OrderId};

use crate::config::EmailConfig;
use crate::services::stripe::Shipping;

/// Resend API endpoint for sending email.
const SEND_URL: &str = "https://api.resend.com/emails";

/// Length of the short order reference shown to customers.
const SHORT_ORDER_ID_LEN: usize = 13;

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {body}")]
    Api { status: u16, body: String },
}

/// Data rendered into the order-confirmation email.
#[derive(Debug)]
pub struct OrderEmail {
    pub order_id: OrderId,
    pub to: String,
    pub customer_name: String,
    pub product_name: String,
    pub amount: MinorUnits,
    pub shipping: Option<Shipping>,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: String,
    html: String,
}

/// Resend API client.
#[derive(Clone)]
pub struct ResendClient {
    client: reqwest::Client,
    config: EmailConfig,
}

impl ResendClient {
    /// Create a new Resend API client.
    #[must_use]
    pub fn new(client: reqwest::Client, config: EmailConfig) -> Self {
        Self { client, config }
    }

    /// Send an order-confirmation email.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or Resend rejects it.
    pub async fn send_order_confirmation(&self, email: &OrderEmail) -> Result<(), EmailError> {
        let request = SendRequest {
            from: &self.config.from_address,
            to: &email.to,
            subject: format!("Order Confirmation - {}", email.product_name),
            html: render_order_confirmation(email),
        };

        let response = self
            .client
            .post(SEND_URL)
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmailError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

/// Customer-facing order reference: the first 13 characters of the UUID.
fn short_order_id(id: OrderId) -> String {
    id.to_string().chars().take(SHORT_ORDER_ID_LEN).collect()
}

fn render_order_confirmation(email: &OrderEmail) -> String {
    let shipping_block = email
        .shipping
        .as_ref()
        .map(render_shipping_block)
        .unwrap_or_default();

    format!(
        "<div style=\"font-family: sans-serif; max-width: 600px; margin: 0 auto;\">\
         <h1>Thank you for your order!</h1>\
         <p>Hi {name},</p>\
         <p>Your order has been confirmed.</p>\
         <table style=\"width: 100%; border-collapse: collapse;\">\
         <tr><td style=\"padding: 8px 0;\">Order</td><td>#{order}</td></tr>\
         <tr><td style=\"padding: 8px 0;\">Item</td><td>{product}</td></tr>\
         <tr><td style=\"padding: 8px 0;\">Total</td><td>${total}</td></tr>\
         </table>\
         {shipping_block}\
         <p>I'll be in touch when it ships.</p>\
         <p>— Ian</p>\
         </div>",
        name = html_escape(&email.customer_name),
        order = short_order_id(email.order_id),
        product = html_escape(&email.product_name),
        total = email.amount.display_major(),
    )
}

fn render_shipping_block(shipping: &Shipping) -> String {
    let mut lines = Vec::new();
    if let Some(name) = &shipping.name {
        lines.push(html_escape(name));
    }
    if let Some(address) = &shipping.address {
        for part in [&address.line1, &address.line2] {
            if let Some(value) = part {
                lines.push(html_escape(value));
            }
        }
        let locality: Vec<&str> = [&address.city, &address.state, &address.postal_code]
            .into_iter()
            .filter_map(|v| v.as_deref())
            .collect();
        if !locality.is_empty() {
            lines.push(html_escape(&locality.join(", ")));
        }
        if let Some(country) = &address.country {
            lines.push(html_escape(country));
        }
    }

    if lines.is_empty() {
        return String::new();
    }

    format!(
        "<h2 style=\"font-size: 16px;\">Shipping to</h2><p>{}</p>",
        lines.join("<br>")
    )
}

fn html_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::stripe::Address;
    use uuid::Uuid;

    fn sample_email(shipping: Option<Shipping>) -> OrderEmail {
        OrderEmail {
            order_id: OrderId::new(
                Uuid::parse_str("3f1e9c2a-7b4d-4e6f-8a90-1b2c3d4e5f60").unwrap(),
            ),
            to: "buyer@example.com".to_string(),
            customer_name: "Sam Buyer".to_string(),
            product_name: "Athens Rainforest".to_string(),
            amount: MinorUnits::new(3500),
            shipping,
        }
    }

    #[test]
    fn order_reference_is_truncated() {
        let email = sample_email(None);
        let html = render_order_confirmation(&email);
        assert!(html.contains("#3f1e9c2a-7b4d"));
        assert!(!html.contains("3f1e9c2a-7b4d-4e6f"));
    }

    #[test]
    fn total_is_formatted_in_dollars() {
        let html = render_order_confirmation(&sample_email(None));
        assert!(html.contains("$35.00"));
    }

    #[test]
    fn shipping_block_is_omitted_without_address() {
        let html = render_order_confirmation(&sample_email(None));
        assert!(!html.contains("Shipping to"));
    }

    #[test]
    fn shipping_block_renders_address_lines() {
        let shipping = Shipping {
            name: Some("Sam Buyer".to_string()),
            address: Some(Address {
                line1: Some("1 Main St".to_string()),
                line2: None,
                city: Some("Athens".to_string()),
                state: Some("GA".to_string()),
                postal_code: Some("30601".to_string()),
                country: Some("US".to_string()),
            }),
        };
        let html = render_order_confirmation(&sample_email(Some(shipping)));
        assert!(html.contains("Shipping to"));
        assert!(html.contains("1 Main St"));
        assert!(html.contains("Athens, GA, 30601"));
    }

    #[test]
    fn customer_name_is_escaped() {
        let mut email = sample_email(None);
        email.customer_name = "<script>alert(1)</script>".to_string();
        let html = render_order_confirmation(&email);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
