//! Shop route handlers: product lookup, checkout, order status.

use axum::{Json, extract::Path, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use fiftymm_core::{Email, MinorUnits, PaymentIntentId, ProductId};

use crate::db::{OrderRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::models::{Order, Product};
use crate::state::AppState;

/// Request body for `POST /api/shop/checkout`.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub email: Option<String>,
    pub name: Option<String>,
}

/// Response for `POST /api/shop/checkout`.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    #[serde(rename = "clientSecret")]
    pub client_secret: String,
    pub product: Product,
}

/// Response for `GET /api/shop/product`.
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub product: ProductView,
}

/// Product row plus the derived availability flag.
#[derive(Debug, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    #[serde(rename = "inStock")]
    pub in_stock: bool,
}

/// Response for `GET /api/shop/order/{payment_intent_id}`.
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub order: OrderView,
}

/// Order row with the shipping address decoded from its stored JSON.
#[derive(Debug, Serialize)]
pub struct OrderView {
    pub id: uuid::Uuid,
    pub stripe_payment_intent_id: String,
    pub customer_email: String,
    pub customer_name: String,
    pub shipping_address: Option<serde_json::Value>,
    pub amount: i64,
    pub status: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        // Stored as JSON text; a row with a malformed blob still serves,
        // just without the address.
        let shipping_address = order.shipping_address.as_deref().and_then(|raw| {
            serde_json::from_str(raw)
                .map_err(|err| {
                    tracing::error!(
                        order_id = %order.id,
                        error = %err,
                        "Failed to parse stored shipping address"
                    );
                })
                .ok()
        });

        Self {
            id: order.id,
            stripe_payment_intent_id: order.stripe_payment_intent_id,
            customer_email: order.customer_email,
            customer_name: order.customer_name,
            shipping_address,
            amount: order.amount,
            status: order.status,
            created_at: order.created_at,
        }
    }
}

/// Fetch the single sellable product.
#[instrument(skip(state))]
pub async fn get_product(State(state): State<AppState>) -> Result<Json<ProductResponse>> {
    let product = ProductRepository::new(state.pool())
        .get(&state.config().stripe.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    let in_stock = product.in_stock();
    Ok(Json(ProductResponse {
        product: ProductView { product, in_stock },
    }))
}

/// Start a checkout: create a payment intent for one unit of the product.
///
/// Stock is only checked here, not reserved; the real decrement happens on
/// the confirmed-payment webhook so abandoned checkouts never consume stock.
#[instrument(skip(state, body))]
pub async fn checkout(
    State(state): State<AppState>,
    Json(body): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>> {
    let (Some(email), Some(name)) = (body.email.as_deref(), body.name.as_deref()) else {
        return Err(AppError::BadRequest(
            "Email and name are required".to_string(),
        ));
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest(
            "Email and name are required".to_string(),
        ));
    }
    let email = Email::parse(email)
        .map_err(|err| AppError::BadRequest(format!("Invalid email: {err}")))?;

    let product_id = ProductId::new(state.config().stripe.product_id.clone());
    let product = ProductRepository::new(state.pool())
        .get(product_id.as_str())
        .await?;

    let Some(product) = product.filter(Product::in_stock) else {
        return Err(AppError::BadRequest(
            "Product is out of stock".to_string(),
        ));
    };

    let intent = state
        .stripe()
        .create_payment_intent(
            MinorUnits::new(product.price),
            &email,
            name,
            &product_id,
            &product.name,
        )
        .await?;

    tracing::info!(payment_intent_id = %intent.id, "Checkout started");

    Ok(Json(CheckoutResponse {
        client_secret: intent.client_secret,
        product,
    }))
}

/// Look up an order by the payment-intent id the client holds after paying.
#[instrument(skip(state))]
pub async fn get_order(
    State(state): State<AppState>,
    Path(payment_intent_id): Path<String>,
) -> Result<Json<OrderResponse>> {
    let payment_intent_id = PaymentIntentId::new(payment_intent_id);
    let order = OrderRepository::new(state.pool())
        .get_by_payment_intent(&payment_intent_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    Ok(Json(OrderResponse {
        order: order.into(),
    }))
}
