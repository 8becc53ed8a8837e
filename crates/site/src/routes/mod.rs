//! HTTP route handlers for the site API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /rss.xml                         - RSS 2.0 feed of blog posts
//!
//! # Gallery
//! GET  /api/collections                 - Collection listing
//! GET  /api/images                      - All images across collections
//! GET  /api/images/{collection}         - Images of one collection
//! GET  /api/image?src&w&h&q&fit&f       - Image resize proxy
//!
//! # Blog
//! GET  /api/content/blog                - Post listing, newest first
//! GET  /api/content/blog/{slug}         - Single post, rendered to HTML
//!
//! # Shop
//! GET  /api/shop/product                - The single sellable product
//! POST /api/shop/checkout               - Create payment intent
//! GET  /api/shop/order/{payment_intent_id} - Order status lookup
//! POST /api/shop/webhooks/stripe        - Stripe event delivery
//! ```

pub mod blog;
pub mod feed;
pub mod gallery;
pub mod image_proxy;
pub mod shop;
pub mod webhooks;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the application router (health endpoints are added in `main`).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/rss.xml", get(feed::rss))
        .nest("/api", api_routes())
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/collections", get(gallery::list_collections))
        .route("/images", get(gallery::list_all_images))
        .route("/images/{collection}", get(gallery::list_collection_images))
        .route("/image", get(image_proxy::proxy))
        .route("/content/blog", get(blog::list_posts))
        .route("/content/blog/{slug}", get(blog::show_post))
        .nest("/shop", shop_routes())
}

fn shop_routes() -> Router<AppState> {
    Router::new()
        .route("/product", get(shop::get_product))
        .route("/checkout", post(shop::checkout))
        .route("/order/{payment_intent_id}", get(shop::get_order))
        .route("/webhooks/stripe", post(webhooks::stripe))
}
