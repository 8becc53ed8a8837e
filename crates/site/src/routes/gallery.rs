//! Gallery route handlers.
//!
//! Collections and image listings are derived from the object-store key
//! space on every request; the store is the single source of truth.

use axum::{Json, extract::Path, extract::State};
use serde::Serialize;
use tracing::instrument;

use crate::error::Result;
use crate::gallery::{Collection, Image};
use crate::state::AppState;

/// Response for `GET /api/collections`.
#[derive(Debug, Serialize)]
pub struct CollectionsResponse {
    pub collections: Vec<Collection>,
    pub count: usize,
}

/// Response for `GET /api/images`.
#[derive(Debug, Serialize)]
pub struct ImagesResponse {
    pub images: Vec<Image>,
    pub count: usize,
}

/// Response for `GET /api/images/{collection}`.
#[derive(Debug, Serialize)]
pub struct CollectionImagesResponse {
    pub collection: String,
    pub images: Vec<Image>,
    pub count: usize,
}

/// List all collections with cover image and image count.
#[instrument(skip(state))]
pub async fn list_collections(State(state): State<AppState>) -> Result<Json<CollectionsResponse>> {
    let collections = state.gallery().list_collections().await?;
    let count = collections.len();
    Ok(Json(CollectionsResponse { collections, count }))
}

/// List every image in the bucket, tagged with its collection.
#[instrument(skip(state))]
pub async fn list_all_images(State(state): State<AppState>) -> Result<Json<ImagesResponse>> {
    let images = state.gallery().list_all_images().await?;
    let count = images.len();
    Ok(Json(ImagesResponse { images, count }))
}

/// List the images of one collection (`main` means the bucket root).
#[instrument(skip(state))]
pub async fn list_collection_images(
    State(state): State<AppState>,
    Path(collection): Path<String>,
) -> Result<Json<CollectionImagesResponse>> {
    let images = state.gallery().list_images(&collection).await?;
    let count = images.len();
    Ok(Json(CollectionImagesResponse {
        collection,
        images,
        count,
    }))
}
