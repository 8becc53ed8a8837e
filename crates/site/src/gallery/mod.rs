//! Gallery listing and collection derivation.
//!
//! The bucket holds a flat key space: root-level image objects form the
//! synthetic `main` collection, and every top-level "folder" (delimiter
//! prefix) that is not excluded becomes a named collection. Collections are
//! derived per request from storage state, never persisted.
//!
//! Backend selection happens once at startup ([`GalleryStore::from_config`]):
//! either the live S3-compatible lister or a fixed in-memory fixture for
//! local development.

pub mod fixture;
pub mod s3;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::config::{GalleryBackendKind, StorageConfig};

/// Listing calls request at most this many keys and do not paginate;
/// buckets past this size yield truncated results.
pub const MAX_KEYS: i32 = 1000;

/// File extensions treated as gallery images (matched case-insensitively).
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "avif"];

/// Map of folder names to custom display names.
const DISPLAY_NAME_OVERRIDES: &[(&str, &str)] = &[("newyork", "New York")];

/// Errors that can occur while listing the object store.
#[derive(Debug, Error)]
pub enum GalleryError {
    /// The underlying listing call failed.
    #[error("storage listing failed: {0}")]
    Upstream(String),
}

/// A named grouping of images, derived from a storage key prefix.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub name: String,
    pub slug: String,
    pub display_name: String,
    pub description: String,
    pub image_count: usize,
    /// Public URL of the first object under the prefix; `None` iff the
    /// collection is empty. The store's listing order is not guaranteed
    /// stable, so the cover may change between requests.
    pub cover_image: Option<String>,
}

/// A single gallery image.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    /// Full storage path.
    pub key: String,
    /// Filename with the last extension segment stripped.
    pub name: String,
    pub url: String,
    pub collection: String,
    pub size: i64,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Key, size and timestamp of one listed object, independent of backend.
#[derive(Debug, Clone)]
pub struct ObjectInfo {
    pub key: String,
    pub size: i64,
    pub last_modified: Option<DateTime<Utc>>,
}

impl ObjectInfo {
    /// Convenience constructor for fixtures and tests.
    #[must_use]
    pub fn from_key(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            size: 0,
            last_modified: None,
        }
    }
}

/// Gallery backend selected at startup.
pub enum GalleryStore {
    S3(s3::S3Gallery),
    Fixture(fixture::FixtureGallery),
}

impl GalleryStore {
    /// Build the backend the configuration asks for.
    #[must_use]
    pub fn from_config(storage: &StorageConfig) -> Self {
        match storage.backend {
            GalleryBackendKind::S3 => Self::S3(s3::S3Gallery::new(storage)),
            GalleryBackendKind::Fixture => {
                Self::Fixture(fixture::FixtureGallery::new(&storage.public_base_url))
            }
        }
    }

    /// Derive the list of collections from current bucket state.
    ///
    /// # Errors
    ///
    /// Returns `GalleryError::Upstream` if a listing call fails.
    pub async fn list_collections(&self) -> Result<Vec<Collection>, GalleryError> {
        match self {
            Self::S3(gallery) => gallery.list_collections().await,
            Self::Fixture(gallery) => Ok(gallery.list_collections()),
        }
    }

    /// List the images of one collection (`main` = root-level objects).
    ///
    /// An unknown collection yields an empty list, mirroring an empty prefix.
    ///
    /// # Errors
    ///
    /// Returns `GalleryError::Upstream` if the listing call fails.
    pub async fn list_images(&self, collection: &str) -> Result<Vec<Image>, GalleryError> {
        match self {
            Self::S3(gallery) => gallery.list_images(collection).await,
            Self::Fixture(gallery) => Ok(gallery.list_images(collection)),
        }
    }

    /// List every image in the bucket, tagged with its derived collection.
    ///
    /// # Errors
    ///
    /// Returns `GalleryError::Upstream` if the listing call fails.
    pub async fn list_all_images(&self) -> Result<Vec<Image>, GalleryError> {
        match self {
            Self::S3(gallery) => gallery.list_all_images().await,
            Self::Fixture(gallery) => Ok(gallery.list_all_images()),
        }
    }
}

// =============================================================================
// Derivation helpers (pure, shared by both backends)
// =============================================================================

/// Whether a key names an image file by its extension.
#[must_use]
pub fn is_image_file(key: &str) -> bool {
    let Some((_, extension)) = key.rsplit_once('.') else {
        return false;
    };
    // A '/' after the last '.' means the dot belonged to a directory segment.
    if extension.contains('/') {
        return false;
    }
    IMAGE_EXTENSIONS
        .iter()
        .any(|allowed| extension.eq_ignore_ascii_case(allowed))
}

/// Lowercased, whitespace-to-hyphen normalization of a collection name.
#[must_use]
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Display name for a folder: override table lookup, else the folder name
/// with its first character capitalized.
#[must_use]
pub fn display_name(folder: &str) -> String {
    let lower = folder.to_lowercase();
    if let Some((_, name)) = DISPLAY_NAME_OVERRIDES
        .iter()
        .find(|(key, _)| *key == lower)
    {
        return (*name).to_string();
    }

    let mut chars = folder.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().collect::<String>() + chars.as_str()
    })
}

/// Public download URL for a key.
#[must_use]
pub fn object_url(public_base_url: &str, key: &str) -> String {
    format!("{public_base_url}/{key}")
}

/// Filename of a key with its last extension segment stripped
/// (`"Maine/maine-00003.webp"` → `"maine-00003"`).
#[must_use]
pub fn image_name(key: &str) -> String {
    let basename = key.rsplit('/').next().unwrap_or(key);
    basename
        .rsplit_once('.')
        .map_or(basename, |(stem, _)| stem)
        .to_string()
}

/// Map a listed object to an [`Image`] record.
#[must_use]
pub fn image_from_object(object: &ObjectInfo, collection: &str, public_base_url: &str) -> Image {
    Image {
        key: object.key.clone(),
        name: image_name(&object.key),
        url: object_url(public_base_url, &object.key),
        collection: collection.to_string(),
        size: object.size,
        last_modified: object.last_modified,
    }
}

/// Build the collection record for a folder from the objects under its
/// prefix. The cover is the first listed object in store order.
#[must_use]
pub fn folder_collection(
    folder: &str,
    objects: &[ObjectInfo],
    public_base_url: &str,
) -> Collection {
    let display = display_name(folder);
    Collection {
        name: folder.to_string(),
        slug: slugify(folder),
        display_name: display.clone(),
        description: format!("{display} collection"),
        image_count: objects.iter().filter(|o| is_image_file(&o.key)).count(),
        cover_image: objects
            .first()
            .map(|o| object_url(public_base_url, &o.key)),
    }
}

/// Synthesize the `main` collection from root-level image objects, or `None`
/// when the bucket root holds no images.
#[must_use]
pub fn main_collection(root_objects: &[ObjectInfo], public_base_url: &str) -> Option<Collection> {
    let root_images: Vec<&ObjectInfo> = root_objects
        .iter()
        .filter(|o| !o.key.contains('/') && is_image_file(&o.key))
        .collect();

    let first = root_images.first()?;
    Some(Collection {
        name: "main".to_string(),
        slug: "main".to_string(),
        display_name: "Main Collection".to_string(),
        description: "Main photography collection".to_string(),
        image_count: root_images.len(),
        cover_image: Some(object_url(public_base_url, &first.key)),
    })
}

/// Collection a key belongs to: its first path segment, or `main` for
/// root-level keys.
#[must_use]
pub fn collection_of_key(key: &str) -> &str {
    key.split_once('/').map_or("main", |(folder, _)| folder)
}
