//! Live gallery listing against an S3-compatible bucket (Cloudflare R2).

use aws_sdk_s3::Client;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use secrecy::ExposeSecret;

use crate::config::StorageConfig;

use super::{
    Collection, GalleryError, Image, MAX_KEYS, ObjectInfo, folder_collection, image_from_object,
    is_image_file, main_collection,
};

/// One page of listing results.
struct ListingPage {
    objects: Vec<ObjectInfo>,
    common_prefixes: Vec<String>,
}

/// Gallery backend that lists a live bucket.
pub struct S3Gallery {
    client: Client,
    bucket: String,
    public_base_url: String,
    excluded_folders: Vec<String>,
}

impl S3Gallery {
    /// Build the S3 client from storage configuration.
    #[must_use]
    pub fn new(config: &StorageConfig) -> Self {
        let credentials = Credentials::new(
            config.access_key_id.clone(),
            config.secret_access_key.expose_secret().to_owned(),
            None,
            None,
            "fiftymm-static",
        );

        let s3_config = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint)
            .region(Region::new("auto"))
            .credentials_provider(credentials)
            .build();

        Self {
            client: Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
            public_base_url: config.public_base_url.clone(),
            excluded_folders: config.excluded_folders.clone(),
        }
    }

    /// Fetch a single listing page. No continuation-token loop: results past
    /// `MAX_KEYS` are truncated.
    async fn list_page(
        &self,
        prefix: &str,
        delimiter: Option<&str>,
    ) -> Result<ListingPage, GalleryError> {
        let mut request = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .max_keys(MAX_KEYS);

        if !prefix.is_empty() {
            request = request.prefix(prefix);
        }
        if let Some(delimiter) = delimiter {
            request = request.delimiter(delimiter);
        }

        let response = request
            .send()
            .await
            .map_err(|e| GalleryError::Upstream(e.to_string()))?;

        let objects = response
            .contents()
            .iter()
            .filter_map(|object| {
                let key = object.key()?.to_string();
                Some(ObjectInfo {
                    key,
                    size: object.size().unwrap_or(0),
                    last_modified: object
                        .last_modified()
                        .and_then(|ts| chrono::DateTime::from_timestamp(ts.secs(), 0)),
                })
            })
            .collect();

        let common_prefixes = response
            .common_prefixes()
            .iter()
            .filter_map(|p| p.prefix().map(ToString::to_string))
            .collect();

        Ok(ListingPage {
            objects,
            common_prefixes,
        })
    }

    /// Derive the collection taxonomy from a root delimiter listing plus one
    /// flat listing per folder.
    ///
    /// # Errors
    ///
    /// Returns `GalleryError::Upstream` if any listing call fails.
    pub async fn list_collections(&self) -> Result<Vec<Collection>, GalleryError> {
        let root = self.list_page("", Some("/")).await?;

        let mut collections = Vec::new();
        for prefix in &root.common_prefixes {
            let folder = prefix.trim_end_matches('/');
            if folder.is_empty() || self.excluded_folders.iter().any(|f| f == folder) {
                continue;
            }

            let contents = self.list_page(prefix, None).await?;
            collections.push(folder_collection(
                folder,
                &contents.objects,
                &self.public_base_url,
            ));
        }

        if let Some(main) = main_collection(&root.objects, &self.public_base_url) {
            collections.insert(0, main);
        }

        Ok(collections)
    }

    /// List the images of one collection.
    ///
    /// # Errors
    ///
    /// Returns `GalleryError::Upstream` if the listing call fails.
    pub async fn list_images(&self, collection: &str) -> Result<Vec<Image>, GalleryError> {
        let images = if collection == "main" {
            let page = self.list_page("", None).await?;
            page.objects
                .iter()
                .filter(|o| !o.key.contains('/') && is_image_file(&o.key))
                .map(|o| image_from_object(o, collection, &self.public_base_url))
                .collect()
        } else {
            let prefix = format!("{collection}/");
            let page = self.list_page(&prefix, None).await?;
            page.objects
                .iter()
                .filter(|o| is_image_file(&o.key))
                .map(|o| image_from_object(o, collection, &self.public_base_url))
                .collect()
        };

        Ok(images)
    }

    /// List every image in the bucket with its derived collection.
    ///
    /// # Errors
    ///
    /// Returns `GalleryError::Upstream` if the listing call fails.
    pub async fn list_all_images(&self) -> Result<Vec<Image>, GalleryError> {
        let page = self.list_page("", None).await?;

        Ok(page
            .objects
            .iter()
            .filter(|o| is_image_file(&o.key))
            .map(|o| {
                let collection = super::collection_of_key(&o.key);
                image_from_object(o, collection, &self.public_base_url)
            })
            .collect())
    }
}
