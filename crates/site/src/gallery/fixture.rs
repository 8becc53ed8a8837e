//! Static gallery dataset for local development.
//!
//! Mirrors the live bucket layout: `main` images sit at the bucket root,
//! every other collection under its folder prefix. Runs the same derivation
//! helpers as the S3 backend, so shapes and counts match what production
//! listings would produce.

use super::{
    Collection, Image, ObjectInfo, collection_of_key, folder_collection, image_from_object,
    is_image_file, main_collection,
};

/// (collection name, image filenames under that collection)
const FIXTURE_COLLECTIONS: &[(&str, &[&str])] = &[
    (
        "main",
        &[
            "ian-kennedy-01.jpg",
            "ian-kennedy-02.jpg",
            "ian-kennedy-03.jpg",
            "ian-kennedy-04.jpg",
            "ian-kennedy-05.jpg",
            "ian-kennedy-06.jpg",
            "ian-kennedy-07.jpg",
        ],
    ),
    (
        "maine",
        &["maine-00001.webp", "maine-00002.webp", "maine-00003.webp"],
    ),
    ("georgia", &["georgia-fog.jpg", "georgia-kudzu.jpg"]),
    // Placeholder collection awaiting uploads; exercises the empty case.
    ("arizona", &[]),
];

/// Gallery backend backed by the fixture dataset above.
pub struct FixtureGallery {
    public_base_url: String,
}

impl FixtureGallery {
    #[must_use]
    pub fn new(public_base_url: &str) -> Self {
        Self {
            public_base_url: public_base_url.to_string(),
        }
    }

    /// Storage key of a fixture image (root-level for `main`).
    fn key_for(collection: &str, filename: &str) -> String {
        if collection == "main" {
            filename.to_string()
        } else {
            format!("{collection}/{filename}")
        }
    }

    fn objects_for(collection: &str, filenames: &[&str]) -> Vec<ObjectInfo> {
        filenames
            .iter()
            .map(|filename| ObjectInfo::from_key(Self::key_for(collection, filename)))
            .collect()
    }

    /// Derive collection records from the fixture dataset.
    #[must_use]
    pub fn list_collections(&self) -> Vec<Collection> {
        let mut collections = Vec::new();

        for (name, filenames) in FIXTURE_COLLECTIONS {
            let objects = Self::objects_for(name, filenames);
            if *name == "main" {
                if let Some(main) = main_collection(&objects, &self.public_base_url) {
                    collections.insert(0, main);
                }
            } else {
                collections.push(folder_collection(name, &objects, &self.public_base_url));
            }
        }

        collections
    }

    /// List the fixture images of one collection; unknown names yield an
    /// empty list, mirroring an empty prefix.
    #[must_use]
    pub fn list_images(&self, collection: &str) -> Vec<Image> {
        FIXTURE_COLLECTIONS
            .iter()
            .find(|(name, _)| *name == collection)
            .map_or_else(Vec::new, |(name, filenames)| {
                Self::objects_for(name, filenames)
                    .iter()
                    .filter(|o| is_image_file(&o.key))
                    .map(|o| image_from_object(o, name, &self.public_base_url))
                    .collect()
            })
    }

    /// List every fixture image with its derived collection.
    #[must_use]
    pub fn list_all_images(&self) -> Vec<Image> {
        FIXTURE_COLLECTIONS
            .iter()
            .flat_map(|(name, filenames)| Self::objects_for(name, filenames))
            .filter(|o| is_image_file(&o.key))
            .map(|o| {
                let collection = collection_of_key(&o.key).to_string();
                image_from_object(&o, &collection, &self.public_base_url)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PUBLIC_URL: &str = "https://pub-1234.r2.dev";

    fn gallery() -> FixtureGallery {
        FixtureGallery::new(PUBLIC_URL)
    }

    #[test]
    fn main_collection_is_first_and_counts_root_images() {
        let collections = gallery().list_collections();
        let main = collections.first().expect("collections not empty");

        assert_eq!(main.name, "main");
        assert_eq!(main.image_count, 7);
        assert_eq!(
            main.cover_image.as_deref(),
            Some("https://pub-1234.r2.dev/ian-kennedy-01.jpg")
        );
    }

    #[test]
    fn folder_collections_have_prefixed_covers() {
        let collections = gallery().list_collections();
        let maine = collections
            .iter()
            .find(|c| c.name == "maine")
            .expect("maine collection");

        assert_eq!(maine.display_name, "Maine");
        assert_eq!(maine.image_count, 3);
        assert_eq!(
            maine.cover_image.as_deref(),
            Some("https://pub-1234.r2.dev/maine/maine-00001.webp")
        );
    }

    #[test]
    fn empty_collection_has_no_cover() {
        let collections = gallery().list_collections();
        let arizona = collections
            .iter()
            .find(|c| c.name == "arizona")
            .expect("arizona collection");

        assert_eq!(arizona.image_count, 0);
        assert!(arizona.cover_image.is_none());
    }

    #[test]
    fn main_images_use_root_level_keys() {
        let images = gallery().list_images("main");
        assert_eq!(images.len(), 7);
        assert!(images.iter().all(|i| !i.key.contains('/')));
        assert!(images.iter().all(|i| i.collection == "main"));
    }

    #[test]
    fn folder_images_strip_extension_for_name() {
        let images = gallery().list_images("maine");
        let third = images.iter().find(|i| i.key.ends_with("00003.webp"));
        assert_eq!(third.map(|i| i.name.as_str()), Some("maine-00003"));
    }

    #[test]
    fn unknown_collection_is_empty() {
        assert!(gallery().list_images("atlantis").is_empty());
    }

    #[test]
    fn all_images_cover_every_collection() {
        let images = gallery().list_all_images();
        assert_eq!(images.len(), 7 + 3 + 2);
        assert!(images.iter().any(|i| i.collection == "georgia"));
    }
}
