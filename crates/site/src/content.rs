//! Blog content loaded from markdown files.
//!
//! Posts live in `CONTENT_DIR/blog/<slug>.md` with YAML front-matter. They
//! are read fresh on every request — no cache, no persistence — so edits show
//! up without a restart.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use comrak::{Options, markdown_to_html};
use gray_matter::{Matter, ParsedEntity, engine::YAML};
use serde::{Deserialize, Serialize};

/// Front-matter metadata for blog posts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostMeta {
    pub title: String,
    pub date: NaiveDate,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// A blog post parsed from a markdown file.
#[derive(Debug, Clone, Serialize)]
pub struct Post {
    #[serde(flatten)]
    pub meta: PostMeta,
    pub slug: String,
    /// Site-relative page path (`/blog/<slug>`).
    pub path: String,
    /// Raw markdown body.
    pub body: String,
    /// Rendered HTML; only populated for single-post fetches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

/// Content loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("post not found: {0}")]
    PostNotFound(String),
}

fn blog_dir(content_dir: &Path) -> PathBuf {
    content_dir.join("blog")
}

/// Parse one markdown file's front-matter and body into a [`Post`].
fn parse_post(slug: &str, contents: &str) -> Result<Post, ContentError> {
    let matter = Matter::<YAML>::new();
    let parsed: ParsedEntity<PostMeta> = matter
        .parse(contents)
        .map_err(|e| ContentError::Parse(format!("Failed to parse frontmatter: {e}")))?;
    let meta = parsed
        .data
        .ok_or_else(|| ContentError::Parse("Missing frontmatter".to_string()))?;

    Ok(Post {
        meta,
        slug: slug.to_string(),
        path: format!("/blog/{slug}"),
        body: parsed.content,
        html: None,
    })
}

/// List all posts, sorted by date descending (newest first).
///
/// Files whose front-matter fails to parse are skipped with an error log
/// rather than failing the whole listing.
///
/// # Errors
///
/// Returns `ContentError::Io` if the blog directory cannot be read.
pub async fn list_posts(content_dir: &Path) -> Result<Vec<Post>, ContentError> {
    let dir = blog_dir(content_dir);
    let mut entries = tokio::fs::read_dir(&dir)
        .await
        .map_err(|e| ContentError::Io(e.to_string()))?;

    let mut posts = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ContentError::Io(e.to_string()))?
    {
        let path = entry.path();
        if path.extension().is_none_or(|ext| ext != "md") {
            continue;
        }

        let Some(slug) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        let contents = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| ContentError::Io(e.to_string()))?;

        match parse_post(slug, &contents) {
            Ok(post) => posts.push(post),
            Err(e) => {
                tracing::error!("Failed to load post {:?}: {}", path, e);
            }
        }
    }

    // Newest first; order of equal dates is unspecified.
    posts.sort_by(|a, b| b.meta.date.cmp(&a.meta.date));

    Ok(posts)
}

/// Load a single post by slug and render its body to HTML.
///
/// # Errors
///
/// Returns `ContentError::PostNotFound` if no such file exists, `Io`/`Parse`
/// for any other failure.
pub async fn load_post(content_dir: &Path, slug: &str) -> Result<Post, ContentError> {
    // Slugs map directly onto filenames; reject anything that could escape
    // the blog directory.
    if slug.contains(['/', '\\']) || slug.contains("..") {
        return Err(ContentError::PostNotFound(slug.to_string()));
    }

    let path = blog_dir(content_dir).join(format!("{slug}.md"));

    let contents = match tokio::fs::read_to_string(&path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ContentError::PostNotFound(slug.to_string()));
        }
        Err(e) => return Err(ContentError::Io(e.to_string())),
    };

    let mut post = parse_post(slug, &contents)?;
    post.html = Some(render_markdown(&post.body));
    Ok(post)
}

/// Render markdown to HTML with GitHub Flavored Markdown support.
fn render_markdown(content: &str) -> String {
    let mut options = Options::default();

    // Enable GFM extensions
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.footnotes = true;

    // Allow raw HTML in markdown
    options.render.r#unsafe = true;

    markdown_to_html(content, &options)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const POST_JANUARY: &str = "---\n\
title: Winter Light\n\
date: 2024-01-01\n\
description: Shooting fog at dawn\n\
---\n\
\n\
# Winter Light\n\
\n\
Fog rolled in before sunrise.\n";

    const POST_JUNE: &str = "---\n\
title: Roadside Georgia\n\
date: 2024-06-01\n\
description: Kudzu and gas stations\n\
category: travel\n\
image: /images/georgia-kudzu.jpg\n\
---\n\
\n\
Two weeks driving backroads.\n";

    fn write_fixture(dir: &Path) {
        let blog = dir.join("blog");
        std::fs::create_dir_all(&blog).unwrap();
        std::fs::write(blog.join("winter-light.md"), POST_JANUARY).unwrap();
        std::fs::write(blog.join("roadside-georgia.md"), POST_JUNE).unwrap();
        std::fs::write(blog.join("notes.txt"), "not a post").unwrap();
    }

    #[tokio::test]
    async fn lists_posts_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());

        let posts = list_posts(dir.path()).await.unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].slug, "roadside-georgia");
        assert_eq!(posts[1].slug, "winter-light");
        assert!(posts.iter().all(|p| p.html.is_none()));
    }

    #[tokio::test]
    async fn listing_skips_unparseable_files() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        std::fs::write(dir.path().join("blog/broken.md"), "no frontmatter here").unwrap();

        let posts = list_posts(dir.path()).await.unwrap();
        assert_eq!(posts.len(), 2);
    }

    #[tokio::test]
    async fn loads_and_renders_single_post() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());

        let post = load_post(dir.path(), "winter-light").await.unwrap();
        assert_eq!(post.meta.title, "Winter Light");
        assert_eq!(post.path, "/blog/winter-light");
        assert_eq!(
            post.meta.date,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );

        let html = post.html.unwrap();
        assert!(html.contains("<h1>"));
        assert!(html.contains("Fog rolled in"));
    }

    #[tokio::test]
    async fn optional_metadata_survives_parsing() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());

        let post = load_post(dir.path(), "roadside-georgia").await.unwrap();
        assert_eq!(post.meta.category.as_deref(), Some("travel"));
        assert_eq!(
            post.meta.image.as_deref(),
            Some("/images/georgia-kudzu.jpg")
        );
    }

    #[tokio::test]
    async fn missing_post_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());

        let err = load_post(dir.path(), "does-not-exist").await.unwrap_err();
        assert!(matches!(err, ContentError::PostNotFound(_)));
    }

    #[tokio::test]
    async fn traversal_slugs_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());

        let err = load_post(dir.path(), "../secrets").await.unwrap_err();
        assert!(matches!(err, ContentError::PostNotFound(_)));
    }

    #[tokio::test]
    async fn missing_blog_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = list_posts(dir.path()).await.unwrap_err();
        assert!(matches!(err, ContentError::Io(_)));
    }
}
