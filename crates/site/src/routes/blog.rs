//! Blog route handlers.

use axum::{Json, extract::Path, extract::State};
use tracing::instrument;

use crate::content::{self, Post};
use crate::error::Result;
use crate::state::AppState;

/// List all posts, newest first. Bodies are returned raw; HTML rendering
/// happens on single-post fetch only.
#[instrument(skip(state))]
pub async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<Post>>> {
    let posts = content::list_posts(&state.config().content_dir).await?;
    Ok(Json(posts))
}

/// Fetch one post by slug with its body rendered to HTML.
#[instrument(skip(state))]
pub async fn show_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Post>> {
    let post = content::load_post(&state.config().content_dir, &slug).await?;
    Ok(Json(post))
}
