//! RSS feed route handler.

use axum::{
    extract::State,
    http::header::{CONTENT_TYPE, HeaderValue},
    response::{IntoResponse, Response},
};
use tracing::instrument;

use crate::content;
use crate::error::Result;
use crate::feed::build_channel;
use crate::state::AppState;

/// Serve `GET /rss.xml`.
#[instrument(skip(state))]
pub async fn rss(State(state): State<AppState>) -> Result<Response> {
    let posts = content::list_posts(&state.config().content_dir).await?;
    let channel = build_channel(&state.config().base_url, &posts);

    let mut response = channel.to_string().into_response();
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/rss+xml; charset=utf-8"),
    );
    Ok(response)
}
