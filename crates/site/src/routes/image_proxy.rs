//! On-the-fly image resize proxy.
//!
//! Rewrites a trusted source URL into a Cloudflare `/cdn-cgi/image/...`
//! transform URL and streams the result back with long-lived cache headers.
//! Any transform failure falls back to a 307 redirect to the original, so a
//! broken resizer never breaks image delivery.

use axum::{
    extract::{Query, State},
    http::{
        HeaderMap, StatusCode,
        header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE, ETAG, HeaderValue},
    },
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;
use url::Url;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Query parameters accepted by `GET /api/image`.
#[derive(Debug, Deserialize)]
pub struct ImageParams {
    pub src: Option<String>,
    pub w: Option<u32>,
    pub h: Option<u32>,
    pub q: Option<u32>,
    pub fit: Option<String>,
    pub f: Option<String>,
}

/// Proxy and resize a gallery image.
///
/// `src` must point at the configured trusted host; anything else is
/// refused so the proxy cannot be used to fetch arbitrary origins.
#[instrument(skip(state, headers), fields(src = params.src.as_deref().unwrap_or("")))]
pub async fn proxy(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ImageParams>,
) -> Result<Response> {
    let src = params
        .src
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("Missing src parameter".to_string()))?;

    let src_url = Url::parse(src)
        .map_err(|_| AppError::BadRequest("Invalid src parameter".to_string()))?;
    let host = src_url
        .host_str()
        .ok_or_else(|| AppError::BadRequest("Invalid src parameter".to_string()))?;

    if !host.eq_ignore_ascii_case(&state.config().image_trusted_host) {
        return Err(AppError::Forbidden("Invalid image source".to_string()));
    }

    let accept = headers
        .get(ACCEPT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");
    let options = transform_options(&params, accept);
    let transform = transform_url(&src_url, &options);

    match state.http().get(transform).send().await {
        Ok(upstream) if upstream.status().is_success() => {
            Ok(proxied_response(src, upstream).await)
        }
        Ok(upstream) => {
            tracing::warn!(status = %upstream.status(), "Image transform failed, redirecting to original");
            Ok(Redirect::temporary(src).into_response())
        }
        Err(err) => {
            tracing::warn!(error = %err, "Image transform fetch failed, redirecting to original");
            Ok(Redirect::temporary(src).into_response())
        }
    }
}

async fn proxied_response(src: &str, upstream: reqwest::Response) -> Response {
    let content_type = upstream
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| HeaderValue::from_bytes(value.as_bytes()).ok())
        .unwrap_or_else(|| HeaderValue::from_static("image/jpeg"));
    let etag = upstream
        .headers()
        .get(ETAG)
        .and_then(|value| HeaderValue::from_bytes(value.as_bytes()).ok());

    let body = match upstream.bytes().await {
        Ok(body) => body,
        Err(err) => {
            tracing::warn!(error = %err, "Image transform body read failed, redirecting to original");
            return Redirect::temporary(src).into_response();
        }
    };

    let mut response = (StatusCode::OK, body).into_response();
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, content_type);
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=31536000, immutable"),
    );
    if let Some(etag) = etag {
        headers.insert(ETAG, etag);
    }
    response
}

/// Build the comma-separated Cloudflare transform option string.
fn transform_options(params: &ImageParams, accept: &str) -> String {
    let mut options = Vec::new();

    if let Some(width) = params.w {
        options.push(format!("width={width}"));
    }
    if let Some(height) = params.h {
        options.push(format!("height={height}"));
    }
    if let Some(quality) = params.q {
        options.push(format!("quality={quality}"));
    }
    options.push(format!(
        "fit={}",
        params.fit.as_deref().unwrap_or("scale-down")
    ));
    if let Some(format) = negotiated_format(params.f.as_deref(), accept) {
        options.push(format!("format={format}"));
    }

    options.join(",")
}

/// Pick the output format: explicit `f` parameter wins, otherwise the best
/// modern format the client advertises in `Accept`.
fn negotiated_format<'a>(explicit: Option<&'a str>, accept: &str) -> Option<&'a str> {
    if explicit.is_some() {
        return explicit;
    }
    if accept.contains("image/avif") {
        Some("avif")
    } else if accept.contains("image/webp") {
        Some("webp")
    } else {
        None
    }
}

/// Rewrite a source URL into its `/cdn-cgi/image/` transform URL.
fn transform_url(src: &Url, options: &str) -> String {
    let authority = src.host_str().unwrap_or_default();
    format!(
        "{scheme}://{authority}/cdn-cgi/image/{options}{path}",
        scheme = src.scheme(),
        path = src.path(),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn params(w: Option<u32>, f: Option<&str>) -> ImageParams {
        ImageParams {
            src: Some("https://pub.example.r2.dev/Maine/maine-00003.webp".to_string()),
            w,
            h: None,
            q: None,
            fit: None,
            f: f.map(ToString::to_string),
        }
    }

    #[test]
    fn transform_url_inserts_cdn_cgi_segment() {
        let src = Url::parse("https://pub.example.r2.dev/Maine/maine-00003.webp").unwrap();
        assert_eq!(
            transform_url(&src, "width=800,fit=scale-down"),
            "https://pub.example.r2.dev/cdn-cgi/image/width=800,fit=scale-down/Maine/maine-00003.webp"
        );
    }

    #[test]
    fn options_default_to_scale_down_fit() {
        assert_eq!(transform_options(&params(None, None), ""), "fit=scale-down");
    }

    #[test]
    fn options_include_requested_dimensions() {
        let p = ImageParams {
            q: Some(80),
            h: Some(600),
            ..params(Some(800), None)
        };
        assert_eq!(
            transform_options(&p, ""),
            "width=800,height=600,quality=80,fit=scale-down"
        );
    }

    #[test]
    fn explicit_format_wins_over_accept_header() {
        assert_eq!(
            negotiated_format(Some("png"), "image/avif,image/webp"),
            Some("png")
        );
    }

    #[test]
    fn avif_preferred_over_webp() {
        assert_eq!(
            negotiated_format(None, "image/avif,image/webp,image/apng,*/*"),
            Some("avif")
        );
        assert_eq!(negotiated_format(None, "image/webp,*/*"), Some("webp"));
        assert_eq!(negotiated_format(None, "image/png"), None);
    }
}
