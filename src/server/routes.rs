//! HTTP routes
//!
//! Stylesheets are addressed by commit. A symbolic ref redirects to the
//! commit URL, which is then cacheable for a year.

use crate::error::ShowcaseError;
use crate::forge::is_commit_sha;
use crate::render::render_error;
use crate::showcase::Showcase;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::path::Path as FsPath;
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

const CSS: &str = "text/css; charset=utf-8";
const IMMUTABLE: &str = "public, max-age=31536000, immutable";

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub showcase: Arc<Showcase>,
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/{org}/{repo}/{reference}/build/theme.css", get(theme_css))
        .with_state(state)
}

/// URL of the stylesheet for a commit
pub fn stylesheet_url(org: &str, repo: &str, sha: &str) -> String {
    format!("/{}/{}/{}/build/theme.css", org, repo, sha)
}

async fn health() -> &'static str {
    "ok"
}

async fn theme_css(
    State(state): State<AppState>,
    Path((org, repo, reference)): Path<(String, String, String)>,
) -> Response {
    debug!("GET theme.css for {}/{}@{}", org, repo, reference);

    if !is_commit_sha(&reference) {
        return match state.showcase.resolve(&org, &repo, &reference).await {
            Ok(theme) => (
                StatusCode::TEMPORARY_REDIRECT,
                [
                    (header::LOCATION, stylesheet_url(&org, &repo, &theme.sha)),
                    (header::CACHE_CONTROL, "no-cache".to_string()),
                ],
            )
                .into_response(),
            Err(e) => error_response(e),
        };
    }

    match state.showcase.stylesheet(&org, &repo, &reference).await {
        Ok(path) => serve_artifact(&path).await,
        Err(e) => error_response(e),
    }
}

/// Stream a built stylesheet with long-lived cache headers
async fn serve_artifact(path: &FsPath) -> Response {
    let file = match tokio::fs::File::open(path).await {
        Ok(file) => file,
        Err(e) => {
            return error_response(ShowcaseError::io(format!("opening {}", path.display()), e))
        }
    };

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, CSS), (header::CACHE_CONTROL, IMMUTABLE)],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response()
}

/// Map an error to a response
///
/// Build failures stay `200 OK` with a diagnostic stylesheet so the
/// browser shows the message on the page.
pub fn error_response(err: ShowcaseError) -> Response {
    match &err {
        ShowcaseError::Build { .. } => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, CSS), (header::CACHE_CONTROL, "no-store")],
            render_error(&err),
        )
            .into_response(),
        ShowcaseError::BuildTimeout { .. } => (
            StatusCode::SERVICE_UNAVAILABLE,
            [
                (header::CONTENT_TYPE, CSS),
                (header::CACHE_CONTROL, "no-store"),
                (header::RETRY_AFTER, "5"),
            ],
            render_error(&err),
        )
            .into_response(),
        ShowcaseError::InvalidKeyInput(_) => {
            (StatusCode::BAD_REQUEST, err.to_string()).into_response()
        }
        ShowcaseError::Resolution { status: 404, .. } => {
            (StatusCode::NOT_FOUND, err.to_string()).into_response()
        }
        ShowcaseError::Resolution { .. } | ShowcaseError::Forge(_) => {
            (StatusCode::BAD_GATEWAY, err.to_string()).into_response()
        }
        _ => {
            warn!("Request failed: {}", err.diagnostic());
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
        }
    }
}
