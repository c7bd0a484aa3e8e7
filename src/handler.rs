use crate::app::{App, LinkError};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderValue, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde_json::json;
use snaplink_client::{ErrorResponse, ShortenRequest, ShortenResponse};
use std::sync::Arc;
use tracing::{info, warn};

// Make our own error that wraps `anyhow::Error`.
pub struct AppError(anyhow::Error);

impl AppError {
    fn status(&self) -> StatusCode {
        match self.0.downcast_ref::<LinkError>() {
            Some(LinkError::NotFound(_)) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Tell axum how to convert `AppError` into a response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorResponse::new(self.0.to_string()))).into_response()
    }
}

// This enables using `?` on functions that return `Result<_, anyhow::Error>` to turn them into
// `Result<_, AppError>`. That way you don't need to do that manually.
impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message))).into_response()
}

pub async fn handle_home() -> Html<&'static str> {
    Html(
        r#"<h1>URL Shortener</h1>
<p>POST /shorten with {"url": "https://example.com"} to create a short URL</p>"#,
    )
}

pub async fn handle_health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "git_sha": option_env!("VERGEN_GIT_SHA").unwrap_or("unknown"),
    }))
}

pub async fn handle_redirect(
    Path(code): Path<String>,
    State(app): State<Arc<App>>,
) -> Result<impl IntoResponse, AppError> {
    info!("handle_redirect: {}", code);

    let url = app.resolve(&code).await?;

    Ok(Redirect::temporary(&url))
}

pub async fn handle_shorten(
    State(app): State<Arc<App>>,
    payload: Result<Json<ShortenRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(create) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!("handle_shorten: rejected body: {rejection}");
            return Ok(bad_request("Invalid request"));
        }
    };

    if create.url.is_empty() {
        return Ok(bad_request("URL is required"));
    }

    // the redirect sends the URL back verbatim as the `Location` header
    if HeaderValue::try_from(create.url.as_str()).is_err() {
        warn!("handle_shorten: url is not a valid header value");
        return Ok(bad_request("URL contains invalid characters"));
    }

    info!("handle_shorten: '{}'", create.url);

    let link = app.shorten(&create.url).await?;

    let response = ShortenResponse::new(link.short_code, app.base_url(), link.original_url);

    Ok((StatusCode::CREATED, Json(response)).into_response())
}
