//! Embedded stylesheet, script and logo.

use axum::http::{StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};

use crate::render;

const ASSET_CACHE_CONTROL: &str = "public, max-age=86400";

pub async fn serve_asset(uri: Uri) -> Response {
    match render::asset(uri.path()) {
        Some(asset) => (
            [
                (header::CONTENT_TYPE, asset.content_type),
                (header::CACHE_CONTROL, ASSET_CACHE_CONTROL),
            ],
            asset.body,
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
