//! Load-more endpoint.
//!
//! `GET /api/posts?cursor=<next_page>` follows a pagination cursor and answers:
//!
//! ```json
//! {
//!   "results": [{"uid": "...", "title": "...", "subtitle": "...", "author": "...", "date": "15 mar 2021"}],
//!   "next_page": "https://...&page=3"
//! }
//! ```
//!
//! `next_page` is `null` on the last page. Errors are JSON too: 400 for a
//! missing cursor or one that doesn't point at the content API, 502 when the
//! content API fails (the script offers a retry).

use axum::Json;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::error::SiteError;
use crate::listing::PostListing;
use crate::render::SummaryView;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoadMoreParams {
    cursor: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoadMoreResponse {
    results: Vec<SummaryView>,
    next_page: Option<String>,
}

pub async fn load_more(
    State(state): State<AppState>,
    Query(params): Query<LoadMoreParams>,
) -> Response {
    match next_page(&state, params).await {
        Ok(body) => Json(body).into_response(),
        Err(err) => err.into_json_response(),
    }
}

async fn next_page(
    state: &AppState,
    params: LoadMoreParams,
) -> Result<LoadMoreResponse, SiteError> {
    let cursor = params
        .cursor
        .filter(|c| !c.is_empty())
        .ok_or_else(|| SiteError::BadRequest("missing cursor".into()))?;
    let page = PostListing::new(state.source.fetch_page(&cursor).await?);
    let locale = state.config.site.locale;
    Ok(LoadMoreResponse {
        results: page
            .posts()
            .iter()
            .map(|p| SummaryView::new(p, locale))
            .collect(),
        next_page: page.next_page().map(str::to_string),
    })
}
