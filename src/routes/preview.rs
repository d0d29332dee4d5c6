//! Preview session endpoints.
//!
//! `/api/preview` is where the provider's preview toolbar (and the
//! reconciler, when the editor switches drafts) sends the visitor. It stores
//! the draft ref in the session cookie and redirects to the previewed post.
//! `/api/exit-preview` removes the session cookie and redirects home. Both
//! answer `307 Temporary Redirect`.

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Redirect, Response};
use serde::Deserialize;

use crate::error::SiteError;
use crate::generate::post_route;
use crate::preview::{expired_cookie, session_cookie};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AdoptParams {
    token: Option<String>,
    #[serde(rename = "documentId")]
    document_id: Option<String>,
}

fn required(value: Option<String>, name: &str) -> Result<String, SiteError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| SiteError::BadRequest(format!("missing {name}")))
}

/// Start or switch a preview session.
pub async fn adopt(
    State(state): State<AppState>,
    Query(params): Query<AdoptParams>,
) -> Result<Response, SiteError> {
    let token = required(params.token, "token")?;
    let document_id = required(params.document_id, "documentId")?;

    let post = state
        .source
        .get_by_id(&document_id, Some(&token))
        .await?
        .ok_or_else(|| SiteError::NotFound(format!("document {document_id}")))?;

    let location = post_route(&post.uid);
    tracing::info!(document = %document_id, location = %location, "entering preview");
    let cookie = session_cookie(&state.config.preview.session_cookie, &token);
    Ok(([(header::SET_COOKIE, cookie)], Redirect::temporary(&location)).into_response())
}

/// Leave preview mode. Always redirects home, with or without a session.
pub async fn exit(State(state): State<AppState>) -> Response {
    let cookie = expired_cookie(&state.config.preview.session_cookie);
    ([(header::SET_COOKIE, cookie)], Redirect::temporary("/")).into_response()
}
