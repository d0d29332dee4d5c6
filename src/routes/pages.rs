//! Home and post pages.
//!
//! Published pages come from the page cache with incremental regeneration:
//!
//! 1. Fresh page: served as is.
//! 2. Stale page: served as is while a background task regenerates it.
//! 3. Missing home page: generated before answering.
//! 4. Missing post page: a loading placeholder is served while a background
//!    task generates it; the placeholder reloads itself.
//! 5. Post path recently found to have no post: 404.
//!
//! A request carrying the preview session cookie bypasses the cache. Post
//! pages first run the preview reconciler and redirect when the provider's
//! draft ref has moved on, or when the provider session is gone. A preview
//! that can neither render nor adopt a new ref is exited.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{Html, IntoResponse, Redirect, Response};

use crate::cache::{Lookup, unix_now};
use crate::content::ContentError;
use crate::detail::{self, PostView};
use crate::error::SiteError;
use crate::generate::{self, HOME_ROUTE, post_route};
use crate::preview::{
    EXIT_PATH, PreviewInputs, PreviewSessionStore, ProviderCookie, Reconciler, RedirectTarget,
    cookie_value,
};
use crate::render::{self, RenderContext};
use crate::state::AppState;

const NO_STORE: &str = "private, no-store";

/// A page the cache knows how to regenerate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    Home,
    Post(String),
}

impl Page {
    pub fn route(&self) -> String {
        match self {
            Page::Home => HOME_ROUTE.to_string(),
            Page::Post(slug) => post_route(slug),
        }
    }

    async fn render(&self, state: &AppState) -> Result<Option<String>, ContentError> {
        let source = state.source.as_ref();
        match self {
            Page::Home => generate::render_home_page(source, &state.config, None)
                .await
                .map(Some),
            Page::Post(slug) => generate::render_post_page(source, &state.config, slug, None).await,
        }
    }
}

/// Render `page` from published content and store it in the cache.
///
/// Returns the new HTML, or `None` when there is no content at that path
/// (which is recorded too).
pub async fn regenerate(state: &AppState, page: &Page) -> Result<Option<String>, ContentError> {
    let route = page.route();
    let rendered = page.render(state).await?;
    let now = unix_now();
    match &rendered {
        Some(html) => state.pages.store(&route, html.clone(), now).await,
        None => state.pages.mark_not_found(&route, now).await,
    }
    tracing::info!(route = %route, found = rendered.is_some(), "page generated");
    Ok(rendered)
}

/// Regenerate `page` in the background unless that is already happening.
fn spawn_regeneration(state: &AppState, page: Page) {
    let state = state.clone();
    tokio::spawn(async move {
        let route = page.route();
        if !state.pages.begin_regeneration(&route).await {
            tracing::debug!(route = %route, "regeneration already in flight");
            return;
        }
        if let Err(err) = regenerate(&state, &page).await {
            tracing::warn!(route = %route, error = %err, "regeneration failed, keeping previous page");
        }
        state.pages.finish_regeneration(&route).await;
    });
}

fn html_response(html: String, cache_control: String) -> Response {
    (
        StatusCode::OK,
        [(header::CACHE_CONTROL, cache_control)],
        Html(html),
    )
        .into_response()
}

fn shared_cache_control(state: &AppState) -> String {
    format!(
        "public, s-maxage={}, stale-while-revalidate",
        state.config.revalidate.seconds
    )
}

/// The ref of the preview session, if the request has one.
fn preview_ref(state: &AppState, headers: &HeaderMap) -> Option<String> {
    cookie_value(headers, &state.config.preview.session_cookie).filter(|r| !r.is_empty())
}

async fn serve_cached(state: &AppState, page: Page) -> Result<Response, SiteError> {
    let route = page.route();
    match state.pages.lookup(&route, unix_now()).await {
        Lookup::Fresh(html) => Ok(html_response(html, shared_cache_control(state))),
        Lookup::Stale(html) => {
            tracing::debug!(route = %route, "serving stale page");
            spawn_regeneration(state, page);
            Ok(html_response(html, shared_cache_control(state)))
        }
        Lookup::NotFound => Err(SiteError::NotFound(route)),
        Lookup::Missing => match page {
            Page::Home => {
                let html = regenerate(state, &page)
                    .await?
                    .ok_or_else(|| SiteError::NotFound(route))?;
                Ok(html_response(html, shared_cache_control(state)))
            }
            Page::Post(_) => {
                spawn_regeneration(state, page);
                let loading = render::render_loading(RenderContext::new(&state.config));
                Ok(html_response(loading.into_string(), NO_STORE.to_string()))
            }
        },
    }
}

pub async fn home(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, SiteError> {
    if let Some(reference) = preview_ref(&state, &headers) {
        let html =
            generate::render_home_page(state.source.as_ref(), &state.config, Some(&reference))
                .await?;
        return Ok(html_response(html, NO_STORE.to_string()));
    }
    serve_cached(&state, Page::Home).await
}

pub async fn post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> Result<Response, SiteError> {
    match preview_ref(&state, &headers) {
        Some(reference) => preview_post(&state, &slug, reference, &headers).await,
        None => serve_cached(&state, Page::Post(slug)).await,
    }
}

fn leave_preview(slug: &str, reason: &str) -> Response {
    tracing::info!(slug = %slug, reason, "leaving preview");
    Redirect::temporary(EXIT_PATH).into_response()
}

async fn preview_post(
    state: &AppState,
    slug: &str,
    active_ref: String,
    headers: &HeaderMap,
) -> Result<Response, SiteError> {
    let source = state.source.as_ref();
    let provider = ProviderCookie::from_headers(
        headers,
        &state.config.preview.provider_cookie,
        state.repository.clone(),
    );
    if !provider.has_session() {
        return Ok(leave_preview(slug, "provider session ended"));
    }

    // An expired or deleted ref must not stop reconciliation: fall back to
    // the published document for its id so the provider's ref can be adopted.
    let draft = match source.get_by_uid(slug, Some(&active_ref)).await {
        Ok(found) => found,
        Err(err) => {
            tracing::warn!(slug = %slug, reference = %active_ref, error = %err, "preview ref unusable");
            None
        }
    };
    let document_id = match &draft {
        Some(post) => Some(post.id.clone()),
        None => match source.get_by_uid(slug, None).await {
            Ok(published) => published.map(|post| post.id),
            Err(err) => {
                tracing::warn!(slug = %slug, error = %err, "published lookup failed during preview");
                None
            }
        },
    };
    let Some(document_id) = document_id else {
        return Ok(leave_preview(slug, "document unknown"));
    };

    let mut reconciler = Reconciler::new(RedirectTarget::default());
    reconciler.update(
        PreviewInputs {
            document_id,
            is_preview: true,
            active_ref: Some(active_ref.clone()),
        },
        &provider,
    );
    if let Some(location) = reconciler.into_navigator().location {
        tracing::info!(slug = %slug, location = %location, "preview out of step with provider");
        return Ok(Redirect::temporary(&location).into_response());
    }

    // In step with the provider, but the ref can't serve this post.
    let Some(post) = draft else {
        return Ok(leave_preview(slug, "post not available under preview ref"));
    };

    let neighbors = detail::neighbors(source, &post, Some(&active_ref)).await?;
    let view = PostView { post, neighbors };
    let ctx = RenderContext::new(&state.config).previewing(true);
    Ok(html_response(
        render::render_post(&view, ctx).into_string(),
        NO_STORE.to_string(),
    ))
}
