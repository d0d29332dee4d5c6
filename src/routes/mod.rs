//! Route definitions for `serve`.
//!
//! ## Routes
//!
//! - `GET /` - Home page (page cache)
//! - `GET /post/{slug}` - Post page (page cache, or fresh in preview)
//! - `GET /api/posts?cursor=` - Next page of post cards (JSON)
//! - `GET /api/preview?token=&documentId=` - Enter or switch preview
//! - `GET /api/exit-preview` - Leave preview
//! - `GET /health` - Health check (JSON)
//! - Embedded assets: `/style.css`, `/load-more.js`, `/images/logo.svg`

mod assets;
mod health;
pub mod pages;
mod posts;
mod preview;

use axum::Router;
use axum::routing::get;

use crate::preview::{ADOPT_PATH, EXIT_PATH};
use crate::render::ASSETS;
use crate::state::AppState;

/// Build the complete site router.
pub fn router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/", get(pages::home))
        .route("/post/{slug}", get(pages::post))
        .route("/api/posts", get(posts::load_more))
        .route(ADOPT_PATH, get(preview::adopt))
        .route(EXIT_PATH, get(preview::exit))
        .route("/health", get(health::health_check));
    for asset in ASSETS {
        router = router.route(asset.path, get(assets::serve_asset));
    }
    router.with_state(state)
}
