//! Shared test utilities: post builders and an in-memory content source.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let source = FakeSource::new(vec![
//!     post("first", "First post", Some("2021-03-01T10:00:00+0000")),
//!     post("second", "Second post", Some("2021-03-08T10:00:00+0000")),
//! ]);
//! let view = detail::resolve(&source, "first", None).await.unwrap();
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::content::{ContentError, ContentSource, Ordering, Predicate, Query};
use crate::types::{ContentBlock, Post, PostData, PostsPage, RichTextFragment};

// =========================================================================
// Builders
// =========================================================================

/// A post with a title and no content blocks. Its document id is `id-<uid>`.
pub fn post(uid: &str, title: &str, first_publication_date: Option<&str>) -> Post {
    Post {
        id: format!("id-{uid}"),
        uid: uid.to_string(),
        first_publication_date: first_publication_date.map(str::to_string),
        last_publication_date: first_publication_date.map(str::to_string),
        data: PostData {
            title: title.to_string(),
            subtitle: format!("About {title}"),
            author: "Test Author".to_string(),
            ..Default::default()
        },
    }
}

pub fn paragraph(text: &str) -> RichTextFragment {
    RichTextFragment {
        kind: "paragraph".to_string(),
        text: text.to_string(),
        ..Default::default()
    }
}

pub fn block(heading: Option<&str>, body: &[&str]) -> ContentBlock {
    ContentBlock {
        heading: heading.map(str::to_string),
        body: body.iter().map(|t| paragraph(t)).collect(),
    }
}

pub fn page(posts: Vec<Post>, next_page: Option<&str>) -> PostsPage {
    PostsPage {
        next_page: next_page.map(str::to_string),
        total_results_size: posts.len() as u32,
        results: posts,
    }
}

// =========================================================================
// In-memory content source
// =========================================================================

/// A [`ContentSource`] over a fixed list of posts.
///
/// - Queries honor `document.type`, `my.posts.uid` and `document.id`
///   predicates, ordering, `after` and `pageSize`.
/// - Queries with a ref registered via [`FakeSource::with_draft`] see that
///   draft set instead of the published posts.
/// - Cursors default to `fake://posts?offset=N&size=S` over the newest-first
///   listing; [`FakeSource::with_page`] pins an explicit page to a cursor and
///   [`FakeSource::failing`] makes a cursor return a 503.
#[derive(Default)]
pub struct FakeSource {
    posts: Vec<Post>,
    drafts: HashMap<String, Vec<Post>>,
    pages: HashMap<String, PostsPage>,
    failing: HashSet<String>,
    /// Every query `q` and cursor seen, in order.
    pub calls: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn new(posts: Vec<Post>) -> Self {
        Self {
            posts,
            ..Default::default()
        }
    }

    pub fn with_draft(mut self, reference: &str, posts: Vec<Post>) -> Self {
        self.drafts.insert(reference.to_string(), posts);
        self
    }

    pub fn with_page(mut self, cursor: &str, page: PostsPage) -> Self {
        self.pages.insert(cursor.to_string(), page);
        self
    }

    pub fn failing(mut self, cursor: &str) -> Self {
        self.failing.insert(cursor.to_string());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn dataset(&self, reference: Option<&str>) -> &[Post] {
        reference
            .and_then(|r| self.drafts.get(r))
            .unwrap_or(&self.posts)
    }

    fn ordered(posts: &[Post], ordering: Option<Ordering>) -> Vec<Post> {
        let mut posts = posts.to_vec();
        match ordering {
            Some(Ordering::OldestFirst) => {
                posts.sort_by(|a, b| a.first_publication_date.cmp(&b.first_publication_date))
            }
            Some(Ordering::NewestFirst) => {
                posts.sort_by(|a, b| b.first_publication_date.cmp(&a.first_publication_date))
            }
            None => {}
        }
        posts
    }

    fn slice(posts: Vec<Post>, offset: usize, size: usize) -> PostsPage {
        let total = posts.len();
        let next_page = (offset + size < total)
            .then(|| format!("fake://posts?offset={}&size={}", offset + size, size));
        PostsPage {
            next_page,
            results: posts.into_iter().skip(offset).take(size).collect(),
            total_results_size: total as u32,
        }
    }
}

#[async_trait]
impl ContentSource for FakeSource {
    async fn query(&self, query: &Query) -> Result<PostsPage, ContentError> {
        self.calls.lock().unwrap().push(query.q());
        let matching: Vec<Post> = self
            .dataset(query.reference.as_deref())
            .iter()
            .filter(|p| {
                query.predicates.iter().all(|pred| match pred {
                    Predicate::At { path, value } => match path.as_str() {
                        "document.type" => value == "posts",
                        "my.posts.uid" => &p.uid == value,
                        "document.id" => &p.id == value,
                        _ => false,
                    },
                })
            })
            .cloned()
            .collect();

        let mut ordered = Self::ordered(&matching, query.ordering);
        if let Some(after) = &query.after {
            ordered = match ordered.iter().position(|p| &p.id == after) {
                Some(i) => ordered.split_off(i + 1),
                None => Vec::new(),
            };
        }
        Ok(Self::slice(ordered, 0, query.page_size as usize))
    }

    async fn fetch_page(&self, cursor: &str) -> Result<PostsPage, ContentError> {
        self.calls.lock().unwrap().push(cursor.to_string());
        if self.failing.contains(cursor) {
            return Err(ContentError::Status {
                status: 503,
                url: cursor.to_string(),
            });
        }
        if let Some(page) = self.pages.get(cursor) {
            return Ok(page.clone());
        }
        let query = cursor
            .strip_prefix("fake://posts?")
            .ok_or_else(|| ContentError::ForeignCursor(cursor.to_string()))?;
        let mut offset = 0;
        let mut size = 20;
        for pair in query.split('&') {
            match pair.split_once('=') {
                Some(("offset", v)) => offset = v.parse().unwrap_or(0),
                Some(("size", v)) => size = v.parse().unwrap_or(20),
                _ => {}
            }
        }
        let ordered = Self::ordered(&self.posts, Some(Ordering::NewestFirst));
        Ok(Self::slice(ordered, offset, size))
    }
}
