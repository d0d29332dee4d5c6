//! The home page post list and its "load more" pagination.
//!
//! A [`PostListing`] starts from the first page of results and grows one page
//! at a time by following the page cursor. Posts keep the order the API
//! returned them in; each page is appended after the previous ones.
//!
//! Loads are serialized with tickets: [`PostListing::begin_load`] hands out a
//! ticket carrying a monotonically increasing id and the cursor to fetch, and
//! refuses while another ticket is outstanding. [`PostListing::complete`]
//! ignores any result whose ticket isn't the outstanding one, so a late or
//! duplicated response can never append a page twice or out of order.
//!
//! A failed load leaves posts and cursor as they were and records the error;
//! the next load retries the same cursor.

use crate::content::{ContentError, ContentSource};
use crate::types::{PostSummary, PostsPage};

/// Permission to fetch one page. Obtained from [`PostListing::begin_load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    id: u64,
    cursor: String,
}

impl LoadTicket {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn cursor(&self) -> &str {
        &self.cursor
    }
}

/// What happened to a load request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A page was appended; carries the number of new posts.
    Appended(usize),
    /// Nothing left to load.
    Exhausted,
    /// Another load is outstanding.
    Busy,
    /// The result belonged to a ticket that is no longer outstanding.
    Stale,
    /// The fetch failed; the listing is unchanged and can be retried.
    Failed(String),
}

#[derive(Debug, Clone, Default)]
pub struct PostListing {
    posts: Vec<PostSummary>,
    next_page: Option<String>,
    outstanding: Option<u64>,
    issued: u64,
    last_error: Option<String>,
}

impl PostListing {
    /// Start from the first page of results.
    pub fn new(first: PostsPage) -> Self {
        Self {
            next_page: first.cursor().map(str::to_string),
            posts: first.results.iter().map(PostSummary::from).collect(),
            ..Default::default()
        }
    }

    pub fn posts(&self) -> &[PostSummary] {
        &self.posts
    }

    pub fn next_page(&self) -> Option<&str> {
        self.next_page.as_deref()
    }

    /// Whether a "load more" control should be offered.
    pub fn has_more(&self) -> bool {
        self.next_page.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.outstanding.is_some()
    }

    /// The error from the last failed load, cleared by the next success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Reserve the next page fetch.
    ///
    /// `Err(Exhausted)` when there is no cursor, `Err(Busy)` while another
    /// ticket is outstanding.
    pub fn begin_load(&mut self) -> Result<LoadTicket, LoadOutcome> {
        let Some(cursor) = self.next_page.clone() else {
            return Err(LoadOutcome::Exhausted);
        };
        if self.outstanding.is_some() {
            return Err(LoadOutcome::Busy);
        }
        self.issued += 1;
        self.outstanding = Some(self.issued);
        Ok(LoadTicket {
            id: self.issued,
            cursor,
        })
    }

    /// Apply the result of the fetch reserved by `ticket`.
    pub fn complete(
        &mut self,
        ticket: &LoadTicket,
        result: Result<PostsPage, ContentError>,
    ) -> LoadOutcome {
        if self.outstanding != Some(ticket.id) {
            tracing::debug!(ticket = ticket.id, "discarding stale page");
            return LoadOutcome::Stale;
        }
        self.outstanding = None;
        match result {
            Ok(page) => {
                let added = page.results.len();
                self.posts.extend(page.results.iter().map(PostSummary::from));
                self.next_page = page.cursor().map(str::to_string);
                self.last_error = None;
                LoadOutcome::Appended(added)
            }
            Err(err) => {
                tracing::warn!(error = %err, cursor = %ticket.cursor, "load more failed");
                let message = err.to_string();
                self.last_error = Some(message.clone());
                LoadOutcome::Failed(message)
            }
        }
    }

    /// Reserve, fetch, and apply one page.
    pub async fn load_more(&mut self, source: &dyn ContentSource) -> LoadOutcome {
        let ticket = match self.begin_load() {
            Ok(ticket) => ticket,
            Err(outcome) => return outcome,
        };
        let result = source.fetch_page(ticket.cursor()).await;
        self.complete(&ticket, result)
    }

    /// Follow cursors until the list is exhausted or `max_pages` more pages
    /// were loaded. Stops at the first failure.
    pub async fn load_all(
        &mut self,
        source: &dyn ContentSource,
        max_pages: usize,
    ) -> Result<usize, ContentError> {
        let mut loaded = 0;
        while loaded < max_pages && self.has_more() {
            let ticket = match self.begin_load() {
                Ok(ticket) => ticket,
                Err(_) => break,
            };
            match source.fetch_page(ticket.cursor()).await {
                Ok(page) => {
                    self.complete(&ticket, Ok(page));
                    loaded += 1;
                }
                Err(err) => {
                    self.outstanding = None;
                    self.last_error = Some(err.to_string());
                    return Err(err);
                }
            }
        }
        Ok(loaded)
    }
}
