//! Content API client.
//!
//! Everything the renderers need from the headless CMS goes through the
//! [`ContentSource`] trait: a predicate query, following a pagination cursor,
//! and single-document lookups. [`PrismicClient`] implements it against the
//! Prismic REST API v2; tests use an in-memory source instead.
//!
//! ## Query shape
//!
//! ```text
//! GET {endpoint}/documents/search
//!     ?ref=<ref>                               master ref unless previewing
//!     &q=[[at(document.type, "posts")]]
//!     &fetch=posts.title,posts.subtitle        optional field selection
//!     &pageSize=2
//!     &orderings=[document.first_publication_date desc]
//!     &after=<document id>                     optional
//! ```
//!
//! The master ref is read from the API root document (`GET {endpoint}`) for
//! every query that doesn't carry an explicit ref, so regenerated pages always
//! see the latest published content.

use crate::config::ContentConfig;
use crate::types::{Post, PostsPage};
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("content API returned {status} for {url}")]
    Status { status: u16, url: String },
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("cursor does not point at the content API: {0}")]
    ForeignCursor(String),
    #[error("content API has no master ref")]
    NoMasterRef,
}

/// A query predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `at(path, "value")`: exact match.
    At { path: String, value: String },
}

impl Predicate {
    pub fn at(path: impl Into<String>, value: impl Into<String>) -> Self {
        Predicate::At {
            path: path.into(),
            value: value.into(),
        }
    }

    fn to_query(&self) -> String {
        match self {
            Predicate::At { path, value } => {
                format!("[at({}, \"{}\")]", path, value.replace('"', "\\\""))
            }
        }
    }
}

/// Sort direction on `document.first_publication_date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ordering {
    OldestFirst,
    NewestFirst,
}

impl Ordering {
    fn to_query(self) -> &'static str {
        match self {
            Ordering::OldestFirst => "[document.first_publication_date]",
            Ordering::NewestFirst => "[document.first_publication_date desc]",
        }
    }
}

/// The custom type every query in this crate targets.
pub const POSTS_TYPE: &str = "posts";

/// A search request. Build with [`Query::posts`] and the chained setters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub predicates: Vec<Predicate>,
    pub fetch: Vec<String>,
    pub page_size: u32,
    pub ordering: Option<Ordering>,
    pub reference: Option<String>,
    pub after: Option<String>,
}

impl Query {
    /// All documents of the `posts` type.
    pub fn posts() -> Self {
        Self {
            predicates: vec![Predicate::at("document.type", POSTS_TYPE)],
            fetch: Vec::new(),
            page_size: 20,
            ordering: None,
            reference: None,
            after: None,
        }
    }

    pub fn and(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Restrict returned fields, e.g. `["title", "subtitle"]` → `posts.title,...`.
    pub fn fetch(mut self, fields: &[&str]) -> Self {
        self.fetch = fields
            .iter()
            .map(|f| format!("{POSTS_TYPE}.{f}"))
            .collect();
        self
    }

    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = size;
        self
    }

    pub fn order(mut self, ordering: Ordering) -> Self {
        self.ordering = Some(ordering);
        self
    }

    /// Render against a specific content revision (preview).
    pub fn with_ref(mut self, reference: Option<&str>) -> Self {
        self.reference = reference.map(str::to_string);
        self
    }

    /// Only results positioned after this document id in the ordering.
    pub fn after(mut self, document_id: &str) -> Self {
        self.after = Some(document_id.to_string());
        self
    }

    /// The `q` parameter: `[[pred1][pred2]]`.
    pub fn q(&self) -> String {
        let inner: String = self.predicates.iter().map(Predicate::to_query).collect();
        format!("[{inner}]")
    }

    /// Search parameters, excluding `ref` and `access_token`.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("q", self.q()), ("pageSize", self.page_size.to_string())];
        if !self.fetch.is_empty() {
            params.push(("fetch", self.fetch.join(",")));
        }
        if let Some(ordering) = self.ordering {
            params.push(("orderings", ordering.to_query().to_string()));
        }
        if let Some(after) = &self.after {
            params.push(("after", after.clone()));
        }
        params
    }
}

/// Read access to the content repository.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Run a search and return the first page.
    async fn query(&self, query: &Query) -> Result<PostsPage, ContentError>;

    /// Follow a `next_page` cursor returned by a previous page.
    async fn fetch_page(&self, cursor: &str) -> Result<PostsPage, ContentError>;

    /// Look up a post by its slug.
    async fn get_by_uid(
        &self,
        uid: &str,
        reference: Option<&str>,
    ) -> Result<Option<Post>, ContentError> {
        let query = Query::posts()
            .and(Predicate::at(format!("my.{POSTS_TYPE}.uid"), uid))
            .page_size(1)
            .with_ref(reference);
        Ok(self.query(&query).await?.results.into_iter().next())
    }

    /// Look up a post by its document id.
    async fn get_by_id(
        &self,
        id: &str,
        reference: Option<&str>,
    ) -> Result<Option<Post>, ContentError> {
        let query = Query::posts()
            .and(Predicate::at("document.id", id))
            .page_size(1)
            .with_ref(reference);
        Ok(self.query(&query).await?.results.into_iter().next())
    }
}

#[derive(Debug, Deserialize)]
struct ApiRoot {
    refs: Vec<ApiRef>,
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(rename = "isMasterRef", default)]
    is_master: bool,
}

/// HTTP client for a Prismic v2 repository.
#[derive(Debug, Clone)]
pub struct PrismicClient {
    http: reqwest::Client,
    endpoint: Url,
    access_token: Option<String>,
}

impl PrismicClient {
    pub fn new(config: &ContentConfig) -> Result<Self, ContentError> {
        let endpoint = Url::parse(config.endpoint.trim_end_matches('/'))
            .map_err(|_| ContentError::InvalidUrl(config.endpoint.clone()))?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("spacetraveling/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            endpoint,
            access_token: config.access_token.clone().filter(|t| !t.is_empty()),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Whether `cursor` points at this repository's API host.
    pub fn owns_cursor(&self, cursor: &str) -> bool {
        Url::parse(cursor).is_ok_and(|url| {
            url.scheme() == self.endpoint.scheme()
                && url.host_str() == self.endpoint.host_str()
                && url.port_or_known_default() == self.endpoint.port_or_known_default()
        })
    }

    fn with_token(&self, mut url: Url) -> Url {
        if let Some(token) = &self.access_token
            && !url.query_pairs().any(|(k, _)| k == "access_token")
        {
            url.query_pairs_mut().append_pair("access_token", token);
        }
        url
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T, ContentError> {
        let url = self.with_token(url);
        tracing::debug!(url = %url.path(), "content API request");
        let response = self.http.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ContentError::Status {
                status: status.as_u16(),
                url: url.path().to_string(),
            });
        }
        Ok(response.json().await?)
    }

    /// The ref of the currently published content.
    pub async fn master_ref(&self) -> Result<String, ContentError> {
        let root: ApiRoot = self.get_json(self.endpoint.clone()).await?;
        root.refs
            .into_iter()
            .find(|r| r.is_master)
            .map(|r| r.reference)
            .ok_or(ContentError::NoMasterRef)
    }

    fn search_url(&self) -> Url {
        let mut url = self.endpoint.clone();
        let path = format!("{}/documents/search", url.path().trim_end_matches('/'));
        url.set_path(&path);
        url
    }
}

#[async_trait]
impl ContentSource for PrismicClient {
    async fn query(&self, query: &Query) -> Result<PostsPage, ContentError> {
        let reference = match &query.reference {
            Some(r) => r.clone(),
            None => self.master_ref().await?,
        };
        let mut url = self.search_url();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("ref", &reference);
            for (key, value) in query.params() {
                pairs.append_pair(key, &value);
            }
        }
        self.get_json(url).await
    }

    async fn fetch_page(&self, cursor: &str) -> Result<PostsPage, ContentError> {
        if !self.owns_cursor(cursor) {
            return Err(ContentError::ForeignCursor(cursor.to_string()));
        }
        let url = Url::parse(cursor).map_err(|_| ContentError::InvalidUrl(cursor.to_string()))?;
        self.get_json(url).await
    }
}
