//! Preview mode: keeping the rendered revision in step with the provider.
//!
//! Two cookies are involved:
//!
//! - the **provider cookie** (`io.prismic.preview`), written by the content
//!   provider's preview toolbar. It is JSON keyed by `<repo>.prismic.io`, and
//!   the `preview` field under this site's key is the draft ref the editor is
//!   currently looking at:
//!
//!   ```json
//!   {"03-ignite.prismic.io": {"preview": "https://03-ignite.prismic.io/previews/XYZ"}}
//!   ```
//!
//! - the **session cookie** (`spacetraveling.preview`), written by
//!   `/api/preview` and cleared by `/api/exit-preview`. Its value is the ref
//!   this site is rendering. Its presence is what "in preview" means.
//!
//! [`reconcile`] compares the two. When the editor switches drafts the refs
//! diverge and the visitor is sent to `/api/preview` to adopt the new ref;
//! when the provider cookie disappears the preview session is over and the
//! visitor is sent to `/api/exit-preview`. [`Reconciler`] wraps this so it
//! only re-evaluates when its inputs change.
//!
//! A provider cookie that isn't valid JSON yields no action for that cycle:
//! the current preview stays as it is and a warning is logged.

use crate::config::RepositoryName;
use axum::http::HeaderMap;
use axum::http::header::COOKIE;
use reqwest::Url;
use serde_json::Value;
use std::sync::LazyLock;
use thiserror::Error;

/// Path of the endpoint that adopts a new preview ref.
pub const ADOPT_PATH: &str = "/api/preview";

/// Path of the endpoint that ends preview mode.
pub const EXIT_PATH: &str = "/api/exit-preview";

/// Origin used only to serialize site-relative query strings.
static LOCAL_ORIGIN: LazyLock<Url> =
    LazyLock::new(|| Url::parse("http://localhost/").expect("static origin must parse"));

#[derive(Error, Debug)]
pub enum PreviewError {
    #[error("malformed preview cookie: {0}")]
    MalformedCookie(#[from] serde_json::Error),
}

/// Read/clear access to the provider's preview session.
pub trait PreviewSessionStore {
    /// The draft ref for this site, if the provider has a session open.
    ///
    /// `Ok(None)` means no session; `Err` means a session exists but can't be
    /// read.
    fn active_draft_reference(&self) -> Result<Option<String>, PreviewError>;

    /// Whether the provider has any session at all, readable or not.
    fn has_session(&self) -> bool;

    fn clear(&mut self);
}

/// The provider cookie as sent by the browser.
#[derive(Debug, Clone)]
pub struct ProviderCookie {
    raw: Option<String>,
    repository: RepositoryName,
}

impl ProviderCookie {
    pub fn new(raw: Option<String>, repository: RepositoryName) -> Self {
        Self {
            raw: raw.filter(|r| !r.is_empty()),
            repository,
        }
    }

    /// Read the cookie named `name` out of request headers.
    pub fn from_headers(headers: &HeaderMap, name: &str, repository: RepositoryName) -> Self {
        Self::new(cookie_value(headers, name), repository)
    }
}

impl PreviewSessionStore for ProviderCookie {
    fn active_draft_reference(&self) -> Result<Option<String>, PreviewError> {
        let Some(raw) = &self.raw else {
            return Ok(None);
        };
        let parsed: Value = serde_json::from_str(raw)?;
        let reference = parsed
            .get(self.repository.cookie_key())
            .and_then(|entry| entry.get("preview"))
            .and_then(Value::as_str)
            .filter(|r| !r.is_empty())
            .map(str::to_string);
        Ok(reference)
    }

    fn has_session(&self) -> bool {
        self.raw.is_some()
    }

    fn clear(&mut self) {
        self.raw = None;
    }
}

/// The inputs the reconciliation depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewInputs {
    pub document_id: String,
    pub is_preview: bool,
    /// Ref currently rendered, if known.
    pub active_ref: Option<String>,
}

/// Where the visitor should be sent, if anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewAction {
    /// Already in step (or not previewing).
    Stay,
    /// Switch to the ref in the provider cookie.
    Adopt { url: String },
    /// The provider session ended.
    Exit { url: String },
}

impl PreviewAction {
    pub fn url(&self) -> Option<&str> {
        match self {
            PreviewAction::Stay => None,
            PreviewAction::Adopt { url } | PreviewAction::Exit { url } => Some(url),
        }
    }
}

/// URL of the adopt endpoint for `token` and `document_id`.
pub fn adopt_url(token: &str, document_id: &str) -> String {
    let mut url = LOCAL_ORIGIN.clone();
    url.query_pairs_mut()
        .append_pair("token", token)
        .append_pair("documentId", document_id);
    format!("{ADOPT_PATH}?{}", url.query().unwrap_or_default())
}

/// Decide what to do given the current inputs and the provider session.
pub fn reconcile(inputs: &PreviewInputs, store: &dyn PreviewSessionStore) -> PreviewAction {
    if !inputs.is_preview {
        return PreviewAction::Stay;
    }
    if !store.has_session() {
        return PreviewAction::Exit {
            url: EXIT_PATH.to_string(),
        };
    }
    match store.active_draft_reference() {
        Ok(Some(reference)) if inputs.active_ref.as_deref() != Some(reference.as_str()) => {
            PreviewAction::Adopt {
                url: adopt_url(&reference, &inputs.document_id),
            }
        }
        Ok(_) => PreviewAction::Stay,
        Err(err) => {
            tracing::warn!(error = %err, "ignoring unreadable preview cookie");
            PreviewAction::Stay
        }
    }
}

/// Something that can send the visitor elsewhere.
pub trait Navigator {
    fn push(&mut self, url: &str);
}

/// Runs [`reconcile`] when its inputs change and hands the result to a
/// [`Navigator`].
///
/// Calling [`Reconciler::update`] again with the same inputs does nothing;
/// swapping the navigator resets that memory.
pub struct Reconciler<N: Navigator> {
    navigator: N,
    last: Option<PreviewInputs>,
}

impl<N: Navigator> Reconciler<N> {
    pub fn new(navigator: N) -> Self {
        Self {
            navigator,
            last: None,
        }
    }

    pub fn set_navigator(&mut self, navigator: N) {
        self.navigator = navigator;
        self.last = None;
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    pub fn into_navigator(self) -> N {
        self.navigator
    }

    /// Re-evaluate if `inputs` differ from the last call. Returns the action
    /// taken, or `None` when nothing changed.
    pub fn update(
        &mut self,
        inputs: PreviewInputs,
        store: &dyn PreviewSessionStore,
    ) -> Option<PreviewAction> {
        if self.last.as_ref() == Some(&inputs) {
            return None;
        }
        let action = reconcile(&inputs, store);
        if let Some(url) = action.url() {
            self.navigator.push(url);
        }
        self.last = Some(inputs);
        Some(action)
    }
}

/// Navigator that records the target for a redirect response.
#[derive(Debug, Default)]
pub struct RedirectTarget {
    pub location: Option<String>,
}

impl Navigator for RedirectTarget {
    fn push(&mut self, url: &str) {
        self.location = Some(url.to_string());
    }
}

// =============================================================================
// Cookie plumbing
// =============================================================================

/// Value of cookie `name` from the request's `Cookie` headers, percent-decoded.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| percent_decode(value.trim_matches('"')))
}

/// `Set-Cookie` value storing `value` under `name` for the whole site.
pub fn session_cookie(name: &str, value: &str) -> String {
    format!(
        "{name}={}; Path=/; HttpOnly; SameSite=Lax",
        percent_encode(value)
    )
}

/// `Set-Cookie` value that removes `name`.
pub fn expired_cookie(name: &str) -> String {
    format!("{name}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Encode everything outside the RFC 3986 unreserved set. Cookie values are
/// not form data, so `+` and spaces must survive [`percent_decode`].
fn percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// Decode `%XX` escapes; malformed escapes are kept literally.
pub fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && i + 2 < bytes.len()
            && let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2]))
        {
            out.push(hi * 16 + lo);
            i += 3;
            continue;
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}
