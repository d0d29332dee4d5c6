//! Content types shared by the list and detail renderers.
//!
//! These mirror the documents the content API returns for the `posts` custom
//! type. The API is loose about empty fields: a blank key-text comes back as
//! `null`, an empty image as `{}`, an empty group as `null`. Everything that
//! can be blank deserializes to an empty value instead of failing, so a
//! half-filled draft still renders.

use serde::{Deserialize, Deserializer, Serialize};

/// Deserialize `null` as the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A single post document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Provider document id (used for neighbor lookups and preview adoption).
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    /// URL slug.
    #[serde(default, deserialize_with = "null_as_default")]
    pub uid: String,
    /// `None` means the document has never been published.
    #[serde(default)]
    pub first_publication_date: Option<String>,
    #[serde(default)]
    pub last_publication_date: Option<String>,
    pub data: PostData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subtitle: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub author: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub banner: Banner,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Banner {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,
}

/// One section of a post: a heading followed by rich text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub body: Vec<RichTextFragment>,
}

/// A block-level rich text node (`paragraph`, `heading2`, `list-item`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RichTextFragment {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub spans: Vec<Span>,
    /// Set on `image` fragments.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,
}

/// Inline formatting over a character range of a fragment's text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Option<SpanData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpanData {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    /// Label name for `label` spans.
    #[serde(default)]
    pub label: Option<String>,
}

/// One page of search results.
///
/// `next_page` is the pagination cursor: a full URL to the following page, or
/// `None` at the end of the list. Some API versions send an empty string
/// instead of `null`; [`PostsPage::cursor`] normalizes both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostsPage {
    #[serde(default)]
    pub next_page: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<Post>,
    #[serde(default)]
    pub total_results_size: u32,
}

impl PostsPage {
    pub fn cursor(&self) -> Option<&str> {
        self.next_page.as_deref().filter(|c| !c.trim().is_empty())
    }
}

/// The reduced shape shown on the home page and returned by load-more.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    pub uid: String,
    pub first_publication_date: Option<String>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

impl From<&Post> for PostSummary {
    fn from(post: &Post) -> Self {
        Self {
            uid: post.uid.clone(),
            first_publication_date: post.first_publication_date.clone(),
            title: post.data.title.clone(),
            subtitle: post.data.subtitle.clone(),
            author: post.data.author.clone(),
        }
    }
}

/// A link to an adjacent post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborLink {
    pub uid: String,
    pub title: String,
}

impl From<&Post> for NeighborLink {
    fn from(post: &Post) -> Self {
        Self {
            uid: post.uid.clone(),
            title: post.data.title.clone(),
        }
    }
}

/// Previous (published earlier) and next (published later) posts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Neighbors {
    pub previous: Option<NeighborLink>,
    pub next: Option<NeighborLink>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_fields_deserialize_as_empty() {
        let json = r#"{
            "id": "X1",
            "uid": null,
            "first_publication_date": null,
            "last_publication_date": null,
            "data": {
                "title": null,
                "subtitle": "sub",
                "author": null,
                "banner": {},
                "content": null
            }
        }"#;
        let post: Post = serde_json::from_str(json).unwrap();
        assert_eq!(post.uid, "");
        assert_eq!(post.data.title, "");
        assert_eq!(post.data.subtitle, "sub");
        assert!(post.data.banner.url.is_none());
        assert!(post.data.content.is_empty());
        assert!(post.first_publication_date.is_none());
    }

    #[test]
    fn content_block_without_body_or_heading() {
        let json = r#"{"data": {"content": [{"heading": null}, {"body": null}]}}"#;
        let post: Post = serde_json::from_str(json).unwrap();
        assert_eq!(post.data.content.len(), 2);
        assert!(post.data.content[0].heading.is_none());
        assert!(post.data.content[1].body.is_empty());
    }

    #[test]
    fn rich_text_fragment_parses_spans() {
        let json = r#"{
            "type": "paragraph",
            "text": "Hello world",
            "spans": [{"start": 0, "end": 5, "type": "strong"},
                      {"start": 6, "end": 11, "type": "hyperlink",
                       "data": {"link_type": "Web", "url": "https://example.com"}}]
        }"#;
        let fragment: RichTextFragment = serde_json::from_str(json).unwrap();
        assert_eq!(fragment.kind, "paragraph");
        assert_eq!(fragment.spans.len(), 2);
        assert_eq!(
            fragment.spans[1].data.as_ref().unwrap().url.as_deref(),
            Some("https://example.com")
        );
    }

    #[test]
    fn empty_cursor_is_end_of_list() {
        let page = PostsPage {
            next_page: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(page.cursor(), None);

        let page = PostsPage {
            next_page: Some("https://repo.cdn.prismic.io/api/v2/documents/search?page=2".into()),
            ..Default::default()
        };
        assert!(page.cursor().is_some());
    }

    #[test]
    fn summary_keeps_list_fields() {
        let post = Post {
            id: "X".into(),
            uid: "como-utilizar-hooks".into(),
            first_publication_date: Some("2021-03-15T19:25:28+0000".into()),
            last_publication_date: None,
            data: PostData {
                title: "Como utilizar Hooks".into(),
                subtitle: "Pensando em sincronização".into(),
                author: "Joseph Oliveira".into(),
                ..Default::default()
            },
        };
        let summary = PostSummary::from(&post);
        assert_eq!(summary.uid, "como-utilizar-hooks");
        assert_eq!(summary.title, "Como utilizar Hooks");
        assert_eq!(summary.author, "Joseph Oliveira");
    }
}
