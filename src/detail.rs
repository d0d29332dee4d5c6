//! Post detail resolution: the post itself, its neighbors, reading time.
//!
//! Neighbors are two one-result queries ordered by first publication date,
//! each starting `after` the current document:
//!
//! ```text
//! previous: orderings=[document.first_publication_date desc] after=<id> pageSize=1
//! next:     orderings=[document.first_publication_date]      after=<id> pageSize=1
//! ```

use crate::content::{ContentError, ContentSource, Ordering, Query};
use crate::richtext::count_words;
use crate::types::{NeighborLink, Neighbors, Post};

/// Average reading speed used for the reading-time estimate.
pub const WORDS_PER_MINUTE: usize = 200;

/// A post plus everything the detail page needs around it.
#[derive(Debug, Clone, PartialEq)]
pub struct PostView {
    pub post: Post,
    pub neighbors: Neighbors,
}

/// Total words in a post: every block's heading plus every body fragment.
///
/// Blocks without a heading or body contribute nothing for the missing part.
pub fn word_count(post: &Post) -> usize {
    post.data
        .content
        .iter()
        .map(|block| {
            let heading = block.heading.as_deref().map_or(0, count_words);
            let body: usize = block.body.iter().map(|f| count_words(&f.text)).sum();
            heading + body
        })
        .sum()
}

/// Estimated reading time in whole minutes, rounded up.
pub fn reading_time(post: &Post) -> usize {
    word_count(post).div_ceil(WORDS_PER_MINUTE)
}

/// Resolve a post by slug together with its neighbors.
///
/// `reference` selects a content revision (preview); `None` means published
/// content. Returns `Ok(None)` when no post has this slug.
pub async fn resolve(
    source: &dyn ContentSource,
    slug: &str,
    reference: Option<&str>,
) -> Result<Option<PostView>, ContentError> {
    let Some(post) = source.get_by_uid(slug, reference).await? else {
        return Ok(None);
    };
    let neighbors = neighbors(source, &post, reference).await?;
    Ok(Some(PostView { post, neighbors }))
}

/// The posts published immediately before and after `post`.
pub async fn neighbors(
    source: &dyn ContentSource,
    post: &Post,
    reference: Option<&str>,
) -> Result<Neighbors, ContentError> {
    if post.id.is_empty() {
        return Ok(Neighbors::default());
    }
    let adjacent = |ordering| {
        Query::posts()
            .fetch(&["title"])
            .page_size(1)
            .order(ordering)
            .after(&post.id)
            .with_ref(reference)
    };
    let previous = source.query(&adjacent(Ordering::NewestFirst)).await?;
    let next = source.query(&adjacent(Ordering::OldestFirst)).await?;

    Ok(Neighbors {
        previous: previous.results.first().map(NeighborLink::from),
        next: next.results.first().map(NeighborLink::from),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    fn three_posts() -> FakeSource {
        FakeSource::new(vec![
            post("middle", "Middle", Some("2021-03-08T10:00:00+0000")),
            post("oldest", "Oldest", Some("2021-03-01T10:00:00+0000")),
            post("newest", "Newest", Some("2021-03-15T10:00:00+0000")),
        ])
    }

    #[test]
    fn reading_time_heading_only_block() {
        let mut p = post("a", "A", None);
        // 3 heading words, no body fragments
        p.data.content = vec![block(Some("Only a heading"), &[])];
        assert_eq!(word_count(&p), 3);
        assert_eq!(reading_time(&p), 1);
    }

    #[test]
    fn reading_time_sums_all_fragments() {
        let mut p = post("a", "A", None);
        let hundred = vec!["word"; 100].join(" ");
        let fifty = vec!["word"; 50].join(" ");
        p.data.content = vec![
            block(Some("Two words"), &[hundred.as_str(), fifty.as_str()]),
            block(Some("Three more words"), &[fifty.as_str()]),
        ];
        // 2 + 100 + 50 + 3 + 50 = 205 → ceil(205 / 200) = 2
        assert_eq!(word_count(&p), 205);
        assert_eq!(reading_time(&p), 2);
    }

    #[test]
    fn reading_time_exact_multiple() {
        let mut p = post("a", "A", None);
        let two_hundred = vec!["w"; 200].join(" ");
        p.data.content = vec![block(None, &[two_hundred.as_str()])];
        assert_eq!(reading_time(&p), 1);
    }

    #[test]
    fn missing_heading_and_body_count_zero() {
        let mut p = post("a", "A", None);
        p.data.content = vec![block(None, &[]), block(None, &["one two"])];
        assert_eq!(word_count(&p), 2);
    }

    #[test]
    fn empty_post_reads_in_zero_minutes() {
        let p = post("a", "A", None);
        assert_eq!(reading_time(&p), 0);
    }

    #[tokio::test]
    async fn resolve_unknown_slug_is_none() {
        let source = three_posts();
        assert!(resolve(&source, "nope", None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn middle_post_has_both_neighbors() {
        let source = three_posts();
        let view = resolve(&source, "middle", None).await.unwrap().unwrap();
        assert_eq!(
            view.neighbors.previous,
            Some(NeighborLink {
                uid: "oldest".into(),
                title: "Oldest".into()
            })
        );
        assert_eq!(
            view.neighbors.next,
            Some(NeighborLink {
                uid: "newest".into(),
                title: "Newest".into()
            })
        );
    }

    #[tokio::test]
    async fn oldest_post_has_no_previous() {
        let source = three_posts();
        let view = resolve(&source, "oldest", None).await.unwrap().unwrap();
        assert!(view.neighbors.previous.is_none());
        assert_eq!(view.neighbors.next.unwrap().uid, "middle");
    }

    #[tokio::test]
    async fn newest_post_has_no_next() {
        let source = three_posts();
        let view = resolve(&source, "newest", None).await.unwrap().unwrap();
        assert_eq!(view.neighbors.previous.unwrap().uid, "middle");
        assert!(view.neighbors.next.is_none());
    }

    #[tokio::test]
    async fn resolve_uses_draft_ref() {
        let mut draft = post("middle", "Middle (draft)", Some("2021-03-08T10:00:00+0000"));
        draft.data.subtitle = "edited".into();
        let source = three_posts().with_draft("draft-ref", vec![draft]);
        let view = resolve(&source, "middle", Some("draft-ref"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(view.post.data.title, "Middle (draft)");
        // Draft set has a single document: no neighbors under that ref.
        assert_eq!(view.neighbors, Neighbors::default());
    }
}
