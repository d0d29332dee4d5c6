//! Rich text rendering and word counting.
//!
//! Post bodies arrive as structured rich text: a list of block fragments
//! (`paragraph`, `heading1`..`heading6`, `preformatted`, `list-item`,
//! `o-list-item`, `image`) whose `spans` mark inline formatting by character
//! offset. Rendering goes through maud, so every piece of text is escaped and
//! the only markup in the output is markup this module writes. Link and image
//! URLs are restricted to web schemes.

use crate::types::{RichTextFragment, Span};
use maud::{Markup, html};

/// Check if a URL is safe to use in `src` attributes.
pub fn is_safe_url(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}

/// Links may also be `mailto:`.
fn is_safe_href(url: &str) -> bool {
    is_safe_url(url) || url.starts_with("mailto:")
}

/// Number of words in `text`: maximal runs of ASCII letters, digits and
/// underscores. Any other character, accented letters included, ends a word.
pub fn count_words(text: &str) -> usize {
    let mut count = 0;
    let mut in_word = false;
    for c in text.chars() {
        let is_word = c.is_ascii_alphanumeric() || c == '_';
        if is_word && !in_word {
            count += 1;
        }
        in_word = is_word;
    }
    count
}

/// Render a fragment list as HTML.
///
/// Consecutive list items are grouped into one `<ul>`/`<ol>`.
pub fn as_html(fragments: &[RichTextFragment]) -> Markup {
    let mut groups: Vec<(&str, &[RichTextFragment])> = Vec::new();
    let mut start = 0;
    while start < fragments.len() {
        let kind = fragments[start].kind.as_str();
        let mut end = start + 1;
        if kind == "list-item" || kind == "o-list-item" {
            while end < fragments.len() && fragments[end].kind == kind {
                end += 1;
            }
        }
        groups.push((kind, &fragments[start..end]));
        start = end;
    }

    html! {
        @for (kind, group) in groups {
            @match kind {
                "list-item" => {
                    ul { @for item in group { li { (inline(item)) } } }
                }
                "o-list-item" => {
                    ol { @for item in group { li { (inline(item)) } } }
                }
                _ => {
                    (block(&group[0]))
                }
            }
        }
    }
}

fn block(fragment: &RichTextFragment) -> Markup {
    match fragment.kind.as_str() {
        "heading1" => html! { h1 { (inline(fragment)) } },
        "heading2" => html! { h2 { (inline(fragment)) } },
        "heading3" => html! { h3 { (inline(fragment)) } },
        "heading4" => html! { h4 { (inline(fragment)) } },
        "heading5" => html! { h5 { (inline(fragment)) } },
        "heading6" => html! { h6 { (inline(fragment)) } },
        "preformatted" => html! { pre { (fragment.text) } },
        "image" => match fragment.url.as_deref().filter(|u| is_safe_url(u)) {
            Some(url) => html! {
                p.block-img { img src=(url) alt=(fragment.alt.as_deref().unwrap_or("")); }
            },
            None => html! {},
        },
        // paragraph, and anything newer than this renderer knows about
        _ => html! { p { (inline(fragment)) } },
    }
}

/// Text of one fragment with its spans applied.
fn inline(fragment: &RichTextFragment) -> Markup {
    let chars: Vec<char> = fragment.text.chars().collect();
    let len = chars.len();
    let spans: Vec<&Span> = fragment
        .spans
        .iter()
        .filter(|s| s.start < s.end && s.start < len)
        .collect();

    let mut bounds: Vec<usize> = vec![0, len];
    for span in &spans {
        bounds.push(span.start);
        bounds.push(span.end.min(len));
    }
    bounds.sort_unstable();
    bounds.dedup();

    let segments: Vec<Markup> = bounds
        .windows(2)
        .map(|w| {
            let (a, b) = (w[0], w[1]);
            let text: String = chars[a..b].iter().collect();
            let mut markup = with_line_breaks(&text);
            // Outermost span first in `active`; wrap innermost-out.
            let mut active: Vec<&Span> = spans
                .iter()
                .copied()
                .filter(|s| s.start <= a && s.end.min(len) >= b)
                .collect();
            active.sort_by(|x, y| x.start.cmp(&y.start).then(y.end.cmp(&x.end)));
            for span in active.iter().rev() {
                markup = wrap(span, markup);
            }
            markup
        })
        .collect();

    html! { @for segment in segments { (segment) } }
}

fn with_line_breaks(text: &str) -> Markup {
    html! {
        @for (i, line) in text.split('\n').enumerate() {
            @if i > 0 { br; }
            (line)
        }
    }
}

fn wrap(span: &Span, inner: Markup) -> Markup {
    match span.kind.as_str() {
        "strong" => html! { strong { (inner) } },
        "em" => html! { em { (inner) } },
        "hyperlink" => {
            let data = span.data.as_ref();
            match data.and_then(|d| d.url.as_deref()).filter(|u| is_safe_href(u)) {
                Some(url) => {
                    let blank = data.and_then(|d| d.target.as_deref()) == Some("_blank");
                    html! {
                        a href=(url) target=[blank.then_some("_blank")]
                            rel=[blank.then_some("noopener noreferrer")] { (inner) }
                    }
                }
                None => inner,
            }
        }
        "label" => {
            let label = span.data.as_ref().and_then(|d| d.label.as_deref());
            html! { span class=[label] { (inner) } }
        }
        _ => inner,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SpanData;

    fn fragment(kind: &str, text: &str) -> RichTextFragment {
        RichTextFragment {
            kind: kind.to_string(),
            text: text.to_string(),
            ..Default::default()
        }
    }

    fn span(start: usize, end: usize, kind: &str) -> Span {
        Span {
            start,
            end,
            kind: kind.to_string(),
            data: None,
        }
    }

    #[test]
    fn count_words_basic() {
        assert_eq!(count_words("Como utilizar Hooks"), 3);
        assert_eq!(count_words(""), 0);
        assert_eq!(count_words("   ...  "), 0);
    }

    #[test]
    fn count_words_punctuation_splits_runs() {
        assert_eq!(count_words("use-effect, useState; snake_case"), 4);
    }

    #[test]
    fn count_words_accented_letters_split_words() {
        // "sincroniza" + "o"
        assert_eq!(count_words("sincronização"), 2);
        assert_eq!(count_words("Pensando em sincronização"), 4);
    }

    #[test]
    fn paragraph_text_is_escaped() {
        let html = as_html(&[fragment("paragraph", "<script>alert(1)</script>")]).into_string();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.starts_with("<p>"));
    }

    #[test]
    fn headings_map_to_tags() {
        let html = as_html(&[fragment("heading2", "Título")]).into_string();
        assert_eq!(html, "<h2>Título</h2>");
    }

    #[test]
    fn consecutive_list_items_share_one_list() {
        let html = as_html(&[
            fragment("list-item", "a"),
            fragment("list-item", "b"),
            fragment("paragraph", "p"),
            fragment("o-list-item", "c"),
        ])
        .into_string();
        assert_eq!(html, "<ul><li>a</li><li>b</li></ul><p>p</p><ol><li>c</li></ol>");
    }

    #[test]
    fn spans_wrap_ranges() {
        let mut f = fragment("paragraph", "Hello bold world");
        f.spans = vec![span(6, 10, "strong")];
        let html = as_html(&[f]).into_string();
        assert_eq!(html, "<p>Hello <strong>bold</strong> world</p>");
    }

    #[test]
    fn nested_spans() {
        let mut f = fragment("paragraph", "abcdef");
        f.spans = vec![span(0, 6, "strong"), span(2, 4, "em")];
        let html = as_html(&[f]).into_string();
        assert_eq!(
            html,
            "<p><strong>ab</strong><strong><em>cd</em></strong><strong>ef</strong></p>"
        );
    }

    #[test]
    fn hyperlink_span_with_safe_url() {
        let mut f = fragment("paragraph", "see docs");
        f.spans = vec![Span {
            start: 4,
            end: 8,
            kind: "hyperlink".into(),
            data: Some(SpanData {
                url: Some("https://example.com".into()),
                target: Some("_blank".into()),
                label: None,
            }),
        }];
        let html = as_html(&[f]).into_string();
        assert!(html.contains(r#"<a href="https://example.com" target="_blank" rel="noopener noreferrer">docs</a>"#));
    }

    #[test]
    fn javascript_link_is_dropped() {
        let mut f = fragment("paragraph", "click");
        f.spans = vec![Span {
            start: 0,
            end: 5,
            kind: "hyperlink".into(),
            data: Some(SpanData {
                url: Some("javascript:alert(1)".into()),
                ..Default::default()
            }),
        }];
        let html = as_html(&[f]).into_string();
        assert_eq!(html, "<p>click</p>");
    }

    #[test]
    fn out_of_range_span_is_clamped() {
        let mut f = fragment("paragraph", "abc");
        f.spans = vec![span(1, 99, "em"), span(50, 60, "strong")];
        let html = as_html(&[f]).into_string();
        assert_eq!(html, "<p>a<em>bc</em></p>");
    }

    #[test]
    fn newline_becomes_br() {
        let html = as_html(&[fragment("paragraph", "one\ntwo")]).into_string();
        assert_eq!(html, "<p>one<br>two</p>");
    }

    #[test]
    fn image_requires_web_url() {
        let mut ok = fragment("image", "");
        ok.url = Some("https://images.example.com/a.png".into());
        ok.alt = Some("diagram".into());
        let mut bad = fragment("image", "");
        bad.url = Some("data:image/png;base64,AAAA".into());
        let html = as_html(&[ok, bad]).into_string();
        assert!(html.contains(r#"src="https://images.example.com/a.png""#));
        assert!(html.contains(r#"alt="diagram""#));
        assert!(!html.contains("data:image"));
    }
}
