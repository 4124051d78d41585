// SPDX-License-Identifier: MPL-2.0

//! Rich text facets.
//!
//! Post text arrives with `app.bsky.richtext.facet` annotations that point at
//! UTF-8 byte ranges. [`segments`] cuts the text around those ranges so a host
//! can render links, mentions and hashtags inline. [`linkify`] does the same
//! for text that has no facets (profile descriptions) by detecting the spans
//! itself.

use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ByteSlice {
    pub byte_start: usize,
    pub byte_end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "$type")]
pub enum FacetFeature {
    #[serde(rename = "app.bsky.richtext.facet#link")]
    Link { uri: String },
    #[serde(rename = "app.bsky.richtext.facet#mention")]
    Mention { did: String },
    #[serde(rename = "app.bsky.richtext.facet#tag")]
    Tag { tag: String },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Facet {
    pub index: ByteSlice,
    #[serde(default)]
    pub features: Vec<FacetFeature>,
}

/// Where an inline span points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpanLink {
    Url(String),
    /// A DID from a mention facet, or a bare handle from [`linkify`].
    Profile(String),
    Tag(String),
}

impl SpanLink {
    fn from_feature(feature: &FacetFeature) -> Option<Self> {
        match feature {
            FacetFeature::Link { uri } => Some(SpanLink::Url(uri.clone())),
            FacetFeature::Mention { did } => Some(SpanLink::Profile(did.clone())),
            FacetFeature::Tag { tag } => Some(SpanLink::Tag(tag.clone())),
            FacetFeature::Unsupported => None,
        }
    }
}

/// A run of text, linked or plain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub link: Option<SpanLink>,
}

impl Segment {
    fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            link: None,
        }
    }
}

struct Span {
    start: usize,
    end: usize,
    link: SpanLink,
}

/// Cut `text` around the facet ranges.
///
/// Facets whose range is empty, out of bounds, not on a char boundary or
/// overlapping an earlier facet are ignored and their text stays plain.
pub fn segments(text: &str, facets: &[Facet]) -> Vec<Segment> {
    let spans = facets
        .iter()
        .filter_map(|facet| {
            let link = facet.features.iter().find_map(SpanLink::from_feature)?;
            Some(Span {
                start: facet.index.byte_start,
                end: facet.index.byte_end,
                link,
            })
        })
        .collect();

    compose(text, spans)
}

fn compose(text: &str, mut spans: Vec<Span>) -> Vec<Segment> {
    spans.sort_by_key(|s| (s.start, s.end));

    let mut out = Vec::new();
    let mut cursor = 0;

    for span in spans {
        let valid = span.start < span.end
            && span.start >= cursor
            && span.end <= text.len()
            && text.is_char_boundary(span.start)
            && text.is_char_boundary(span.end);
        if !valid {
            continue;
        }

        if span.start > cursor {
            out.push(Segment::plain(&text[cursor..span.start]));
        }
        out.push(Segment {
            text: text[span.start..span.end].to_string(),
            link: Some(span.link),
        });
        cursor = span.end;
    }

    if cursor < text.len() {
        out.push(Segment::plain(&text[cursor..]));
    }

    out
}

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://[^\s<>\[\]\{}|\\^`\x00-\x1f\x7f]+").expect("valid url pattern")
});

static MENTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[\s\(\[])(@(([a-zA-Z0-9]([a-zA-Z0-9-]*[a-zA-Z0-9])?\.)+[a-zA-Z]([a-zA-Z0-9-]*[a-zA-Z0-9])?))")
        .expect("valid mention pattern")
});

static HASHTAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[\s\(\[])(#([a-zA-Z][a-zA-Z0-9_]*))").expect("valid hashtag pattern")
});

fn overlaps(start: usize, end: usize, existing: &[Span]) -> bool {
    existing.iter().any(|s| start < s.end && end > s.start)
}

/// Sentence punctuation right after a URL is almost never part of it.
fn trim_url_trailing(url: &str) -> &str {
    url.trim_end_matches(['.', ',', ';', '!', '?'])
}

/// Detect URLs, mentions and hashtags in plain text and segment it.
///
/// URLs win over mentions, mentions over hashtags.
pub fn linkify(text: &str) -> Vec<Segment> {
    let mut spans: Vec<Span> = Vec::new();

    for m in URL_RE.find_iter(text) {
        let trimmed = trim_url_trailing(m.as_str());
        spans.push(Span {
            start: m.start(),
            end: m.start() + trimmed.len(),
            link: SpanLink::Url(trimmed.to_string()),
        });
    }

    // Group 1 is "@handle", group 2 the bare handle.
    for caps in MENTION_RE.captures_iter(text) {
        let (Some(at_handle), Some(handle)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        if !overlaps(at_handle.start(), at_handle.end(), &spans) {
            spans.push(Span {
                start: at_handle.start(),
                end: at_handle.end(),
                link: SpanLink::Profile(handle.as_str().to_string()),
            });
        }
    }

    for caps in HASHTAG_RE.captures_iter(text) {
        let (Some(hashtag), Some(tag)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        if !overlaps(hashtag.start(), hashtag.end(), &spans) {
            spans.push(Span {
                start: hashtag.start(),
                end: hashtag.end(),
                link: SpanLink::Tag(tag.as_str().to_string()),
            });
        }
    }

    compose(text, spans)
}

/// Flatten segments back into their text.
pub fn plain_text(segments: &[Segment]) -> String {
    segments.iter().map(|s| s.text.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn facet(start: usize, end: usize, feature: serde_json::Value) -> Facet {
        serde_json::from_value(json!({
            "index": { "byteStart": start, "byteEnd": end },
            "features": [feature]
        }))
        .unwrap()
    }

    fn links(segments: &[Segment]) -> Vec<&SpanLink> {
        segments.iter().filter_map(|s| s.link.as_ref()).collect()
    }

    #[test]
    fn test_decode_facet_features() {
        let link = facet(
            0,
            4,
            json!({"$type": "app.bsky.richtext.facet#link", "uri": "https://a.b"}),
        );
        assert_eq!(
            link.features,
            vec![FacetFeature::Link {
                uri: "https://a.b".to_string()
            }]
        );

        let future = facet(0, 4, json!({"$type": "app.bsky.richtext.facet#sparkle"}));
        assert_eq!(future.features, vec![FacetFeature::Unsupported]);
    }

    #[test]
    fn test_segments_wrap_facet_ranges() {
        let text = "hi @alice.test see #rust";
        let facets = vec![
            facet(
                3,
                14,
                json!({"$type": "app.bsky.richtext.facet#mention", "did": "did:plc:alice"}),
            ),
            facet(
                19,
                24,
                json!({"$type": "app.bsky.richtext.facet#tag", "tag": "rust"}),
            ),
        ];

        let segs = segments(text, &facets);
        assert_eq!(segs.len(), 4);
        assert_eq!(segs[0], Segment::plain("hi "));
        assert_eq!(segs[1].text, "@alice.test");
        assert_eq!(
            segs[1].link,
            Some(SpanLink::Profile("did:plc:alice".to_string()))
        );
        assert_eq!(segs[2], Segment::plain(" see "));
        assert_eq!(segs[3].link, Some(SpanLink::Tag("rust".to_string())));
        assert_eq!(plain_text(&segs), text);
    }

    #[test]
    fn test_segments_use_byte_offsets_not_chars() {
        // The emoji is four bytes, so the link starts at byte 5.
        let text = "\u{1F600} https://x.io";
        let facets = vec![facet(
            5,
            17,
            json!({"$type": "app.bsky.richtext.facet#link", "uri": "https://x.io"}),
        )];

        let segs = segments(text, &facets);
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[1].text, "https://x.io");
    }

    #[test]
    fn test_segments_skip_broken_ranges() {
        let text = "\u{1F600} hello";
        let facets = vec![
            // Inside the emoji.
            facet(
                1,
                3,
                json!({"$type": "app.bsky.richtext.facet#tag", "tag": "x"}),
            ),
            // Past the end.
            facet(
                6,
                99,
                json!({"$type": "app.bsky.richtext.facet#tag", "tag": "y"}),
            ),
        ];

        let segs = segments(text, &facets);
        assert_eq!(segs, vec![Segment::plain(text)]);
    }

    #[test]
    fn test_segments_skip_overlapping_facet() {
        let text = "abcdefgh";
        let facets = vec![
            facet(
                0,
                4,
                json!({"$type": "app.bsky.richtext.facet#tag", "tag": "a"}),
            ),
            facet(
                2,
                6,
                json!({"$type": "app.bsky.richtext.facet#tag", "tag": "b"}),
            ),
        ];

        let segs = segments(text, &facets);
        assert_eq!(links(&segs), vec![&SpanLink::Tag("a".to_string())]);
        assert_eq!(plain_text(&segs), text);
    }

    #[test]
    fn test_linkify_plain_text_no_links() {
        let segs = linkify("Hello world, no links here");
        assert_eq!(segs, vec![Segment::plain("Hello world, no links here")]);
    }

    #[test]
    fn test_linkify_url_trailing_punctuation_trimmed() {
        let segs = linkify("Visit https://example.com.");
        assert_eq!(
            links(&segs),
            vec![&SpanLink::Url("https://example.com".to_string())]
        );
        assert_eq!(segs.last().map(|s| s.text.as_str()), Some("."));
    }

    #[test]
    fn test_linkify_mention_and_hashtag() {
        let segs = linkify("@user.bsky.social loves #rust");
        assert_eq!(
            links(&segs),
            vec![
                &SpanLink::Profile("user.bsky.social".to_string()),
                &SpanLink::Tag("rust".to_string()),
            ]
        );
        assert_eq!(segs[0].text, "@user.bsky.social");
    }

    #[test]
    fn test_linkify_url_takes_priority_over_mention() {
        let segs = linkify("See https://example.com/@user.bsky.social/post");
        assert_eq!(links(&segs).len(), 1);
        assert!(matches!(links(&segs)[0], SpanLink::Url(_)));
    }
}
