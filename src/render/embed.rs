// SPDX-License-Identifier: MPL-2.0

//! Embed dispatch.
//!
//! One arm per embed variant plus the `Unknown` arm for tags this client does
//! not know. Nested embeds recurse through the same dispatcher with a depth
//! counter; at [`MAX_EMBED_DEPTH`] the embed is replaced by a placeholder.
//! Nothing here fails: a branch either draws something, draws nothing, or
//! draws a diagnostic.

use crate::atproto::embed::{
    Embed, ExternalView, ImagesView, Media, QuotedRecord, RawView, VideoView, ViewRecord, kind,
};
use crate::atproto::facets::Facet;
use crate::atproto::types::{Author, record_facets, rkey};
use crate::config::MAX_EMBED_DEPTH;
use crate::render::context::RenderContext;
use crate::render::node::{
    GridLayout, ImageKind, ImageNode, LinkCardNode, QuoteHeader, QuoteNode, RenderNode, VideoNode,
};
use serde_json::Value;
use tracing::debug;

/// Render an optional embed. `None` renders nothing.
pub fn render_embed(embed: Option<&Embed>, ctx: &dyn RenderContext) -> RenderNode {
    match embed {
        Some(embed) => render_at(embed, ctx, 0),
        None => RenderNode::Empty,
    }
}

fn render_at(embed: &Embed, ctx: &dyn RenderContext, depth: usize) -> RenderNode {
    if depth >= MAX_EMBED_DEPTH {
        debug!(kind = embed.kind(), depth, "embed nested too deep");
        return RenderNode::Placeholder {
            kind: embed.kind().to_string(),
            data: None,
        };
    }

    match embed {
        Embed::Images(view) => render_images(view),
        Embed::Video(video) => render_video(video, ctx),
        Embed::External(view) => render_external(view),
        Embed::Record(view) => render_record(&view.record, ctx, depth),
        // The quoted half is decoded but only the media is drawn here.
        Embed::RecordWithMedia(view) => image_grid(media_images(&view.media)),
        Embed::Unknown(raw) => not_implemented(raw),
    }
}

fn not_implemented(raw: &RawView) -> RenderNode {
    RenderNode::Placeholder {
        kind: raw.kind.clone(),
        data: Some(raw.raw.clone()),
    }
}

/// Layout depends only on how many images there are.
fn image_grid(images: Vec<ImageNode>) -> RenderNode {
    if images.is_empty() {
        return RenderNode::Empty;
    }
    RenderNode::ImageGrid {
        layout: GridLayout::for_count(images.len()),
        images,
    }
}

fn render_images(view: &ImagesView) -> RenderNode {
    image_grid(
        view.images
            .iter()
            .map(|image| ImageNode::new(&image.thumb, &image.alt, ImageKind::Post))
            .collect(),
    )
}

fn render_video(video: &VideoView, ctx: &dyn RenderContext) -> RenderNode {
    RenderNode::Video(VideoNode {
        playlist: video.playlist.clone(),
        thumbnail: video.thumbnail.clone(),
        alt: video.alt.clone(),
        aspect_ratio: video.aspect_ratio,
        obscured: ctx.streamer_mode(),
    })
}

/// Link cards without a thumbnail are not shown at all.
fn render_external(view: &ExternalView) -> RenderNode {
    let external = &view.external;
    let Some(thumb) = &external.thumb else {
        return RenderNode::Empty;
    };

    let domain = url::Url::parse(&external.uri)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string));

    let mut image = ImageNode::new(thumb, &external.title, ImageKind::Post);
    image.link = Some(external.uri.clone());

    RenderNode::LinkCard(LinkCardNode {
        uri: external.uri.clone(),
        title: external.title.clone(),
        description: external.description.clone(),
        domain,
        image,
    })
}

/// Images of a record-with-media embed: its own images, or a single tile for
/// a link card that has a thumbnail.
pub fn media_images(media: &Media) -> Vec<ImageNode> {
    match media {
        Media::Images(view) => view
            .images
            .iter()
            .map(|image| ImageNode::new(&image.thumb, &image.alt, ImageKind::Post))
            .collect(),
        Media::External(view) => {
            let external = &view.external;
            match &external.thumb {
                Some(thumb) => {
                    let mut image = ImageNode::new(thumb, &external.description, ImageKind::Post);
                    image.link = Some(external.uri.clone());
                    vec![image]
                }
                None => Vec::new(),
            }
        }
        Media::Other(_) => Vec::new(),
    }
}

fn render_record(record: &QuotedRecord, ctx: &dyn RenderContext, depth: usize) -> RenderNode {
    let Some(author) = record.author() else {
        return RenderNode::Debug(record.to_raw());
    };

    if ctx.is_blocked(&author) {
        return RenderNode::Blocked {
            message: ctx.translate("post.blockedAuthor"),
        };
    }

    let header = match record {
        QuotedRecord::Post(post) => Some(quote_header(post, &author, ctx)),
        _ => None,
    };

    RenderNode::Quote(Box::new(QuoteNode {
        header,
        body: record_body(record, ctx, depth),
    }))
}

fn quote_header(post: &ViewRecord, author: &Author, ctx: &dyn RenderContext) -> QuoteHeader {
    QuoteHeader {
        avatar: author
            .avatar
            .as_deref()
            .map(|src| ImageNode::new(src, &author.handle, ImageKind::Avatar)),
        name: author.name().to_string(),
        handle: author.handle.clone(),
        profile_link: format!("/profile/{}", author.handle),
        post_link: format!("/profile/{}/post/{}", author.handle, rkey(&post.uri)),
        timestamp: ctx.relative_time(&post.indexed_at),
    }
}

/// Inline text, else the first nested embed, else a starter pack
/// placeholder, else the text stored on the record value.
///
/// Nested embeds after the first are not shown.
fn record_body(record: &QuotedRecord, ctx: &dyn RenderContext, depth: usize) -> RenderNode {
    match record {
        QuotedRecord::Post(post) => {
            if let Some(text) = post.text.as_deref().filter(|t| !t.is_empty()) {
                return ctx.rich_text(text, post.facets.as_deref());
            }
            if let Some(first) = post.embeds.as_deref().and_then(<[Embed]>::first) {
                return render_at(first, ctx, depth + 1);
            }
            match post.value_text() {
                Some(text) => ctx.rich_text(text, post.value_facets().as_deref()),
                None => RenderNode::Empty,
            }
        }
        QuotedRecord::StarterPack(_) => RenderNode::Placeholder {
            kind: kind::RECORD_VIEW.to_string(),
            data: Some(record.to_raw()),
        },
        QuotedRecord::Blocked(_) => RenderNode::Empty,
        QuotedRecord::Other(raw) => raw_value_text(&raw.raw, ctx),
    }
}

fn raw_value_text(raw: &Value, ctx: &dyn RenderContext) -> RenderNode {
    let Some(value) = raw.get("value") else {
        return RenderNode::Empty;
    };
    let Some(text) = value.get("text").and_then(Value::as_str) else {
        return RenderNode::Empty;
    };
    let facets: Option<Vec<Facet>> = raw
        .get("facets")
        .and_then(|f| serde_json::from_value(f.clone()).ok())
        .or_else(|| record_facets(value));
    ctx.rich_text(text, facets.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atproto::facets::SpanLink;
    use serde_json::json;
    use std::cell::RefCell;

    #[derive(Default)]
    struct TestContext {
        streamer: bool,
        rich_text_calls: RefCell<Vec<(String, Option<Vec<Facet>>)>>,
    }

    impl RenderContext for TestContext {
        fn streamer_mode(&self) -> bool {
            self.streamer
        }

        fn zen_mode(&self) -> bool {
            false
        }

        fn relative_time(&self, _timestamp: &str) -> String {
            "3h".to_string()
        }

        fn rich_text(&self, text: &str, facets: Option<&[Facet]>) -> RenderNode {
            self.rich_text_calls
                .borrow_mut()
                .push((text.to_string(), facets.map(<[Facet]>::to_vec)));
            RenderNode::Text(text.to_string())
        }
    }

    fn embed(value: Value) -> Embed {
        serde_json::from_value(value).unwrap()
    }

    fn image(thumb: &str) -> Value {
        json!({"thumb": thumb, "fullsize": format!("{thumb}-full"), "alt": format!("alt {thumb}")})
    }

    fn images(count: usize) -> Value {
        let items: Vec<Value> = (0..count).map(|i| image(&format!("img{i}"))).collect();
        json!({"$type": "app.bsky.embed.images#view", "images": items})
    }

    fn author(handle: &str) -> Value {
        json!({
            "did": format!("did:plc:{handle}"),
            "handle": handle,
            "displayName": format!("{handle} name"),
            "avatar": format!("https://cdn/{handle}.jpg")
        })
    }

    fn blocked_author(handle: &str) -> Value {
        let mut author = author(handle);
        author["viewer"] = json!({"blockedBy": true});
        author
    }

    fn quoted_post(author: Value, extra: Value) -> Value {
        let mut record = json!({
            "$type": "app.bsky.embed.record#viewRecord",
            "uri": "at://did:plc:q/app.bsky.feed.post/3kquote",
            "cid": "bafyquote",
            "author": author,
            "value": {"$type": "app.bsky.feed.post", "text": "value text", "createdAt": "2024-01-01T00:00:00Z"},
            "likeCount": 1,
            "repostCount": 2,
            "replyCount": 3,
            "indexedAt": "2024-01-01T00:00:00Z"
        });
        if let (Some(record), Some(extra)) = (record.as_object_mut(), extra.as_object()) {
            for (k, v) in extra {
                record.insert(k.clone(), v.clone());
            }
        }
        json!({"$type": "app.bsky.embed.record#view", "record": record})
    }

    fn external(thumb: Option<&str>) -> Value {
        let mut ext = json!({
            "uri": "https://example.com/article",
            "title": "Title",
            "description": "Desc"
        });
        if let Some(thumb) = thumb {
            ext["thumb"] = json!(thumb);
        }
        json!({"$type": "app.bsky.embed.external#view", "external": ext})
    }

    #[test]
    fn test_none_renders_nothing() {
        let ctx = TestContext::default();
        assert_eq!(render_embed(None, &ctx), RenderNode::Empty);
    }

    #[test]
    fn test_single_image_is_single_column() {
        let ctx = TestContext::default();
        let node = render_embed(Some(&embed(images(1))), &ctx);
        let RenderNode::ImageGrid { layout, images } = node else {
            panic!("expected image grid");
        };
        assert_eq!(layout, GridLayout::Single);
        assert_eq!(images[0].src, "img0");
        assert_eq!(images[0].alt, "alt img0");
    }

    #[test]
    fn test_two_images_are_two_columns() {
        let ctx = TestContext::default();
        let node = render_embed(Some(&embed(images(2))), &ctx);
        assert!(matches!(
            node,
            RenderNode::ImageGrid {
                layout: GridLayout::TwoColumn,
                ..
            }
        ));

        let node = render_embed(Some(&embed(images(4))), &ctx);
        assert_eq!(node.image_sources().len(), 4);
    }

    #[test]
    fn test_video_obscured_follows_streamer_mode() {
        let video = embed(json!({
            "$type": "app.bsky.embed.video#view",
            "cid": "c",
            "playlist": "https://video/playlist.m3u8",
            "thumbnail": "https://video/thumb.jpg",
            "aspectRatio": {"width": 16, "height": 9}
        }));

        let mut ctx = TestContext {
            streamer: true,
            ..Default::default()
        };
        let RenderNode::Video(on) = render_embed(Some(&video), &ctx) else {
            panic!("expected video");
        };
        assert!(on.obscured);

        ctx.streamer = false;
        let RenderNode::Video(off) = render_embed(Some(&video), &ctx) else {
            panic!("expected video");
        };
        assert!(!off.obscured);
        assert_eq!(on.playlist, off.playlist);
        assert_eq!(on.thumbnail, off.thumbnail);
    }

    #[test]
    fn test_external_without_thumb_renders_nothing() {
        let ctx = TestContext::default();
        assert_eq!(
            render_embed(Some(&embed(external(None))), &ctx),
            RenderNode::Empty
        );
    }

    #[test]
    fn test_external_with_thumb_renders_card() {
        let ctx = TestContext::default();
        let RenderNode::LinkCard(card) =
            render_embed(Some(&embed(external(Some("https://cdn/t.jpg")))), &ctx)
        else {
            panic!("expected link card");
        };
        assert_eq!(card.title, "Title");
        assert_eq!(card.domain.as_deref(), Some("example.com"));
        assert_eq!(card.image.src, "https://cdn/t.jpg");
    }

    #[test]
    fn test_unknown_tag_renders_placeholder_with_exact_tag() {
        let ctx = TestContext::default();
        let raw = json!({"$type": "app.bsky.embed.poll#view", "question": "?"});
        let node = render_embed(Some(&embed(raw.clone())), &ctx);
        assert_eq!(
            node,
            RenderNode::Placeholder {
                kind: "app.bsky.embed.poll#view".to_string(),
                data: Some(raw),
            }
        );
    }

    #[test]
    fn test_unknown_tag_without_type_never_panics() {
        let ctx = TestContext::default();
        let node = render_embed(Some(&embed(json!(42))), &ctx);
        assert!(matches!(node, RenderNode::Placeholder { kind: tag, .. } if tag.is_empty()));
    }

    #[test]
    fn test_quote_renders_header_and_inline_text() {
        let ctx = TestContext::default();
        let quote = embed(quoted_post(
            author("alice.test"),
            json!({
                "text": "inline text",
                "facets": [{
                    "index": {"byteStart": 0, "byteEnd": 6},
                    "features": [{"$type": "app.bsky.richtext.facet#tag", "tag": "inline"}]
                }],
                "embeds": [images(1)]
            }),
        ));

        let RenderNode::Quote(node) = render_embed(Some(&quote), &ctx) else {
            panic!("expected quote");
        };
        let header = node.header.as_ref().unwrap();
        assert_eq!(header.name, "alice.test name");
        assert_eq!(header.handle, "alice.test");
        assert_eq!(header.post_link, "/profile/alice.test/post/3kquote");
        assert_eq!(header.timestamp, "3h");
        assert_eq!(node.body, RenderNode::Text("inline text".to_string()));

        // Text wins: the facet renderer saw exactly the inline text and
        // facets, and the nested image was never drawn.
        let calls = ctx.rich_text_calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "inline text");
        let facets = calls[0].1.as_ref().unwrap();
        assert_eq!(facets.len(), 1);
        assert_eq!(facets[0].index.byte_end, 6);
        assert!(!RenderNode::Quote(node.clone()).image_sources().contains(&"img0".to_string()));
    }

    #[test]
    fn test_quote_without_text_renders_only_first_nested_embed() {
        let ctx = TestContext::default();
        let second = json!({
            "$type": "app.bsky.embed.images#view",
            "images": [image("second")]
        });
        let quote = embed(quoted_post(
            author("alice.test"),
            json!({"embeds": [external(Some("https://cdn/first.jpg")), second]}),
        ));

        let node = render_embed(Some(&quote), &ctx);
        let sources = node.image_sources();
        assert!(sources.contains(&"https://cdn/first.jpg".to_string()));
        assert!(!sources.contains(&"second".to_string()));
        assert!(ctx.rich_text_calls.borrow().is_empty());
    }

    #[test]
    fn test_quote_falls_back_to_value_text() {
        let ctx = TestContext::default();
        let quote = embed(quoted_post(author("alice.test"), json!({})));

        let RenderNode::Quote(node) = render_embed(Some(&quote), &ctx) else {
            panic!("expected quote");
        };
        assert_eq!(node.body, RenderNode::Text("value text".to_string()));
        assert_eq!(ctx.rich_text_calls.borrow()[0].0, "value text");
    }

    #[test]
    fn test_quote_value_text_uses_default_facet_renderer() {
        struct Plain;
        impl RenderContext for Plain {
            fn streamer_mode(&self) -> bool {
                false
            }
            fn zen_mode(&self) -> bool {
                false
            }
        }

        let quote = embed(quoted_post(
            author("alice.test"),
            json!({
                "value": {
                    "text": "see #rust",
                    "facets": [{
                        "index": {"byteStart": 4, "byteEnd": 9},
                        "features": [{"$type": "app.bsky.richtext.facet#tag", "tag": "rust"}]
                    }]
                }
            }),
        ));

        let RenderNode::Quote(node) = render_embed(Some(&quote), &Plain) else {
            panic!("expected quote");
        };
        let RenderNode::RichText(segments) = &node.body else {
            panic!("expected rich text");
        };
        assert_eq!(segments[1].link, Some(SpanLink::Tag("rust".to_string())));
    }

    #[test]
    fn test_blocked_author_shows_only_placeholder() {
        let ctx = TestContext::default();
        let quote = embed(quoted_post(
            blocked_author("mallory.test"),
            json!({"text": "secret words", "embeds": [images(2)]}),
        ));

        let node = render_embed(Some(&quote), &ctx);
        assert_eq!(
            node,
            RenderNode::Blocked {
                message: "Post by a blocked account".to_string()
            }
        );
        assert!(node.image_sources().is_empty());
        assert!(!node.texts().iter().any(|t| t.contains("secret")));
        assert!(ctx.rich_text_calls.borrow().is_empty());
    }

    #[test]
    fn test_blocked_record_view_is_placeholder() {
        let ctx = TestContext::default();
        let quote = embed(json!({
            "$type": "app.bsky.embed.record#view",
            "record": {
                "$type": "app.bsky.embed.record#viewBlocked",
                "uri": "at://did:plc:b/app.bsky.feed.post/1",
                "blocked": true,
                "author": {"did": "did:plc:b", "viewer": {"blocking": "at://did:plc:me/app.bsky.graph.block/1"}}
            }
        }));
        assert!(matches!(
            render_embed(Some(&quote), &ctx),
            RenderNode::Blocked { .. }
        ));
    }

    #[test]
    fn test_record_without_author_renders_debug_dump() {
        let ctx = TestContext::default();
        let raw_record = json!({
            "$type": "app.bsky.embed.record#viewNotFound",
            "uri": "at://did:plc:x/app.bsky.feed.post/gone",
            "notFound": true
        });
        let quote = embed(json!({
            "$type": "app.bsky.embed.record#view",
            "record": raw_record.clone()
        }));
        assert_eq!(render_embed(Some(&quote), &ctx), RenderNode::Debug(raw_record));
    }

    #[test]
    fn test_starter_pack_has_no_header_and_placeholder_body() {
        let ctx = TestContext::default();
        let pack = embed(json!({
            "$type": "app.bsky.embed.record#view",
            "record": {
                "$type": "app.bsky.graph.defs#starterPackViewBasic",
                "uri": "at://did:plc:c/app.bsky.graph.starterpack/1",
                "cid": "c",
                "creator": author("creator.test"),
                "record": {"$type": "app.bsky.graph.starterpack", "name": "Rustaceans", "list": "at://l"},
                "joinedAllTimeCount": 10,
                "indexedAt": "2024-01-01T00:00:00Z"
            }
        }));

        let RenderNode::Quote(node) = render_embed(Some(&pack), &ctx) else {
            panic!("expected quote");
        };
        assert!(node.header.is_none());
        assert!(matches!(
            &node.body,
            RenderNode::Placeholder { kind: tag, .. } if tag == kind::RECORD_VIEW
        ));
    }

    #[test]
    fn test_record_with_media_images_verbatim() {
        let ctx = TestContext::default();
        let rwm = embed(json!({
            "$type": "app.bsky.embed.recordWithMedia#view",
            "record": {"record": quoted_post(author("a.test"), json!({}))["record"].clone()},
            "media": images(2)
        }));

        let node = render_embed(Some(&rwm), &ctx);
        let RenderNode::ImageGrid { layout, images } = &node else {
            panic!("expected grid");
        };
        assert_eq!(*layout, GridLayout::TwoColumn);
        assert_eq!(images.len(), 2);
        // The quoted record is not drawn.
        assert!(node.texts().is_empty());
    }

    #[test]
    fn test_record_with_media_external_synthesizes_single_image() {
        let ctx = TestContext::default();
        let rwm = embed(json!({
            "$type": "app.bsky.embed.recordWithMedia#view",
            "record": {"record": {"$type": "app.bsky.embed.record#viewNotFound", "uri": "at://x"}},
            "media": external(Some("https://cdn/t.jpg"))
        }));

        let RenderNode::ImageGrid { layout, images } = render_embed(Some(&rwm), &ctx) else {
            panic!("expected grid");
        };
        assert_eq!(layout, GridLayout::Single);
        assert_eq!(images[0].alt, "Desc");
        assert_eq!(images[0].link.as_deref(), Some("https://example.com/article"));
    }

    #[test]
    fn test_record_with_media_without_images_renders_nothing() {
        let ctx = TestContext::default();
        for media in [
            external(None),
            json!({"$type": "app.bsky.embed.video#view", "playlist": "p"}),
        ] {
            let rwm = embed(json!({
                "$type": "app.bsky.embed.recordWithMedia#view",
                "record": {"record": {"$type": "app.bsky.embed.record#viewNotFound", "uri": "at://x"}},
                "media": media
            }));
            assert_eq!(render_embed(Some(&rwm), &ctx), RenderNode::Empty);
        }
    }

    #[test]
    fn test_self_nesting_stops_at_depth_limit() {
        let ctx = TestContext::default();
        // Quotes nested well past the limit, each with only an embed.
        let mut inner = images(1);
        for _ in 0..10 {
            let wrapped = quoted_post(author("deep.test"), json!({"embeds": [inner]}));
            inner = wrapped;
        }

        let node = render_embed(Some(&embed(inner)), &ctx);

        let mut quotes = 0;
        let mut placeholders = 0;
        node.visit(&mut |n: &RenderNode| match n {
            RenderNode::Quote(_) => quotes += 1,
            RenderNode::Placeholder { .. } => placeholders += 1,
            _ => {}
        });
        assert_eq!(quotes, MAX_EMBED_DEPTH);
        assert_eq!(placeholders, 1);
        assert!(node.image_sources().iter().all(|s| s != "img0"));
    }
}
