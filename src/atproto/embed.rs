// SPDX-License-Identifier: MPL-2.0

//! Hydrated embed views attached to posts.
//!
//! Every embed is discriminated by its `$type`. Tags we know decode into a
//! typed variant. Anything else, and any known tag whose payload does not
//! match the shape we expect, becomes [`Embed::Unknown`] carrying the tag and
//! the raw JSON. Decoding an embed never fails.

use crate::atproto::facets::Facet;
use crate::atproto::types::{Author, record_facets};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub mod kind {
    pub const IMAGES_VIEW: &str = "app.bsky.embed.images#view";
    pub const VIDEO_VIEW: &str = "app.bsky.embed.video#view";
    pub const EXTERNAL_VIEW: &str = "app.bsky.embed.external#view";
    pub const RECORD_VIEW: &str = "app.bsky.embed.record#view";
    pub const RECORD_WITH_MEDIA_VIEW: &str = "app.bsky.embed.recordWithMedia#view";

    pub const VIEW_RECORD: &str = "app.bsky.embed.record#viewRecord";
    pub const VIEW_BLOCKED: &str = "app.bsky.embed.record#viewBlocked";
    pub const STARTER_PACK_VIEW_BASIC: &str = "app.bsky.graph.defs#starterPackViewBasic";

    /// Record-level (non-view) images embed, as stored in a post record.
    pub const IMAGES: &str = "app.bsky.embed.images";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct AspectRatio {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewImage {
    pub thumb: String,
    pub fullsize: String,
    #[serde(default)]
    pub alt: String,
    #[serde(default)]
    pub aspect_ratio: Option<AspectRatio>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImagesView {
    pub images: Vec<ViewImage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoView {
    #[serde(default)]
    pub cid: Option<String>,
    pub playlist: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub aspect_ratio: Option<AspectRatio>,
    #[serde(default)]
    pub alt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ViewExternal {
    pub uri: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumb: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExternalView {
    pub external: ViewExternal,
}

/// A quoted post, hydrated.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewRecord {
    pub uri: String,
    pub cid: String,
    pub author: Author,
    /// The quoted `app.bsky.feed.post` record as stored.
    #[serde(default)]
    pub value: Value,
    /// Inline text some views carry next to `value`.
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub facets: Option<Vec<Facet>>,
    #[serde(default)]
    pub embeds: Option<Vec<Embed>>,
    #[serde(default)]
    pub like_count: Option<u64>,
    #[serde(default)]
    pub repost_count: Option<u64>,
    #[serde(default)]
    pub reply_count: Option<u64>,
    #[serde(default)]
    pub quote_count: Option<u64>,
    #[serde(default)]
    pub indexed_at: String,
}

impl ViewRecord {
    /// Text stored on the record value, the legacy location.
    pub fn value_text(&self) -> Option<&str> {
        self.value.get("text").and_then(Value::as_str)
    }

    /// Facets for the value text: the view's own, else the record's.
    pub fn value_facets(&self) -> Option<Vec<Facet>> {
        self.facets
            .clone()
            .or_else(|| record_facets(&self.value))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StarterPackView {
    pub uri: String,
    pub cid: String,
    pub creator: Author,
    /// The `app.bsky.graph.starterpack` record.
    #[serde(default)]
    pub record: Value,
    #[serde(default)]
    pub joined_all_time_count: Option<u64>,
    #[serde(default)]
    pub joined_week_count: Option<u64>,
    #[serde(default)]
    pub indexed_at: String,
}

impl StarterPackView {
    pub fn name(&self) -> Option<&str> {
        self.record.get("name").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BlockedRecord {
    pub uri: String,
    #[serde(default)]
    pub blocked: bool,
    pub author: Author,
}

/// A payload we keep only as raw JSON, tagged with its `$type`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawView {
    pub kind: String,
    pub raw: Value,
}

impl RawView {
    fn new(raw: Value) -> Self {
        Self {
            kind: type_of(&raw).to_string(),
            raw,
        }
    }

    fn field_author(&self, field: &str) -> Option<Author> {
        let value = self.raw.get(field)?;
        serde_json::from_value(value.clone()).ok()
    }
}

/// The thing a record embed points at.
#[derive(Debug, Clone, PartialEq)]
pub enum QuotedRecord {
    Post(Box<ViewRecord>),
    StarterPack(StarterPackView),
    Blocked(BlockedRecord),
    /// Feed generators, lists, labelers, not-found and detached views.
    Other(RawView),
}

impl QuotedRecord {
    pub fn from_value(raw: Value) -> Self {
        let decoded = match type_of(&raw) {
            kind::VIEW_RECORD => decode(&raw).map(|r| QuotedRecord::Post(Box::new(r))),
            kind::STARTER_PACK_VIEW_BASIC => decode(&raw).map(QuotedRecord::StarterPack),
            kind::VIEW_BLOCKED => decode(&raw).map(QuotedRecord::Blocked),
            _ => None,
        };
        decoded.unwrap_or_else(|| QuotedRecord::Other(RawView::new(raw)))
    }

    /// The account behind the record: a post's author, a starter pack's
    /// creator, or whichever of the two a raw view carries.
    pub fn author(&self) -> Option<Author> {
        match self {
            QuotedRecord::Post(post) => Some(post.author.clone()),
            QuotedRecord::StarterPack(pack) => Some(pack.creator.clone()),
            QuotedRecord::Blocked(blocked) => Some(blocked.author.clone()),
            QuotedRecord::Other(raw) => raw
                .field_author("author")
                .or_else(|| raw.field_author("creator")),
        }
    }

    /// Raw JSON of the record, for diagnostics.
    pub fn to_raw(&self) -> Value {
        match self {
            QuotedRecord::Other(raw) => raw.raw.clone(),
            QuotedRecord::Post(post) => serde_json::json!({
                "$type": kind::VIEW_RECORD,
                "uri": post.uri,
                "cid": post.cid,
                "value": post.value,
            }),
            QuotedRecord::StarterPack(pack) => serde_json::json!({
                "$type": kind::STARTER_PACK_VIEW_BASIC,
                "uri": pack.uri,
                "cid": pack.cid,
                "record": pack.record,
            }),
            QuotedRecord::Blocked(blocked) => serde_json::json!({
                "$type": kind::VIEW_BLOCKED,
                "uri": blocked.uri,
                "blocked": blocked.blocked,
            }),
        }
    }
}

impl<'de> Deserialize<'de> for QuotedRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_value)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RecordView {
    pub record: QuotedRecord,
}

/// The media half of a record-with-media embed.
#[derive(Debug, Clone, PartialEq)]
pub enum Media {
    Images(ImagesView),
    External(ExternalView),
    /// Video and anything newer.
    Other(RawView),
}

impl Media {
    pub fn from_value(raw: Value) -> Self {
        let decoded = match type_of(&raw) {
            kind::IMAGES_VIEW => decode(&raw).map(Media::Images),
            kind::EXTERNAL_VIEW => decode(&raw).map(Media::External),
            _ => None,
        };
        decoded.unwrap_or_else(|| Media::Other(RawView::new(raw)))
    }
}

impl<'de> Deserialize<'de> for Media {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_value)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RecordWithMediaView {
    pub record: RecordView,
    pub media: Media,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Embed {
    Images(ImagesView),
    Video(VideoView),
    External(ExternalView),
    Record(RecordView),
    RecordWithMedia(Box<RecordWithMediaView>),
    Unknown(RawView),
}

impl Embed {
    pub fn from_value(raw: Value) -> Self {
        let decoded = match type_of(&raw) {
            kind::IMAGES_VIEW => decode(&raw).map(Embed::Images),
            kind::VIDEO_VIEW => decode(&raw).map(Embed::Video),
            kind::EXTERNAL_VIEW => decode(&raw).map(Embed::External),
            kind::RECORD_VIEW => decode(&raw).map(Embed::Record),
            kind::RECORD_WITH_MEDIA_VIEW => {
                decode(&raw).map(|v| Embed::RecordWithMedia(Box::new(v)))
            }
            _ => None,
        };
        decoded.unwrap_or_else(|| Embed::Unknown(RawView::new(raw)))
    }

    /// The `$type` this embed was sent with.
    pub fn kind(&self) -> &str {
        match self {
            Embed::Images(_) => kind::IMAGES_VIEW,
            Embed::Video(_) => kind::VIDEO_VIEW,
            Embed::External(_) => kind::EXTERNAL_VIEW,
            Embed::Record(_) => kind::RECORD_VIEW,
            Embed::RecordWithMedia(_) => kind::RECORD_WITH_MEDIA_VIEW,
            Embed::Unknown(raw) => &raw.kind,
        }
    }
}

impl<'de> Deserialize<'de> for Embed {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_value)
    }
}

fn type_of(raw: &Value) -> &str {
    raw.get("$type").and_then(Value::as_str).unwrap_or_default()
}

fn decode<T: serde::de::DeserializeOwned>(raw: &Value) -> Option<T> {
    match serde_json::from_value(raw.clone()) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!(kind = type_of(raw), error = %e, "embed payload did not decode");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn author(handle: &str) -> Value {
        json!({"did": format!("did:plc:{handle}"), "handle": handle})
    }

    #[test]
    fn test_images_decode() {
        let embed = Embed::from_value(json!({
            "$type": "app.bsky.embed.images#view",
            "images": [
                {"thumb": "t1", "fullsize": "f1", "alt": "one", "aspectRatio": {"width": 4, "height": 3}},
                {"thumb": "t2", "fullsize": "f2", "alt": ""}
            ]
        }));
        let Embed::Images(images) = embed else {
            panic!("expected images");
        };
        assert_eq!(images.images.len(), 2);
        assert_eq!(
            images.images[0].aspect_ratio,
            Some(AspectRatio {
                width: 4,
                height: 3
            })
        );
    }

    #[test]
    fn test_unknown_tag_keeps_raw_payload() {
        let raw = json!({"$type": "app.bsky.embed.poll#view", "options": ["a", "b"]});
        let embed = Embed::from_value(raw.clone());
        assert_eq!(embed.kind(), "app.bsky.embed.poll#view");
        assert_eq!(
            embed,
            Embed::Unknown(RawView {
                kind: "app.bsky.embed.poll#view".to_string(),
                raw
            })
        );
    }

    #[test]
    fn test_known_tag_with_bad_shape_degrades_to_unknown() {
        let embed = Embed::from_value(json!({"$type": "app.bsky.embed.video#view"}));
        assert!(matches!(embed, Embed::Unknown(_)));
        assert_eq!(embed.kind(), kind::VIDEO_VIEW);
    }

    #[test]
    fn test_missing_type_is_unknown_with_empty_kind() {
        let embed = Embed::from_value(json!({"images": []}));
        assert_eq!(embed.kind(), "");
    }

    #[test]
    fn test_record_view_with_nested_embeds() {
        let embed: Embed = serde_json::from_value(json!({
            "$type": "app.bsky.embed.record#view",
            "record": {
                "$type": "app.bsky.embed.record#viewRecord",
                "uri": "at://did:plc:q/app.bsky.feed.post/1",
                "cid": "c",
                "author": author("q.test"),
                "value": {"$type": "app.bsky.feed.post", "text": "quoted", "createdAt": "2024-01-01T00:00:00Z"},
                "embeds": [
                    {"$type": "app.bsky.embed.external#view", "external": {"uri": "https://x", "title": "x", "description": ""}},
                    {"$type": "something.new"}
                ],
                "indexedAt": "2024-01-01T00:00:00Z"
            }
        }))
        .unwrap();

        let Embed::Record(view) = embed else {
            panic!("expected record");
        };
        let QuotedRecord::Post(post) = &view.record else {
            panic!("expected post");
        };
        assert_eq!(post.value_text(), Some("quoted"));
        let embeds = post.embeds.as_ref().unwrap();
        assert!(matches!(embeds[0], Embed::External(_)));
        assert!(matches!(embeds[1], Embed::Unknown(_)));
    }

    #[test]
    fn test_quoted_record_author_resolution() {
        let pack = QuotedRecord::from_value(json!({
            "$type": "app.bsky.graph.defs#starterPackViewBasic",
            "uri": "at://did:plc:c/app.bsky.graph.starterpack/1",
            "cid": "c",
            "creator": author("creator.test"),
            "record": {"name": "Pack"}
        }));
        assert_eq!(pack.author().unwrap().handle, "creator.test");

        let generator = QuotedRecord::from_value(json!({
            "$type": "app.bsky.feed.defs#generatorView",
            "uri": "at://did:plc:c/app.bsky.feed.generator/1",
            "creator": author("gen.test")
        }));
        assert!(matches!(generator, QuotedRecord::Other(_)));
        assert_eq!(generator.author().unwrap().handle, "gen.test");

        let missing = QuotedRecord::from_value(json!({
            "$type": "app.bsky.embed.record#viewNotFound",
            "uri": "at://x",
            "notFound": true
        }));
        assert!(missing.author().is_none());
    }

    #[test]
    fn test_blocked_view_carries_author_without_handle() {
        let blocked = QuotedRecord::from_value(json!({
            "$type": "app.bsky.embed.record#viewBlocked",
            "uri": "at://did:plc:b/app.bsky.feed.post/1",
            "blocked": true,
            "author": {"did": "did:plc:b", "viewer": {"blockedBy": true}}
        }));
        let author = blocked.author().unwrap();
        assert!(author.is_blocked());
        assert_eq!(author.handle, "");
    }

    #[test]
    fn test_record_with_media_keeps_video_media_raw() {
        let embed = Embed::from_value(json!({
            "$type": "app.bsky.embed.recordWithMedia#view",
            "record": {"record": {"$type": "app.bsky.embed.record#viewNotFound", "uri": "at://x"}},
            "media": {"$type": "app.bsky.embed.video#view", "playlist": "p"}
        }));
        let Embed::RecordWithMedia(view) = embed else {
            panic!("expected record with media");
        };
        assert!(matches!(&view.media, Media::Other(raw) if raw.kind == kind::VIDEO_VIEW));
    }

    #[test]
    fn test_value_facets_fall_back_to_record() {
        let record: ViewRecord = serde_json::from_value(json!({
            "uri": "at://x",
            "cid": "c",
            "author": author("a.test"),
            "value": {
                "text": "#tag",
                "facets": [{
                    "index": {"byteStart": 0, "byteEnd": 4},
                    "features": [{"$type": "app.bsky.richtext.facet#tag", "tag": "tag"}]
                }]
            }
        }))
        .unwrap();
        assert_eq!(record.value_facets().map(|f| f.len()), Some(1));
    }
}
