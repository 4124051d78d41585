// SPDX-License-Identifier: MPL-2.0

//! Our own view of the AT Protocol payloads we read.
//!
//! The client turns atrium's responses into JSON and decodes them into these
//! types, so the rest of the crate never touches atrium and union members we
//! do not model survive as raw JSON instead of failing the whole page.

use crate::atproto::embed::Embed;
use crate::atproto::facets::Facet;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Decoupled from atrium's internal representation so we own the API boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub did: String,
    pub handle: String,
    pub access_jwt: String,
    pub refresh_jwt: String,
}

/// The viewer's relationship with an account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorViewer {
    #[serde(default)]
    pub muted: bool,
    #[serde(default)]
    pub blocked_by: bool,
    /// URI of the viewer's block record, if the viewer blocks this account.
    #[serde(default)]
    pub blocking: Option<String>,
    #[serde(default)]
    pub following: Option<String>,
    #[serde(default)]
    pub followed_by: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Associated {
    #[serde(default)]
    pub labeler: bool,
}

/// An account as it appears on posts, quotes and conversations.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub did: String,
    /// Blocked-record views only carry the DID.
    #[serde(default)]
    pub handle: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub associated: Option<Associated>,
    #[serde(default)]
    pub viewer: Option<ActorViewer>,
}

impl Author {
    /// Display name, or the handle when the name is missing or blank.
    pub fn name(&self) -> &str {
        match self.display_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.handle,
        }
    }

    /// True when either side of the relationship has a block in place.
    pub fn is_blocked(&self) -> bool {
        self.viewer
            .as_ref()
            .is_some_and(|v| v.blocked_by || v.blocking.is_some())
    }

    pub fn is_labeler(&self) -> bool {
        self.associated.as_ref().is_some_and(|a| a.labeler)
    }
}

/// The viewer's own like/repost records on a post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PostViewer {
    /// URI of the viewer's like record, if they liked this post
    #[serde(default)]
    pub like: Option<String>,
    /// URI of the viewer's repost record, if they reposted this post
    #[serde(default)]
    pub repost: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub uri: String,
    pub cid: String,
    pub author: Author,
    /// The raw `app.bsky.feed.post` record.
    #[serde(default)]
    pub record: Value,
    #[serde(default)]
    pub embed: Option<Embed>,
    #[serde(default)]
    pub reply_count: Option<u64>,
    #[serde(default)]
    pub repost_count: Option<u64>,
    #[serde(default)]
    pub like_count: Option<u64>,
    #[serde(default)]
    pub quote_count: Option<u64>,
    #[serde(default)]
    pub indexed_at: String,
    #[serde(default)]
    pub viewer: Option<PostViewer>,
}

impl PostView {
    pub fn text(&self) -> &str {
        self.record
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn facets(&self) -> Option<Vec<Facet>> {
        record_facets(&self.record)
    }

    pub fn created_at(&self) -> Option<&str> {
        self.record.get("createdAt").and_then(Value::as_str)
    }

    pub fn is_reply(&self) -> bool {
        self.record.get("reply").is_some_and(|r| !r.is_null())
    }

    /// `$type` of the embed on the record itself (not the hydrated view).
    pub fn record_embed_kind(&self) -> Option<&str> {
        self.record
            .get("embed")
            .and_then(|e| e.get("$type"))
            .and_then(Value::as_str)
    }

    pub fn is_liked(&self) -> bool {
        self.viewer.as_ref().is_some_and(|v| v.like.is_some())
    }

    pub fn is_reposted(&self) -> bool {
        self.viewer.as_ref().is_some_and(|v| v.repost.is_some())
    }

    /// Record key, the last path segment of the AT-URI.
    pub fn rkey(&self) -> &str {
        rkey(&self.uri)
    }
}

/// Facets stored on a raw record. Undecodable facets are dropped as a whole.
pub fn record_facets(record: &Value) -> Option<Vec<Facet>> {
    let facets = record.get("facets")?;
    serde_json::from_value(facets.clone()).ok()
}

/// Record key of an AT-URI (`at://did/collection/rkey`).
pub fn rkey(uri: &str) -> &str {
    uri.rsplit('/').next().unwrap_or("")
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReasonRepost {
    pub by: Author,
    #[serde(default)]
    pub indexed_at: String,
}

/// Why a post is in the feed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "$type")]
pub enum FeedReason {
    #[serde(rename = "app.bsky.feed.defs#reasonRepost")]
    Repost(ReasonRepost),
    #[serde(rename = "app.bsky.feed.defs#reasonPin")]
    Pin,
    #[serde(other)]
    Other,
}

/// One entry of a timeline, custom feed or author feed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FeedViewPost {
    pub post: PostView,
    #[serde(default)]
    pub reason: Option<FeedReason>,
}

impl FeedViewPost {
    pub fn reposted_by(&self) -> Option<&Author> {
        match &self.reason {
            Some(FeedReason::Repost(repost)) => Some(&repost.by),
            _ => None,
        }
    }
}

/// One page of a paginated feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedPage {
    pub posts: Vec<FeedViewPost>,
    /// `None` once the server has nothing more to give.
    pub cursor: Option<String>,
}

/// `app.bsky.actor.defs#profileViewDetailed`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub did: String,
    pub handle: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub banner: Option<String>,
    #[serde(default)]
    pub followers_count: Option<u64>,
    #[serde(default)]
    pub follows_count: Option<u64>,
    #[serde(default)]
    pub posts_count: Option<u64>,
    #[serde(default)]
    pub associated: Option<Associated>,
    #[serde(default)]
    pub viewer: Option<ActorViewer>,
}

impl Profile {
    pub fn name(&self) -> &str {
        match self.display_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.handle,
        }
    }

    /// Both sides follow each other.
    pub fn is_mutual(&self) -> bool {
        self.viewer
            .as_ref()
            .is_some_and(|v| v.following.is_some() && v.followed_by.is_some())
    }

    pub fn is_followed(&self) -> bool {
        self.viewer.as_ref().is_some_and(|v| v.following.is_some())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MessageSender {
    pub did: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    #[serde(default)]
    pub text: String,
    pub sender: MessageSender,
    pub sent_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedMessage {
    pub id: String,
    pub sender: MessageSender,
    pub sent_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "$type")]
pub enum LastMessage {
    #[serde(rename = "chat.bsky.convo.defs#messageView")]
    Message(ChatMessage),
    #[serde(rename = "chat.bsky.convo.defs#deletedMessageView")]
    Deleted(DeletedMessage),
    #[serde(other)]
    Other,
}

impl LastMessage {
    pub fn sent_at(&self) -> Option<&str> {
        match self {
            LastMessage::Message(m) => Some(&m.sent_at),
            LastMessage::Deleted(m) => Some(&m.sent_at),
            LastMessage::Other => None,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            LastMessage::Message(m) => &m.text,
            LastMessage::Deleted(_) | LastMessage::Other => "",
        }
    }
}

/// `chat.bsky.convo.defs#convoView`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    #[serde(default)]
    pub members: Vec<Author>,
    #[serde(default)]
    pub last_message: Option<LastMessage>,
    #[serde(default)]
    pub unread_count: i64,
    #[serde(default)]
    pub muted: bool,
}
