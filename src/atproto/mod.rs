// SPDX-License-Identifier: MPL-2.0

mod client;
pub mod embed;
pub mod facets;
pub mod types;

pub use client::{ClientError, SkyClient};
pub use embed::{Embed, Media, QuotedRecord};
pub use facets::{Facet, Segment, SpanLink};
pub use types::{Author, Conversation, FeedPage, FeedViewPost, PostView, Profile, Session};
