// SPDX-License-Identifier: MPL-2.0

//! Paginated feeds and the timeline that walks them.

pub mod mutations;
pub mod timeline;

use crate::atproto::{ClientError, FeedPage, SkyClient};
use crate::state::Settings;
use tracing::debug;

pub use mutations::{Mutation, MutationOutcome, MutationQueue};
pub use timeline::{Command, Effect, LoadState, Timeline};

/// Where a timeline's posts come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSource {
    /// The signed-in account's following timeline.
    Home,
    /// A custom feed generator, by AT-URI.
    Feed(String),
}

impl FeedSource {
    /// The feed configured for a deck column; unset columns show home.
    pub fn for_column(settings: &Settings, column: usize) -> Self {
        match settings.column_feed(column) {
            Some(uri) => FeedSource::Feed(uri.to_string()),
            None => FeedSource::Home,
        }
    }
}

/// One page to fetch. `cursor` is `None` for the first page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub source: FeedSource,
    pub cursor: Option<String>,
}

pub async fn load_page(client: &SkyClient, request: &PageRequest) -> Result<FeedPage, ClientError> {
    debug!(source = ?request.source, cursor = ?request.cursor, "loading feed page");
    let cursor = request.cursor.as_deref();
    match &request.source {
        FeedSource::Home => client.get_timeline(cursor).await,
        FeedSource::Feed(uri) => client.get_feed(uri, cursor).await,
    }
}
