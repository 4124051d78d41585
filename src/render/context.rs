// SPDX-License-Identifier: MPL-2.0

//! What the renderers ask of the outside world.

use crate::atproto::facets::{self, Facet};
use crate::atproto::types::Author;
use crate::i18n;
use crate::render::node::RenderNode;
use crate::state::SettingsStore;
use chrono::{DateTime, Utc};

/// Collaborators consulted while building a tree.
///
/// Every method has a sensible default except the preference lookups, which
/// must come from wherever the settings live.
pub trait RenderContext {
    fn streamer_mode(&self) -> bool;

    fn zen_mode(&self) -> bool;

    fn is_blocked(&self, author: &Author) -> bool {
        author.is_blocked()
    }

    fn translate(&self, key: &str) -> String {
        i18n::translate(key).to_string()
    }

    fn relative_time(&self, timestamp: &str) -> String {
        relative_time(timestamp, Utc::now())
    }

    /// Text with its facets composited inline. Without facets the text is
    /// passed through untouched.
    fn rich_text(&self, text: &str, facets: Option<&[Facet]>) -> RenderNode {
        match facets {
            Some(facets) => RenderNode::RichText(facets::segments(text, facets)),
            None => RenderNode::Text(text.to_string()),
        }
    }
}

/// Reads preferences straight from the store, so a toggle shows up on the
/// very next render.
pub struct StoreContext<'a> {
    store: &'a SettingsStore,
}

impl<'a> StoreContext<'a> {
    pub fn new(store: &'a SettingsStore) -> Self {
        Self { store }
    }
}

impl RenderContext for StoreContext<'_> {
    fn streamer_mode(&self) -> bool {
        self.store.settings().experiments.streamer_mode
    }

    fn zen_mode(&self) -> bool {
        self.store.settings().experiments.zen_mode
    }
}

/// "now", "5m", "3h", "2d", then the calendar date. Unparseable input gives
/// an empty string.
pub fn relative_time(timestamp: &str, now: DateTime<Utc>) -> String {
    if timestamp.is_empty() {
        return String::new();
    }

    let Ok(then) = DateTime::parse_from_rfc3339(timestamp) else {
        return String::new();
    };

    let elapsed = now.signed_duration_since(then);

    if elapsed.num_seconds() < 60 {
        "now".to_string()
    } else if elapsed.num_minutes() < 60 {
        format!("{}m", elapsed.num_minutes())
    } else if elapsed.num_hours() < 24 {
        format!("{}h", elapsed.num_hours())
    } else if elapsed.num_days() < 7 {
        format!("{}d", elapsed.num_days())
    } else {
        then.format("%b %d").to_string()
    }
}
