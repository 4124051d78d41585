// SPDX-License-Identifier: MPL-2.0

use crate::atproto::types::{FeedPage, FeedViewPost, PostViewer};
use crate::feed::mutations::{Mutation, MutationOutcome, MutationQueue};
use crate::feed::{FeedSource, PageRequest};
use crate::render::context::RenderContext;
use crate::render::node::RenderNode;
use crate::render::post::{post_url, render_post};
use tracing::{debug, info, warn};

/// How far a page-down moves the selection.
const PAGE_STEP: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    /// The first page could not be fetched.
    Failed(String),
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Next,
    Previous,
    ToggleLike,
    Repost,
    PageDown,
    OpenInBrowser,
}

impl Command {
    pub fn from_key(key: char) -> Option<Self> {
        match key {
            'j' => Some(Command::Next),
            'k' => Some(Command::Previous),
            'l' => Some(Command::ToggleLike),
            't' => Some(Command::Repost),
            ' ' => Some(Command::PageDown),
            'o' => Some(Command::OpenInBrowser),
            _ => None,
        }
    }
}

/// What the host should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Bring this post into view.
    ScrollIntoView(String),
    /// Open a web URL.
    Open(String),
}

/// An append-only list of feed entries with one selected entry.
pub struct Timeline {
    source: FeedSource,
    items: Vec<FeedViewPost>,
    cursor: Option<String>,
    selected: Option<usize>,
    state: LoadState,
    fetching: bool,
    mutations: MutationQueue,
}

impl Timeline {
    pub fn new(source: FeedSource, mutations: MutationQueue) -> Self {
        Self {
            source,
            items: Vec::new(),
            cursor: None,
            selected: None,
            state: LoadState::Loading,
            fetching: false,
            mutations,
        }
    }

    pub fn source(&self) -> &FeedSource {
        &self.source
    }

    pub fn items(&self) -> &[FeedViewPost] {
        &self.items
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn is_fetching(&self) -> bool {
        self.fetching
    }

    /// Request for the first page. Marks a fetch as in flight.
    pub fn first_page(&mut self) -> PageRequest {
        self.fetching = true;
        self.state = LoadState::Loading;
        PageRequest {
            source: self.source.clone(),
            cursor: None,
        }
    }

    /// The consumer reached the end of the list. Returns the next page to
    /// fetch, or `None` while one is in flight or when the feed is exhausted.
    pub fn end_reached(&mut self) -> Option<PageRequest> {
        if self.fetching || self.state != LoadState::Ready {
            return None;
        }
        let cursor = self.cursor.clone()?;
        self.fetching = true;
        Some(PageRequest {
            source: self.source.clone(),
            cursor: Some(cursor),
        })
    }

    pub fn receive_page(&mut self, page: FeedPage) {
        debug!(count = page.posts.len(), cursor = ?page.cursor, "received feed page");
        self.fetching = false;
        self.cursor = page.cursor;
        self.items.extend(page.posts);
        self.state = LoadState::Ready;
        if self.selected.is_none() && !self.items.is_empty() {
            self.selected = Some(0);
        }
    }

    /// A fetch failed. Only a failed first page replaces the list with an
    /// error; later failures keep what is loaded.
    pub fn receive_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.fetching = false;
        if self.items.is_empty() {
            warn!(%message, "failed to load feed");
            self.state = LoadState::Failed(message);
        } else {
            warn!(%message, "failed to load next page");
        }
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected(&self) -> Option<&FeedViewPost> {
        self.selected.and_then(|i| self.items.get(i))
    }

    pub fn selected_uri(&self) -> Option<&str> {
        self.selected().map(|item| item.post.uri.as_str())
    }

    /// Whether the selection sits on the last loaded entry.
    pub fn at_end(&self) -> bool {
        self.selected
            .is_some_and(|i| i + 1 >= self.items.len())
    }

    pub fn select_next(&mut self) -> Option<Effect> {
        self.move_selection(1, true)
    }

    pub fn select_previous(&mut self) -> Option<Effect> {
        self.move_selection(1, false)
    }

    fn move_selection(&mut self, step: usize, forward: bool) -> Option<Effect> {
        let current = self.selected?;
        let last = self.items.len().checked_sub(1)?;
        let target = if forward {
            current.saturating_add(step).min(last)
        } else {
            current.saturating_sub(step)
        };
        if target == current {
            return None;
        }
        self.selected = Some(target);
        self.selected_uri()
            .map(|uri| Effect::ScrollIntoView(uri.to_string()))
    }

    pub fn handle(&mut self, command: Command) -> Option<Effect> {
        match command {
            Command::Next => self.select_next(),
            Command::Previous => self.select_previous(),
            Command::PageDown => self.move_selection(PAGE_STEP, true),
            Command::ToggleLike => {
                self.toggle_like();
                None
            }
            Command::Repost => {
                self.repost();
                None
            }
            Command::OpenInBrowser => self
                .selected()
                .map(|item| Effect::Open(post_url(&item.post.author.handle, &item.post.uri))),
        }
    }

    /// Like the selected post, or unlike it if already liked. Posts without
    /// viewer state are left alone.
    fn toggle_like(&self) {
        let Some(item) = self.selected() else {
            return;
        };
        let post = &item.post;
        let Some(viewer) = &post.viewer else {
            debug!(uri = %post.uri, "no viewer state, not toggling like");
            return;
        };
        self.mutations.push(Mutation::Like {
            uri: post.uri.clone(),
            cid: post.cid.clone(),
            like: viewer.like.is_none(),
            like_record: viewer.like.clone(),
        });
    }

    fn repost(&self) {
        if let Some(item) = self.selected() {
            self.mutations.push(Mutation::Repost {
                uri: item.post.uri.clone(),
                cid: item.post.cid.clone(),
            });
        }
    }

    /// Fold a finished mutation into every copy of the affected post.
    pub fn apply_outcome(&mut self, outcome: &MutationOutcome) {
        match outcome {
            MutationOutcome::Liked { uri, like_record } => {
                for post in self.posts_mut(uri) {
                    let was_liked = post.is_liked();
                    let count = post.like_count.get_or_insert(0);
                    match (was_liked, like_record.is_some()) {
                        (false, true) => *count += 1,
                        (true, false) => *count = count.saturating_sub(1),
                        _ => {}
                    }
                    post.viewer.get_or_insert_with(PostViewer::default).like = like_record.clone();
                }
            }
            MutationOutcome::Reposted { uri, repost_record } => {
                info!(%uri, "reposted");
                for post in self.posts_mut(uri) {
                    if !post.is_reposted() {
                        *post.repost_count.get_or_insert(0) += 1;
                    }
                    post.viewer.get_or_insert_with(PostViewer::default).repost =
                        Some(repost_record.clone());
                }
            }
            // Follows belong to the profile view.
            MutationOutcome::Followed { .. } | MutationOutcome::Failed { .. } => {}
        }
    }

    fn posts_mut<'a>(
        &'a mut self,
        uri: &'a str,
    ) -> impl Iterator<Item = &'a mut crate::atproto::types::PostView> + 'a {
        self.items
            .iter_mut()
            .map(|item| &mut item.post)
            .filter(move |post| post.uri == uri)
    }

    /// Cards for every loaded entry, or the loading/error/empty text.
    pub fn render(&self, ctx: &dyn RenderContext) -> RenderNode {
        match &self.state {
            LoadState::Loading => RenderNode::Text(ctx.translate("app.loading")),
            LoadState::Failed(message) => RenderNode::Text(message.clone()),
            LoadState::Ready if self.items.is_empty() => {
                RenderNode::Text(ctx.translate("timeline.empty"))
            }
            LoadState::Ready => RenderNode::Column(
                self.items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| render_post(item, self.selected == Some(i), ctx))
                    .collect(),
            ),
        }
    }

    /// Card for the selected entry only.
    pub fn render_selected(&self, ctx: &dyn RenderContext) -> RenderNode {
        match self.selected() {
            Some(item) => render_post(item, true, ctx),
            None => self.render(ctx),
        }
    }
}
