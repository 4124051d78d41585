// SPDX-License-Identifier: MPL-2.0

//! Profile page: header plus one tab of the author feed.

use crate::atproto::embed::kind;
use crate::atproto::facets::linkify;
use crate::atproto::types::{FeedViewPost, Profile};
use crate::render::context::RenderContext;
use crate::render::node::{ImageKind, ImageNode, RenderNode};
use crate::render::post::render_post;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProfileTab {
    All,
    #[default]
    Posts,
    Reposts,
    Replies,
    Media,
    Likes,
    Feeds,
    StarterPacks,
    Lists,
}

impl ProfileTab {
    pub const ALL: [ProfileTab; 9] = [
        ProfileTab::All,
        ProfileTab::Posts,
        ProfileTab::Reposts,
        ProfileTab::Replies,
        ProfileTab::Media,
        ProfileTab::Likes,
        ProfileTab::Feeds,
        ProfileTab::StarterPacks,
        ProfileTab::Lists,
    ];

    pub fn id(self) -> &'static str {
        match self {
            ProfileTab::All => "all",
            ProfileTab::Posts => "posts",
            ProfileTab::Reposts => "reposts",
            ProfileTab::Replies => "replies",
            ProfileTab::Media => "media",
            ProfileTab::Likes => "likes",
            ProfileTab::Feeds => "feeds",
            ProfileTab::StarterPacks => "starter-packs",
            ProfileTab::Lists => "lists",
        }
    }

    fn label_key(self) -> &'static str {
        match self {
            ProfileTab::All => "profile.tabs.all",
            ProfileTab::Posts => "profile.tabs.posts",
            ProfileTab::Reposts => "profile.tabs.reposts",
            ProfileTab::Replies => "app.replies",
            ProfileTab::Media => "profile.tabs.media",
            ProfileTab::Likes => "profile.tabs.likes",
            ProfileTab::Feeds => "profile.tabs.feeds",
            ProfileTab::StarterPacks => "profile.tabs.starterpacks",
            ProfileTab::Lists => "profile.tabs.lists",
        }
    }

    /// Tabs backed by the author feed. The rest are not built yet.
    pub fn is_feed(self) -> bool {
        matches!(
            self,
            ProfileTab::All
                | ProfileTab::Posts
                | ProfileTab::Reposts
                | ProfileTab::Replies
                | ProfileTab::Media
        )
    }

    /// Whether an author feed entry of `handle` belongs on this tab.
    pub fn includes(self, handle: &str, item: &FeedViewPost) -> bool {
        let post = &item.post;
        match self {
            ProfileTab::All => true,
            ProfileTab::Posts => !post.is_reply() && post.author.handle == handle,
            ProfileTab::Reposts => post.author.handle != handle,
            ProfileTab::Replies => post.is_reply(),
            ProfileTab::Media => post.record_embed_kind() == Some(kind::IMAGES),
            ProfileTab::Likes
            | ProfileTab::Feeds
            | ProfileTab::StarterPacks
            | ProfileTab::Lists => false,
        }
    }

    pub fn filter<'a>(self, handle: &str, feed: &'a [FeedViewPost]) -> Vec<&'a FeedViewPost> {
        feed.iter()
            .filter(|item| self.includes(handle, item))
            .collect()
    }
}

pub fn render_profile(
    profile: Option<&Profile>,
    tab: ProfileTab,
    feed: &[FeedViewPost],
    ctx: &dyn RenderContext,
) -> RenderNode {
    let Some(profile) = profile else {
        return RenderNode::Text(ctx.translate("profile.notFound"));
    };

    RenderNode::Column(vec![
        render_header(profile, ctx),
        render_tabs(tab, ctx),
        render_tab_body(profile, tab, feed, ctx),
    ])
}

fn render_header(profile: &Profile, ctx: &dyn RenderContext) -> RenderNode {
    let mut children = Vec::new();

    if let Some(banner) = &profile.banner {
        children.push(RenderNode::Image(ImageNode::new(
            banner,
            "Banner",
            ImageKind::Banner,
        )));
    }

    if let Some(avatar) = &profile.avatar {
        let is_labeler = profile.associated.as_ref().is_some_and(|a| a.labeler);
        let kind = if is_labeler {
            ImageKind::SquareAvatar
        } else {
            ImageKind::Avatar
        };
        children.push(RenderNode::Image(ImageNode::new(avatar, "Avatar", kind)));
    }

    let mut title = vec![RenderNode::Heading(profile.name().to_string())];
    if profile.is_mutual() {
        title.push(RenderNode::Badge {
            label: ctx.translate("profile.mutuals"),
            title: ctx.translate("profile.mutualsTitle"),
        });
    }
    let follow_key = if profile.is_followed() {
        "profile.unfollow"
    } else {
        "profile.follow"
    };
    title.push(RenderNode::Text(ctx.translate(follow_key)));
    children.push(RenderNode::Row(title));

    if !ctx.zen_mode() {
        let stat = |count: Option<u64>, key: &str| {
            RenderNode::Text(format!("{} {}", count.unwrap_or(0), ctx.translate(key)))
        };
        children.push(RenderNode::Row(vec![
            stat(profile.followers_count, "app.followers"),
            stat(profile.follows_count, "app.following"),
            stat(profile.posts_count, "app.posts"),
        ]));
    }

    let description = profile.description.as_deref().unwrap_or_default();
    if !description.is_empty() {
        children.push(RenderNode::RichText(linkify(description)));
    }

    RenderNode::Column(children)
}

fn render_tabs(selected: ProfileTab, ctx: &dyn RenderContext) -> RenderNode {
    RenderNode::Row(
        ProfileTab::ALL
            .iter()
            .map(|tab| {
                let label = ctx.translate(tab.label_key());
                if *tab == selected {
                    RenderNode::Heading(label)
                } else {
                    RenderNode::Link {
                        href: format!("#{}", tab.id()),
                        label,
                    }
                }
            })
            .collect(),
    )
}

fn render_tab_body(
    profile: &Profile,
    tab: ProfileTab,
    feed: &[FeedViewPost],
    ctx: &dyn RenderContext,
) -> RenderNode {
    if !tab.is_feed() {
        return RenderNode::Placeholder {
            kind: tab.id().to_string(),
            data: None,
        };
    }

    RenderNode::Column(
        tab.filter(&profile.handle, feed)
            .into_iter()
            .map(|item| render_post(item, false, ctx))
            .collect(),
    )
}
