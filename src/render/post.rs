// SPDX-License-Identifier: MPL-2.0

use crate::atproto::types::{Author, FeedViewPost};
use crate::config::WEB_BASE_URL;
use crate::render::context::RenderContext;
use crate::render::embed::render_embed;
use crate::render::node::{Counts, ImageKind, ImageNode, PostNode, RenderNode};

/// Build the card for one feed entry.
pub fn render_post(item: &FeedViewPost, selected: bool, ctx: &dyn RenderContext) -> RenderNode {
    let post = &item.post;
    let author = &post.author;

    // Blocked authors never reach the card body, same as quotes.
    if ctx.is_blocked(author) {
        return RenderNode::Blocked {
            message: ctx.translate("post.blockedAuthor"),
        };
    }

    let counts = (!ctx.zen_mode()).then(|| Counts {
        replies: post.reply_count.unwrap_or(0),
        reposts: post.repost_count.unwrap_or(0),
        likes: post.like_count.unwrap_or(0),
    });

    RenderNode::Post(Box::new(PostNode {
        uri: post.uri.clone(),
        avatar: avatar(author),
        name: author.name().to_string(),
        handle: author.handle.clone(),
        timestamp: ctx.relative_time(&post.indexed_at),
        permalink: post_url(&author.handle, &post.uri),
        reposted_by: item.reposted_by().map(|by| by.name().to_string()),
        text: ctx.rich_text(post.text(), post.facets().as_deref()),
        embed: render_embed(post.embed.as_ref(), ctx),
        counts,
        liked: post.is_liked(),
        reposted: post.is_reposted(),
        selected,
    }))
}

pub(crate) fn avatar(author: &Author) -> Option<ImageNode> {
    let kind = if author.is_labeler() {
        ImageKind::SquareAvatar
    } else {
        ImageKind::Avatar
    };
    author
        .avatar
        .as_deref()
        .map(|src| ImageNode::new(src, author.name(), kind))
}

/// Web URL of a post on bsky.app.
pub fn post_url(handle: &str, uri: &str) -> String {
    let rkey = crate::atproto::types::rkey(uri);
    format!("{WEB_BASE_URL}/profile/{handle}/post/{rkey}")
}

/// Compact count: blank for zero, then `1.2K`, `3.4M`.
pub fn format_count(count: u64) -> String {
    match count {
        c if c >= 1_000_000 => format!("{:.1}M", c as f64 / 1_000_000.0),
        c if c >= 1_000 => format!("{:.1}K", c as f64 / 1_000.0),
        c if c > 0 => c.to_string(),
        _ => String::new(),
    }
}
