// SPDX-License-Identifier: MPL-2.0

//! The toolkit-neutral tree every view renders into.

use crate::atproto::embed::AspectRatio;
use crate::atproto::facets::Segment;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Post,
    Avatar,
    /// Avatars of labeler accounts are drawn square instead of round.
    SquareAvatar,
    Banner,
}

/// An image for the host's loader; `src` doubles as the element key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageNode {
    pub src: String,
    pub alt: String,
    pub kind: ImageKind,
    /// Where activating the image leads, if anywhere.
    pub link: Option<String>,
}

impl ImageNode {
    pub fn new(src: &str, alt: &str, kind: ImageKind) -> Self {
        Self {
            src: src.to_string(),
            alt: alt.to_string(),
            kind,
            link: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridLayout {
    /// One image, full width.
    Single,
    /// Two or more images, two columns.
    TwoColumn,
}

impl GridLayout {
    pub fn for_count(count: usize) -> Self {
        if count >= 2 {
            GridLayout::TwoColumn
        } else {
            GridLayout::Single
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoNode {
    pub playlist: String,
    pub thumbnail: Option<String>,
    pub alt: Option<String>,
    pub aspect_ratio: Option<AspectRatio>,
    /// Blur the player; playback itself is untouched.
    pub obscured: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCardNode {
    pub uri: String,
    pub title: String,
    pub description: String,
    pub domain: Option<String>,
    pub image: ImageNode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteHeader {
    pub avatar: Option<ImageNode>,
    pub name: String,
    pub handle: String,
    pub profile_link: String,
    pub post_link: String,
    /// Already formatted, e.g. "3h".
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuoteNode {
    pub header: Option<QuoteHeader>,
    pub body: RenderNode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub replies: u64,
    pub reposts: u64,
    pub likes: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostNode {
    pub uri: String,
    pub avatar: Option<ImageNode>,
    pub name: String,
    pub handle: String,
    pub timestamp: String,
    pub permalink: String,
    pub reposted_by: Option<String>,
    pub text: RenderNode,
    pub embed: RenderNode,
    /// Hidden in zen mode.
    pub counts: Option<Counts>,
    pub liked: bool,
    pub reposted: bool,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderNode {
    Empty,
    Column(Vec<RenderNode>),
    Row(Vec<RenderNode>),
    Text(String),
    Heading(String),
    RichText(Vec<Segment>),
    Link { href: String, label: String },
    Badge { label: String, title: String },
    Image(ImageNode),
    ImageGrid {
        layout: GridLayout,
        images: Vec<ImageNode>,
    },
    Video(VideoNode),
    LinkCard(LinkCardNode),
    Quote(Box<QuoteNode>),
    /// Stands in for content of a blocked account.
    Blocked { message: String },
    Post(Box<PostNode>),
    /// Something recognized but not drawn yet, tagged with what it was.
    Placeholder { kind: String, data: Option<Value> },
    /// Raw payload shown for diagnosis.
    Debug(Value),
}

impl RenderNode {
    pub fn is_empty(&self) -> bool {
        matches!(self, RenderNode::Empty)
    }

    /// Depth-first walk over this node and everything under it.
    pub fn visit(&self, f: &mut dyn FnMut(&RenderNode)) {
        f(self);
        match self {
            RenderNode::Column(children) | RenderNode::Row(children) => {
                for child in children {
                    child.visit(f);
                }
            }
            RenderNode::Quote(quote) => quote.body.visit(f),
            RenderNode::Post(post) => {
                post.text.visit(f);
                post.embed.visit(f);
            }
            _ => {}
        }
    }

    /// Every piece of visible text in the tree, in order.
    pub fn texts(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.visit(&mut |node: &RenderNode| match node {
            RenderNode::Text(text) | RenderNode::Heading(text) => out.push(text.clone()),
            RenderNode::RichText(segments) => {
                out.extend(segments.iter().map(|s| s.text.clone()));
            }
            RenderNode::Link { label, .. } | RenderNode::Badge { label, .. } => {
                out.push(label.clone())
            }
            RenderNode::Blocked { message } => out.push(message.clone()),
            RenderNode::LinkCard(card) => out.push(card.title.clone()),
            RenderNode::Quote(quote) => {
                if let Some(header) = &quote.header {
                    out.push(header.name.clone());
                    out.push(header.handle.clone());
                }
            }
            _ => {}
        });
        out
    }

    /// Every image source in the tree, in order.
    pub fn image_sources(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.visit(&mut |node: &RenderNode| match node {
            RenderNode::Image(image) => out.push(image.src.clone()),
            RenderNode::ImageGrid { images, .. } => {
                out.extend(images.iter().map(|i| i.src.clone()));
            }
            RenderNode::LinkCard(card) => out.push(card.image.src.clone()),
            RenderNode::Video(video) => out.extend(video.thumbnail.clone()),
            RenderNode::Quote(quote) => {
                if let Some(avatar) = quote.header.as_ref().and_then(|h| h.avatar.as_ref()) {
                    out.push(avatar.src.clone());
                }
            }
            RenderNode::Post(post) => {
                if let Some(avatar) = &post.avatar {
                    out.push(avatar.src.clone());
                }
            }
            _ => {}
        });
        out
    }
}
