// SPDX-License-Identifier: MPL-2.0

//! Plain-text host for render trees, used by the terminal binary.

use crate::atproto::facets::{SpanLink, plain_text};
use crate::i18n::translate;
use crate::render::node::{GridLayout, PostNode, RenderNode};
use crate::render::post::format_count;

pub struct TextHost {
    /// Raw payload dumps are printed only when set.
    pub dev_mode: bool,
}

impl TextHost {
    pub fn new(dev_mode: bool) -> Self {
        Self { dev_mode }
    }

    pub fn render(&self, node: &RenderNode) -> String {
        let mut out = String::new();
        self.write(node, 0, &mut out);
        out
    }

    fn line(out: &mut String, indent: usize, text: &str) {
        for _ in 0..indent {
            out.push_str("  ");
        }
        out.push_str(text);
        out.push('\n');
    }

    fn write(&self, node: &RenderNode, indent: usize, out: &mut String) {
        match node {
            RenderNode::Empty => {}
            RenderNode::Column(children) => {
                for child in children {
                    self.write(child, indent, out);
                }
            }
            RenderNode::Row(children) => {
                let parts: Vec<String> = children
                    .iter()
                    .map(|child| self.render(child).trim_end().replace('\n', " "))
                    .filter(|part| !part.is_empty())
                    .collect();
                if !parts.is_empty() {
                    Self::line(out, indent, &parts.join(" · "));
                }
            }
            RenderNode::Text(text) => Self::line(out, indent, text),
            RenderNode::Heading(text) => Self::line(out, indent, &format!("# {text}")),
            RenderNode::RichText(segments) => {
                let mut text = plain_text(segments);
                let urls: Vec<&str> = segments
                    .iter()
                    .filter_map(|s| match &s.link {
                        Some(SpanLink::Url(url)) if *url != s.text => Some(url.as_str()),
                        _ => None,
                    })
                    .collect();
                if !urls.is_empty() {
                    text.push_str(&format!(" [{}]", urls.join(", ")));
                }
                Self::line(out, indent, &text);
            }
            RenderNode::Link { href, label } => {
                Self::line(out, indent, &format!("{label} <{href}>"))
            }
            RenderNode::Badge { label, .. } => Self::line(out, indent, &format!("[{label}]")),
            RenderNode::Image(image) => Self::line(out, indent, &format!("[image: {}]", image.alt)),
            RenderNode::ImageGrid { layout, images } => {
                let label = match layout {
                    GridLayout::Single => "image",
                    GridLayout::TwoColumn => "images",
                };
                Self::line(out, indent, &format!("[{} {label}]", images.len()));
                for image in images.iter().filter(|i| !i.alt.is_empty()) {
                    Self::line(out, indent + 1, &format!("alt: {}", image.alt));
                }
            }
            RenderNode::Video(video) => {
                let text = if video.obscured {
                    "[video hidden]".to_string()
                } else {
                    format!("[video: {}]", video.playlist)
                };
                Self::line(out, indent, &text);
            }
            RenderNode::LinkCard(card) => {
                Self::line(out, indent, &format!("┌ {}", card.title));
                if let Some(domain) = &card.domain {
                    Self::line(out, indent, &format!("└ {domain}"));
                }
            }
            RenderNode::Quote(quote) => {
                if let Some(header) = &quote.header {
                    Self::line(
                        out,
                        indent,
                        &format!("> {} @{} · {}", header.name, header.handle, header.timestamp),
                    );
                }
                self.write(&quote.body, indent + 1, out);
            }
            RenderNode::Blocked { message } => Self::line(out, indent, &format!("[{message}]")),
            RenderNode::Post(post) => self.write_post(post, indent, out),
            RenderNode::Placeholder { kind, data } => {
                Self::line(
                    out,
                    indent,
                    &format!("[{}: {kind}]", translate("post.notImplemented")),
                );
                if let Some(data) = data.as_ref().filter(|_| self.dev_mode) {
                    self.dump(data, indent + 1, out);
                }
            }
            RenderNode::Debug(value) => {
                if self.dev_mode {
                    self.dump(value, indent, out);
                }
            }
        }
    }

    fn write_post(&self, post: &PostNode, indent: usize, out: &mut String) {
        let marker = if post.selected { "▶ " } else { "" };
        if let Some(by) = &post.reposted_by {
            Self::line(out, indent, &format!("{marker}↻ {by}"));
        }
        Self::line(
            out,
            indent,
            &format!("{marker}{} @{} · {}", post.name, post.handle, post.timestamp),
        );
        self.write(&post.text, indent + 1, out);
        self.write(&post.embed, indent + 1, out);

        if let Some(counts) = post.counts {
            let like = if post.liked { "♥" } else { "♡" };
            let repost = if post.reposted { "↻*" } else { "↻" };
            Self::line(
                out,
                indent + 1,
                &format!(
                    "💬 {}  {repost} {}  {like} {}",
                    format_count(counts.replies),
                    format_count(counts.reposts),
                    format_count(counts.likes)
                ),
            );
        }
    }

    fn dump(&self, value: &serde_json::Value, indent: usize, out: &mut String) {
        let json = serde_json::to_string_pretty(value).unwrap_or_default();
        for line in json.lines() {
            Self::line(out, indent, line);
        }
    }
}
