// SPDX-License-Identifier: MPL-2.0

use crate::atproto::types::{Author, Conversation};
use crate::render::context::RenderContext;
use crate::render::node::RenderNode;
use crate::render::post::avatar;

/// Members of a conversation other than the signed-in account.
pub fn other_members<'a>(convo: &'a Conversation, session_did: &str) -> Vec<&'a Author> {
    convo
        .members
        .iter()
        .filter(|member| member.did != session_did)
        .collect()
}

pub fn render_conversations(
    convos: &[Conversation],
    session_did: &str,
    ctx: &dyn RenderContext,
) -> RenderNode {
    if convos.is_empty() {
        return RenderNode::Text(ctx.translate("messages.empty"));
    }

    RenderNode::Column(
        convos
            .iter()
            .map(|convo| render_conversation(convo, session_did, ctx))
            .collect(),
    )
}

fn render_conversation(
    convo: &Conversation,
    session_did: &str,
    ctx: &dyn RenderContext,
) -> RenderNode {
    let sent_at = convo
        .last_message
        .as_ref()
        .and_then(|m| m.sent_at())
        .map(|ts| ctx.relative_time(ts))
        .unwrap_or_default();
    let text = convo
        .last_message
        .as_ref()
        .map(|m| m.text().to_string())
        .unwrap_or_default();

    let rows = other_members(convo, session_did)
        .into_iter()
        .map(|member| {
            let handle = if member.handle.is_empty() {
                &member.did
            } else {
                &member.handle
            };
            let mut row = Vec::new();
            if let Some(image) = avatar(member) {
                row.push(RenderNode::Image(image));
            }
            row.push(RenderNode::Column(vec![
                RenderNode::Row(vec![
                    RenderNode::Link {
                        href: format!("/messages/{}", convo.id),
                        label: format!("@{handle}"),
                    },
                    RenderNode::Text(sent_at.clone()),
                ]),
                RenderNode::Text(text.clone()),
            ]));
            RenderNode::Row(row)
        })
        .collect();

    RenderNode::Column(rows)
}
