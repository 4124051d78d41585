// SPDX-License-Identifier: MPL-2.0

pub mod context;
pub mod embed;
pub mod messages;
pub mod node;
pub mod post;
pub mod profile;
pub mod text;

pub use context::{RenderContext, StoreContext};
pub use embed::render_embed;
pub use messages::render_conversations;
pub use node::RenderNode;
pub use post::render_post;
pub use profile::{ProfileTab, render_profile};
pub use text::TextHost;
