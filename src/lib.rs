// SPDX-License-Identifier: MPL-2.0

//! Bluesky client core.
//!
//! [`render`] turns hydrated AT Protocol views into a toolkit-neutral
//! [`render::RenderNode`] tree, [`feed`] keeps a paginated timeline with a
//! selection and queued like/repost commands, and [`state`] holds the
//! persisted user settings. [`atproto`] is the only module that talks to
//! the network.

pub mod atproto;
pub mod config;
pub mod feed;
pub mod i18n;
pub mod logging;
pub mod render;
pub mod runtime;
pub mod state;
