// SPDX-License-Identifier: MPL-2.0

pub const APP_ID: &str = "io.github.sethcottle.Skydeck";
pub const APP_NAME: &str = "Skydeck";

#[cfg(feature = "devel")]
pub const IS_DEVEL: bool = true;
#[cfg(not(feature = "devel"))]
pub const IS_DEVEL: bool = false;

pub const DEFAULT_PDS: &str = "https://bsky.social";

/// Public web app, used for permalinks opened in the browser.
pub const WEB_BASE_URL: &str = "https://bsky.app";

/// Storage key of the persisted settings document.
pub const SETTINGS_KEY: &str = "settings";

/// Deepest embed nesting the renderer will follow. The server nests at most
/// one quote inside another, so three levels leave headroom.
pub const MAX_EMBED_DEPTH: usize = 3;

/// Environment variables read by the terminal front-end.
pub const ENV_HANDLE: &str = "SKYDECK_HANDLE";
pub const ENV_APP_PASSWORD: &str = "SKYDECK_APP_PASSWORD";
pub const ENV_PDS: &str = "SKYDECK_PDS";
