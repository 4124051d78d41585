// SPDX-License-Identifier: MPL-2.0

use crate::config::IS_DEVEL;
use tracing_subscriber::EnvFilter;

/// Install the stderr subscriber. `RUST_LOG` wins over the built-in level.
pub fn init() {
    let default_level = if IS_DEVEL { "debug" } else { "info" };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
