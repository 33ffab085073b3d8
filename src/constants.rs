//! Application-wide constants.

/// Directory name under the platform config dir.
pub const APP_DIR_NAME: &str = "kommark";

/// Config file name inside the config dir.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Log file name inside the config dir.
pub const LOG_FILE_NAME: &str = "kommark.log";

/// Log filter used when neither RUST_LOG nor the config sets one.
pub const DEFAULT_LOG_FILTER: &str = "info,kommark=debug";

/// How long `kommark replay` waits for the queue to drain.
pub const REPLAY_DRAIN_TIMEOUT_SECS: u64 = 30;
