#![cfg(feature = "runtime")]

use std::env;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "NAVAL_DUEL_LOG";

/// Initialize logging with a filter taken from the `NAVAL_DUEL_LOG`
/// environment variable, in `env_logger` syntax (`debug`,
/// `naval_duel::sync=trace`). Defaults to `info`. Calling this twice is
/// harmless.
pub fn init_logging() {
    let filter = env::var(LOG_ENV).unwrap_or_else(|_| "info".to_string());
    let _ = pretty_env_logger::formatted_builder()
        .parse_filters(&filter)
        .try_init();
}
