//! Library surface of the `fitlog` binary, exposed so integration tests
//! can drive the command functions directly.

pub mod commands;

/// Resolve the log filter the way `main` does: `FITLOG_LOG_LEVEL` first,
/// then `RUST_LOG`, default `info`. Takes the lookup as a function so
/// tests never have to mutate the process environment.
pub fn log_filter_from_env_with<F>(mut get: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    get("FITLOG_LOG_LEVEL")
        .or_else(|| get("RUST_LOG"))
        .unwrap_or_else(|| "info".to_string())
}
