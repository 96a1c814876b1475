/// Environment variable names used by this crate for convenient
/// configuration from applications.
///
/// These are purely helpers; the handler types themselves never read the
/// environment.

/// Minimum level, e.g. `debug`, `warn`, `INFO+2` or `-4`.
pub const COLOR_LOG_LEVEL_ENV: &str = "COLOR_LOG_LEVEL";

/// `true`/`1` to nest span fields under groups named after their spans.
pub const COLOR_LOG_SPAN_GROUPS_ENV: &str = "COLOR_LOG_SPAN_GROUPS";

/// Output stream: `stdout` (default) or `stderr`.
pub const COLOR_LOG_TARGET_ENV: &str = "COLOR_LOG_TARGET";

/// Interpret common truthy spellings (`1`, `true`, `yes`, `on`).
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
