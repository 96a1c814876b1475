//! ANSI SGR color codes used for terminal output.

use crate::level::Level;

pub const RESET: &str = "\x1b[0m";

pub const RED: u8 = 31;
pub const YELLOW: u8 = 33;
pub const BLUE: u8 = 34;
pub const LIGHT_GRAY: u8 = 37;
pub const DARK_GRAY: u8 = 90;
pub const LIGHT_GREEN: u8 = 92;
pub const WHITE: u8 = 97;

pub const TIMESTAMP: u8 = LIGHT_GRAY;
pub const MESSAGE: u8 = WHITE;
pub const ATTRIBUTES: u8 = DARK_GRAY;

/// Wrap `s` in the escape sequence for `code`, followed by a reset.
pub fn with_color(code: u8, s: &str) -> String {
    format!("\x1b[{}m{}{}", code, s, RESET)
}

/// Color for one of the four named levels; `None` for anything in between.
pub fn level_color(level: Level) -> Option<u8> {
    match level {
        Level::DEBUG => Some(BLUE),
        Level::INFO => Some(LIGHT_GREEN),
        Level::WARN => Some(YELLOW),
        Level::ERROR => Some(RED),
        _ => None,
    }
}

/// `"LEVEL:"` tag, colored when the level is one of the named ones.
pub fn level_tag(level: Level) -> String {
    let tag = format!("{}:", level);
    match level_color(level) {
        Some(code) => with_color(code, &tag),
        None => tag,
    }
}

/// Remove SGR escape sequences (`ESC [ ... m`) from `s`.
pub fn strip(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' && chars.peek() == Some(&'[') {
            for c in chars.by_ref() {
                if c == 'm' {
                    break;
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}
