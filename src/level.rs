use std::fmt;
use std::str::FromStr;

/// Severity of a [`Record`](crate::record::Record).
///
/// Levels are plain integers so that thresholds finer than the four named
/// tiers can be expressed; the named constants leave room between them
/// (`INFO + 2` sits between `INFO` and `WARN`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Level(pub i32);

impl Level {
    pub const DEBUG: Level = Level(-4);
    pub const INFO: Level = Level(0);
    pub const WARN: Level = Level(4);
    pub const ERROR: Level = Level(8);

    /// Nearest named level at or below `self`, and the distance to it.
    ///
    /// Anything below `DEBUG` is reported relative to `DEBUG`.
    fn base(self) -> (&'static str, i32) {
        let (name, base) = if self < Level::INFO {
            ("DEBUG", Level::DEBUG)
        } else if self < Level::WARN {
            ("INFO", Level::INFO)
        } else if self < Level::ERROR {
            ("WARN", Level::WARN)
        } else {
            ("ERROR", Level::ERROR)
        };
        (name, self.0 - base.0)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (name, offset) = self.base();
        if offset == 0 {
            f.write_str(name)
        } else {
            write!(f, "{}{:+}", name, offset)
        }
    }
}

/// Error returned when a string cannot be parsed into a [`Level`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid log level: {0:?}")]
pub struct LevelParseError(pub String);

impl FromStr for Level {
    type Err = LevelParseError;

    /// Accepts `debug`, `INFO`, `warn+1`, `ERROR-2` or a bare integer such
    /// as `-4`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(n) = trimmed.parse::<i32>() {
            return Ok(Level(n));
        }

        let split = trimmed.find(|c| c == '+' || c == '-');
        let (name, offset) = match split {
            Some(idx) => {
                let offset = trimmed[idx..]
                    .parse::<i32>()
                    .map_err(|_| LevelParseError(s.to_string()))?;
                (&trimmed[..idx], offset)
            }
            None => (trimmed, 0),
        };

        let base = match name.to_ascii_uppercase().as_str() {
            "DEBUG" => Level::DEBUG,
            "INFO" => Level::INFO,
            "WARN" | "WARNING" => Level::WARN,
            "ERROR" => Level::ERROR,
            _ => return Err(LevelParseError(s.to_string())),
        };

        base.0
            .checked_add(offset)
            .map(Level)
            .ok_or_else(|| LevelParseError(s.to_string()))
    }
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Level(Level::DEBUG.0 - 4),
            tracing::Level::DEBUG => Level::DEBUG,
            tracing::Level::INFO => Level::INFO,
            tracing::Level::WARN => Level::WARN,
            tracing::Level::ERROR => Level::ERROR,
        }
    }
}

impl From<&tracing::Level> for Level {
    fn from(level: &tracing::Level) -> Self {
        Level::from(*level)
    }
}
