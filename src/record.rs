use crate::level::Level;
use chrono::{DateTime, Local};

/// A single key/value pair attached to a record or bound to a handler.
#[derive(Debug, Clone, PartialEq)]
pub struct Attr {
    pub key: String,
    pub value: serde_json::Value,
}

impl Attr {
    pub fn new(key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Attr { key: key.into(), value: value.into() }
    }
}

/// One log event as seen by a [`Handler`](crate::handler::Handler).
///
/// Records are owned by the caller; handlers only read them.
#[derive(Debug, Clone)]
pub struct Record {
    pub time: DateTime<Local>,
    pub level: Level,
    pub message: String,
    pub attrs: Vec<Attr>,
}

impl Record {
    /// Record stamped with the current local time and no attributes.
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Record {
            time: Local::now(),
            level,
            message: message.into(),
            attrs: Vec::new(),
        }
    }

    pub fn with_time(mut self, time: DateTime<Local>) -> Self {
        self.time = time;
        self
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.attrs.push(Attr::new(key, value));
        self
    }
}
