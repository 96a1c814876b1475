use crate::handler::{Handler, HandlerError};
use crate::level::Level;
use crate::record::{Attr, Record};
use chrono::SecondsFormat;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::fmt;
use std::io::Write;
use std::sync::Arc;

/// Key of the built-in timestamp attribute.
pub const TIME_KEY: &str = "time";
/// Key of the built-in level attribute.
pub const LEVEL_KEY: &str = "level";
/// Key of the built-in message attribute.
pub const MESSAGE_KEY: &str = "msg";

/// Hook applied to every attribute before it is encoded.
///
/// Receives the open group path (empty for top-level and built-in
/// attributes) and the attribute; returning `None` drops it.
pub type ReplaceAttr = Arc<dyn Fn(&[String], Attr) -> Option<Attr> + Send + Sync>;

/// Options for [`JsonHandler`].
#[derive(Clone, Default)]
pub struct HandlerOptions {
    /// Minimum level that is processed. Defaults to `INFO`.
    pub level: Level,
    pub replace_attr: Option<ReplaceAttr>,
}

impl fmt::Debug for HandlerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerOptions")
            .field("level", &self.level)
            .field("replace_attr", &self.replace_attr.as_ref().map(|_| ".."))
            .finish()
    }
}

/// Wrap `next` so that the top-level `time`, `level` and `msg` keys are
/// dropped. Everything else is forwarded to `next` when present.
pub fn suppress_builtins(next: Option<ReplaceAttr>) -> ReplaceAttr {
    Arc::new(move |groups: &[String], attr: Attr| {
        if groups.is_empty() && matches!(attr.key.as_str(), TIME_KEY | LEVEL_KEY | MESSAGE_KEY) {
            return None;
        }
        match &next {
            Some(next) => next(groups, attr),
            None => Some(attr),
        }
    })
}

/// Handler that writes each record as a single line of JSON.
///
/// Attributes bound with [`Handler::with_attrs`] are pre-encoded into a
/// map, and [`Handler::with_group`] opens a nested object that receives
/// every attribute added afterwards. Groups that end up empty are left out.
pub struct JsonHandler<W> {
    writer: Arc<Mutex<W>>,
    options: HandlerOptions,
    bound: Map<String, Value>,
    groups: Vec<String>,
}

impl<W> Clone for JsonHandler<W> {
    fn clone(&self) -> Self {
        JsonHandler {
            writer: Arc::clone(&self.writer),
            options: self.options.clone(),
            bound: self.bound.clone(),
            groups: self.groups.clone(),
        }
    }
}

impl<W> JsonHandler<W>
where
    W: Write + Send + 'static,
{
    pub fn new(writer: W, options: HandlerOptions) -> Self {
        JsonHandler {
            writer: Arc::new(Mutex::new(writer)),
            options,
            bound: Map::new(),
            groups: Vec::new(),
        }
    }

    fn put(&self, map: &mut Map<String, Value>, groups: &[String], attr: Attr) {
        if attr.key.is_empty() {
            return;
        }
        let attr = match &self.options.replace_attr {
            Some(replace) => match replace(groups, attr) {
                Some(attr) => attr,
                None => return,
            },
            None => attr,
        };
        if !attr.key.is_empty() {
            map.insert(attr.key, attr.value);
        }
    }

    fn collect(&self, attrs: impl IntoIterator<Item = Attr>) -> Map<String, Value> {
        let mut map = Map::new();
        for attr in attrs {
            self.put(&mut map, &self.groups, attr);
        }
        map
    }
}

/// Merge `attrs` into `root` under the nested objects named by `path`,
/// creating them as needed. Nothing is created when `attrs` is empty.
fn insert_at(root: &mut Map<String, Value>, path: &[String], attrs: Map<String, Value>) {
    if attrs.is_empty() {
        return;
    }
    let mut target = root;
    for name in path {
        let slot = target
            .entry(name.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        target = match slot {
            Value::Object(next) => next,
            _ => return,
        };
    }
    target.extend(attrs);
}

impl<W> Handler for JsonHandler<W>
where
    W: Write + Send + 'static,
{
    fn enabled(&self, level: Level) -> bool {
        level >= self.options.level
    }

    fn handle(&self, record: &Record) -> Result<(), HandlerError> {
        let mut out = Map::new();
        let time = record.time.to_rfc3339_opts(SecondsFormat::AutoSi, false);
        self.put(&mut out, &[], Attr::new(TIME_KEY, time));
        self.put(&mut out, &[], Attr::new(LEVEL_KEY, record.level.to_string()));
        self.put(&mut out, &[], Attr::new(MESSAGE_KEY, record.message.clone()));

        for (key, value) in &self.bound {
            out.insert(key.clone(), value.clone());
        }

        let attrs = self.collect(record.attrs.iter().cloned());
        insert_at(&mut out, &self.groups, attrs);

        let mut line = serde_json::to_vec(&out).map_err(HandlerError::Encode)?;
        line.push(b'\n');

        let mut writer = self.writer.lock();
        writer.write_all(&line)?;
        writer.flush()?;
        Ok(())
    }

    fn with_attrs(&self, attrs: Vec<Attr>) -> Arc<dyn Handler> {
        let mut next = self.clone();
        let attrs = self.collect(attrs);
        insert_at(&mut next.bound, &self.groups, attrs);
        Arc::new(next)
    }

    fn with_group(&self, name: &str) -> Arc<dyn Handler> {
        let mut next = self.clone();
        if !name.is_empty() {
            next.groups.push(name.to_string());
        }
        Arc::new(next)
    }
}
