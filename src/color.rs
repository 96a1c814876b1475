use crate::ansi::{self, with_color};
use crate::buffer::SharedBuffer;
use crate::handler::{Handler, HandlerError};
use crate::init::{LayerConfig, Target};
use crate::json::{suppress_builtins, HandlerOptions, JsonHandler};
use crate::level::Level;
use crate::record::{Attr, Record};
use parking_lot::{Mutex, MutexGuard};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use std::io::{self, Write};
use std::sync::Arc;

/// Timestamp prefix, e.g. `[15:04:05.000]`.
pub const TIME_FORMAT: &str = "[%H:%M:%S%.3f]";

type Console = Arc<Mutex<Box<dyn Write + Send>>>;

/// Handler that prints records as colorized terminal lines.
///
/// Structured encoding is left to a child handler writing into a
/// [`SharedBuffer`]. For every record the child's output is decoded back
/// into a map and printed as an indented block after a colored
/// timestamp, level and message:
///
/// ```text
/// [15:04:05.123] INFO: user logged in {
///  "user_id": 42
/// }
/// ```
///
/// The console mutex doubles as the serialization lock for the buffer.
/// Handlers derived through [`Handler::with_attrs`] and
/// [`Handler::with_group`] share both, so every handler derived from one
/// root funnels through a single critical section.
pub struct ColorHandler {
    child: Arc<dyn Handler>,
    buffer: SharedBuffer,
    console: Console,
}

/// Held for the duration of one `handle` call. Dropping it resets the
/// buffer before the console lock is released.
struct Serialized<'a> {
    console: MutexGuard<'a, Box<dyn Write + Send>>,
    buffer: &'a SharedBuffer,
}

impl Drop for Serialized<'_> {
    fn drop(&mut self) {
        self.buffer.reset();
    }
}

impl ColorHandler {
    /// Print to stdout, enabling records at `level` and above.
    pub fn new(level: Level) -> Self {
        Self::with_writer(level, io::stdout())
    }

    /// Like [`ColorHandler::new`] but print to `writer`.
    ///
    /// The child is a [`JsonHandler`] that drops its own `time`, `level`
    /// and `msg` keys, since those are rendered in the colored prefix.
    pub fn with_writer<W>(level: Level, writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        let buffer = SharedBuffer::new();
        let child = JsonHandler::new(
            buffer.clone(),
            HandlerOptions {
                level,
                replace_attr: Some(suppress_builtins(None)),
            },
        );
        Self::with_child(Arc::new(child), buffer, writer)
    }

    /// Wrap an arbitrary child. The child must write one JSON object per
    /// record into `buffer`.
    pub fn with_child<W>(child: Arc<dyn Handler>, buffer: SharedBuffer, writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        ColorHandler {
            child,
            buffer,
            console: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    /// Build from a [`LayerConfig`], printing to its configured target.
    pub fn from_config(config: &LayerConfig) -> Self {
        match config.target {
            Target::Stdout => Self::with_writer(config.level, io::stdout()),
            Target::Stderr => Self::with_writer(config.level, io::stderr()),
        }
    }

    /// Same as [`Handler::with_attrs`], keeping the concrete type.
    pub fn derive_attrs(&self, attrs: Vec<Attr>) -> ColorHandler {
        self.derive(self.child.with_attrs(attrs))
    }

    /// Same as [`Handler::with_group`], keeping the concrete type.
    pub fn derive_group(&self, name: &str) -> ColorHandler {
        self.derive(self.child.with_group(name))
    }

    /// Whether `self` and `other` serialize through the same lock and buffer.
    pub fn shares_lock_with(&self, other: &ColorHandler) -> bool {
        Arc::ptr_eq(&self.console, &other.console) && self.buffer.same_as(&other.buffer)
    }

    fn derive(&self, child: Arc<dyn Handler>) -> ColorHandler {
        ColorHandler {
            child,
            buffer: self.buffer.clone(),
            console: Arc::clone(&self.console),
        }
    }

    fn lock(&self) -> Serialized<'_> {
        Serialized {
            console: self.console.lock(),
            buffer: &self.buffer,
        }
    }

    /// Run the child and decode what it wrote. Must be called with the
    /// serialization lock held.
    fn extract_child_attrs(&self, record: &Record) -> Result<Map<String, Value>, HandlerError> {
        self.child
            .handle(record)
            .map_err(|e| HandlerError::Child(Box::new(e)))?;

        self.buffer
            .with_bytes(|bytes| serde_json::from_slice::<Map<String, Value>>(bytes))
            .map_err(HandlerError::Decode)
    }
}

/// Pretty-print `attrs` with a single-space indent.
fn indent(attrs: &Map<String, Value>) -> Result<String, HandlerError> {
    let mut out = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b" "));
    attrs.serialize(&mut ser).map_err(HandlerError::Encode)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

impl Handler for ColorHandler {
    fn enabled(&self, level: Level) -> bool {
        self.child.enabled(level)
    }

    fn handle(&self, record: &Record) -> Result<(), HandlerError> {
        let level = ansi::level_tag(record.level);

        let mut guard = self.lock();
        let attrs = self.extract_child_attrs(record)?;
        let block = indent(&attrs)?;

        let time = record.time.format(TIME_FORMAT).to_string();
        writeln!(
            guard.console,
            "{} {} {} {}",
            with_color(ansi::TIMESTAMP, &time),
            level,
            with_color(ansi::MESSAGE, &record.message),
            with_color(ansi::ATTRIBUTES, &block),
        )?;
        guard.console.flush()?;
        Ok(())
    }

    fn with_attrs(&self, attrs: Vec<Attr>) -> Arc<dyn Handler> {
        Arc::new(self.derive_attrs(attrs))
    }

    fn with_group(&self, name: &str) -> Arc<dyn Handler> {
        Arc::new(self.derive_group(name))
    }
}
