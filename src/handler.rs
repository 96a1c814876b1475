use crate::level::Level;
use crate::record::{Attr, Record};
use std::error::Error;
use std::sync::Arc;

/// Capability set shared by every handler in this crate.
///
/// A handler decides which records it wants, turns them into output, and
/// can be specialised with bound attributes or an open group. Because
/// [`ColorHandler`](crate::color::ColorHandler) implements the same trait it
/// wraps, handlers nest to any depth.
///
/// Derived handlers are returned as `Arc<dyn Handler>` so they can be
/// shared across threads and stored by the tracing layer.
pub trait Handler: Send + Sync {
    /// Whether a record at `level` would be processed.
    fn enabled(&self, level: Level) -> bool;

    /// Process a single record.
    ///
    /// **Returns**
    /// - `Ok(())` once the record has been written.
    /// - `Err(..)` if encoding or the underlying writer failed. Callers
    ///   are not expected to retry.
    fn handle(&self, record: &Record) -> Result<(), HandlerError>;

    /// New handler that includes `attrs` in every record it processes.
    fn with_attrs(&self, attrs: Vec<Attr>) -> Arc<dyn Handler>;

    /// New handler that nests subsequent attributes under `name`.
    fn with_group(&self, name: &str) -> Arc<dyn Handler>;
}

/// Errors surfaced from [`Handler::handle`].
#[derive(thiserror::Error, Debug)]
pub enum HandlerError {
    #[error("cannot handle child's attributes: {0}")]
    Child(#[source] Box<HandlerError>),

    #[error("cannot decode buffer into attribute map: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("cannot encode attributes: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(Box<dyn Error + Send + Sync>),
}

impl From<Box<dyn Error + Send + Sync>> for HandlerError {
    fn from(err: Box<dyn Error + Send + Sync>) -> Self {
        HandlerError::Other(err)
    }
}
