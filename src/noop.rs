use crate::handler::{Handler, HandlerError};
use crate::level::Level;
use crate::record::{Attr, Record};
use std::sync::Arc;

/// A handler that accepts every record and drops it.
///
/// Useful for measuring the overhead of the tracing layer itself without
/// any encoding or terminal I/O, and for tests that don't care about output.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopHandler;

impl Handler for NoopHandler {
    fn enabled(&self, _level: Level) -> bool {
        true
    }

    fn handle(&self, _record: &Record) -> Result<(), HandlerError> {
        Ok(())
    }

    fn with_attrs(&self, _attrs: Vec<Attr>) -> Arc<dyn Handler> {
        Arc::new(NoopHandler)
    }

    fn with_group(&self, _name: &str) -> Arc<dyn Handler> {
        Arc::new(NoopHandler)
    }
}
