use crate::color::ColorHandler;
use crate::handler::Handler;
use crate::init::LayerConfig;
use crate::level::Level;
use crate::record::{Attr, Record};
use chrono::Local;
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{span, Event, Metadata, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// `tracing_subscriber` layer that turns events into [`Record`]s and passes
/// them to a [`Handler`].
///
/// Fields recorded on enclosing spans are bound to the handler with
/// [`Handler::with_attrs`] before the event is handled, outermost span
/// first. With span groups enabled, every span additionally opens a group
/// named after itself, so its fields (and the event's) nest under it.
///
/// Handler failures never reach the application; they are printed to
/// stderr and the event is dropped.
pub struct ColorLayer {
    handler: Arc<dyn Handler>,
    span_groups: bool,
}

impl ColorLayer {
    pub fn new(handler: Arc<dyn Handler>) -> Self {
        Self { handler, span_groups: false }
    }

    /// Layer printing through a [`ColorHandler`] built from `config`.
    pub fn from_config(config: &LayerConfig) -> Self {
        Self::new(Arc::new(ColorHandler::from_config(config))).with_span_groups(config.span_groups)
    }

    pub fn with_span_groups(mut self, enabled: bool) -> Self {
        self.span_groups = enabled;
        self
    }

    /// Handler with the attributes (and groups) of every span in `scope`
    /// applied, outermost first.
    fn scoped_handler<S>(&self, event: &Event<'_>, ctx: &Context<'_, S>) -> Arc<dyn Handler>
    where
        S: Subscriber + for<'span> LookupSpan<'span>,
    {
        let mut handler = Arc::clone(&self.handler);
        let Some(scope) = ctx.event_scope(event) else {
            return handler;
        };

        for span in scope.from_root() {
            if self.span_groups {
                handler = handler.with_group(span.name());
            }
            if let Some(SpanAttrs(attrs)) = span.extensions().get::<SpanAttrs>() {
                if !attrs.is_empty() {
                    handler = handler.with_attrs(attrs.clone());
                }
            }
        }
        handler
    }
}

/// Fields recorded on a span, stored in its extensions.
struct SpanAttrs(Vec<Attr>);

fn visit_fields(record: impl FnOnce(&mut FieldVisitor<'_>)) -> (Vec<Attr>, Option<String>) {
    let mut fields = Vec::new();
    let mut message = None;
    record(&mut FieldVisitor { fields: &mut fields, message: &mut message });
    (fields, message)
}

/// Span fields, with a `message` field kept as an ordinary attribute.
fn span_fields(record: impl FnOnce(&mut FieldVisitor<'_>)) -> Vec<Attr> {
    let (mut fields, message) = visit_fields(record);
    if let Some(message) = message {
        fields.push(Attr::new(MESSAGE_FIELD, message));
    }
    fields
}

const MESSAGE_FIELD: &str = "message";

impl<S> Layer<S> for ColorLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn enabled(&self, metadata: &Metadata<'_>, _ctx: Context<'_, S>) -> bool {
        // Spans carry attributes for the events inside them, so they are
        // always kept.
        metadata.is_span() || self.handler.enabled(Level::from(metadata.level()))
    }

    fn on_new_span(&self, attrs: &span::Attributes<'_>, id: &span::Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let fields = span_fields(|visitor| attrs.record(visitor));
        span.extensions_mut().insert(SpanAttrs(fields));
    }

    fn on_record(&self, id: &span::Id, values: &span::Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let fields = span_fields(|visitor| values.record(visitor));
        let mut extensions = span.extensions_mut();
        match extensions.get_mut::<SpanAttrs>() {
            Some(SpanAttrs(existing)) => existing.extend(fields),
            None => extensions.insert(SpanAttrs(fields)),
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let level = Level::from(event.metadata().level());
        if !self.handler.enabled(level) {
            return;
        }

        let (attrs, message) = visit_fields(|visitor| event.record(visitor));
        let record = Record {
            time: Local::now(),
            level,
            message: message.unwrap_or_default(),
            attrs,
        };

        let handler = self.scoped_handler(event, &ctx);
        if let Err(e) = handler.handle(&record) {
            eprintln!("error handling log record: {}", e);
        }
    }
}

/// Collects `tracing` fields as [`Attr`]s, splitting out the message.
pub struct FieldVisitor<'a> {
    pub fields: &'a mut Vec<Attr>,
    pub message: &'a mut Option<String>,
}

impl<'a> FieldVisitor<'a> {
    fn push(&mut self, field: &Field, value: serde_json::Value) {
        self.fields.push(Attr::new(field.name(), value));
    }
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == MESSAGE_FIELD {
            *self.message = Some(value.to_string());
        } else {
            self.push(field, serde_json::Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.push(field, serde_json::Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.push(field, serde_json::Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.push(field, serde_json::Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.push(field, serde_json::Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.push(field, serde_json::Value::String(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == MESSAGE_FIELD {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.push(field, serde_json::Value::String(format!("{:?}", value)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ansi;
    use crate::buffer::SharedBuffer;
    use serde_json::{json, Value};
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::Registry;

    fn capture(level: Level, span_groups: bool, body: impl FnOnce()) -> String {
        let out = SharedBuffer::new();
        let handler = Arc::new(ColorHandler::with_writer(level, out.clone()));
        let layer = ColorLayer::new(handler).with_span_groups(span_groups);
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::with_default(subscriber, body);
        ansi::strip(&out.to_string_lossy())
    }

    fn attrs_of(line: &str) -> Value {
        let start = line.find('{').unwrap();
        serde_json::from_str(&line[start..]).unwrap()
    }

    #[test]
    fn event_fields_become_attrs() {
        let out = capture(Level::INFO, false, || {
            tracing::warn!(user = "ann", attempts = 3, locked = true, "login refused");
        });

        assert!(out.contains(" WARN: login refused {"));
        assert_eq!(attrs_of(&out), json!({"user": "ann", "attempts": 3, "locked": true}));
    }

    #[test]
    fn events_below_threshold_are_skipped() {
        let out = capture(Level::WARN, false, || {
            tracing::trace!("trace");
            tracing::debug!("debug");
            tracing::info!("info");
        });
        assert!(out.is_empty());

        let out = capture(Level(-8), false, || tracing::trace!("very fine"));
        assert!(out.contains("DEBUG-4: very fine {}"));
    }

    #[test]
    fn span_fields_are_bound_outermost_first() {
        let out = capture(Level::INFO, false, || {
            let outer = tracing::info_span!("request", id = 7, route = "/login");
            let _outer = outer.enter();
            let inner = tracing::info_span!("db", table = "users");
            let _inner = inner.enter();
            tracing::info!(rows = 1, "query done");
        });

        assert_eq!(
            attrs_of(&out),
            json!({"id": 7, "route": "/login", "table": "users", "rows": 1})
        );
    }

    #[test]
    fn span_groups_nest_attrs_under_span_names() {
        let out = capture(Level::INFO, true, || {
            let outer = tracing::info_span!("request", id = 7);
            let _outer = outer.enter();
            let inner = tracing::info_span!("db");
            let _inner = inner.enter();
            tracing::info!(rows = 1, "query done");
        });

        assert_eq!(attrs_of(&out), json!({"request": {"id": 7, "db": {"rows": 1}}}));
    }

    #[test]
    fn late_recorded_span_fields_are_included() {
        let out = capture(Level::INFO, false, || {
            let span = tracing::info_span!("job", status = tracing::field::Empty);
            span.record("status", "running");
            let _guard = span.enter();
            tracing::info!("tick");
        });

        assert_eq!(attrs_of(&out), json!({"status": "running"}));
    }

    #[test]
    fn visitor_splits_message_from_fields() {
        let out = capture(Level::INFO, false, || {
            tracing::error!(ratio = 0.25, detail = ?vec![1, 2], "formatted {}", 42);
        });
        assert!(out.contains(" ERROR: formatted 42 {"));
        assert_eq!(attrs_of(&out), json!({"ratio": 0.25, "detail": "[1, 2]"}));
    }
}
