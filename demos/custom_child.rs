use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

use tracing_color_handler::buffer::SharedBuffer;
use tracing_color_handler::color::ColorHandler;
use tracing_color_handler::json::{suppress_builtins, HandlerOptions, JsonHandler, ReplaceAttr};
use tracing_color_handler::layer::ColorLayer;
use tracing_color_handler::level::Level;
use tracing_color_handler::record::Attr;

/// Example of supplying your own child handler. Here the child is a JSON
/// handler with an extra rewrite hook that masks secrets, but any
/// implementation of `Handler` that writes one JSON object per record into
/// the shared buffer works.
fn main() {
    let mask: ReplaceAttr = Arc::new(|_groups: &[String], attr: Attr| {
        if attr.key == "token" {
            Some(Attr::new("token", "<redacted>"))
        } else {
            Some(attr)
        }
    });

    let buffer = SharedBuffer::new();
    let child = JsonHandler::new(
        buffer.clone(),
        HandlerOptions {
            level: Level::INFO,
            replace_attr: Some(suppress_builtins(Some(mask))),
        },
    );
    let handler = ColorHandler::with_child(Arc::new(child), buffer, std::io::stdout());

    let subscriber = Registry::default().with(ColorLayer::new(Arc::new(handler)).with_span_groups(true));
    tracing::subscriber::set_global_default(subscriber).expect("set global subscriber");

    let span = tracing::info_span!("session", user = "ann");
    let _guard = span.enter();

    info!(token = "s3cr3t", "token refreshed");
    warn!(remaining = 2, "quota almost exhausted");
}
