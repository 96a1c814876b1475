use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use tracing_color_handler::ansi;
use tracing_color_handler::buffer::SharedBuffer;
use tracing_color_handler::color::ColorHandler;
use tracing_color_handler::handler::Handler;
use tracing_color_handler::layer::ColorLayer;
use tracing_color_handler::level::Level;
use tracing_color_handler::noop::NoopHandler;
use tracing_color_handler::record::{Attr, Record};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Split captured output into (message, attrs) pairs, one per record.
fn parse_lines(raw: &str) -> Vec<(String, Value)> {
    raw.split("\x1b[0m\n")
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| {
            let plain = ansi::strip(chunk);
            let brace = plain.find(" {").unwrap();
            let prefix = &plain[..brace];
            let message = prefix.splitn(3, ' ').nth(2).unwrap().to_string();
            let attrs = serde_json::from_str(&plain[brace + 1..]).unwrap();
            (message, attrs)
        })
        .collect()
}

#[test]
fn concurrent_records_never_mix_attributes() {
    const THREADS: usize = 16;
    const PER_THREAD: usize = 50;

    let out = SharedBuffer::new();
    let root = ColorHandler::with_writer(Level::DEBUG, out.clone());

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            // Half the threads log through a derived handler that shares
            // the root's buffer and lock.
            let handler: Arc<dyn Handler> = if t % 2 == 0 {
                Arc::new(root.derive_attrs(vec![Attr::new("worker", t)]))
            } else {
                root.with_group("g").with_attrs(vec![Attr::new("worker", t)])
            };
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    let marker = format!("m-{}-{}", t, i);
                    let record = Record::new(Level::INFO, marker.clone())
                        .with_attr("marker", marker)
                        .with_attr("thread", t)
                        .with_attr("seq", i);
                    handler.handle(&record).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let lines = parse_lines(&out.to_string_lossy());
    assert_eq!(lines.len(), THREADS * PER_THREAD);

    let mut seen: HashMap<String, usize> = HashMap::new();
    for (message, attrs) in &lines {
        *seen.entry(message.clone()).or_default() += 1;

        let mut parts = message.trim_start_matches("m-").split('-');
        let t: usize = parts.next().unwrap().parse().unwrap();
        let i: usize = parts.next().unwrap().parse().unwrap();

        let expected_attrs = json!({"marker": message, "thread": t, "seq": i});
        if t % 2 == 0 {
            let mut expected = expected_attrs;
            expected["worker"] = json!(t);
            assert_eq!(attrs, &expected);
        } else {
            assert_eq!(attrs["g"]["worker"], json!(t));
            assert_eq!(attrs["g"]["marker"], expected_attrs["marker"]);
            assert_eq!(attrs["g"]["thread"], expected_attrs["thread"]);
            assert_eq!(attrs["g"]["seq"], expected_attrs["seq"]);
            assert_eq!(attrs.as_object().unwrap().len(), 1);
        }
    }

    assert_eq!(seen.len(), THREADS * PER_THREAD);
    assert!(seen.values().all(|&count| count == 1));
}

#[test]
fn failed_child_does_not_leak_into_concurrent_output() {
    struct Flaky {
        inner: Arc<dyn Handler>,
        buffer: SharedBuffer,
    }

    impl Handler for Flaky {
        fn enabled(&self, level: Level) -> bool {
            self.inner.enabled(level)
        }

        fn handle(&self, record: &Record) -> Result<(), tracing_color_handler::handler::HandlerError> {
            if record.message.ends_with("-bad") {
                use std::io::Write;
                let mut buffer = self.buffer.clone();
                buffer.write_all(b"{\"leak\": true")?;
                return Err(std::io::Error::new(std::io::ErrorKind::Other, "refused").into());
            }
            self.inner.handle(record)
        }

        fn with_attrs(&self, attrs: Vec<Attr>) -> Arc<dyn Handler> {
            Arc::new(Flaky { inner: self.inner.with_attrs(attrs), buffer: self.buffer.clone() })
        }

        fn with_group(&self, name: &str) -> Arc<dyn Handler> {
            Arc::new(Flaky { inner: self.inner.with_group(name), buffer: self.buffer.clone() })
        }
    }

    let buffer = SharedBuffer::new();
    let out = SharedBuffer::new();
    let json = tracing_color_handler::json::JsonHandler::new(
        buffer.clone(),
        tracing_color_handler::json::HandlerOptions {
            level: Level::DEBUG,
            replace_attr: Some(tracing_color_handler::json::suppress_builtins(None)),
        },
    );
    let flaky = Flaky { inner: Arc::new(json), buffer: buffer.clone() };
    let handler = Arc::new(ColorHandler::with_child(Arc::new(flaky), buffer.clone(), out.clone()));

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let handler = Arc::clone(&handler);
            thread::spawn(move || {
                let mut failures = 0usize;
                for i in 0..40 {
                    let suffix = if i % 3 == 0 { "bad" } else { "ok" };
                    let record = Record::new(Level::WARN, format!("{}.{}-{}", t, i, suffix))
                        .with_attr("id", format!("{}.{}", t, i));
                    if handler.handle(&record).is_err() {
                        failures += 1;
                    }
                }
                failures
            })
        })
        .collect();

    let failures: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(failures, 8 * 14);
    assert!(buffer.is_empty());

    let raw = out.to_string_lossy();
    assert!(!raw.contains("leak"));

    let lines = parse_lines(&raw);
    assert_eq!(lines.len(), 8 * 40 - failures);
    for (message, attrs) in lines {
        let id = message.trim_end_matches("-ok");
        assert_eq!(attrs, json!({ "id": id }));
    }
}

#[test]
fn layer_serializes_events_from_many_threads() {
    let out = SharedBuffer::new();
    let handler = Arc::new(ColorHandler::with_writer(Level::INFO, out.clone()));
    let dispatch = tracing::Dispatch::new(Registry::default().with(ColorLayer::new(handler)));

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let dispatch = dispatch.clone();
            thread::spawn(move || {
                tracing::dispatcher::with_default(&dispatch, || {
                    for i in 0..25 {
                        tracing::info!(thread = t, seq = i, "event {}-{}", t, i);
                        tracing::debug!(thread = t, "filtered");
                    }
                });
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let lines = parse_lines(&out.to_string_lossy());
    assert_eq!(lines.len(), 8 * 25);
    for (message, attrs) in lines {
        assert_eq!(message, format!("event {}-{}", attrs["thread"], attrs["seq"]));
    }
}

#[test]
fn noop_handler_accepts_everything() {
    let subscriber = Registry::default().with(ColorLayer::new(Arc::new(NoopHandler)));
    tracing::subscriber::with_default(subscriber, || {
        let span = tracing::info_span!("outer", id = 1);
        let _guard = span.enter();
        tracing::trace!(n = 1, "dropped quietly");
    });

    assert!(NoopHandler.enabled(Level(-100)));
    assert!(NoopHandler.with_group("g").with_attrs(vec![]).handle(&Record::new(Level::INFO, "x")).is_ok());
}
