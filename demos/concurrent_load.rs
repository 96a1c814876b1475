use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

use tracing_color_handler::color::ColorHandler;
use tracing_color_handler::layer::ColorLayer;
use tracing_color_handler::level::Level;
use tracing_color_handler::noop::NoopHandler;

const TASKS: u64 = 8;
const PER_TASK: u64 = 10_000;

async fn run(label: &str, dispatch: tracing::Dispatch) {
    let start = Instant::now();

    let mut handles = Vec::new();
    for task in 0..TASKS {
        let dispatch = dispatch.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            tracing::dispatcher::with_default(&dispatch, || {
                for i in 0..PER_TASK {
                    info!(task, iteration = i, "load test event");
                }
            });
        }));
    }
    for handle in handles {
        if let Err(e) = handle.await {
            eprintln!("{}: load task failed: {}", label, e);
        }
    }

    let n = TASKS * PER_TASK;
    let elapsed = start.elapsed();
    eprintln!("{}: {} events in {:?} (~{:.0} ev/s)",
        label,
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );
}

#[tokio::main]
async fn main() {
    // Layer overhead alone.
    let noop = Registry::default().with(ColorLayer::new(Arc::new(NoopHandler)));
    run("noop handler", tracing::Dispatch::new(noop)).await;

    // Full JSON encode/decode and colorized output to a discarded writer.
    let handler = ColorHandler::with_writer(Level::INFO, std::io::sink());
    let color = Registry::default().with(ColorLayer::new(Arc::new(handler)));
    run("color handler", tracing::Dispatch::new(color)).await;
}
