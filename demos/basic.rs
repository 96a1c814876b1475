use tracing::{debug, error, info, info_span, warn};

use tracing_color_handler::env::COLOR_LOG_LEVEL_ENV;
use tracing_color_handler::init::{init_tracing_with_config, LayerConfig};
use tracing_color_handler::level::Level;

fn main() {
    let mut config = LayerConfig::from_env();
    if std::env::var_os(COLOR_LOG_LEVEL_ENV).is_none() {
        config.level = Level::DEBUG;
    }
    init_tracing_with_config(config);

    info!("starting service");

    let span = info_span!("request", request_id = "r-42", route = "/login");
    let _guard = span.enter();

    debug!(user_id = 42, "looking up user");
    warn!(attempts = 3, "password retry limit close");
    error!(
        user_id = 42,
        reason = "invalid password",
        "authentication failed"
    );
}
