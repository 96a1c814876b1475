//! Colorized terminal output for structured logs.
//!
//! [`ColorHandler`](color::ColorHandler) wraps a child [`Handler`](handler::Handler)
//! (by default a [`JsonHandler`](json::JsonHandler)) that does the
//! structured encoding, decodes what the child wrote and prints it as one
//! colored line per record. [`ColorLayer`](layer::ColorLayer) plugs any
//! handler into `tracing`.
//!
//! ```no_run
//! use tracing_color_handler::init::init_tracing;
//! use tracing_color_handler::level::Level;
//!
//! init_tracing(Level::DEBUG);
//! tracing::info!(user_id = 42, "user logged in");
//! ```

pub mod level;
pub mod record;
pub mod handler;
pub mod buffer;
pub mod json;
pub mod ansi;
pub mod color;
pub mod layer;

pub mod env;
pub mod init;
pub mod noop;
