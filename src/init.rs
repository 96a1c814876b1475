use crate::env::{parse_flag, COLOR_LOG_LEVEL_ENV, COLOR_LOG_SPAN_GROUPS_ENV, COLOR_LOG_TARGET_ENV};
use crate::layer::ColorLayer;
use crate::level::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Stream that colorized lines are written to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Target {
    #[default]
    Stdout,
    Stderr,
}

/// Configuration of the colorizing layer.
///
/// **Fields**
/// - `level`: minimum [`Level`] that is printed.
/// - `span_groups`: if `true`, fields of enclosing spans are nested under
///   a group named after each span instead of being merged flat.
/// - `target`: stream the lines go to.
#[derive(Clone, Debug)]
pub struct LayerConfig {
    pub level: Level,
    pub span_groups: bool,
    pub target: Target,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            span_groups: false,
            target: Target::Stdout,
        }
    }
}

impl LayerConfig {
    /// Defaults overridden by `COLOR_LOG_*` environment variables.
    ///
    /// Values that cannot be parsed are ignored and the default is kept.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`LayerConfig::from_env`] with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(level) = lookup(COLOR_LOG_LEVEL_ENV).and_then(|v| v.parse().ok()) {
            config.level = level;
        }
        if let Some(flag) = lookup(COLOR_LOG_SPAN_GROUPS_ENV).as_deref().and_then(parse_flag) {
            config.span_groups = flag;
        }
        if let Some(target) = lookup(COLOR_LOG_TARGET_ENV) {
            match target.trim().to_ascii_lowercase().as_str() {
                "stdout" => config.target = Target::Stdout,
                "stderr" => config.target = Target::Stderr,
                _ => {}
            }
        }

        config
    }
}

/// Error returned when the global subscriber cannot be installed.
#[derive(thiserror::Error, Debug)]
#[error("cannot install global subscriber: {0}")]
pub struct InitError(#[from] tracing::subscriber::SetGlobalDefaultError);

/// Install a [`Registry`] combined with [`ColorLayer`] as the global
/// default subscriber.
///
/// **Returns**
/// - `Err(..)` if a global subscriber was already set.
pub fn try_init_tracing_with_config(config: LayerConfig) -> Result<(), InitError> {
    let layer = ColorLayer::from_config(&config);
    let subscriber = Registry::default().with(layer);
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Like [`try_init_tracing_with_config`], panicking if a global subscriber
/// is already installed.
pub fn init_tracing_with_config(config: LayerConfig) {
    try_init_tracing_with_config(config).expect("set global subscriber");
}

/// Initialize tracing with colorized output at `level` and above.
///
/// Equivalent to calling [`init_tracing_with_config`] with
/// [`LayerConfig::default`] and the given level. This is the recommended
/// entrypoint for binaries.
pub fn init_tracing(level: Level) {
    init_tracing_with_config(LayerConfig { level, ..LayerConfig::default() });
}
