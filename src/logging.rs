use tracing::Level;

/// Map a user supplied level name to a tracing level. Unknown names fall back
/// to DEBUG in debug builds and INFO otherwise.
pub fn parse_level(name: Option<&str>) -> Level {
    match name.map(|s| s.trim().to_uppercase()).as_deref() {
        Some("TRACE") => Level::TRACE,
        Some("DEBUG") => Level::DEBUG,
        Some("INFO") => Level::INFO,
        Some("WARN") => Level::WARN,
        Some("ERROR") => Level::ERROR,
        _ if cfg!(debug_assertions) => Level::DEBUG,
        _ => Level::INFO,
    }
}

/// Install the global subscriber. Later calls are ignored.
#[cfg(target_arch = "wasm32")]
pub fn init(max_level: Level) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_wasm::WASMLayerConfigBuilder;

    let mut builder = WASMLayerConfigBuilder::new();
    builder.set_max_level(max_level);
    let _ = tracing_subscriber::registry()
        .with(tracing_wasm::WASMLayer::new(builder.build()))
        .try_init();
}

/// Install the global subscriber. Later calls are ignored.
#[cfg(not(target_arch = "wasm32"))]
pub fn init(max_level: Level) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(max_level.as_str().to_lowercase()));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
