/// Installs a fmt subscriber filtered by `RUST_LOG`, defaulting to `default_filter`.
///
/// Safe to call more than once; later calls are ignored once a global subscriber exists.
pub fn init_tracing(default_filter: &str) {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
