//! Subscriber setup shared by `vocab-server` and `import_posts`, so a seed
//! import run by hand logs with the same filter and format as the server.

const DEFAULT_FILTER: &str = "vocab_server=debug,axum=info,tower_http=info";

/// `RUST_LOG` picks the filter, `LOG_FORMAT=json` switches to JSON lines.
pub fn init_tracing() {
    let builder =
        tracing_subscriber::fmt().with_env_filter(filter_directive(std::env::var("RUST_LOG").ok()));

    if wants_json(std::env::var("LOG_FORMAT").ok().as_deref()) {
        builder.with_target(false).json().init();
    } else {
        builder.init();
    }
}

fn filter_directive(rust_log: Option<String>) -> String {
    rust_log
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

fn wants_json(log_format: Option<&str>) -> bool {
    log_format.is_some_and(|v| v.trim().eq_ignore_ascii_case("json"))
}
