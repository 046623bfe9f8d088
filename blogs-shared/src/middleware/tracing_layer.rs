use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// `BLOGS_ENV=production` switches to JSON lines; anything else is the
/// human-readable format.
fn json_output() -> bool {
    std::env::var("BLOGS_ENV").is_ok_and(|env| env.eq_ignore_ascii_case("production"))
}

/// Installs the global subscriber. `RUST_LOG` wins over the default filter.
pub fn init_tracing(service_name: &str) {
    let crate_target = service_name.replace('-', "_");
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "info,{crate_target}=debug,blogs_shared=debug,tower_http=info"
        ))
    });

    let registry = tracing_subscriber::registry().with(env_filter);
    if json_output() {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_line_number(true),
            )
            .init();
    }

    tracing::info!(service = service_name, json = json_output(), "tracing initialized");
}
