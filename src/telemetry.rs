use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Installs a JSON subscriber filtered by `RUST_LOG` (default `info`).
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,open_energy_modeller=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .try_init();
}
