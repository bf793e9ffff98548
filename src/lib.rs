// モジュール定義
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
pub mod shared;
pub mod state;

pub use infrastructure::database::ConnectionPool;
pub use presentation::handlers::SyncHandler;
pub use shared::{AppConfig, AppError};
pub use state::AppState;

/// Install the process-wide tracing subscriber. Call once, before
/// constructing `AppState`.
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wayfare=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
