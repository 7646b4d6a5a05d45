//! Records Console
//!
//! Terminal administration console for student and faculty records kept by a
//! REST backend.

use std::io::IsTerminal;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use records_console::api::HttpStore;
use records_console::config::{Config, LogFormat};
use records_console::console::{Console, Style};
use records_console::views::settings::Settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging; stdout belongs to the console
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }

    for fallback in &config.fallbacks {
        tracing::warn!("{}", fallback);
    }

    tracing::info!("Starting records console");
    tracing::info!("Backend: {}", config.base_url);
    tracing::info!("Settings path: {:?}", config.settings_path);
    tracing::info!("Request timeout: {:?}", config.request_timeout);

    let settings = Settings::load(&config.settings_path).await;
    let style = if std::io::stdout().is_terminal() {
        Style::for_theme(settings.theme)
    } else {
        Style::plain()
    };

    let backend = HttpStore::connect(&config).await?;
    if !backend.has_csrf_token() {
        tracing::warn!("Continuing without a CSRF token (set RECORDS_CSRF_TOKEN)");
    }

    Console::new(backend, settings, config.settings_path.clone(), style)
        .run()
        .await?;

    tracing::info!("Console closed");
    Ok(())
}
