//src/main.rs

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use gad_backend::config::{AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Si la configuración falla, la aplicación no arranca.
    let config = Config::from_env()?;
    let app_state = AppState::new(&config).await?;

    let app = gad_backend::app(app_state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("🚀 Servidor escuchando en http://{}", addr);
    tracing::info!("📚 Swagger UI disponible en http://{}/swagger-ui", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
