use anyhow::Result;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cvpress::config::Config;
use cvpress::photo::PhotoLoader;
use cvpress::routes::{build_router, AppState};
use cvpress::{ArtifactStore, DocumentRenderer};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting cvpress v{}", env!("CARGO_PKG_VERSION"));

    let photos = PhotoLoader::new(&config.asset_root, &config.upload_dir)
        .with_remote(config.allow_remote_photos);
    let state = AppState::new(
        DocumentRenderer::new(photos),
        ArtifactStore::new(&config.output_dir),
    );
    info!(
        output_dir = %config.output_dir.display(),
        remote_photos = config.allow_remote_photos,
        "renderer ready"
    );

    // Allow all origins for now (you can restrict later)
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr = config.addr()?;
    info!("PDF engine listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
