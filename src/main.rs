use slc_serve::{config, model, server};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "slc_serve=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. ORT runtime
    model::loader::init_ort()?;

    // 3. Load Config
    let config = config::AppConfig::from_file(".env")?;

    // 4. Load Model
    let classifier = model::SignClassifier::load(&config.model.path)?;
    let state = server::types::AppState {
        predictor: Arc::new(classifier),
    };

    // 5. Create Router
    let app = server::routes::create_router(state);

    // 6. Bind & Serve
    let listener = TcpListener::bind(config.bind_addr()).await?;
    tracing::info!(
        "Server listening on http://{}:{}",
        config.server.host,
        config.server.port
    );

    axum::serve(listener, app).await?;

    Ok(())
}
