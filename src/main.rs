use std::sync::Arc;

use anyhow::Context;
use bookstore::config::{AppConfig, StoreBackend};
use bookstore::memory::MemoryStore;
use bookstore::mongo::MongoStore;
use bookstore::observability::init_tracing;
use bookstore::openapi::ApiDoc;
use bookstore::routes::create_router;
use bookstore::state::AppState;
use bookstore::store::Store;
use tracing::{info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::from_env().context("loading configuration")?;

    let store: Arc<dyn Store> = match config.store_backend {
        StoreBackend::Mongo => {
            let uri = config
                .mongodb_uri
                .as_deref()
                .context("MONGODB_URI is required for the mongo backend")?;
            let store = MongoStore::connect(uri, &config.database_name, config.request_timeout)
                .await
                .context("connecting to MongoDB")?;
            Arc::new(store)
        }
        StoreBackend::Memory => {
            warn!("Using the in-memory store; data is lost on shutdown");
            Arc::new(MemoryStore::new())
        }
    };

    let addr = config.bind_address();
    let app = create_router(AppState::new(store, config)).merge(
        SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("Server running on http://{}", addr);
    info!("Swagger UI: http://{}/swagger-ui/", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
