use std::sync::Arc;
use std::time::Duration;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use docsheet_acquisition::DocumentReader;
use docsheet_workflow::Workflow;

mod handlers;
mod routes;
mod scheduler;
mod state;

use state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("docsheet=info".parse()?))
        .init();

    let config = docsheet_core::AppConfig::from_env();
    let host = config.server_host.clone();
    let port = config.server_port;

    let completion = docsheet_llm::completion_from_config(&config)?;
    let acquisition = Arc::new(DocumentReader::from_config(&config));
    let workflow = Arc::new(Workflow::from_config(&config, acquisition, completion));

    tokio::fs::create_dir_all(&config.upload_dir).await?;
    tokio::fs::create_dir_all(&config.output_dir).await?;

    tokio::spawn(scheduler::run_output_sweeper(
        config.output_dir.clone(),
        Duration::from_secs(config.output_ttl_secs),
    ));

    let state = AppState { config, workflow };

    let app = routes::create_router()
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = format!("{host}:{port}");
    tracing::info!("Docsheet server listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
