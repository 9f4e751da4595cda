use log::{error, info};
use recipe_saver::{api, AppConfig, RecipeService};
use std::env;
use std::process::ExitCode;
use std::sync::Arc;

#[tokio::main]
async fn main() -> ExitCode {
    if env::args().skip(1).any(|arg| arg == "--version" || arg == "-V") {
        println!("recipe-saver {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    info!("recipe-saver {}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load()?;
    let service = Arc::new(RecipeService::from_config(&config)?);
    let _sweepers = service.spawn_cache_sweepers();

    let app = api::router(service);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutting down");
}
