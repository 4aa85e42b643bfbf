use fpa_copilot::{agent::Copilot, api::start_server, data};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    // Load environment variables
    dotenv::dotenv().ok();

    let data_dir =
        std::env::var("FPA_DATA_DIR").unwrap_or_else(|_| "fixtures".to_string());

    let api_port: u16 = std::env::var("PORT")
        .or_else(|_| std::env::var("API_PORT"))
        .unwrap_or_else(|_| "8080".to_string())
        .parse()?;

    info!("FP&A Copilot - API Server");
    info!("Data directory: {}", data_dir);
    info!("Port: {}", api_port);

    let snapshot = Arc::new(data::load_dir(&data_dir)?);
    let copilot = Arc::new(Copilot::new(snapshot));

    info!("Snapshot loaded, starting API server");

    start_server(copilot, api_port).await?;

    Ok(())
}
