use letsrefine::{start_server, LoggingConfig, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    LoggingConfig::from_env().init();

    // Listen address from LETSREFINE_ADDR, default 0.0.0.0:50051
    let config = ServerConfig::from_env()?;
    start_server(config).await?;

    Ok(())
}
