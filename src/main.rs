use color_eyre::eyre::Result;
use dentiro_api::config::ApiConfig;
use dentiro_webhooks::create_client;
use dotenv::dotenv;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Load environment variables
    dotenv().ok();

    // Load configuration
    let config = ApiConfig::from_env()?;

    // Connect to the automation webhooks
    let webhooks = create_client(config.webhooks.clone(), config.webhook_timeout)?;

    // Start API server
    dentiro_api::start_server(config, webhooks).await?;

    Ok(())
}
