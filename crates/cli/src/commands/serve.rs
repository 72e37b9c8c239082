//! `anxiousroid serve` — Start the HTTP chat API.

use anxiousroid_config::AppConfig;

pub async fn run(
    mut config: AppConfig,
    port_override: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("Anxiousroid Gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Model:     {}", config.model);
    println!("   History:   {}", config.conversation.backend);

    anxiousroid_gateway::start(config).await?;

    Ok(())
}
