//! `caliper serve` — Start the HTTP assessment server.

use caliper_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("📏 Caliper Server");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!(
        "   Bank:      {}",
        if config.bank.path.is_empty() {
            "built-in demo bank"
        } else {
            &config.bank.path
        }
    );
    println!("   Store:     {}", config.store.backend);

    caliper_gateway::start(config).await?;

    Ok(())
}
