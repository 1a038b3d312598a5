//! `caliper status` — Show configuration and system status.

use caliper_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    println!("📏 Caliper Status");
    println!("=================");
    println!("  Config dir:   {}", AppConfig::config_dir().display());
    println!(
        "  Bank:         {}",
        if config.bank.path.is_empty() {
            "built-in demo bank"
        } else {
            &config.bank.path
        }
    );
    println!("  Store:        {}", config.store.backend);
    println!("  Gateway:      {}:{}", config.gateway.host, config.gateway.port);
    println!("  Items:        {} min / {} max", config.assessment.min_items, config.assessment.max_items);
    println!("  Target SE:    {}", config.assessment.target_se);
    println!(
        "  Time budget:  {}",
        config
            .assessment
            .max_seconds
            .map(|s| format!("{s}s"))
            .unwrap_or_else(|| "none".into())
    );
    println!("  θ range:      [{}, {}]", config.assessment.theta_min, config.assessment.theta_max);
    println!(
        "  Abandonment:  after {}s, swept every {}s",
        config.sessions.abandon_after_secs, config.sessions.sweep_interval_secs
    );

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file — run `caliper onboard` first");
    }

    Ok(())
}
