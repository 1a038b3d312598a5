//! `caliper simulate` — run simulated respondents against a bank.
//!
//! Useful for sanity-checking a freshly calibrated bank: with enough items
//! the final estimates should cluster around the true ability.

use std::sync::Arc;

use caliper_bank::{InMemoryBank, demo_bank, load_bank};
use caliper_config::AppConfig;
use caliper_core::bank::ItemBank;
use caliper_core::event::EventBus;
use caliper_engine::{Orchestrator, SettingsOverrides, run_simulated_session};
use caliper_store::InMemoryStore;

pub async fn run(
    theta: f64,
    sessions: usize,
    seed: u64,
    bank_path: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().unwrap_or_default();

    let bank: Arc<dyn ItemBank> = match &bank_path {
        Some(path) => {
            let bank: InMemoryBank = load_bank(std::path::Path::new(path))?;
            Arc::new(bank)
        }
        None => Arc::new(demo_bank()),
    };

    let orchestrator = Orchestrator::new(
        bank,
        Arc::new(InMemoryStore::new()),
        Arc::new(EventBus::default()),
        config.assessment.settings(),
        config.estimator.clone(),
    );

    println!("📏 Caliper Simulation");
    println!("   True θ:    {theta:+.2}");
    println!("   Sessions:  {sessions}");
    println!(
        "   Bank:      {}",
        bank_path.as_deref().unwrap_or("built-in demo bank")
    );
    println!();

    let mut total_items = 0usize;
    let mut total_abs_err = 0.0f64;

    for i in 0..sessions {
        let result = run_simulated_session(
            &orchestrator,
            theta,
            seed + i as u64,
            SettingsOverrides::default(),
        )
        .await?;

        let err = result.final_theta - theta;
        total_items += result.items_administered;
        total_abs_err += err.abs();

        println!(
            "  #{:<3} θ̂ = {:+.3}  SE = {:.3}  items = {:<3} reason = {:?}",
            i + 1,
            result.final_theta,
            result.final_standard_error,
            result.items_administered,
            result.reason,
        );

        if sessions == 1 {
            println!();
            println!("  Trajectory:");
            for (n, point) in result.trajectory.iter().enumerate() {
                println!(
                    "    {:>2}. {:<10} {}  θ = {:+.3}  SE = {:.3}",
                    n + 1,
                    point.item_id,
                    if point.correct { "✓" } else { "✗" },
                    point.theta,
                    point.standard_error,
                );
            }
        }
    }

    if sessions > 1 {
        println!();
        println!("  Mean items/session: {:.1}", total_items as f64 / sessions as f64);
        println!("  Mean |θ̂ − θ|:       {:.3}", total_abs_err / sessions as f64);
    }

    Ok(())
}
