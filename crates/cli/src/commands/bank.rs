//! `caliper bank` — inspect and validate an item bank file.

use caliper_bank::{InMemoryBank, demo_bank, load_bank};
use caliper_core::bank::{CandidateFilter, ItemBank};

pub async fn run(path: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let bank: InMemoryBank = match &path {
        Some(p) => load_bank(std::path::Path::new(p))?,
        None => demo_bank(),
    };

    let items = bank.candidates(&CandidateFilter::default()).await?;
    let categories = bank.categories().await;

    let (mut b_min, mut b_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut a_min, mut a_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let mut three_pl = 0usize;
    for item in &items {
        b_min = b_min.min(item.b);
        b_max = b_max.max(item.b);
        a_min = a_min.min(item.a);
        a_max = a_max.max(item.a);
        if item.c.is_some() {
            three_pl += 1;
        }
    }

    println!("📏 Caliper Bank");
    println!("===============");
    println!(
        "  Source:        {}",
        path.as_deref().unwrap_or("built-in demo bank")
    );
    println!("  Items:         {}", items.len());
    println!("  Categories:    {}", categories.join(", "));
    println!("  Difficulty b:  [{b_min:+.2}, {b_max:+.2}]");
    println!("  Discrim. a:    [{a_min:.2}, {a_max:.2}]");
    println!("  3PL items:     {three_pl}");
    println!("\n  ✅ Bank is valid");

    Ok(())
}
