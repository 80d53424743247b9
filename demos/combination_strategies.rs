//! Compare combination strategies on a simulated forecast history.
//!
//! Three indicators with different error profiles forecast the same target
//! for twelve quarters. The weights each strategy assigns are then printed
//! side by side for one set of current nowcasts.

use chrono::NaiveDate;
use midas_nowcast::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut rng = StdRng::seed_from_u64(7);

    // (indicator, bias, noise scale)
    let profiles = [("precise", 0.0, 0.1), ("biased", 0.4, 0.1), ("noisy", 0.0, 0.8)];

    let mut table = HistoryTable::new();
    for t in 0..12 {
        let actual = 1.5 + (t as f64 * 0.8).sin();
        let forecasts: Vec<(&str, f64)> = profiles
            .iter()
            .map(|&(name, bias, scale)| (name, actual + bias + rng.gen_range(-1.0..1.0f64) * scale))
            .collect();
        let date = NaiveDate::from_ymd_opt(2021 + t / 4, (t as u32 % 4) * 3 + 3, 28).unwrap();
        update_forecast_history(&mut table, forecasts, actual, date);
    }

    println!("{}", "=".repeat(80));
    println!("FORECAST HISTORY");
    println!("{}", "=".repeat(80));
    println!("{:<10} {:>8} {:>8} {:>8} {:>8}", "indicator", "n", "rmse", "mae", "dir.acc");
    for (name, history) in table.iter() {
        println!(
            "{:<10} {:>8} {:>8.4} {:>8.4} {:>8.2}",
            name,
            history.len(),
            history.calculate_rmse(None),
            history.calculate_mae(None),
            history.calculate_directional_accuracy(None)
        );
    }
    println!();

    // current nowcasts with their information criteria (lower is better)
    let candidates = vec![
        Candidate::new("precise", 1.82, -41.0),
        Candidate::new("biased", 2.20, -38.5),
        Candidate::new("noisy", 1.10, -12.0),
    ];

    println!("{}", "=".repeat(80));
    println!("WEIGHTS BY STRATEGY");
    println!("{}", "=".repeat(80));
    print!("{:<18}", "strategy");
    for c in &candidates {
        print!(" {:>9}", c.indicator);
    }
    println!(" {:>10} {:>9}", "combined", "fallback");

    let combiner = ForecastCombiner::new(&table);
    for strategy in CombinationStrategy::all() {
        let weights = combiner.weights(strategy, &candidates);
        print!("{:<18}", strategy.name());
        for c in &candidates {
            print!(" {:>9.4}", weights.get(&c.indicator).unwrap_or(0.0));
        }
        match weights.apply(&candidates) {
            Some(value) => print!(" {:>10.4}", value),
            None => print!(" {:>10}", "-"),
        }
        println!(" {:>9}", weights.is_fallback());
    }
    println!();

    // strategies can also be read from configuration
    let toml = "[combination]\nprimary = { kind = \"rmse\", window = 4 }\n";
    let configured = match NowcastConfig::from_toml_str(toml) {
        Ok(config) => config.combination.primary,
        Err(e) => {
            eprintln!("bad configuration: {}", e);
            return;
        }
    };
    println!(
        "configured {} -> {:?}",
        configured,
        combiner.combine(configured, &candidates)
    );
}
