//! Weekly nowcast updates through one quarter with the Mexican release calendar.
//!
//! Run with `RUST_LOG=midas_nowcast=debug cargo run --example weekly_nowcast`
//! to see skipped lag combinations and combiner fallbacks.

use chrono::{Duration, NaiveDate};
use midas_nowcast::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const INDICATORS: [&str; 4] = ["EAI", "PMI_M", "PMI_NM", "RETSALES"];

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut rng = StdRng::seed_from_u64(2024);
    let start = NaiveDate::from_ymd_opt(2010, 1, 1).unwrap();

    // monthly indicators through June 2024, a common cycle plus noise
    let months = 14 * 12 + 6;
    let cycle: Vec<f64> = (0..months).map(|i| (i as f64 * 0.21).sin()).collect();
    let mut panel = Vec::new();
    for (k, name) in INDICATORS.iter().enumerate() {
        let loading = 0.6 + 0.2 * k as f64;
        let values: Vec<f64> = cycle
            .iter()
            .map(|c| loading * c + rng.gen_range(-0.25..0.25f64))
            .collect();
        panel.push((*name, values));
    }

    // quarterly growth 2010Q1..2024Q1, driven by the middle month of the quarter
    let quarters = 14 * 4 + 1;
    let gdp: Vec<f64> = (0..quarters)
        .map(|t| 0.5 + 1.2 * cycle[3 * t + 1] + rng.gen_range(-0.15..0.15f64))
        .collect();
    let history = QuarterlySeries::from_values(Quarter::new(2010, 1)?, &gdp);
    let target = QuarterlyTarget::new(history).with_last_forecast(0.4);

    let mut nowcaster = Nowcaster::new(ReleaseCalendar::mexico(), target)
        .with_model_config(MidasConfig::default().with_max_lags(2, 3))
        .with_strategy(CombinationStrategy::Criterion)
        .with_alternatives(vec![
            CombinationStrategy::rmse(),
            CombinationStrategy::Rank,
            CombinationStrategy::thick_modeling(),
        ]);
    for (name, values) in panel {
        nowcaster.add_indicator(name, MonthlySeries::new(start, values));
    }

    // pseudo out-of-sample pass over 2023 to seed the forecast history
    for q in 1..=4u32 {
        let date = NaiveDate::from_ymd_opt(2023, q * 3, 25).unwrap();
        let report = nowcaster.run(date)?;
        let actual = gdp[52 + (q as usize - 1)];
        println!(
            "2023Q{} backtest: combined {:?}, actual {:.3}",
            q, report.combined_forecast, actual
        );
        nowcaster.record_report(&report, actual, date);
    }
    println!();

    println!("Release schedule 2024 (first month of each quarter):");
    for event in nowcaster.calendar().schedule(2024).iter().take(12) {
        println!("  {}  {:<10} {}", event.release_date, event.indicator, event.quarter);
    }
    println!();

    let mut date = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
    while date <= end {
        let report = nowcaster.run(date)?;
        println!("{}", report);
        date += Duration::days(7);
    }

    Ok(())
}
