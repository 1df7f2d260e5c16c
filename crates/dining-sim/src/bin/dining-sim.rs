//! Dining Table Simulation
//!
//! Seat the diners, run every meal and print who finished in what order.
//!
//! Usage: `dining-sim [--json] [meals] [seed] [names...]`

use dining_sim::{Simulation, SimulationConfig};
use std::env;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing; stdout is reserved for the report
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dining_sim=info,dining_protocol=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Parse command line args
    let mut json = false;
    let mut args: Vec<String> = Vec::new();
    for arg in env::args().skip(1) {
        if arg == "--json" {
            json = true;
        } else {
            args.push(arg);
        }
    }

    let mut config = SimulationConfig::default();

    if let Some(meals) = args.first() {
        config = config.with_meals(meals.parse()?);
    }
    if let Some(seed) = args.get(1) {
        // "-" keeps the run unseeded
        if seed != "-" {
            config = config.with_seed(seed.parse()?);
        }
    }
    if args.len() > 2 {
        config = config.with_names(args[2..].iter().cloned());
    }

    let sim = Simulation::new(config)?;

    if !json {
        println!("Dining Table");
        println!("============");
        println!();
        println!(
            "Seating {} diners, {} meals each...",
            sim.table().len(),
            sim.config().meals
        );
        println!();
    }

    let report = sim.run().await?;

    if json {
        for event in &report.events {
            println!("{}", serde_json::to_string(event)?);
        }
        return Ok(());
    }

    for event in &report.events {
        println!(
            "  [{:>5}] {}: {}",
            event.seq,
            report.name_of(event.diner),
            event.kind.label()
        );
    }

    println!();
    println!("Finish order:");
    for (place, name) in report.finish_names().iter().enumerate() {
        println!("  {}. {}", place + 1, name);
    }

    println!();
    println!("Run complete:");
    println!("  Meals: {}", report.stats.total_meals());
    println!("  Back-offs: {}", report.stats.total_backoffs());
    println!("  Longest back-off streak: {}", report.stats.longest_streak());
    if let Some(timeline) = &report.timeline {
        println!("  Events: {}", timeline.events);
        println!("  Most diners eating at once: {}", timeline.max_concurrent_eaters);
    }
    if let Some(hungriest) = report.stats.hungriest() {
        println!(
            "  Hungriest: {} ({} back-offs)",
            report.name_of(hungriest.diner),
            hungriest.backoffs
        );
    }
    println!("  Elapsed: {:?}", report.stats.elapsed);

    Ok(())
}
