//! sim-runner: headless simulation runner for Lifesim.
//!
//! Usage:
//!   sim-runner --seed 12345 --steps 520
//!   sim-runner --config sim.json --steps 52 --json
//!   sim-runner --population 500 --steps 100

use anyhow::Result;
use lifesim_core::{
    config::SimConfig,
    engine::SimEngine,
    population::Census,
    scheduler::DeadLetter,
};
use std::env;

#[derive(serde::Serialize)]
struct RunSummary {
    seed:           u64,
    steps:          u64,
    start_date:     chrono::NaiveDate,
    final_date:     chrono::NaiveDate,
    queued_events:  usize,
    final_census:   Census,
    census_history: Vec<Census>,
    dead_letters:   Vec<DeadLetter>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let json = args.iter().any(|a| a == "--json");
    let mut config = match find_arg(&args, "--config") {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default_test(),
    };
    config.seed = parse_arg(&args, "--seed", config.seed);
    config.seeding.initial_population =
        parse_arg(&args, "--population", config.seeding.initial_population);
    let steps = parse_arg(&args, "--steps", 52u64);

    if !json {
        println!("Lifesim — sim-runner");
        println!("  seed:        {}", config.seed);
        println!("  population:  {}", config.seeding.initial_population);
        println!("  steps:       {steps}");
        println!("  speed:       {:?}", config.speed);
        println!();
    }

    let mut engine = SimEngine::build(config)?;
    if let Err(e) = engine.run_steps(steps) {
        log::error!("run stopped at step {}: {e}", engine.steps_run());
        if !json {
            println!("!! run stopped at step {}: {e}", engine.steps_run());
        }
    }

    let summary = RunSummary {
        seed:           engine.config.seed,
        steps:          engine.steps_run(),
        start_date:     engine.config.start_date,
        final_date:     engine.now(),
        queued_events:  engine.scheduler.len(),
        final_census:   engine.census(),
        census_history: engine.census_history(),
        dead_letters:   engine.scheduler.dead_letters(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(s: &RunSummary) {
    println!("=== RUN SUMMARY ===");
    println!("  steps run:     {}", s.steps);
    println!("  dates:         {} .. {}", s.start_date, s.final_date);
    println!("  living:        {}", s.final_census.living);
    println!("  deceased:      {}", s.final_census.deceased);
    println!("  partnered:     {}", s.final_census.partnered);
    println!("  queued events: {}", s.queued_events);
    println!("  dead letters:  {}", s.dead_letters.len());

    println!();
    println!("=== LIFE STAGES ===");
    for (stage, count) in &s.final_census.by_stage {
        println!("  {:<12} {count}", format!("{stage:?}"));
    }

    if !s.census_history.is_empty() {
        println!();
        println!("=== CENSUS HISTORY ===");
        for c in &s.census_history {
            let date = c.date.map(|d| d.to_string()).unwrap_or_default();
            println!(
                "  {date} | living {:>5} | deceased {:>5} | partnered {:>5}",
                c.living, c.deceased, c.partnered
            );
        }
    }
}

fn find_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    find_arg(args, flag)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
