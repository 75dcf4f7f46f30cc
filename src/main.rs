//! Home energy simulator entry point: CLI wiring and scenario-driven runs.

mod cli;

use std::collections::BTreeMap;
use std::process;

use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use home_energy_sim::config::ScenarioConfig;
use home_energy_sim::io::export::{DECIMALS, export_csv};
use home_energy_sim::{OptimalSystemCandidate, Optimizer, SimulationResult, simulate};

/// Everything printed with `--json`.
#[derive(Serialize)]
struct Report<'a> {
    simulation: &'a SimulationResult,
    optimizations: BTreeMap<&'static str, Option<&'a OptimalSystemCandidate>>,
}

fn load_scenario(cli: &cli::CliOptions) -> Result<ScenarioConfig, String> {
    let scenario = match (&cli.scenario, &cli.preset) {
        (Some(path), _) => ScenarioConfig::from_toml_file(path),
        (None, Some(name)) => ScenarioConfig::from_preset(name),
        (None, None) => Ok(ScenarioConfig::baseline()),
    };
    scenario.map_err(|e| e.to_string())
}

fn print_candidate(name: &str, candidate: Option<&OptimalSystemCandidate>) {
    let Some(c) = candidate else {
        println!("{name:<20} no system found");
        return;
    };
    let batteries: Vec<String> = c
        .batteries
        .iter()
        .map(|b| format!("{} x{}", b.model.id, b.quantity))
        .collect();
    println!(
        "{name:<20} solar={:.1} kW  batteries=[{}]  cost={:.0}  bill={:.2}/month  \
         payback={}  net={:.0}",
        c.solar_kw,
        batteries.join(", "),
        c.system_cost,
        c.monthly_bill_with,
        c.payback,
        c.net_savings,
    );
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::parse_args().unwrap_or_else(|e| {
        eprintln!("error: {e}");
        cli::print_usage();
        process::exit(2);
    });

    let scenario = load_scenario(&cli).unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(1);
    });

    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let (system, catalog) = scenario.resolve().unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(1);
    });

    info!(
        country = %system.country,
        solar_kw = system.solar_kw,
        batteries = system.batteries.len(),
        vehicles = system.vehicles.len(),
        "simulating scenario"
    );
    let result = simulate(&system, &scenario.assumptions);

    let optimizer = Optimizer::new(&system, &catalog)
        .with_assumptions(scenario.assumptions)
        .with_settings(scenario.optimizer);
    let optimizations: Vec<_> = cli
        .optimize
        .iter()
        .map(|&strategy| (strategy, optimizer.run(strategy)))
        .collect();

    if cli.json {
        let report = Report {
            simulation: &result,
            optimizations: optimizations
                .iter()
                .map(|(s, c)| (s.name(), c.as_ref()))
                .collect(),
        };
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("error: failed to serialize report: {e}");
                process::exit(1);
            }
        }
    } else {
        for r in result.hourly_rounded(DECIMALS) {
            println!("{r}");
        }
        println!("\n{}", result.kpis);
        println!("\n{}", result.finance);
        if !result.issues.is_empty() {
            println!("\n--- Input issues ---");
            for issue in &result.issues {
                println!("{issue}");
            }
        }
        if !optimizations.is_empty() {
            println!("\n--- Recommended systems ---");
            for (strategy, candidate) in &optimizations {
                print_candidate(strategy.name(), candidate.as_ref());
            }
        }
    }

    if let Some(ref path) = cli.hourly_out {
        if let Err(e) = export_csv(&result.hourly, path) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Hourly breakdown written to {}", path.display());
    }
}
