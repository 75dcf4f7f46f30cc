use std::env;
use std::path::PathBuf;

use home_energy_sim::Strategy;
use home_energy_sim::config::ScenarioConfig;

pub struct CliOptions {
    pub scenario: Option<PathBuf>,
    pub preset: Option<String>,
    pub optimize: Vec<Strategy>,
    pub hourly_out: Option<PathBuf>,
    pub json: bool,
}

pub fn parse_args() -> Result<CliOptions, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_args_from(args)
}

fn parse_args_from(args: Vec<String>) -> Result<CliOptions, String> {
    if args.len() == 1 && (args[0] == "--help" || args[0] == "-h") {
        print_usage();
        std::process::exit(0);
    }
    parse_options(&args)
}

fn parse_strategies(value: &str) -> Result<Vec<Strategy>, String> {
    if value.eq_ignore_ascii_case("all") {
        return Ok(Strategy::ALL.to_vec());
    }
    value.split(',').map(|s| s.trim().parse()).collect()
}

fn parse_options(args: &[String]) -> Result<CliOptions, String> {
    let mut i = 0usize;
    let mut scenario = None;
    let mut preset = None;
    let mut optimize = Vec::new();
    let mut hourly_out = None;
    let mut json = false;

    while i < args.len() {
        match args[i].as_str() {
            "--scenario" => {
                i += 1;
                let path = args.next_or_err(
                    i,
                    "missing value for --scenario (expected a TOML file path)",
                )?;
                if scenario.replace(PathBuf::from(path)).is_some() {
                    return Err("--scenario provided more than once".to_string());
                }
            }
            "--preset" => {
                i += 1;
                let name =
                    args.next_or_err(i, "missing value for --preset (expected a preset name)")?;
                if preset.replace(name.to_string()).is_some() {
                    return Err("--preset provided more than once".to_string());
                }
            }
            "--optimize" => {
                i += 1;
                let value = args.next_or_err(
                    i,
                    "missing value for --optimize (expected a strategy name or `all`)",
                )?;
                for strategy in parse_strategies(value)? {
                    if !optimize.contains(&strategy) {
                        optimize.push(strategy);
                    }
                }
            }
            "--hourly-out" => {
                i += 1;
                let path =
                    args.next_or_err(i, "missing value for --hourly-out (expected a file path)")?;
                if hourly_out.replace(PathBuf::from(path)).is_some() {
                    return Err("--hourly-out provided more than once".to_string());
                }
            }
            "--json" => json = true,
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    if scenario.is_some() && preset.is_some() {
        return Err(
            "arguments `--scenario` and `--preset` are mutually exclusive; choose one source"
                .to_string(),
        );
    }

    if scenario.is_none() && preset.is_none() {
        preset = Some("baseline".to_string());
    }

    Ok(CliOptions {
        scenario,
        preset,
        optimize,
        hourly_out,
        json,
    })
}

trait SliceArgExt {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String>;
}

impl SliceArgExt for [String] {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String> {
        self.get(index)
            .map(String::as_str)
            .ok_or_else(|| err.to_string())
    }
}

pub fn print_usage() {
    eprintln!("home-energy-sim: home solar, battery, and EV energy simulator");
    eprintln!();
    eprintln!("Usage:");
    eprintln!(
        "  home-energy-sim [--scenario <path> | --preset <name>] [--optimize <strategy>] \
         [--hourly-out <path>] [--json]"
    );
    eprintln!();
    eprintln!("Presets:    {}", ScenarioConfig::PRESETS.join(", "));
    eprintln!(
        "Strategies: {}, all (comma-separated lists accepted)",
        Strategy::ALL.map(Strategy::name).join(", ")
    );
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the baseline preset is used.");
    eprintln!("Log verbosity follows RUST_LOG (default: info).");
}

#[cfg(test)]
mod tests {
    use super::parse_args_from;
    use home_energy_sim::Strategy;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn supports_scenario_cli() {
        let opts = parse_args_from(args(&["--scenario", "scenario.toml"]))
            .expect("parse should succeed");
        assert_eq!(
            opts.scenario.as_deref().and_then(|p| p.to_str()),
            Some("scenario.toml")
        );
        assert!(opts.preset.is_none());
    }

    #[test]
    fn defaults_to_baseline_preset() {
        let opts = parse_args_from(Vec::new()).expect("parse should succeed");
        assert_eq!(opts.preset.as_deref(), Some("baseline"));
        assert!(opts.optimize.is_empty());
        assert!(!opts.json);
    }

    #[test]
    fn parses_optimize_lists_and_all() {
        let opts = parse_args_from(args(&["--optimize", "off_grid,payback", "--json"]))
            .expect("parse should succeed");
        assert_eq!(
            opts.optimize,
            vec![Strategy::OffGrid, Strategy::MinimumPayback]
        );
        assert!(opts.json);

        let opts = parse_args_from(args(&["--optimize", "all"])).expect("parse should succeed");
        assert_eq!(opts.optimize.len(), 4);
    }

    #[test]
    fn rejects_conflicting_sources() {
        assert!(parse_args_from(args(&["--scenario", "a.toml", "--preset", "baseline"])).is_err());
        assert!(parse_args_from(args(&["--optimize", "cheapest"])).is_err());
        assert!(parse_args_from(args(&["--hourly-out"])).is_err());
        assert!(parse_args_from(args(&["--bogus"])).is_err());
    }
}
