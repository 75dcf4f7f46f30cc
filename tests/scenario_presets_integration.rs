use std::process::Command;

use serde_json::Value;

fn run_json(args: &[&str]) -> Value {
    let output = Command::new(env!("CARGO_BIN_EXE_home-energy-sim"))
        .args(args)
        .arg("--json")
        .output()
        .expect("home-energy-sim process should run");

    assert!(
        output.status.success(),
        "run failed for {args:?}: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be a JSON report")
}

fn number(report: &Value, pointer: &str) -> f64 {
    report
        .pointer(pointer)
        .and_then(Value::as_f64)
        .unwrap_or_else(|| panic!("missing number at {pointer}"))
}

#[test]
fn presets_run_via_cli_and_differ() {
    let baseline = run_json(&["--preset", "baseline"]);
    let ev = run_json(&["--preset", "ev_household"]);
    let net = run_json(&["--preset", "net_metering"]);

    assert_eq!(
        baseline.pointer("/simulation/finance/currency").and_then(Value::as_str),
        Some("MYR")
    );
    assert_eq!(
        ev.pointer("/simulation/finance/currency").and_then(Value::as_str),
        Some("THB")
    );
    assert_eq!(
        net.pointer("/simulation/finance/currency").and_then(Value::as_str),
        Some("PHP")
    );

    for report in [&baseline, &ev, &net] {
        let hourly = report
            .pointer("/simulation/hourly")
            .and_then(Value::as_array)
            .expect("hourly records");
        assert_eq!(hourly.len(), 24);
        assert!(
            number(report, "/simulation/finance/monthly_bill_with")
                < number(report, "/simulation/finance/monthly_bill_without")
        );
    }

    assert_eq!(number(&baseline, "/simulation/day/grid_export_kwh"), 0.0);
    assert!(number(&net, "/simulation/finance/monthly_export_credit") > 0.0);
    assert!(number(&ev, "/simulation/daily/ev_home_kwh") > 0.0);
}

#[test]
fn scenario_files_run_via_cli() {
    for path in [
        "scenarios/baseline.toml",
        "scenarios/sg_net_billing.toml",
        "scenarios/ev_night.toml",
    ] {
        let report = run_json(&["--scenario", path]);
        assert!(
            number(&report, "/simulation/finance/monthly_bill_without") > 0.0,
            "{path}"
        );
    }
}

#[test]
fn optimize_reports_every_requested_strategy() {
    let report = run_json(&["--preset", "baseline", "--optimize", "all"]);
    let optimizations = report
        .get("optimizations")
        .and_then(Value::as_object)
        .expect("optimizations map");
    for name in [
        "minimum_payback",
        "best_net_savings",
        "cheapest_zero_bill",
        "off_grid",
    ] {
        assert!(optimizations.contains_key(name), "missing {name}");
    }
    assert!(
        optimizations["minimum_payback"]
            .get("solar_kw")
            .and_then(Value::as_f64)
            .is_some()
    );
}

#[test]
fn invalid_scenario_exits_with_error() {
    let dir = std::env::temp_dir().join("home-energy-sim-invalid");
    std::fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join("bad.toml");
    std::fs::write(&path, "[household]\nsolar_kw = -1.0\n").expect("write scenario");

    let output = Command::new(env!("CARGO_BIN_EXE_home-energy-sim"))
        .arg("--scenario")
        .arg(&path)
        .output()
        .expect("home-energy-sim process should run");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("household.solar_kw"), "stderr={stderr}");
}

#[test]
fn hourly_csv_is_written() {
    let dir = std::env::temp_dir().join("home-energy-sim-csv");
    std::fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join("hourly.csv");

    let status = Command::new(env!("CARGO_BIN_EXE_home-energy-sim"))
        .args(["--preset", "baseline", "--hourly-out"])
        .arg(&path)
        .output()
        .expect("home-energy-sim process should run")
        .status;
    assert!(status.success());

    let csv = std::fs::read_to_string(&path).expect("csv written");
    assert_eq!(csv.lines().count(), 25);
    assert!(csv.starts_with("hour,"));
}
