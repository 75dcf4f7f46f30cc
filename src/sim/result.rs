//! Simulation outputs: hourly records, day and month aggregates, and the full result.

use std::fmt;

use serde::Serialize;

use crate::catalog::Country;
use crate::devices::InputIssue;
use crate::finance::FinancialSummary;

use super::aggregate::DailyTotals;
use super::allocator::DailyAllocation;
use super::kpi::EnergyKpis;

/// Energy flows for one hour of the steady-state day (kWh).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct HourRecord {
    /// Hour of day, `0..24`.
    pub hour: usize,
    pub solar_kwh: f64,
    pub household_kwh: f64,
    /// Home EV charging demand.
    pub ev_kwh: f64,
    pub ev_from_solar: f64,
    pub ev_from_battery: f64,
    pub ev_from_grid: f64,
    pub household_from_grid: f64,
    pub battery_charge_kwh: f64,
    pub battery_discharge_kwh: f64,
    /// Stored energy at the end of the hour.
    pub battery_level_kwh: f64,
    pub grid_supply_kwh: f64,
    pub grid_export_kwh: f64,
    /// Surplus solar that could not be used or credited.
    pub curtailed_kwh: f64,
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    // `+ 0.0` keeps rounded tiny negatives from printing as "-0".
    (value * scale).round() / scale + 0.0
}

impl HourRecord {
    /// A copy with every energy value rounded for presentation.
    pub fn rounded(&self, decimals: i32) -> Self {
        let r = |v| round_to(v, decimals);
        Self {
            hour: self.hour,
            solar_kwh: r(self.solar_kwh),
            household_kwh: r(self.household_kwh),
            ev_kwh: r(self.ev_kwh),
            ev_from_solar: r(self.ev_from_solar),
            ev_from_battery: r(self.ev_from_battery),
            ev_from_grid: r(self.ev_from_grid),
            household_from_grid: r(self.household_from_grid),
            battery_charge_kwh: r(self.battery_charge_kwh),
            battery_discharge_kwh: r(self.battery_discharge_kwh),
            battery_level_kwh: r(self.battery_level_kwh),
            grid_supply_kwh: r(self.grid_supply_kwh),
            grid_export_kwh: r(self.grid_export_kwh),
            curtailed_kwh: r(self.curtailed_kwh),
        }
    }
}

impl fmt::Display for HourRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:00 | solar={:>6.2}  home={:>5.2}  ev={:>5.2} | \
             bat +{:.2}/-{:.2} (level={:.2}) | grid={:>5.2}  export={:.2}  curtailed={:.2}",
            self.hour,
            self.solar_kwh,
            self.household_kwh,
            self.ev_kwh,
            self.battery_charge_kwh,
            self.battery_discharge_kwh,
            self.battery_level_kwh,
            self.grid_supply_kwh,
            self.grid_export_kwh,
            self.curtailed_kwh,
        )
    }
}

/// Sums of the hourly records over one day (kWh/day).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DayTotals {
    pub solar_kwh: f64,
    pub household_kwh: f64,
    pub ev_home_kwh: f64,
    pub battery_charge_kwh: f64,
    pub battery_discharge_kwh: f64,
    pub grid_supply_kwh: f64,
    pub household_from_grid: f64,
    pub grid_export_kwh: f64,
    pub curtailed_kwh: f64,
    pub ev_from_solar: f64,
    pub ev_from_battery: f64,
    pub ev_from_grid: f64,
}

impl DayTotals {
    pub fn from_records(records: &[HourRecord]) -> Self {
        records.iter().fold(Self::default(), |mut acc, r| {
            acc.solar_kwh += r.solar_kwh;
            acc.household_kwh += r.household_kwh;
            acc.ev_home_kwh += r.ev_kwh;
            acc.battery_charge_kwh += r.battery_charge_kwh;
            acc.battery_discharge_kwh += r.battery_discharge_kwh;
            acc.grid_supply_kwh += r.grid_supply_kwh;
            acc.household_from_grid += r.household_from_grid;
            acc.grid_export_kwh += r.grid_export_kwh;
            acc.curtailed_kwh += r.curtailed_kwh;
            acc.ev_from_solar += r.ev_from_solar;
            acc.ev_from_battery += r.ev_from_battery;
            acc.ev_from_grid += r.ev_from_grid;
            acc
        })
    }
}

/// Monthly energy figures (kWh/month).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MonthlyTotals {
    pub solar_kwh: f64,
    pub battery_charge_kwh: f64,
    pub battery_discharge_kwh: f64,
    pub grid_supply_kwh: f64,
    pub grid_export_kwh: f64,
    pub ev_from_solar: f64,
    pub ev_from_battery: f64,
    pub ev_from_grid: f64,
    pub ev_public_kwh: f64,
}

impl MonthlyTotals {
    pub fn new(day: &DayTotals, ev_public_kwh_per_day: f64, days_per_month: f64) -> Self {
        Self {
            solar_kwh: day.solar_kwh * days_per_month,
            battery_charge_kwh: day.battery_charge_kwh * days_per_month,
            battery_discharge_kwh: day.battery_discharge_kwh * days_per_month,
            grid_supply_kwh: day.grid_supply_kwh * days_per_month,
            grid_export_kwh: day.grid_export_kwh * days_per_month,
            ev_from_solar: day.ev_from_solar * days_per_month,
            ev_from_battery: day.ev_from_battery * days_per_month,
            ev_from_grid: day.ev_from_grid * days_per_month,
            ev_public_kwh: ev_public_kwh_per_day * days_per_month,
        }
    }
}

/// Complete output of one simulation call.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationResult {
    pub country: Country,
    /// Scalar inputs to the allocator.
    pub daily: DailyTotals,
    /// Fixed-priority daily split.
    pub allocation: DailyAllocation,
    /// Sums of the hourly records.
    pub day: DayTotals,
    pub monthly: MonthlyTotals,
    pub kpis: EnergyKpis,
    pub finance: FinancialSummary,
    /// Unrounded steady-state day, one record per hour.
    pub hourly: Vec<HourRecord>,
    /// Battery level the recorded day started from.
    pub starting_battery_kwh: f64,
    /// Warm-up passes run before the recorded day.
    pub warm_up_passes: usize,
    pub issues: Vec<InputIssue>,
}

impl SimulationResult {
    /// Hourly records rounded for presentation.
    pub fn hourly_rounded(&self, decimals: i32) -> Vec<HourRecord> {
        self.hourly.iter().map(|r| r.rounded(decimals)).collect()
    }

    /// `true` when no hour imports from the grid.
    pub fn is_grid_independent(&self) -> bool {
        self.kpis.hours_with_import == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_is_presentation_only() {
        let r = HourRecord {
            solar_kwh: 1.234_567,
            battery_level_kwh: -0.000_01,
            ..HourRecord::default()
        };
        let rounded = r.rounded(3);
        assert_eq!(rounded.solar_kwh, 1.235);
        assert!(rounded.battery_level_kwh.is_sign_positive());
        assert_eq!(r.solar_kwh, 1.234_567);
    }

    #[test]
    fn day_totals_sum_records() {
        let records: Vec<HourRecord> = (0..24)
            .map(|h| HourRecord {
                hour: h,
                solar_kwh: 1.0,
                grid_supply_kwh: 0.5,
                ..HourRecord::default()
            })
            .collect();
        let day = DayTotals::from_records(&records);
        assert_eq!(day.solar_kwh, 24.0);
        assert_eq!(day.grid_supply_kwh, 12.0);

        let month = MonthlyTotals::new(&day, 2.0, 30.0);
        assert_eq!(month.grid_supply_kwh, 360.0);
        assert_eq!(month.ev_public_kwh, 60.0);
    }

    #[test]
    fn display_does_not_panic() {
        let s = format!("{}", HourRecord::default());
        assert!(s.starts_with("00:00"));
    }
}
