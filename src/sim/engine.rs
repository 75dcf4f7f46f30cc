//! Hourly simulator and the single-configuration pipeline.

use tracing::debug;

use crate::devices::types::HOURS_PER_DAY;
use crate::devices::{
    BaseLoad, BatteryBank, Device, DeviceContext, EvCharger, EvFleet, InputIssue, SolarPv,
};
use crate::finance;

use super::aggregate::{DailyTotals, aggregate};
use super::allocator::allocate;
use super::dispatch::{HourDemand, dispatch_hour};
use super::kpi::EnergyKpis;
use super::result::{DayTotals, HourRecord, MonthlyTotals, SimulationResult};
use super::types::{Assumptions, SteadyState, SystemConfiguration};

/// Unserved charging below this is not worth reporting (kWh).
const UNSERVED_EPSILON_KWH: f64 = 1e-9;

/// Replays the representative day hour by hour against a battery bank.
///
/// Holds the three device curves sampled once at construction; every pass
/// over the day reuses them, so passes differ only in the starting level.
#[derive(Debug, Clone)]
pub struct HourlySimulator {
    pv: SolarPv,
    load: BaseLoad,
    fleet: EvFleet,
    demands: [HourDemand; HOURS_PER_DAY],
    capacity_kwh: f64,
    export_allowed: bool,
}

impl HourlySimulator {
    /// Builds the device curves from daily totals.
    ///
    /// Home charging that does not fit a vehicle's window is recorded as
    /// [`InputIssue::UnservedCharging`].
    pub fn new(daily: &DailyTotals, issues: &mut Vec<InputIssue>) -> Self {
        let profile = daily.country.profile();
        let pv = SolarPv::new(daily.solar_kwh, profile);
        let load = BaseLoad::new(daily.household_day_kwh, daily.household_night_kwh);
        let fleet = EvFleet {
            chargers: daily
                .vehicles
                .iter()
                .map(|v| EvCharger::new(&v.name, v.home_kwh, v.quantity, v.charging_time))
                .collect(),
        };

        for charger in &fleet.chargers {
            if charger.unserved_kwh > UNSERVED_EPSILON_KWH {
                InputIssue::UnservedCharging {
                    vehicle: charger.name.clone(),
                    unserved_kwh: charger.unserved_kwh,
                }
                .report(issues);
            }
        }

        let demands = std::array::from_fn(|hour| {
            let context = DeviceContext::new(hour);
            HourDemand {
                hour,
                solar_kwh: pv.energy_kwh(&context),
                household_kwh: load.energy_kwh(&context),
                ev_kwh: fleet.energy_kwh(&context),
            }
        });

        Self {
            pv,
            load,
            fleet,
            demands,
            capacity_kwh: daily.battery_capacity_kwh,
            export_allowed: daily.export_multiplier > 0.0,
        }
    }

    pub fn capacity_kwh(&self) -> f64 {
        self.capacity_kwh
    }

    pub fn demands(&self) -> &[HourDemand; HOURS_PER_DAY] {
        &self.demands
    }

    pub fn pv(&self) -> &SolarPv {
        &self.pv
    }

    pub fn load(&self) -> &BaseLoad {
        &self.load
    }

    pub fn fleet(&self) -> &EvFleet {
        &self.fleet
    }

    /// Dispatches one hour against `bank`.
    pub fn step(&self, hour: usize, bank: &mut BatteryBank) -> HourRecord {
        dispatch_hour(self.demands[hour % HOURS_PER_DAY], bank, self.export_allowed)
    }

    /// Runs one full day from `start_level_kwh` and returns the end-of-day
    /// level, discarding the hourly detail.
    pub fn warm_up_pass(&self, start_level_kwh: f64) -> f64 {
        let mut bank = BatteryBank::new(self.capacity_kwh, start_level_kwh);
        for hour in 0..HOURS_PER_DAY {
            self.step(hour, &mut bank);
        }
        bank.level_kwh()
    }

    /// Finds the midnight battery level the day settles into.
    ///
    /// Starts at `seed_fraction` of capacity and repeats warm-up passes,
    /// each seeded with the previous end level, until consecutive end levels
    /// are within `steady.tolerance_kwh` or `steady.max_passes` have run.
    ///
    /// # Returns
    ///
    /// The starting level for the recorded pass and the warm-up passes used.
    pub fn steady_state_level(&self, seed_fraction: f64, steady: SteadyState) -> (f64, usize) {
        let mut level = BatteryBank::at_fraction(self.capacity_kwh, seed_fraction).level_kwh();
        let mut passes = 0;
        while passes < steady.max_passes {
            let end = self.warm_up_pass(level);
            passes += 1;
            let delta = (end - level).abs();
            debug!(pass = passes, start = level, end, delta, "warm-up pass");
            level = end;
            if delta <= steady.tolerance_kwh {
                break;
            }
        }
        (level, passes)
    }

    /// Records all 24 hours starting from `start_level_kwh`.
    pub fn run_day(&self, start_level_kwh: f64) -> Vec<HourRecord> {
        let mut bank = BatteryBank::new(self.capacity_kwh, start_level_kwh);
        (0..HOURS_PER_DAY)
            .map(|hour| self.step(hour, &mut bank))
            .collect()
    }
}

/// Simulates one configuration end to end.
///
/// Aggregates daily totals, applies the daily priority split, replays the
/// steady-state day hourly, then derives KPIs and financials. Never fails:
/// unusable inputs are substituted and listed in [`SimulationResult::issues`].
///
/// # Examples
///
/// ```
/// use home_energy_sim::catalog::Country;
/// use home_energy_sim::sim::engine::simulate;
/// use home_energy_sim::sim::types::{Assumptions, SystemConfiguration};
///
/// let cfg = SystemConfiguration::new(Country::MY).with_solar_kw(5.0);
/// let result = simulate(&cfg, &Assumptions::default());
/// assert_eq!(result.hourly.len(), 24);
/// assert!(result.finance.monthly_bill_with < result.finance.monthly_bill_without);
/// ```
pub fn simulate(config: &SystemConfiguration, assumptions: &Assumptions) -> SimulationResult {
    let mut issues = Vec::new();

    let daily = aggregate(config, assumptions, &mut issues);
    let allocation = allocate(&daily);

    let simulator = HourlySimulator::new(&daily, &mut issues);
    let (starting_battery_kwh, warm_up_passes) = simulator
        .steady_state_level(assumptions.warm_up_seed_fraction, assumptions.steady_state);
    let hourly = simulator.run_day(starting_battery_kwh);

    let day = DayTotals::from_records(&hourly);
    let kpis = EnergyKpis::from_records(&hourly, daily.battery_capacity_kwh);
    let finance = finance::project(config, &daily, &day, &kpis, assumptions, &mut issues);
    let ev_public_kwh = daily.ev_public_kwh + simulator.fleet().unserved_kwh();
    let monthly = MonthlyTotals::new(&day, ev_public_kwh, assumptions.days_per_month);

    debug!(
        country = %config.country,
        solar_kw = config.solar_kw,
        battery_kwh = daily.battery_capacity_kwh,
        warm_up_passes,
        bill_with = finance.monthly_bill_with,
        "simulated configuration"
    );

    SimulationResult {
        country: config.country,
        daily,
        allocation,
        day,
        monthly,
        kpis,
        finance,
        hourly,
        starting_battery_kwh,
        warm_up_passes,
        issues,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::catalog::{BatteryModel, Country};
    use crate::sim::dispatch::balance_residual;
    use crate::sim::types::LoadSpec;

    fn battery(usable: f64) -> Arc<BatteryModel> {
        Arc::new(BatteryModel {
            id: "bank".into(),
            manufacturer: "Acme".into(),
            name: "Bank".into(),
            capacity_kwh: usable,
            usable_capacity_kwh: usable,
            round_trip_efficiency: 0.9,
            warranty_cycles: 6000,
            warranty_years: 10,
            continuous_power_kw: 5.0,
            peak_power_kw: 7.0,
            prices: BTreeMap::from([(Country::MY, 25_000.0)]),
            v2h: false,
        })
    }

    fn config() -> SystemConfiguration {
        SystemConfiguration::new(Country::MY)
            .with_solar_kw(10.0)
            .with_loads(LoadSpec::Kwh(8.0), LoadSpec::Kwh(10.0))
            .with_battery(battery(10.0), 1)
    }

    #[test]
    fn every_hour_balances() {
        let result = simulate(&config(), &Assumptions::default());
        for r in &result.hourly {
            assert_abs_diff_eq!(balance_residual(r), 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn two_pass_runs_one_warm_up() {
        let assumptions = Assumptions {
            steady_state: SteadyState::two_pass(),
            ..Assumptions::default()
        };
        let result = simulate(&config(), &assumptions);
        assert_eq!(result.warm_up_passes, 1);
    }

    #[test]
    fn zero_passes_records_from_seed() {
        let mut issues = Vec::new();
        let daily = aggregate(&config(), &Assumptions::default(), &mut issues);
        let sim = HourlySimulator::new(&daily, &mut issues);
        let steady = SteadyState {
            max_passes: 0,
            tolerance_kwh: 0.0,
        };
        let (level, passes) = sim.steady_state_level(0.2, steady);
        assert_eq!(passes, 0);
        assert_abs_diff_eq!(level, 0.2 * sim.capacity_kwh(), epsilon = 1e-12);
    }

    #[test]
    fn hourly_demand_matches_daily_totals() {
        let mut issues = Vec::new();
        let daily = aggregate(&config(), &Assumptions::default(), &mut issues);
        let sim = HourlySimulator::new(&daily, &mut issues);
        let solar: f64 = sim.demands().iter().map(|d| d.solar_kwh).sum();
        let household: f64 = sim.demands().iter().map(|d| d.household_kwh).sum();
        assert_abs_diff_eq!(solar, daily.solar_kwh, epsilon = 1e-9);
        assert_abs_diff_eq!(household, 18.0, epsilon = 1e-9);
    }
}
