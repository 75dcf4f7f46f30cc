//! Daily priority allocation of solar, battery, and grid energy.

use serde::Serialize;

use super::aggregate::DailyTotals;

/// Daily energy flows from the fixed-priority greedy pass (kWh/day).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DailyAllocation {
    pub solar_to_household: f64,
    pub solar_to_battery: f64,
    pub solar_to_ev: f64,
    /// Surplus credited as export.
    pub exported: f64,
    /// Surplus with nowhere to go (no export credit).
    pub curtailed: f64,
    pub battery_to_household: f64,
    pub battery_to_ev: f64,
    pub grid_day_household: f64,
    pub grid_night_household: f64,
    pub grid_day_ev: f64,
    pub grid_night_ev: f64,
}

impl DailyAllocation {
    pub fn grid_day(&self) -> f64 {
        self.grid_day_household + self.grid_day_ev
    }

    pub fn grid_night(&self) -> f64 {
        self.grid_night_household + self.grid_night_ev
    }

    pub fn grid_total(&self) -> f64 {
        self.grid_day() + self.grid_night()
    }

    pub fn battery_discharge(&self) -> f64 {
        self.battery_to_household + self.battery_to_ev
    }
}

/// Splits daily totals into flows using a fixed priority order.
///
/// 1. daytime household load from solar
/// 2. solar surplus into the battery, up to its capacity
/// 3. remaining solar into EV home charging, if the fleet charges by day
/// 4. anything left is exported (or curtailed without export credit)
/// 5. nighttime household load from the battery, shortfall from the grid
/// 6. remaining battery into EV home charging, if the fleet charges by night,
///    shortfall from the grid
///
/// Each step only sees what earlier steps left behind.
pub fn allocate(totals: &DailyTotals) -> DailyAllocation {
    let mut flows = DailyAllocation::default();
    let policy = totals.charging_policy;
    let ev_day = totals.ev_home_kwh * policy.day_share();
    let ev_night = totals.ev_home_kwh * policy.night_share();

    let mut solar = totals.solar_kwh;

    flows.solar_to_household = solar.min(totals.household_day_kwh);
    solar -= flows.solar_to_household;
    flows.grid_day_household = totals.household_day_kwh - flows.solar_to_household;

    flows.solar_to_battery = solar.min(totals.battery_capacity_kwh);
    solar -= flows.solar_to_battery;

    flows.solar_to_ev = solar.min(ev_day);
    solar -= flows.solar_to_ev;
    flows.grid_day_ev = ev_day - flows.solar_to_ev;

    let surplus = solar.max(0.0);
    if totals.export_multiplier > 0.0 {
        flows.exported = surplus;
    } else {
        flows.curtailed = surplus;
    }

    let mut stored = flows.solar_to_battery;

    flows.battery_to_household = stored.min(totals.household_night_kwh);
    stored -= flows.battery_to_household;
    flows.grid_night_household = totals.household_night_kwh - flows.battery_to_household;

    flows.battery_to_ev = stored.min(ev_night);
    flows.grid_night_ev = ev_night - flows.battery_to_ev;

    flows
}
