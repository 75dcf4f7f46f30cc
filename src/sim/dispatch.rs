//! One-hour priority dispatch.

use crate::devices::BatteryBank;

use super::result::HourRecord;

/// Demand and supply presented to the dispatcher for one hour (kWh).
#[derive(Debug, Clone, Copy, Default)]
pub struct HourDemand {
    pub hour: usize,
    pub solar_kwh: f64,
    pub household_kwh: f64,
    pub ev_kwh: f64,
}

/// Dispatches one hour using the same priority as the daily allocator.
///
/// solar → household, solar → battery, solar → EV, battery → household,
/// battery → EV, remainder from the grid, surplus exported when
/// `export_allowed` (curtailed otherwise). Mutates `battery` in place.
pub fn dispatch_hour(
    demand: HourDemand,
    battery: &mut BatteryBank,
    export_allowed: bool,
) -> HourRecord {
    let mut solar = demand.solar_kwh;
    let mut household = demand.household_kwh;
    let mut ev = demand.ev_kwh;

    let solar_to_household = solar.min(household);
    solar -= solar_to_household;
    household -= solar_to_household;

    let battery_charge = battery.charge(solar);
    solar -= battery_charge;

    let ev_from_solar = solar.min(ev);
    solar -= ev_from_solar;
    ev -= ev_from_solar;

    let battery_to_household = battery.discharge(household);
    household -= battery_to_household;

    let ev_from_battery = battery.discharge(ev);
    ev -= ev_from_battery;

    let surplus = solar.max(0.0);
    let (grid_export, curtailed) = if export_allowed {
        (surplus, 0.0)
    } else {
        (0.0, surplus)
    };

    HourRecord {
        hour: demand.hour,
        solar_kwh: demand.solar_kwh,
        household_kwh: demand.household_kwh,
        ev_kwh: demand.ev_kwh,
        ev_from_solar,
        ev_from_battery,
        ev_from_grid: ev.max(0.0),
        household_from_grid: household.max(0.0),
        battery_charge_kwh: battery_charge,
        battery_discharge_kwh: battery_to_household + ev_from_battery,
        battery_level_kwh: battery.level_kwh(),
        grid_supply_kwh: household.max(0.0) + ev.max(0.0),
        grid_export_kwh: grid_export,
        curtailed_kwh: curtailed,
    }
}

/// Supply minus use for one hour; zero when the hour balances.
///
/// Supply is solar + battery discharge + grid import; use is household + EV
/// + battery charge + export + curtailment.
pub fn balance_residual(record: &HourRecord) -> f64 {
    let supply = record.solar_kwh + record.battery_discharge_kwh + record.grid_supply_kwh;
    let used = record.household_kwh
        + record.ev_kwh
        + record.battery_charge_kwh
        + record.grid_export_kwh
        + record.curtailed_kwh;
    supply - used
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demand(solar: f64, household: f64, ev: f64) -> HourDemand {
        HourDemand {
            hour: 12,
            solar_kwh: solar,
            household_kwh: household,
            ev_kwh: ev,
        }
    }

    #[test]
    fn solar_surplus_charges_then_exports() {
        let mut bank = BatteryBank::new(10.0, 9.0);
        let r = dispatch_hour(demand(5.0, 1.0, 0.0), &mut bank, true);
        assert_eq!(r.battery_charge_kwh, 1.0);
        assert_eq!(r.grid_export_kwh, 3.0);
        assert_eq!(r.grid_supply_kwh, 0.0);
        assert_eq!(r.battery_level_kwh, 10.0);
        assert!(balance_residual(&r).abs() < 1e-12);
    }

    #[test]
    fn no_credit_means_curtailment() {
        let mut bank = BatteryBank::new(0.0, 0.0);
        let r = dispatch_hour(demand(5.0, 1.0, 0.0), &mut bank, false);
        assert_eq!(r.grid_export_kwh, 0.0);
        assert_eq!(r.curtailed_kwh, 4.0);
        assert!(balance_residual(&r).abs() < 1e-12);
    }

    #[test]
    fn battery_then_grid_covers_deficit() {
        let mut bank = BatteryBank::new(10.0, 2.0);
        let r = dispatch_hour(demand(0.0, 1.5, 3.0), &mut bank, false);
        assert_eq!(r.battery_discharge_kwh, 2.0);
        assert_eq!(r.ev_from_battery, 0.5);
        assert_eq!(r.ev_from_grid, 2.5);
        assert_eq!(r.household_from_grid, 0.0);
        assert_eq!(r.grid_supply_kwh, 2.5);
        assert_eq!(r.battery_level_kwh, 0.0);
        assert!(balance_residual(&r).abs() < 1e-12);
    }

    #[test]
    fn solar_feeds_ev_after_battery_is_full() {
        let mut bank = BatteryBank::new(5.0, 5.0);
        let r = dispatch_hour(demand(6.0, 1.0, 3.0), &mut bank, false);
        assert_eq!(r.ev_from_solar, 3.0);
        assert_eq!(r.curtailed_kwh, 2.0);
        assert_eq!(r.grid_supply_kwh, 0.0);
    }
}
