use std::sync::Arc;

use serde::Serialize;

use crate::catalog::Catalog;
use crate::sim::HourlySimulator;
use crate::sim::aggregate::aggregate;
use crate::sim::types::{Assumptions, BatteryLineItem, SystemConfiguration};

/// Oversizing of PV relative to the daily energy need.
pub const SOLAR_BUFFER: f64 = 1.15;
/// Hours of simultaneous household and EV peak draw held in reserve.
pub const PEAK_BUFFER_HOURS: f64 = 2.0;
/// Multiplier on the night requirement for cloudy-day autonomy.
pub const AUTONOMY_FACTOR: f64 = 1.5;

/// Analytic off-grid sizing, before verification.
#[derive(Debug, Clone, Serialize)]
pub struct OffGridSizing {
    /// Household plus EV home energy per day (kWh).
    pub daily_need_kwh: f64,
    pub solar_kw: f64,
    /// Degraded capacity the battery must reach (kWh).
    pub required_battery_kwh: f64,
    /// Cheapest single model and quantity meeting the requirement.
    pub battery: Option<BatteryLineItem>,
}

/// Sizes PV and storage for a household to run without the grid.
///
/// PV covers the daily need with [`SOLAR_BUFFER`] headroom, rounded up to
/// whole kW. Storage covers the nighttime household and EV energy plus
/// [`PEAK_BUFFER_HOURS`] of combined peak draw, times [`AUTONOMY_FACTOR`].
///
/// Returns `None` when the country yields no solar, or when storage is needed
/// and no catalog battery is sold in the country.
pub fn size(
    base: &SystemConfiguration,
    catalog: &Catalog,
    assumptions: &Assumptions,
) -> Option<OffGridSizing> {
    let mut issues = Vec::new();
    let daily = aggregate(base, assumptions, &mut issues);
    let simulator = HourlySimulator::new(&daily, &mut issues);

    let yield_per_kw = base.country.profile().solar_yield_per_kw * base.roof.multiplier();
    if yield_per_kw <= 0.0 {
        return None;
    }
    let daily_need_kwh = daily.household_kwh() + daily.ev_home_kwh;
    let solar_kw = (daily_need_kwh * SOLAR_BUFFER / yield_per_kw).ceil();

    let night_ev_kwh: f64 = daily
        .vehicles
        .iter()
        .map(|v| v.home_kwh * v.charging_time.night_share())
        .sum();
    let peak_kwh = simulator.load().peak_kwh() + simulator.fleet().peak_kwh();
    let required_battery_kwh = (daily.household_night_kwh
        + night_ev_kwh
        + PEAK_BUFFER_HOURS * peak_kwh)
        * AUTONOMY_FACTOR;

    let battery = if required_battery_kwh > 0.0 {
        Some(cheapest_battery(base, catalog, assumptions, required_battery_kwh)?)
    } else {
        None
    };

    Some(OffGridSizing {
        daily_need_kwh,
        solar_kw,
        required_battery_kwh,
        battery,
    })
}

/// Cheapest `(model, quantity)` whose degraded capacity reaches `required_kwh`.
///
/// Ties go to the larger bank, then to the model id.
fn cheapest_battery(
    base: &SystemConfiguration,
    catalog: &Catalog,
    assumptions: &Assumptions,
    required_kwh: f64,
) -> Option<BatteryLineItem> {
    catalog
        .batteries_sold_in(base.country)
        .into_iter()
        .filter_map(|model| {
            let unit_kwh = model.degraded_capacity_kwh(
                assumptions.degradation_rate_per_year,
                assumptions.degradation_years,
            );
            let price = model.price_in(base.country)?;
            if unit_kwh <= 0.0 {
                return None;
            }
            let quantity = (required_kwh / unit_kwh).ceil().max(1.0) as u32;
            let cost = price * f64::from(quantity);
            let capacity = unit_kwh * f64::from(quantity);
            Some((cost, capacity, model, quantity))
        })
        .min_by(|a, b| {
            a.0.total_cmp(&b.0)
                .then_with(|| b.1.total_cmp(&a.1))
                .then_with(|| a.2.id.cmp(&b.2.id))
        })
        .map(|(_, _, model, quantity)| BatteryLineItem::new(Arc::clone(&model), quantity))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use approx::assert_relative_eq;

    use super::*;
    use crate::catalog::{BatteryModel, Country};
    use crate::sim::types::LoadSpec;

    fn model(id: &str, usable: f64, price: f64) -> BatteryModel {
        BatteryModel {
            id: id.into(),
            manufacturer: "Acme".into(),
            name: id.into(),
            capacity_kwh: usable,
            usable_capacity_kwh: usable,
            round_trip_efficiency: 0.9,
            warranty_cycles: 6000,
            warranty_years: 10,
            continuous_power_kw: 5.0,
            peak_power_kw: 7.0,
            prices: BTreeMap::from([(Country::MY, price)]),
            v2h: false,
        }
    }

    fn base() -> SystemConfiguration {
        SystemConfiguration::new(Country::MY).with_loads(LoadSpec::Kwh(8.0), LoadSpec::Kwh(10.0))
    }

    #[test]
    fn solar_covers_need_with_buffer() {
        let catalog = Catalog::new(vec![model("big", 50.0, 1.0)], Vec::new());
        let sizing = size(&base(), &catalog, &Assumptions::default()).unwrap();
        assert_relative_eq!(sizing.daily_need_kwh, 18.0, epsilon = 1e-9);
        // 18 × 1.15 / 4.0 = 5.175 → 6 kW
        assert_eq!(sizing.solar_kw, 6.0);
        assert!(sizing.required_battery_kwh > 15.0);
    }

    #[test]
    fn picks_cheapest_quantity_that_fits() {
        let catalog = Catalog::new(
            vec![model("small", 5.0, 10_000.0), model("large", 25.0, 45_000.0)],
            Vec::new(),
        );
        let sizing = size(&base(), &catalog, &Assumptions::default()).unwrap();
        let battery = sizing.battery.unwrap();
        let unit = battery.model.degraded_capacity_kwh(0.015, 5.0);
        assert!(unit * f64::from(battery.quantity) >= sizing.required_battery_kwh);
        // Five small units (50 000) cost more than one large (45 000).
        assert_eq!(battery.model.id, "large");
    }

    #[test]
    fn no_batteries_means_no_sizing() {
        let catalog = Catalog::new(Vec::new(), Vec::new());
        assert!(size(&base(), &catalog, &Assumptions::default()).is_none());
    }
}
