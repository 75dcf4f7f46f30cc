//! Shared test fixtures for integration tests.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use home_energy_sim::catalog::{BatteryModel, Catalog, Country, VehicleModel};
use home_energy_sim::sim::types::{ChargingTime, LoadSpec, SystemConfiguration, VehicleLineItem};

/// Battery with equal nameplate and usable capacity, priced in each of `prices`.
pub fn battery(id: &str, usable_kwh: f64, prices: &[(Country, f64)]) -> BatteryModel {
    BatteryModel {
        id: id.to_string(),
        manufacturer: "Acme".to_string(),
        name: id.to_uppercase(),
        capacity_kwh: usable_kwh,
        usable_capacity_kwh: usable_kwh,
        round_trip_efficiency: 0.9,
        warranty_cycles: 6000,
        warranty_years: 10,
        continuous_power_kw: 5.0,
        peak_power_kw: 7.0,
        prices: prices.iter().copied().collect::<BTreeMap<_, _>>(),
        v2h: false,
    }
}

/// 60 kWh EV with a 400 km WLTP range (0.15 kWh/km).
pub fn ev(id: &str) -> VehicleModel {
    VehicleModel {
        id: id.to_string(),
        make: "Acme".to_string(),
        model: id.to_uppercase(),
        battery_kwh: 60.0,
        range_wltp_km: Some(400.0),
        range_epa_km: None,
        range_km: None,
        efficiency_kwh_per_100km: None,
    }
}

/// Two Malaysian battery sizes and one EV.
pub fn my_catalog() -> Catalog {
    Catalog::new(
        vec![
            battery("pack-5", 5.0, &[(Country::MY, 12_000.0)]),
            battery("pack-10", 10.0, &[(Country::MY, 22_000.0)]),
        ],
        vec![ev("runabout")],
    )
}

/// Malaysia, 8/10 kWh day/night load, no PV, no storage.
pub fn my_household() -> SystemConfiguration {
    SystemConfiguration::new(Country::MY).with_loads(LoadSpec::Kwh(8.0), LoadSpec::Kwh(10.0))
}

/// `my_household` with 10 kW PV and one 10 kWh battery.
pub fn my_solar_battery(catalog: &Catalog) -> SystemConfiguration {
    let pack = catalog.battery("pack-10").expect("fixture battery");
    my_household()
        .with_solar_kw(10.0)
        .with_battery(Arc::clone(pack), 1)
}

/// One vehicle at `km` per day with the given home share and window.
pub fn vehicle(
    catalog: &Catalog,
    km: f64,
    home_pct: f64,
    charging_time: ChargingTime,
) -> VehicleLineItem {
    let model = catalog.vehicle("runabout").expect("fixture vehicle");
    VehicleLineItem {
        daily_distance_km: Some(km),
        home_charging_pct: home_pct,
        charging_time,
        ..VehicleLineItem::new(Arc::clone(model))
    }
}
