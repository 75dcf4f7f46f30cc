//! Demand & generation aggregation: configuration → daily scalar totals.

use serde::Serialize;

use crate::catalog::Country;
use crate::devices::types::{InputIssue, non_negative, percentage, safe_div};

use super::types::{Assumptions, ChargingTime, LoadSpec, SystemConfiguration};

/// Daily energy demand of one active vehicle line item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleDemand {
    pub name: String,
    pub quantity: u32,
    /// Energy driven per day across all units (kWh).
    pub daily_kwh: f64,
    /// Share charged at home (0–100).
    pub home_charging_pct: f64,
    /// `daily_kwh × home_charging_pct / 100`.
    pub home_kwh: f64,
    pub charging_time: ChargingTime,
}

/// Daily scalar totals derived from a configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTotals {
    pub country: Country,
    pub household_day_kwh: f64,
    pub household_night_kwh: f64,
    pub solar_kwh: f64,
    /// Sum of degraded usable capacity over all battery line items.
    pub battery_capacity_kwh: f64,
    pub ev_total_kwh: f64,
    pub ev_home_kwh: f64,
    pub ev_public_kwh: f64,
    /// Fleet-weighted home-charging share (0–100).
    pub home_charging_pct: f64,
    /// Effective charging window for the fleet as a whole.
    pub charging_policy: ChargingTime,
    /// Export credit as a fraction of the tariff for the selected mode.
    pub export_multiplier: f64,
    pub vehicles: Vec<VehicleDemand>,
}

impl DailyTotals {
    pub fn household_kwh(&self) -> f64 {
        self.household_day_kwh + self.household_night_kwh
    }
}

fn resolve_load(
    field: &str,
    spec: LoadSpec,
    default_kwh: f64,
    pick: fn((f64, f64)) -> f64,
    issues: &mut Vec<InputIssue>,
) -> f64 {
    match spec {
        LoadSpec::Kwh(kwh) => non_negative(field, kwh, issues),
        LoadSpec::Preset(preset) => default_kwh * pick(preset.factors()),
    }
}

/// Fleet charging policy: a unanimous preference wins; otherwise `Both` if
/// anyone asks for it; otherwise the caller default.
pub fn fleet_policy(vehicles: &[VehicleDemand], default: ChargingTime) -> ChargingTime {
    let mut active = vehicles.iter().filter(|v| v.daily_kwh > 0.0);
    let Some(first) = active.next() else {
        return default;
    };
    let mut unanimous = true;
    let mut any_both = first.charging_time == ChargingTime::Both;
    for v in active {
        unanimous &= v.charging_time == first.charging_time;
        any_both |= v.charging_time == ChargingTime::Both;
    }
    if unanimous {
        first.charging_time
    } else if any_both {
        ChargingTime::Both
    } else {
        default
    }
}

/// Turns a configuration into daily scalar totals.
///
/// Malformed line items contribute zero and are recorded in `issues`.
pub fn aggregate(
    config: &SystemConfiguration,
    assumptions: &Assumptions,
    issues: &mut Vec<InputIssue>,
) -> DailyTotals {
    let profile = config.country.profile();

    let household_day_kwh = resolve_load(
        "day_load_kwh",
        config.day_load,
        profile.default_day_load_kwh,
        |(day, _)| day,
        issues,
    );
    let household_night_kwh = resolve_load(
        "night_load_kwh",
        config.night_load,
        profile.default_night_load_kwh,
        |(_, night)| night,
        issues,
    );

    let solar_kw = non_negative("solar_kw", config.solar_kw, issues);
    let solar_kwh = profile.solar_yield_per_kw * solar_kw * config.roof.multiplier();

    let mut battery_capacity_kwh = 0.0;
    for item in config.batteries.iter().filter(|b| b.quantity > 0) {
        let usable = item.model.usable_capacity_kwh;
        if !usable.is_finite() || usable <= 0.0 {
            InputIssue::InvalidBatteryCapacity {
                battery: item.model.id.clone(),
                capacity_kwh: usable,
            }
            .report(issues);
            continue;
        }
        battery_capacity_kwh += item.model.degraded_capacity_kwh(
            assumptions.degradation_rate_per_year,
            assumptions.degradation_years,
        ) * f64::from(item.quantity);
    }

    let mut vehicles = Vec::new();
    for item in config.vehicles.iter().filter(|v| v.quantity > 0) {
        let name = item.model.id.clone();
        let Some(kwh_per_km) = item.model.kwh_per_km() else {
            InputIssue::VehicleWithoutRange { vehicle: name }.report(issues);
            continue;
        };
        let distance_km = item
            .daily_distance_km
            .unwrap_or(profile.default_driving_km);
        if !distance_km.is_finite() || distance_km <= 0.0 {
            InputIssue::InvalidDistance {
                vehicle: name,
                distance_km,
            }
            .report(issues);
            continue;
        }
        let home_charging_pct = percentage(
            &format!("{name}.home_charging_pct"),
            item.home_charging_pct,
            issues,
        );
        let daily_kwh = distance_km * kwh_per_km * f64::from(item.quantity);
        vehicles.push(VehicleDemand {
            name,
            quantity: item.quantity,
            daily_kwh,
            home_charging_pct,
            home_kwh: daily_kwh * home_charging_pct / 100.0,
            charging_time: item.charging_time,
        });
    }

    let ev_total_kwh: f64 = vehicles.iter().map(|v| v.daily_kwh).sum();
    let home_charging_pct = if ev_total_kwh > 0.0 {
        let weighted: f64 = vehicles
            .iter()
            .map(|v| v.daily_kwh * v.home_charging_pct)
            .sum();
        safe_div(weighted, ev_total_kwh).clamp(0.0, 100.0)
    } else {
        percentage(
            "default_home_charging_pct",
            config.default_home_charging_pct,
            issues,
        )
    };
    let ev_home_kwh = ev_total_kwh * home_charging_pct / 100.0;
    let ev_public_kwh = (ev_total_kwh - ev_home_kwh).max(0.0);

    if !profile.offers(config.net_metering) {
        InputIssue::UnavailableNetMetering {
            mode: config.net_metering,
            country: config.country,
        }
        .report(issues);
    }

    DailyTotals {
        country: config.country,
        household_day_kwh,
        household_night_kwh,
        solar_kwh,
        battery_capacity_kwh,
        ev_total_kwh,
        ev_home_kwh,
        ev_public_kwh,
        home_charging_pct,
        charging_policy: fleet_policy(&vehicles, config.default_charging_time),
        export_multiplier: profile.export_multiplier(config.net_metering),
        vehicles,
    }
}
