use std::collections::BTreeMap;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use super::country::Country;

/// A home battery (BESS) catalog entry.
///
/// Read-only: the engine never mutates catalog records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatteryModel {
    /// Stable catalog identifier.
    pub id: String,
    pub manufacturer: String,
    pub name: String,
    /// Nameplate capacity (kWh).
    pub capacity_kwh: f64,
    /// Usable capacity (kWh), before degradation.
    pub usable_capacity_kwh: f64,
    /// Round-trip efficiency (0.0–1.0).
    #[serde(default = "default_efficiency")]
    pub round_trip_efficiency: f64,
    #[serde(default)]
    pub warranty_cycles: u32,
    #[serde(default)]
    pub warranty_years: u32,
    /// Continuous power rating (kW).
    #[serde(default)]
    pub continuous_power_kw: f64,
    /// Peak power rating (kW).
    #[serde(default)]
    pub peak_power_kw: f64,
    /// Retail price per unit, keyed by market.
    #[serde(default, deserialize_with = "deserialize_prices")]
    pub prices: BTreeMap<Country, f64>,
    /// Vehicle-to-home support.
    #[serde(default)]
    pub v2h: bool,
}

fn default_efficiency() -> f64 {
    0.9
}

/// Reads a `{ "MY" = 25000.0, ... }` table, accepting country codes in any case.
fn deserialize_prices<'de, D>(deserializer: D) -> Result<BTreeMap<Country, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, f64>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(code, price)| {
            code.parse::<Country>()
                .map(|country| (country, price))
                .map_err(de::Error::custom)
        })
        .collect()
}

impl BatteryModel {
    /// Unit price in `country`, if the model is sold there.
    pub fn price_in(&self, country: Country) -> Option<f64> {
        self.prices
            .get(&country)
            .copied()
            .filter(|p| p.is_finite() && *p >= 0.0)
    }

    /// Usable capacity after linear degradation over `years` at `rate_per_year`.
    pub fn degraded_capacity_kwh(&self, rate_per_year: f64, years: f64) -> f64 {
        self.usable_capacity_kwh * (1.0 - rate_per_year * years).max(0.0)
    }
}
