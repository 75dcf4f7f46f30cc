use serde::{Deserialize, Serialize};

/// An electric vehicle catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VehicleModel {
    /// Stable catalog identifier.
    pub id: String,
    pub make: String,
    pub model: String,
    /// Traction battery capacity (kWh).
    pub battery_kwh: f64,
    /// WLTP range (km).
    #[serde(default)]
    pub range_wltp_km: Option<f64>,
    /// EPA range (km).
    #[serde(default)]
    pub range_epa_km: Option<f64>,
    /// Range figure from older catalog imports (km).
    #[serde(default)]
    pub range_km: Option<f64>,
    /// Consumption (kWh/100 km).
    #[serde(default)]
    pub efficiency_kwh_per_100km: Option<f64>,
}

fn usable(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

impl VehicleModel {
    /// Range used for energy estimates: WLTP, then EPA, then the legacy figure,
    /// then capacity ÷ efficiency.
    ///
    /// Returns `None` when no source yields a positive finite range.
    pub fn effective_range_km(&self) -> Option<f64> {
        usable(self.range_wltp_km)
            .or_else(|| usable(self.range_epa_km))
            .or_else(|| usable(self.range_km))
            .or_else(|| {
                let efficiency = usable(self.efficiency_kwh_per_100km)?;
                usable(Some(self.battery_kwh / efficiency * 100.0))
            })
    }

    /// Energy drawn from the battery per km driven.
    pub fn kwh_per_km(&self) -> Option<f64> {
        let range = self.effective_range_km()?;
        usable(Some(self.battery_kwh / range))
    }
}
