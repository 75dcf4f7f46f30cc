//! Post-hoc energy KPIs computed from the hourly records.

use std::fmt;

use serde::Serialize;

use crate::devices::types::safe_div;

use super::result::HourRecord;

/// Imports below this are treated as zero when counting import hours (kWh).
pub const IMPORT_EPSILON_KWH: f64 = 1e-6;

/// Aggregate energy indicators for the recorded steady-state day.
///
/// Computed from the same `HourRecord`s that are exported, so the reported
/// figures always agree with the time series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EnergyKpis {
    /// Share of household + EV home demand not met from the grid (%).
    pub self_sufficiency_pct: f64,
    /// Hours whose grid import exceeds [`IMPORT_EPSILON_KWH`].
    pub hours_with_import: usize,
    /// Largest single-hour grid import (kWh).
    pub peak_import_kwh: f64,
    /// Largest single-hour export (kWh).
    pub peak_export_kwh: f64,
    /// Charge plus discharge over the day (kWh).
    pub battery_throughput_kwh: f64,
    /// Throughput divided by twice the capacity.
    pub battery_equivalent_full_cycles: f64,
}

impl EnergyKpis {
    /// Computes all KPIs from one day of hourly records.
    ///
    /// # Arguments
    ///
    /// * `records` - Recorded steady-state day
    /// * `battery_capacity_kwh` - Degraded bank capacity for the cycle count
    pub fn from_records(records: &[HourRecord], battery_capacity_kwh: f64) -> Self {
        if records.is_empty() {
            return Self::default();
        }

        let mut demand = 0.0;
        let mut imported = 0.0;
        let mut kpis = Self::default();

        for r in records {
            demand += r.household_kwh + r.ev_kwh;
            imported += r.grid_supply_kwh;
            kpis.peak_import_kwh = kpis.peak_import_kwh.max(r.grid_supply_kwh);
            kpis.peak_export_kwh = kpis.peak_export_kwh.max(r.grid_export_kwh);
            kpis.battery_throughput_kwh += r.battery_charge_kwh + r.battery_discharge_kwh;
            if r.grid_supply_kwh > IMPORT_EPSILON_KWH {
                kpis.hours_with_import += 1;
            }
        }

        kpis.self_sufficiency_pct = if demand > 0.0 {
            (100.0 * (1.0 - safe_div(imported, demand))).clamp(0.0, 100.0)
        } else {
            0.0
        };
        kpis.battery_equivalent_full_cycles =
            safe_div(kpis.battery_throughput_kwh, 2.0 * battery_capacity_kwh);
        kpis
    }
}

impl fmt::Display for EnergyKpis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Energy KPIs ---")?;
        writeln!(f, "Self-sufficiency:      {:.1}%", self.self_sufficiency_pct)?;
        writeln!(f, "Hours with import:     {}", self.hours_with_import)?;
        writeln!(f, "Peak import:           {:.2} kWh", self.peak_import_kwh)?;
        writeln!(f, "Peak export:           {:.2} kWh", self.peak_export_kwh)?;
        write!(
            f,
            "Battery throughput:    {:.2} kWh ({:.2} equiv. cycles)",
            self.battery_throughput_kwh, self.battery_equivalent_full_cycles
        )
    }
}
