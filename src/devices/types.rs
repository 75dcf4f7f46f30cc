//! Common types and traits for hourly device profiles, plus input sanitization.

use serde::Serialize;
use tracing::warn;

use crate::catalog::{Country, NetMeteringMode};

/// Hours in the simulated day.
pub const HOURS_PER_DAY: usize = 24;

/// Contextual information passed to devices when sampling a profile.
/// # Fields
/// * `hour` - Hour of day, `0..24`; the hour covers `[hour, hour + 1)`
#[derive(Debug, Clone, Copy)]
pub struct DeviceContext {
    pub hour: usize,
}

impl DeviceContext {
    pub fn new(hour: usize) -> Self {
        Self {
            hour: hour % HOURS_PER_DAY,
        }
    }
}

/// A deterministic producer or consumer of energy over one representative day.
pub trait Device {
    /// Returns the energy produced or consumed during the given hour (kWh, ≥ 0).
    fn energy_kwh(&self, context: &DeviceContext) -> f64;

    /// Returns a human-readable type name for the device.
    fn device_type(&self) -> &'static str;

    /// Samples all 24 hours.
    fn profile(&self) -> [f64; HOURS_PER_DAY] {
        std::array::from_fn(|h| self.energy_kwh(&DeviceContext::new(h)))
    }
}

/// Maps NaN and ±∞ to zero.
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

/// Division that yields zero instead of NaN/∞.
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    finite_or_zero(numerator / denominator)
}

/// Clamps a percentage into `[0, 100]`; non-finite values become 0.
pub fn clamp_pct(value: f64) -> f64 {
    finite_or_zero(value).clamp(0.0, 100.0)
}

/// An input value the engine could not use as given.
///
/// The engine never fails on bad inputs: the offending value is substituted
/// (usually with zero) or its line item skipped, and one of these is recorded
/// on the result so callers can surface it.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputIssue {
    #[error("vehicle {vehicle} has no usable range or efficiency; skipped")]
    VehicleWithoutRange { vehicle: String },

    #[error("vehicle {vehicle} has invalid daily distance {distance_km} km; skipped")]
    InvalidDistance { vehicle: String, distance_km: f64 },

    #[error("battery {battery} has invalid usable capacity {capacity_kwh} kWh; skipped")]
    InvalidBatteryCapacity { battery: String, capacity_kwh: f64 },

    #[error("battery {battery} has no price in {country}; costed at zero")]
    MissingBatteryPrice { battery: String, country: Country },

    #[error("{field} = {value} is out of range; clamped to {clamped}")]
    Clamped {
        field: String,
        value: f64,
        clamped: f64,
    },

    #[error("{mode:?} is not offered in {country}; exports are not credited")]
    UnavailableNetMetering {
        mode: NetMeteringMode,
        country: Country,
    },

    #[error("{unserved_kwh:.3} kWh of home charging for {vehicle} does not fit its window")]
    UnservedCharging { vehicle: String, unserved_kwh: f64 },
}

impl InputIssue {
    /// Logs the issue and appends it to `issues`.
    pub fn report(self, issues: &mut Vec<InputIssue>) {
        warn!(issue = %self, "input substituted");
        issues.push(self);
    }
}

/// Sanitizes a non-negative quantity, recording an issue if it had to change.
pub fn non_negative(field: &str, value: f64, issues: &mut Vec<InputIssue>) -> f64 {
    let clamped = finite_or_zero(value).max(0.0);
    if clamped != value {
        InputIssue::Clamped {
            field: field.to_string(),
            value,
            clamped,
        }
        .report(issues);
    }
    clamped
}

/// Sanitizes a percentage, recording an issue if it had to change.
pub fn percentage(field: &str, value: f64, issues: &mut Vec<InputIssue>) -> f64 {
    let clamped = clamp_pct(value);
    if clamped != value {
        InputIssue::Clamped {
            field: field.to_string(),
            value,
            clamped,
        }
        .report(issues);
    }
    clamped
}
