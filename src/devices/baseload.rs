use crate::devices::types::{Device, DeviceContext, HOURS_PER_DAY, finite_or_zero, safe_div};

/// First hour of the daytime period (inclusive).
pub const DAY_START_HOUR: usize = 6;
/// First hour of the nighttime period (inclusive).
pub const NIGHT_START_HOUR: usize = 18;

const MORNING_PEAK: std::ops::Range<usize> = 7..9;
const EVENING_PEAK: std::ops::Range<usize> = 18..20;
const MORNING_PEAK_MULTIPLIER: f64 = 1.3;
const EVENING_PEAK_MULTIPLIER: f64 = 1.5;
const LATE_NIGHT_MULTIPLIER: f64 = 0.6;

/// Returns `true` for hours in the daytime period `06:00–18:00`.
pub fn is_daytime(hour: usize) -> bool {
    (DAY_START_HOUR..NIGHT_START_HOUR).contains(&(hour % HOURS_PER_DAY))
}

/// Relative weight of an hour before per-period normalization.
fn shape(hour: usize) -> f64 {
    if MORNING_PEAK.contains(&hour) {
        MORNING_PEAK_MULTIPLIER
    } else if EVENING_PEAK.contains(&hour) {
        EVENING_PEAK_MULTIPLIER
    } else if hour >= 22 || hour < DAY_START_HOUR {
        LATE_NIGHT_MULTIPLIER
    } else {
        1.0
    }
}

/// Household consumption shaped over the day.
///
/// A flat day/night base rate modulated by a morning peak (07:00–09:00),
/// an evening peak (18:00–20:00) and a late-night dip (22:00–06:00). Each
/// period is renormalized so the daytime hours sum to `day_kwh` and the
/// nighttime hours sum to `night_kwh`.
///
/// # Examples
///
/// ```
/// use home_energy_sim::devices::baseload::BaseLoad;
/// use home_energy_sim::devices::Device;
///
/// let load = BaseLoad::new(8.0, 10.0);
/// let total: f64 = load.profile().iter().sum();
/// assert!((total - 18.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct BaseLoad {
    /// Daytime consumption (kWh).
    pub day_kwh: f64,

    /// Nighttime consumption (kWh).
    pub night_kwh: f64,

    day_shape_total: f64,
    night_shape_total: f64,
}

impl BaseLoad {
    pub fn new(day_kwh: f64, night_kwh: f64) -> Self {
        let (day_shape_total, night_shape_total) =
            (0..HOURS_PER_DAY).fold((0.0, 0.0), |(day, night), h| {
                if is_daytime(h) {
                    (day + shape(h), night)
                } else {
                    (day, night + shape(h))
                }
            });
        Self {
            day_kwh: finite_or_zero(day_kwh).max(0.0),
            night_kwh: finite_or_zero(night_kwh).max(0.0),
            day_shape_total,
            night_shape_total,
        }
    }

    /// Total daily consumption.
    pub fn daily_kwh(&self) -> f64 {
        self.day_kwh + self.night_kwh
    }

    /// Highest single-hour draw.
    pub fn peak_kwh(&self) -> f64 {
        self.profile().into_iter().fold(0.0, f64::max)
    }
}

impl Device for BaseLoad {
    fn energy_kwh(&self, context: &DeviceContext) -> f64 {
        let hour = context.hour;
        if is_daytime(hour) {
            self.day_kwh * safe_div(shape(hour), self.day_shape_total)
        } else {
            self.night_kwh * safe_div(shape(hour), self.night_shape_total)
        }
    }

    fn device_type(&self) -> &'static str {
        "BaseLoad"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(h: usize) -> DeviceContext {
        DeviceContext::new(h)
    }

    #[test]
    fn periods_sum_to_their_totals() {
        let load = BaseLoad::new(8.0, 10.0);
        let profile = load.profile();
        let day: f64 = (6..18).map(|h| profile[h]).sum();
        let night: f64 = (0..6).chain(18..24).map(|h| profile[h]).sum();
        assert!((day - 8.0).abs() < 1e-9);
        assert!((night - 10.0).abs() < 1e-9);
    }

    #[test]
    fn peaks_and_dips() {
        let load = BaseLoad::new(12.0, 12.0);
        assert!(load.energy_kwh(&ctx(7)) > load.energy_kwh(&ctx(10)));
        assert!(load.energy_kwh(&ctx(19)) > load.energy_kwh(&ctx(21)));
        assert!(load.energy_kwh(&ctx(23)) < load.energy_kwh(&ctx(21)));
        assert!(load.energy_kwh(&ctx(3)) < load.energy_kwh(&ctx(20)));
    }

    #[test]
    fn daytime_boundaries() {
        assert!(!is_daytime(5));
        assert!(is_daytime(6));
        assert!(is_daytime(17));
        assert!(!is_daytime(18));
    }

    #[test]
    fn invalid_loads_are_zero() {
        let load = BaseLoad::new(f64::NAN, -1.0);
        assert_eq!(load.daily_kwh(), 0.0);
        assert_eq!(load.peak_kwh(), 0.0);
    }
}
