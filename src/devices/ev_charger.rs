use crate::devices::types::{Device, DeviceContext, HOURS_PER_DAY, finite_or_zero};
use crate::sim::types::ChargingTime;

/// Daytime charging window, `09:00–17:00`.
pub const DAY_WINDOW: [usize; 8] = [9, 10, 11, 12, 13, 14, 15, 16];
/// Nighttime charging window, `22:00–06:00`.
pub const NIGHT_WINDOW: [usize; 8] = [22, 23, 0, 1, 2, 3, 4, 5];
/// Per-vehicle rate ceiling in the daytime window (public DC fast charging).
pub const PUBLIC_FAST_CHARGING_KW: f64 = 50.0;
/// Per-vehicle rate ceiling in the nighttime window (home AC wallbox).
pub const HOME_AC_KW: f64 = 7.4;

/// Spreads `energy_kwh` evenly over `window`, never exceeding `ceiling_kwh` per hour.
///
/// Returns the energy that did not fit.
fn fill_window(
    hourly: &mut [f64; HOURS_PER_DAY],
    window: &[usize],
    energy_kwh: f64,
    ceiling_kwh: f64,
) -> f64 {
    let mut remaining = energy_kwh;
    for (i, &hour) in window.iter().enumerate() {
        let hours_left = (window.len() - i) as f64;
        let slice = (remaining / hours_left).min(ceiling_kwh).max(0.0);
        hourly[hour] += slice;
        remaining -= slice;
    }
    remaining.max(0.0)
}

/// Home charging load of one vehicle line item.
///
/// Charging is confined to the window chosen by the line item's
/// [`ChargingTime`]; `Both` splits the energy evenly across the two windows.
///
/// # Power Flow Convention
/// Returns **positive** values (consumption).
#[derive(Debug, Clone)]
pub struct EvCharger {
    /// Vehicle label used in diagnostics.
    pub name: String,

    /// Home charging energy for the whole line item (kWh/day).
    pub home_kwh: f64,

    /// Number of identical vehicles.
    pub quantity: u32,

    pub charging_time: ChargingTime,

    /// Requested energy that exceeds the window capacity (kWh/day).
    pub unserved_kwh: f64,

    hourly: [f64; HOURS_PER_DAY],
}

impl EvCharger {
    /// Creates a charging profile.
    ///
    /// # Arguments
    ///
    /// * `name` - Vehicle label
    /// * `home_kwh` - Daily home charging energy across all `quantity` vehicles
    /// * `quantity` - Vehicles sharing this profile; scales the rate ceilings
    /// * `charging_time` - Preferred charging window
    pub fn new(
        name: impl Into<String>,
        home_kwh: f64,
        quantity: u32,
        charging_time: ChargingTime,
    ) -> Self {
        let home_kwh = finite_or_zero(home_kwh).max(0.0);
        let vehicles = f64::from(quantity);
        let mut hourly = [0.0; HOURS_PER_DAY];

        let unserved_day = fill_window(
            &mut hourly,
            &DAY_WINDOW,
            home_kwh * charging_time.day_share(),
            PUBLIC_FAST_CHARGING_KW * vehicles,
        );
        let unserved_night = fill_window(
            &mut hourly,
            &NIGHT_WINDOW,
            home_kwh * charging_time.night_share(),
            HOME_AC_KW * vehicles,
        );

        Self {
            name: name.into(),
            home_kwh,
            quantity,
            charging_time,
            unserved_kwh: unserved_day + unserved_night,
            hourly,
        }
    }

    /// Energy actually scheduled over the day.
    pub fn served_kwh(&self) -> f64 {
        self.hourly.iter().sum()
    }
}

impl Device for EvCharger {
    fn energy_kwh(&self, context: &DeviceContext) -> f64 {
        self.hourly[context.hour]
    }

    fn device_type(&self) -> &'static str {
        "EvCharger"
    }
}

/// All active chargers of a household.
#[derive(Debug, Clone, Default)]
pub struct EvFleet {
    pub chargers: Vec<EvCharger>,
}

impl EvFleet {
    pub fn unserved_kwh(&self) -> f64 {
        self.chargers.iter().map(|c| c.unserved_kwh).sum()
    }

    /// Highest single-hour charging draw.
    pub fn peak_kwh(&self) -> f64 {
        self.profile().into_iter().fold(0.0, f64::max)
    }
}

impl Device for EvFleet {
    fn energy_kwh(&self, context: &DeviceContext) -> f64 {
        self.chargers.iter().map(|c| c.energy_kwh(context)).sum()
    }

    fn device_type(&self) -> &'static str {
        "EvFleet"
    }
}
