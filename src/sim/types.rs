//! Simulation inputs: system configuration, line items, and tunable assumptions.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::{BatteryModel, Country, NetMeteringMode, RoofQuality, VehicleModel};

/// When a vehicle prefers to plug in at home.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargingTime {
    Day,
    #[default]
    Night,
    Both,
}

impl ChargingTime {
    /// Share of home charging energy delivered in the daytime window.
    pub fn day_share(self) -> f64 {
        match self {
            Self::Day => 1.0,
            Self::Night => 0.0,
            Self::Both => 0.5,
        }
    }

    /// Share of home charging energy delivered in the nighttime window.
    pub fn night_share(self) -> f64 {
        1.0 - self.day_share()
    }
}

/// Named household consumption profiles, scaled from the country defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadPreset {
    Minimal,
    #[default]
    Typical,
    Large,
    WorkFromHome,
}

impl LoadPreset {
    pub const NAMES: &[&str] = &["minimal", "typical", "large", "work_from_home"];

    /// `(day, night)` multipliers applied to the country default loads.
    pub fn factors(self) -> (f64, f64) {
        match self {
            Self::Minimal => (0.6, 0.6),
            Self::Typical => (1.0, 1.0),
            Self::Large => (1.5, 1.5),
            Self::WorkFromHome => (1.4, 1.0),
        }
    }
}

/// Household load for one half of the day: either an explicit kWh figure or a preset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LoadSpec {
    Kwh(f64),
    Preset(LoadPreset),
}

impl Default for LoadSpec {
    fn default() -> Self {
        Self::Preset(LoadPreset::Typical)
    }
}

/// A battery model and how many units are installed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatteryLineItem {
    pub model: Arc<BatteryModel>,
    pub quantity: u32,
}

impl BatteryLineItem {
    pub fn new(model: Arc<BatteryModel>, quantity: u32) -> Self {
        Self { model, quantity }
    }
}

/// A vehicle model in the household fleet with its usage pattern.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleLineItem {
    pub model: Arc<VehicleModel>,
    pub quantity: u32,
    /// Daily distance per vehicle (km); `None` uses the country default.
    pub daily_distance_km: Option<f64>,
    /// Share of charging done at home (0–100).
    pub home_charging_pct: f64,
    pub charging_time: ChargingTime,
}

impl VehicleLineItem {
    /// One vehicle at the country default distance, charged fully at home overnight.
    pub fn new(model: Arc<VehicleModel>) -> Self {
        Self {
            model,
            quantity: 1,
            daily_distance_km: None,
            home_charging_pct: 100.0,
            charging_time: ChargingTime::Night,
        }
    }
}

/// Everything the engine needs to simulate one household.
///
/// # Examples
///
/// ```
/// use home_energy_sim::catalog::Country;
/// use home_energy_sim::sim::types::{LoadSpec, SystemConfiguration};
///
/// let cfg = SystemConfiguration::new(Country::MY)
///     .with_solar_kw(10.0)
///     .with_loads(LoadSpec::Kwh(8.0), LoadSpec::Kwh(10.0));
/// assert_eq!(cfg.solar_kw, 10.0);
/// assert!(cfg.batteries.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemConfiguration {
    pub country: Country,
    /// Installed PV (kW).
    pub solar_kw: f64,
    pub roof: RoofQuality,
    pub batteries: Vec<BatteryLineItem>,
    pub vehicles: Vec<VehicleLineItem>,
    pub day_load: LoadSpec,
    pub night_load: LoadSpec,
    pub net_metering: NetMeteringMode,
    /// Home-charging share used when the fleet has no measurable demand (0–100).
    pub default_home_charging_pct: f64,
    /// Fleet charging policy used when vehicle preferences disagree.
    pub default_charging_time: ChargingTime,
}

impl SystemConfiguration {
    /// An empty system in `country`: no PV, no storage, no vehicles, typical loads.
    pub fn new(country: Country) -> Self {
        Self {
            country,
            solar_kw: 0.0,
            roof: RoofQuality::default(),
            batteries: Vec::new(),
            vehicles: Vec::new(),
            day_load: LoadSpec::default(),
            night_load: LoadSpec::default(),
            net_metering: NetMeteringMode::default(),
            default_home_charging_pct: 80.0,
            default_charging_time: ChargingTime::default(),
        }
    }

    pub fn with_solar_kw(mut self, solar_kw: f64) -> Self {
        self.solar_kw = solar_kw;
        self
    }

    pub fn with_roof(mut self, roof: RoofQuality) -> Self {
        self.roof = roof;
        self
    }

    pub fn with_loads(mut self, day: LoadSpec, night: LoadSpec) -> Self {
        self.day_load = day;
        self.night_load = night;
        self
    }

    pub fn with_net_metering(mut self, mode: NetMeteringMode) -> Self {
        self.net_metering = mode;
        self
    }

    pub fn with_battery(mut self, model: Arc<BatteryModel>, quantity: u32) -> Self {
        self.batteries.push(BatteryLineItem::new(model, quantity));
        self
    }

    pub fn with_batteries(mut self, batteries: Vec<BatteryLineItem>) -> Self {
        self.batteries = batteries;
        self
    }

    pub fn with_vehicle(mut self, vehicle: VehicleLineItem) -> Self {
        self.vehicles.push(vehicle);
        self
    }
}

/// Steady-state search for the battery level at midnight.
///
/// Warm-up passes replay the day, each seeded with the previous end level,
/// until two consecutive end levels differ by at most `tolerance_kwh` or
/// `max_passes` warm-up passes have run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SteadyState {
    pub max_passes: usize,
    pub tolerance_kwh: f64,
}

impl SteadyState {
    /// A single warm-up pass followed by the recorded pass.
    pub fn two_pass() -> Self {
        Self {
            max_passes: 1,
            tolerance_kwh: 0.0,
        }
    }
}

impl Default for SteadyState {
    fn default() -> Self {
        Self {
            max_passes: 64,
            tolerance_kwh: 1e-6,
        }
    }
}

/// Economic and modelling constants shared by every simulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Assumptions {
    /// Yearly tariff escalation (fraction).
    pub tariff_inflation: f64,
    /// Yearly operating cost as a fraction of system cost.
    pub opex_rate: f64,
    /// Total-cost-of-ownership horizon (years).
    pub horizon_years: u32,
    /// Payback search cap (years).
    pub payback_cap_years: u32,
    /// Linear capacity fade per year (fraction).
    pub degradation_rate_per_year: f64,
    /// Battery age the degraded capacity is evaluated at (years).
    pub degradation_years: f64,
    pub days_per_month: f64,
    /// Battery level the first warm-up pass starts from (fraction of capacity).
    pub warm_up_seed_fraction: f64,
    pub steady_state: SteadyState,
}

impl Default for Assumptions {
    fn default() -> Self {
        Self {
            tariff_inflation: 0.03,
            opex_rate: 0.01,
            horizon_years: 25,
            payback_cap_years: 50,
            degradation_rate_per_year: 0.015,
            degradation_years: 5.0,
            days_per_month: 30.0,
            warm_up_seed_fraction: 0.2,
            steady_state: SteadyState::default(),
        }
    }
}

impl Assumptions {
    /// Tariff multiplier for 1-based `year`.
    pub fn inflation_factor(&self, year: u32) -> f64 {
        (1.0 + self.tariff_inflation).powi(year.saturating_sub(1) as i32)
    }
}
