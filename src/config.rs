//! TOML-based scenario configuration and preset definitions.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use crate::catalog::{BatteryModel, Catalog, Country, NetMeteringMode, RoofQuality, VehicleModel};
use crate::optimizer::OptimizerSettings;
use crate::sim::types::{
    Assumptions, BatteryLineItem, ChargingTime, LoadPreset, LoadSpec, SystemConfiguration,
    VehicleLineItem,
};

/// Top-level scenario configuration parsed from TOML.
///
/// Every section has defaults, so a file only needs the fields it changes.
/// Load from TOML with [`ScenarioConfig::from_toml_file`] or use one of the
/// [`ScenarioConfig::PRESETS`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Site, PV, loads, and tariff regime.
    #[serde(default)]
    pub household: HouseholdConfig,
    /// Installed batteries, by catalog id.
    #[serde(default)]
    pub batteries: Vec<BatteryItemConfig>,
    /// Household vehicles, by catalog id.
    #[serde(default)]
    pub vehicles: Vec<VehicleItemConfig>,
    /// Economic and modelling constants.
    #[serde(default)]
    pub assumptions: Assumptions,
    /// Search-space bounds for `--optimize`.
    #[serde(default)]
    pub optimizer: OptimizerSettings,
    /// Catalog snapshot the ids above refer to.
    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Household site parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HouseholdConfig {
    pub country: Country,
    /// Installed PV (kW).
    pub solar_kw: f64,
    pub roof: RoofQuality,
    /// kWh/day or a preset name (`minimal`, `typical`, `large`, `work_from_home`).
    pub day_load: LoadSpec,
    pub night_load: LoadSpec,
    pub net_metering: NetMeteringMode,
    /// Home-charging share when no vehicle has measurable demand (0–100).
    pub default_home_charging_pct: f64,
    pub default_charging_time: ChargingTime,
}

impl Default for HouseholdConfig {
    fn default() -> Self {
        Self {
            country: Country::MY,
            solar_kw: 0.0,
            roof: RoofQuality::default(),
            day_load: LoadSpec::default(),
            night_load: LoadSpec::default(),
            net_metering: NetMeteringMode::default(),
            default_home_charging_pct: 80.0,
            default_charging_time: ChargingTime::default(),
        }
    }
}

/// One `[[batteries]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatteryItemConfig {
    /// Catalog id.
    pub model: String,
    #[serde(default = "one")]
    pub quantity: u32,
}

/// One `[[vehicles]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VehicleItemConfig {
    /// Catalog id.
    pub model: String,
    #[serde(default = "one")]
    pub quantity: u32,
    /// Per-vehicle daily distance (km); the country default when omitted.
    #[serde(default)]
    pub daily_distance_km: Option<f64>,
    #[serde(default = "full_pct")]
    pub home_charging_pct: f64,
    #[serde(default)]
    pub charging_time: ChargingTime,
}

fn one() -> u32 {
    1
}

fn full_pct() -> f64 {
    100.0
}

/// Embedded catalog snapshot.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    pub batteries: Vec<BatteryModel>,
    pub vehicles: Vec<VehicleModel>,
}

/// Errors raised while loading, validating, or resolving a scenario.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read \"{}\": {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid scenario TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unknown preset \"{name}\", available: {available}")]
    UnknownPreset { name: String, available: String },

    #[error("unknown battery model \"{0}\"")]
    UnknownBattery(String),

    #[error("unknown vehicle model \"{0}\"")]
    UnknownVehicle(String),

    #[error("config error: {field}: {message}")]
    Invalid { field: String, message: String },
}

impl ConfigError {
    fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Dotted field path for validation errors.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Invalid { field, .. } => Some(field),
            _ => None,
        }
    }
}

fn battery(
    id: &str,
    manufacturer: &str,
    name: &str,
    capacity_kwh: f64,
    usable_capacity_kwh: f64,
    power_kw: (f64, f64),
    prices: &[(Country, f64)],
) -> BatteryModel {
    BatteryModel {
        id: id.to_string(),
        manufacturer: manufacturer.to_string(),
        name: name.to_string(),
        capacity_kwh,
        usable_capacity_kwh,
        round_trip_efficiency: 0.9,
        warranty_cycles: 6000,
        warranty_years: 10,
        continuous_power_kw: power_kw.0,
        peak_power_kw: power_kw.1,
        prices: prices.iter().copied().collect::<BTreeMap<_, _>>(),
        v2h: false,
    }
}

fn vehicle(id: &str, make: &str, model: &str, battery_kwh: f64) -> VehicleModel {
    VehicleModel {
        id: id.to_string(),
        make: make.to_string(),
        model: model.to_string(),
        battery_kwh,
        range_wltp_km: None,
        range_epa_km: None,
        range_km: None,
        efficiency_kwh_per_100km: None,
    }
}

impl CatalogConfig {
    /// Small illustrative catalog shared by the built-in presets.
    pub fn demo() -> Self {
        use Country::*;
        Self {
            batteries: vec![
                battery(
                    "hv-10",
                    "Voltaris",
                    "HV 10",
                    10.24,
                    10.0,
                    (5.0, 7.5),
                    &[(MY, 28_000.0), (SG, 9_500.0), (TH, 210_000.0), (PH, 380_000.0)],
                ),
                battery(
                    "lv-5",
                    "Voltaris",
                    "LV 5",
                    5.12,
                    5.0,
                    (2.5, 3.6),
                    &[(MY, 15_000.0), (TH, 110_000.0), (PH, 200_000.0), (ID, 45e6)],
                ),
                battery(
                    "wall-13",
                    "Helion",
                    "Wall 13",
                    13.5,
                    13.5,
                    (5.0, 10.0),
                    &[(MY, 38_000.0), (SG, 13_000.0), (TH, 300_000.0), (PH, 520_000.0)],
                ),
            ],
            vehicles: vec![
                VehicleModel {
                    range_wltp_km: Some(420.0),
                    ..vehicle("compact-suv", "Orbit", "Compact SUV", 60.48)
                },
                VehicleModel {
                    range_wltp_km: Some(513.0),
                    range_epa_km: Some(438.0),
                    ..vehicle("sedan-lr", "Helion", "Sedan LR", 57.5)
                },
                VehicleModel {
                    range_km: Some(350.0),
                    efficiency_kwh_per_100km: Some(16.6),
                    ..vehicle("hatch", "Orbit", "Hatch", 51.0)
                },
            ],
        }
    }
}

impl ScenarioConfig {
    /// Malaysia, 8/10 kWh day/night load, 10 kW PV, one 10 kWh battery, no EVs.
    pub fn baseline() -> Self {
        Self {
            household: HouseholdConfig {
                country: Country::MY,
                solar_kw: 10.0,
                day_load: LoadSpec::Kwh(8.0),
                night_load: LoadSpec::Kwh(10.0),
                ..HouseholdConfig::default()
            },
            batteries: vec![BatteryItemConfig {
                model: "hv-10".to_string(),
                quantity: 1,
            }],
            catalog: CatalogConfig::demo(),
            ..Self::default()
        }
    }

    /// Thailand, PV + two small batteries + two EVs under net billing.
    pub fn ev_household() -> Self {
        Self {
            household: HouseholdConfig {
                country: Country::TH,
                solar_kw: 8.0,
                roof: RoofQuality::Good,
                net_metering: NetMeteringMode::NetBilling,
                ..HouseholdConfig::default()
            },
            batteries: vec![BatteryItemConfig {
                model: "lv-5".to_string(),
                quantity: 2,
            }],
            vehicles: vec![
                VehicleItemConfig {
                    model: "compact-suv".to_string(),
                    quantity: 1,
                    daily_distance_km: Some(40.0),
                    home_charging_pct: 90.0,
                    charging_time: ChargingTime::Night,
                },
                VehicleItemConfig {
                    model: "sedan-lr".to_string(),
                    quantity: 1,
                    daily_distance_km: Some(60.0),
                    home_charging_pct: 70.0,
                    charging_time: ChargingTime::Both,
                },
            ],
            catalog: CatalogConfig::demo(),
            ..Self::default()
        }
    }

    /// Philippines, PV only with net-metering export credit, one day-charged EV.
    pub fn net_metering() -> Self {
        Self {
            household: HouseholdConfig {
                country: Country::PH,
                solar_kw: 6.0,
                day_load: LoadSpec::Preset(LoadPreset::WorkFromHome),
                net_metering: NetMeteringMode::NetMetering,
                default_charging_time: ChargingTime::Day,
                ..HouseholdConfig::default()
            },
            vehicles: vec![VehicleItemConfig {
                model: "hatch".to_string(),
                quantity: 1,
                daily_distance_km: None,
                home_charging_pct: 100.0,
                charging_time: ChargingTime::Day,
            }],
            catalog: CatalogConfig::demo(),
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "ev_household", "net_metering"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownPreset`] if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "ev_household" => Ok(Self::ev_household()),
            "net_metering" => Ok(Self::net_metering()),
            _ => Err(ConfigError::UnknownPreset {
                name: name.to_string(),
                available: Self::PRESETS.join(", "),
            }),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid. The engine itself
    /// tolerates most of these (it substitutes and reports), so this is the
    /// strict gate for hand-written scenario files.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let mut check = |ok: bool, field: &str, message: &str| {
            if !ok {
                errors.push(ConfigError::invalid(field, message));
            }
        };
        let non_negative = |v: f64| v.is_finite() && v >= 0.0;
        let positive = |v: f64| v.is_finite() && v > 0.0;
        let pct = |v: f64| (0.0..=100.0).contains(&v);

        let h = &self.household;
        check(non_negative(h.solar_kw), "household.solar_kw", "must be a finite value >= 0");
        for (field, load) in [
            ("household.day_load", h.day_load),
            ("household.night_load", h.night_load),
        ] {
            if let LoadSpec::Kwh(kwh) = load {
                check(non_negative(kwh), field, "must be a finite kWh value >= 0");
            }
        }
        check(
            pct(h.default_home_charging_pct),
            "household.default_home_charging_pct",
            "must be in [0, 100]",
        );
        check(
            h.country.profile().offers(h.net_metering),
            "household.net_metering",
            "mode is not offered in this country",
        );

        for (i, v) in self.vehicles.iter().enumerate() {
            check(
                pct(v.home_charging_pct),
                &format!("vehicles[{i}].home_charging_pct"),
                "must be in [0, 100]",
            );
            if let Some(km) = v.daily_distance_km {
                check(
                    positive(km),
                    &format!("vehicles[{i}].daily_distance_km"),
                    "must be a finite value > 0",
                );
            }
        }

        let a = &self.assumptions;
        check(a.tariff_inflation > -1.0, "assumptions.tariff_inflation", "must be > -1");
        check(non_negative(a.opex_rate), "assumptions.opex_rate", "must be >= 0");
        check(a.horizon_years > 0, "assumptions.horizon_years", "must be > 0");
        check(a.payback_cap_years > 0, "assumptions.payback_cap_years", "must be > 0");
        check(
            (0.0..=1.0).contains(&a.degradation_rate_per_year),
            "assumptions.degradation_rate_per_year",
            "must be in [0.0, 1.0]",
        );
        check(
            non_negative(a.degradation_years),
            "assumptions.degradation_years",
            "must be >= 0",
        );
        check(positive(a.days_per_month), "assumptions.days_per_month", "must be > 0");
        check(
            (0.0..=1.0).contains(&a.warm_up_seed_fraction),
            "assumptions.warm_up_seed_fraction",
            "must be in [0.0, 1.0]",
        );
        check(
            non_negative(a.steady_state.tolerance_kwh),
            "assumptions.steady_state.tolerance_kwh",
            "must be >= 0",
        );

        let o = &self.optimizer;
        check(non_negative(o.max_solar_kw), "optimizer.max_solar_kw", "must be >= 0");
        check(positive(o.solar_step_kw), "optimizer.solar_step_kw", "must be > 0");
        check(
            non_negative(o.zero_bill_window_kw),
            "optimizer.zero_bill_window_kw",
            "must be >= 0",
        );
        check(positive(o.zero_bill_step_kw), "optimizer.zero_bill_step_kw", "must be > 0");

        let mut seen = BTreeSet::new();
        for b in &self.catalog.batteries {
            check(
                seen.insert(b.id.as_str()),
                "catalog.batteries",
                &format!("duplicate id \"{}\"", b.id),
            );
        }
        let mut seen = BTreeSet::new();
        for v in &self.catalog.vehicles {
            check(
                seen.insert(v.id.as_str()),
                "catalog.vehicles",
                &format!("duplicate id \"{}\"", v.id),
            );
        }

        for b in &self.batteries {
            if !self.catalog.batteries.iter().any(|m| m.id == b.model) {
                errors.push(ConfigError::UnknownBattery(b.model.clone()));
            }
        }
        for v in &self.vehicles {
            if !self.catalog.vehicles.iter().any(|m| m.id == v.model) {
                errors.push(ConfigError::UnknownVehicle(v.model.clone()));
            }
        }

        errors
    }

    /// Builds the engine inputs, resolving catalog ids to shared records.
    ///
    /// # Errors
    ///
    /// Returns the first unknown battery or vehicle id.
    pub fn resolve(&self) -> Result<(SystemConfiguration, Catalog), ConfigError> {
        let catalog = Catalog::new(
            self.catalog.batteries.clone(),
            self.catalog.vehicles.clone(),
        );
        let h = &self.household;

        let batteries = self
            .batteries
            .iter()
            .map(|b| {
                let model = catalog
                    .battery(&b.model)
                    .ok_or_else(|| ConfigError::UnknownBattery(b.model.clone()))?;
                Ok(BatteryLineItem::new(Arc::clone(model), b.quantity))
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let mut config = SystemConfiguration::new(h.country)
            .with_solar_kw(h.solar_kw)
            .with_roof(h.roof)
            .with_loads(h.day_load, h.night_load)
            .with_net_metering(h.net_metering)
            .with_batteries(batteries);
        config.default_home_charging_pct = h.default_home_charging_pct;
        config.default_charging_time = h.default_charging_time;

        for v in &self.vehicles {
            let model = catalog
                .vehicle(&v.model)
                .ok_or_else(|| ConfigError::UnknownVehicle(v.model.clone()))?;
            config = config.with_vehicle(VehicleLineItem {
                model: Arc::clone(model),
                quantity: v.quantity,
                daily_distance_km: v.daily_distance_km,
                home_charging_pct: v.home_charging_pct,
                charging_time: v.charging_time,
            });
        }

        Ok((config, catalog))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_preset_valid() {
        let cfg = ScenarioConfig::baseline();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "baseline should be valid: {errors:?}");
    }

    #[test]
    fn from_preset_unknown() {
        let err = ScenarioConfig::from_preset("nonexistent").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownPreset { .. }));
        assert!(err.to_string().contains("unknown preset"));
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[household]
country = "SG"
solar_kw = 6.5
roof = "shaded"
day_load = 7.5
night_load = "large"
net_metering = "net_billing"

[[batteries]]
model = "b1"
quantity = 2

[[vehicles]]
model = "v1"
daily_distance_km = 55.0
home_charging_pct = 60.0
charging_time = "both"

[assumptions]
tariff_inflation = 0.02
horizon_years = 20

[assumptions.steady_state]
max_passes = 1

[optimizer]
max_solar_kw = 12.0

[[catalog.batteries]]
id = "b1"
manufacturer = "Acme"
name = "B1"
capacity_kwh = 5.0
usable_capacity_kwh = 4.8
prices = { SG = 4000.0 }

[[catalog.vehicles]]
id = "v1"
make = "Acme"
model = "V1"
battery_kwh = 60.0
range_epa_km = 400.0
"#;
        let cfg = ScenarioConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.unwrap();
        assert!(cfg.validate().is_empty(), "{:?}", cfg.validate());
        assert_eq!(cfg.household.night_load, LoadSpec::Preset(LoadPreset::Large));
        assert_eq!(cfg.assumptions.steady_state.max_passes, 1);
        assert_eq!(cfg.assumptions.opex_rate, 0.01);
        assert_eq!(cfg.optimizer.solar_step_kw, 2.0);

        let (system, catalog) = cfg.resolve().unwrap();
        assert_eq!(system.country, Country::SG);
        assert_eq!(system.batteries[0].quantity, 2);
        assert_eq!(system.vehicles[0].charging_time, ChargingTime::Both);
        assert!(Arc::ptr_eq(
            &system.batteries[0].model,
            catalog.battery("b1").unwrap()
        ));
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[household]
solar_kw = 5.0
bogus_field = true
"#;
        let err = ScenarioConfig::from_toml_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ScenarioConfig::from_toml_file(Path::new("/nonexistent/scenario.toml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn validation_collects_every_problem() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.household.solar_kw = -1.0;
        cfg.household.default_home_charging_pct = 120.0;
        cfg.assumptions.days_per_month = 0.0;
        cfg.optimizer.solar_step_kw = 0.0;
        let errors = cfg.validate();
        let fields: Vec<_> = errors.iter().filter_map(ConfigError::field).collect();
        assert!(fields.contains(&"household.solar_kw"));
        assert!(fields.contains(&"household.default_home_charging_pct"));
        assert!(fields.contains(&"assumptions.days_per_month"));
        assert!(fields.contains(&"optimizer.solar_step_kw"));
    }

    #[test]
    fn validation_flags_unavailable_net_metering() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.household.net_metering = NetMeteringMode::NetMetering;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field() == Some("household.net_metering")));
    }

    #[test]
    fn unknown_ids_fail_validation_and_resolution() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.batteries[0].model = "missing".to_string();
        assert!(
            cfg.validate()
                .iter()
                .any(|e| matches!(e, ConfigError::UnknownBattery(id) if id == "missing"))
        );
        assert!(matches!(cfg.resolve(), Err(ConfigError::UnknownBattery(_))));
    }

    #[test]
    fn duplicate_catalog_ids_are_rejected() {
        let mut cfg = ScenarioConfig::baseline();
        let dup = cfg.catalog.batteries[0].clone();
        cfg.catalog.batteries.push(dup);
        assert!(
            cfg.validate()
                .iter()
                .any(|e| e.field() == Some("catalog.batteries"))
        );
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let cfg = ScenarioConfig::from_toml_str("[household]\nsolar_kw = 3.0\n").unwrap();
        assert_eq!(cfg.household.solar_kw, 3.0);
        assert_eq!(cfg.household.country, Country::MY);
        assert_eq!(cfg.household.day_load, LoadSpec::Preset(LoadPreset::Typical));
        assert_eq!(cfg.assumptions.horizon_years, 25);
        assert!(cfg.batteries.is_empty());
    }

    #[test]
    fn all_presets_are_valid_and_resolve() {
        for name in ScenarioConfig::PRESETS {
            let cfg = ScenarioConfig::from_preset(name).unwrap();
            let errors = cfg.validate();
            assert!(errors.is_empty(), "preset \"{name}\" should be valid: {errors:?}");
            assert!(cfg.resolve().is_ok(), "preset \"{name}\" should resolve");
        }
    }
}
