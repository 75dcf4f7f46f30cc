//! Country constant tables: solar resource, tariffs, net-metering rules.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Supported markets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Country {
    /// Malaysia.
    MY,
    /// Singapore.
    SG,
    /// Thailand.
    TH,
    /// Indonesia.
    ID,
    /// Philippines.
    PH,
    /// Vietnam.
    VN,
}

/// Regulatory regime for crediting exported solar energy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetMeteringMode {
    /// No export crediting; surplus is curtailed.
    #[default]
    SelfConsumption,
    /// Exported kWh offset imported kWh (possibly at a discount).
    NetMetering,
    /// Exported kWh are bought back at a separate, lower rate.
    NetBilling,
}

/// Roof orientation/shading class applied to the nameplate yield.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoofQuality {
    #[default]
    Optimal,
    Good,
    Shaded,
}

impl RoofQuality {
    pub fn multiplier(self) -> f64 {
        match self {
            Self::Optimal => 1.0,
            Self::Good => 0.9,
            Self::Shaded => 0.75,
        }
    }
}

/// Immutable per-country constants.
///
/// Monetary values are in the local currency given by `currency`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CountryProfile {
    /// Daily yield per installed kW of PV (kWh/kW/day).
    pub solar_yield_per_kw: f64,
    /// Installed PV cost per kW.
    pub solar_cost_per_kw: f64,
    /// Default daily driving distance (km).
    pub default_driving_km: f64,
    /// Default daytime household load (kWh/day).
    pub default_day_load_kwh: f64,
    /// Default nighttime household load (kWh/day).
    pub default_night_load_kwh: f64,
    /// Export credit as a fraction of the residential tariff, per available mode.
    pub export_multipliers: &'static [(NetMeteringMode, f64)],
    /// Residential tariff per kWh.
    pub tariff_per_kwh: f64,
    /// Public DC fast-charging price per kWh.
    pub public_charging_per_kwh: f64,
    /// Grid emission intensity (kg CO₂/kWh).
    pub co2_kg_per_kwh: f64,
    /// ISO 4217 code.
    pub currency: &'static str,
    /// Local sunrise, fractional hours.
    pub sunrise_hour: f64,
    /// Local sunset, fractional hours.
    pub sunset_hour: f64,
    /// Absolute latitude of the main population centre (degrees).
    pub latitude_deg: f64,
}

impl CountryProfile {
    /// Midpoint between sunrise and sunset.
    pub fn solar_noon(&self) -> f64 {
        (self.sunrise_hour + self.sunset_hour) / 2.0
    }

    /// Net-metering modes this market offers.
    pub fn net_metering_modes(&self) -> impl Iterator<Item = NetMeteringMode> + '_ {
        self.export_multipliers.iter().map(|(mode, _)| *mode)
    }

    pub fn offers(&self, mode: NetMeteringMode) -> bool {
        self.net_metering_modes().any(|m| m == mode)
    }

    /// Export credit multiplier for `mode`, or 0 if the market does not offer it.
    pub fn export_multiplier(&self, mode: NetMeteringMode) -> f64 {
        self.export_multipliers
            .iter()
            .find(|(m, _)| *m == mode)
            .map_or(0.0, |(_, multiplier)| multiplier.max(0.0))
    }

    /// `true` when at least one offered mode pays for exports.
    pub fn has_export_credit(&self) -> bool {
        self.export_multipliers.iter().any(|(_, m)| *m > 0.0)
    }
}

const MY: CountryProfile = CountryProfile {
    solar_yield_per_kw: 4.0,
    solar_cost_per_kw: 4_000.0,
    default_driving_km: 40.0,
    default_day_load_kwh: 8.0,
    default_night_load_kwh: 10.0,
    export_multipliers: &[(NetMeteringMode::SelfConsumption, 0.0)],
    tariff_per_kwh: 0.55,
    public_charging_per_kwh: 1.30,
    co2_kg_per_kwh: 0.585,
    currency: "MYR",
    sunrise_hour: 7.1,
    sunset_hour: 19.3,
    latitude_deg: 3.1,
};

const SG: CountryProfile = CountryProfile {
    solar_yield_per_kw: 3.6,
    solar_cost_per_kw: 1_800.0,
    default_driving_km: 30.0,
    default_day_load_kwh: 6.0,
    default_night_load_kwh: 8.0,
    export_multipliers: &[
        (NetMeteringMode::SelfConsumption, 0.0),
        (NetMeteringMode::NetBilling, 0.75),
    ],
    tariff_per_kwh: 0.30,
    public_charging_per_kwh: 0.65,
    co2_kg_per_kwh: 0.408,
    currency: "SGD",
    sunrise_hour: 7.0,
    sunset_hour: 19.1,
    latitude_deg: 1.35,
};

const TH: CountryProfile = CountryProfile {
    solar_yield_per_kw: 4.2,
    solar_cost_per_kw: 35_000.0,
    default_driving_km: 35.0,
    default_day_load_kwh: 7.0,
    default_night_load_kwh: 9.0,
    export_multipliers: &[
        (NetMeteringMode::SelfConsumption, 0.0),
        (NetMeteringMode::NetBilling, 0.5),
    ],
    tariff_per_kwh: 4.2,
    public_charging_per_kwh: 7.5,
    co2_kg_per_kwh: 0.45,
    currency: "THB",
    sunrise_hour: 6.2,
    sunset_hour: 18.4,
    latitude_deg: 13.7,
};

const ID: CountryProfile = CountryProfile {
    solar_yield_per_kw: 4.0,
    solar_cost_per_kw: 15_000_000.0,
    default_driving_km: 30.0,
    default_day_load_kwh: 5.0,
    default_night_load_kwh: 6.0,
    export_multipliers: &[
        (NetMeteringMode::SelfConsumption, 0.0),
        (NetMeteringMode::NetMetering, 0.65),
    ],
    tariff_per_kwh: 1_445.0,
    public_charging_per_kwh: 2_467.0,
    co2_kg_per_kwh: 0.79,
    currency: "IDR",
    sunrise_hour: 5.7,
    sunset_hour: 17.9,
    latitude_deg: 6.2,
};

const PH: CountryProfile = CountryProfile {
    solar_yield_per_kw: 4.1,
    solar_cost_per_kw: 55_000.0,
    default_driving_km: 30.0,
    default_day_load_kwh: 6.0,
    default_night_load_kwh: 7.0,
    export_multipliers: &[
        (NetMeteringMode::SelfConsumption, 0.0),
        (NetMeteringMode::NetMetering, 0.5),
    ],
    tariff_per_kwh: 11.5,
    public_charging_per_kwh: 25.0,
    co2_kg_per_kwh: 0.69,
    currency: "PHP",
    sunrise_hour: 5.8,
    sunset_hour: 17.9,
    latitude_deg: 14.6,
};

const VN: CountryProfile = CountryProfile {
    solar_yield_per_kw: 3.9,
    solar_cost_per_kw: 18_000_000.0,
    default_driving_km: 25.0,
    default_day_load_kwh: 6.0,
    default_night_load_kwh: 7.0,
    export_multipliers: &[(NetMeteringMode::SelfConsumption, 0.0)],
    tariff_per_kwh: 2_800.0,
    public_charging_per_kwh: 3_858.0,
    co2_kg_per_kwh: 0.68,
    currency: "VND",
    sunrise_hour: 5.6,
    sunset_hour: 17.8,
    latitude_deg: 16.0,
};

impl Country {
    pub const ALL: [Self; 6] = [Self::MY, Self::SG, Self::TH, Self::ID, Self::PH, Self::VN];

    /// Returns the constant table for this country.
    pub const fn profile(self) -> &'static CountryProfile {
        match self {
            Self::MY => &MY,
            Self::SG => &SG,
            Self::TH => &TH,
            Self::ID => &ID,
            Self::PH => &PH,
            Self::VN => &VN,
        }
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::MY => "MY",
            Self::SG => "SG",
            Self::TH => "TH",
            Self::ID => "ID",
            Self::PH => "PH",
            Self::VN => "VN",
        }
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Country {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown country code \"{s}\""))
    }
}
