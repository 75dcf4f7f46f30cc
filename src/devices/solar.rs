use crate::catalog::CountryProfile;
use crate::devices::types::{Device, DeviceContext, HOURS_PER_DAY, finite_or_zero, safe_div};

/// Narrowing of the solar bell per degree of latitude.
const LATITUDE_NARROWING_PER_DEG: f64 = 0.005;

/// A solar PV array distributing its daily yield over daylight hours.
///
/// `SolarPv` shapes generation as a Gaussian centred on local solar noon,
/// truncated to the hours whose midpoint lies between sunrise and sunset and
/// normalized so the 24 hourly values sum to `daily_kwh`.
#[derive(Debug, Clone)]
pub struct SolarPv {
    /// Energy produced over the whole day (kWh).
    pub daily_kwh: f64,

    /// Local solar noon (fractional hour).
    pub noon_hour: f64,

    /// Standard deviation of the bell (hours).
    pub width_hours: f64,

    /// Normalized hourly shares, summing to 1.
    shares: [f64; HOURS_PER_DAY],
}

impl SolarPv {
    /// Creates a PV profile for a country.
    ///
    /// # Arguments
    ///
    /// * `daily_kwh` - Daily yield; negative or non-finite values are treated as zero
    /// * `profile` - Country table providing sunrise, sunset, and latitude
    pub fn new(daily_kwh: f64, profile: &CountryProfile) -> Self {
        let sunrise = profile.sunrise_hour;
        let sunset = profile.sunset_hour;
        let noon_hour = profile.solar_noon();
        let width_hours = Self::width_hours(profile);

        let mut shares = [0.0; HOURS_PER_DAY];
        for (hour, share) in shares.iter_mut().enumerate() {
            let mid = hour as f64 + 0.5;
            if mid < sunrise || mid > sunset {
                continue;
            }
            let z = (mid - noon_hour) / width_hours;
            *share = (-0.5 * z * z).exp();
        }
        let total: f64 = shares.iter().sum();
        for share in &mut shares {
            *share = safe_div(*share, total);
        }

        Self {
            daily_kwh: finite_or_zero(daily_kwh).max(0.0),
            noon_hour,
            width_hours,
            shares,
        }
    }

    /// Bell width: a sixth of the daylight span, narrowed slightly with latitude.
    pub fn width_hours(profile: &CountryProfile) -> f64 {
        let daylight = profile.sunset_hour - profile.sunrise_hour;
        let narrowing = (1.0 - LATITUDE_NARROWING_PER_DEG * profile.latitude_deg.abs()).max(0.5);
        daylight / 6.0 * narrowing
    }

    /// Hourly share of the daily yield.
    pub fn share(&self, hour: usize) -> f64 {
        self.shares[hour % HOURS_PER_DAY]
    }
}

impl Device for SolarPv {
    fn energy_kwh(&self, context: &DeviceContext) -> f64 {
        self.daily_kwh * self.share(context.hour)
    }

    fn device_type(&self) -> &'static str {
        "SolarPV"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Country;

    fn pv(daily: f64, country: Country) -> SolarPv {
        SolarPv::new(daily, country.profile())
    }

    #[test]
    fn hourly_values_integrate_to_daily_total() {
        for c in Country::ALL {
            let total: f64 = pv(40.0, c).profile().iter().sum();
            assert!((total - 40.0).abs() < 1e-9, "{c}: {total}");
        }
    }

    #[test]
    fn no_generation_at_night() {
        let pv = pv(40.0, Country::MY);
        for h in [0, 3, 5, 6, 20, 23] {
            assert_eq!(pv.energy_kwh(&DeviceContext::new(h)), 0.0, "hour {h}");
        }
    }

    #[test]
    fn peak_near_noon() {
        let pv = pv(40.0, Country::MY);
        let profile = pv.profile();
        let peak_hour = (0..24)
            .max_by(|a, b| profile[*a].total_cmp(&profile[*b]))
            .unwrap_or_default();
        assert!((12..=13).contains(&peak_hour));
    }

    #[test]
    fn higher_latitude_is_narrower() {
        let sg = SolarPv::width_hours(Country::SG.profile());
        let vn = SolarPv::width_hours(Country::VN.profile());
        let sg_daylight = Country::SG.profile().sunset_hour - Country::SG.profile().sunrise_hour;
        let vn_daylight = Country::VN.profile().sunset_hour - Country::VN.profile().sunrise_hour;
        assert!(vn / vn_daylight < sg / sg_daylight);
    }

    #[test]
    fn negative_or_nan_yield_is_zero() {
        assert_eq!(pv(-5.0, Country::TH).daily_kwh, 0.0);
        assert_eq!(pv(f64::NAN, Country::TH).daily_kwh, 0.0);
    }
}
