//! Read-only catalog records supplied by the surrounding application.

pub mod battery;
pub mod country;
pub mod vehicle;

use std::sync::Arc;

pub use battery::BatteryModel;
pub use country::{Country, CountryProfile, NetMeteringMode, RoofQuality};
pub use vehicle::VehicleModel;

/// A snapshot of the battery and vehicle catalog.
///
/// Records are shared behind `Arc` so optimizer workers can read them
/// concurrently without copying.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub batteries: Vec<Arc<BatteryModel>>,
    pub vehicles: Vec<Arc<VehicleModel>>,
}

impl Catalog {
    pub fn new(batteries: Vec<BatteryModel>, vehicles: Vec<VehicleModel>) -> Self {
        Self {
            batteries: batteries.into_iter().map(Arc::new).collect(),
            vehicles: vehicles.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn battery(&self, id: &str) -> Option<&Arc<BatteryModel>> {
        self.batteries.iter().find(|b| b.id == id)
    }

    pub fn vehicle(&self, id: &str) -> Option<&Arc<VehicleModel>> {
        self.vehicles.iter().find(|v| v.id == id)
    }

    /// Batteries that have a valid price and positive usable capacity in `country`.
    pub fn batteries_sold_in(&self, country: Country) -> Vec<Arc<BatteryModel>> {
        self.batteries
            .iter()
            .filter(|b| b.price_in(country).is_some())
            .filter(|b| b.usable_capacity_kwh.is_finite() && b.usable_capacity_kwh > 0.0)
            .cloned()
            .collect()
    }
}
