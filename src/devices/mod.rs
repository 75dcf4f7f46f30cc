//! Hourly device profiles for the representative day.

/// Household consumption curve.
pub mod baseload;
/// Aggregate home battery with canonical level clamping.
pub mod battery;
/// Windowed EV home-charging curves.
pub mod ev_charger;
/// Solar PV generation curve.
pub mod solar;
pub mod types;

// Re-export the main types for convenience
pub use baseload::BaseLoad;
pub use battery::BatteryBank;
pub use ev_charger::{EvCharger, EvFleet};
pub use solar::SolarPv;
pub use types::Device;
pub use types::DeviceContext;
pub use types::InputIssue;
