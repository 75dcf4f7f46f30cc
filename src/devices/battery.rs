use crate::devices::types::finite_or_zero;

/// Clamps a stored-energy value into `[0, capacity_kwh]`.
///
/// NaN maps to 0 and `-0.0` is normalized to `0.0`. This is the only place
/// battery levels are bounded; every mutation of [`BatteryBank`] goes through it.
pub fn clamp_level(level_kwh: f64, capacity_kwh: f64) -> f64 {
    let capacity = finite_or_zero(capacity_kwh).max(0.0);
    // `+ 0.0` turns a negative zero into a positive one.
    finite_or_zero(level_kwh).clamp(0.0, capacity) + 0.0
}

/// The aggregate home battery of a household, after degradation.
///
/// Tracks stored energy only. Losses are not modelled at this level; flows
/// into and out of the bank are taken at face value so that hourly energy
/// balances close exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct BatteryBank {
    /// Total degraded usable capacity (kWh).
    pub capacity_kwh: f64,

    level_kwh: f64,
}

impl BatteryBank {
    /// Creates a bank holding `level_kwh`, clamped into range.
    pub fn new(capacity_kwh: f64, level_kwh: f64) -> Self {
        let capacity_kwh = finite_or_zero(capacity_kwh).max(0.0);
        Self {
            capacity_kwh,
            level_kwh: clamp_level(level_kwh, capacity_kwh),
        }
    }

    /// Creates a bank filled to `fraction` of its capacity.
    pub fn at_fraction(capacity_kwh: f64, fraction: f64) -> Self {
        Self::new(capacity_kwh, capacity_kwh * fraction.clamp(0.0, 1.0))
    }

    /// Currently stored energy (kWh).
    pub fn level_kwh(&self) -> f64 {
        self.level_kwh
    }

    /// Free space (kWh).
    pub fn headroom_kwh(&self) -> f64 {
        (self.capacity_kwh - self.level_kwh).max(0.0)
    }

    pub fn set_level(&mut self, level_kwh: f64) {
        self.level_kwh = clamp_level(level_kwh, self.capacity_kwh);
    }

    /// Stores up to `offered_kwh` and returns the amount accepted.
    pub fn charge(&mut self, offered_kwh: f64) -> f64 {
        let accepted = finite_or_zero(offered_kwh).max(0.0).min(self.headroom_kwh());
        self.set_level(self.level_kwh + accepted);
        accepted
    }

    /// Releases up to `requested_kwh` and returns the amount delivered.
    pub fn discharge(&mut self, requested_kwh: f64) -> f64 {
        let delivered = finite_or_zero(requested_kwh).max(0.0).min(self.level_kwh);
        self.set_level(self.level_kwh - delivered);
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_handles_drift_and_garbage() {
        assert_eq!(clamp_level(-1e-15, 10.0), 0.0);
        assert!(clamp_level(-0.0, 10.0).is_sign_positive());
        assert_eq!(clamp_level(10.000_000_1, 10.0), 10.0);
        assert_eq!(clamp_level(f64::NAN, 10.0), 0.0);
        assert_eq!(clamp_level(5.0, f64::NAN), 0.0);
    }

    #[test]
    fn new_bank_clamps_initial_level() {
        let bank = BatteryBank::new(10.0, 12.0);
        assert_eq!(bank.level_kwh(), 10.0);
        let bank = BatteryBank::at_fraction(10.0, 0.2);
        assert!((bank.level_kwh() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn charge_limited_by_headroom() {
        let mut bank = BatteryBank::new(10.0, 9.0);
        assert_eq!(bank.charge(5.0), 1.0);
        assert_eq!(bank.level_kwh(), 10.0);
        assert_eq!(bank.charge(1.0), 0.0);
    }

    #[test]
    fn discharge_limited_by_level() {
        let mut bank = BatteryBank::new(10.0, 1.5);
        assert_eq!(bank.discharge(4.0), 1.5);
        assert_eq!(bank.level_kwh(), 0.0);
        assert_eq!(bank.discharge(1.0), 0.0);
    }

    #[test]
    fn negative_requests_are_ignored() {
        let mut bank = BatteryBank::new(10.0, 5.0);
        assert_eq!(bank.charge(-3.0), 0.0);
        assert_eq!(bank.discharge(f64::NAN), 0.0);
        assert_eq!(bank.level_kwh(), 5.0);
    }

    #[test]
    fn zero_capacity_bank_is_inert() {
        let mut bank = BatteryBank::new(0.0, 3.0);
        assert_eq!(bank.level_kwh(), 0.0);
        assert_eq!(bank.charge(3.0), 0.0);
        assert_eq!(bank.discharge(3.0), 0.0);
    }
}
