use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::BatteryModel;
use crate::sim::types::{BatteryLineItem, SystemConfiguration};

/// Search-space bounds for the brute-force strategies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizerSettings {
    /// Largest PV size tried (kW).
    pub max_solar_kw: f64,
    pub solar_step_kw: f64,
    /// Largest quantity tried per battery model.
    pub max_battery_units: u32,
    /// Half-width of the zero-bill solar window around the load estimate (kW).
    pub zero_bill_window_kw: f64,
    pub zero_bill_step_kw: f64,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            max_solar_kw: 20.0,
            solar_step_kw: 2.0,
            max_battery_units: 4,
            zero_bill_window_kw: 4.0,
            zero_bill_step_kw: 1.0,
        }
    }
}

/// One point of the search space.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Position in generation order; the final tie-breaker.
    pub index: usize,
    pub solar_kw: f64,
    pub batteries: Vec<BatteryLineItem>,
}

impl Candidate {
    /// `base` with this candidate's PV size and batteries.
    pub fn apply(&self, base: &SystemConfiguration) -> SystemConfiguration {
        base.clone()
            .with_solar_kw(self.solar_kw)
            .with_batteries(self.batteries.clone())
    }
}

/// `start, start + step, …` up to and including `end`.
///
/// A non-positive or non-finite step yields just `start`.
pub fn solar_sizes(start: f64, end: f64, step: f64) -> Vec<f64> {
    let start = start.max(0.0);
    if !step.is_finite() || step <= 0.0 || !end.is_finite() {
        return vec![start];
    }
    let count = ((end - start) / step + 1e-9).floor().max(0.0) as usize;
    (0..=count).map(|i| start + step * i as f64).collect()
}

/// No battery, then every model at `1..=max_units`.
pub fn battery_options(models: &[Arc<BatteryModel>], max_units: u32) -> Vec<Vec<BatteryLineItem>> {
    let mut options = vec![Vec::new()];
    for model in models {
        for quantity in 1..=max_units {
            options.push(vec![BatteryLineItem::new(Arc::clone(model), quantity)]);
        }
    }
    options
}

/// Cartesian product of sizes and options, skipping the empty system.
pub fn generate(sizes: &[f64], options: &[Vec<BatteryLineItem>]) -> Vec<Candidate> {
    let mut candidates = Vec::with_capacity(sizes.len() * options.len());
    for &solar_kw in sizes {
        for batteries in options {
            if solar_kw <= 0.0 && batteries.is_empty() {
                continue;
            }
            candidates.push(Candidate {
                index: candidates.len(),
                solar_kw,
                batteries: batteries.clone(),
            });
        }
    }
    candidates
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn model(id: &str) -> Arc<BatteryModel> {
        Arc::new(BatteryModel {
            id: id.into(),
            manufacturer: "Acme".into(),
            name: id.into(),
            capacity_kwh: 5.0,
            usable_capacity_kwh: 5.0,
            round_trip_efficiency: 0.9,
            warranty_cycles: 6000,
            warranty_years: 10,
            continuous_power_kw: 5.0,
            peak_power_kw: 7.0,
            prices: BTreeMap::new(),
            v2h: false,
        })
    }

    #[test]
    fn sizes_include_both_ends() {
        assert_eq!(solar_sizes(0.0, 20.0, 2.0).len(), 11);
        assert_eq!(solar_sizes(3.0, 5.0, 1.0), vec![3.0, 4.0, 5.0]);
        assert_eq!(solar_sizes(-2.0, 2.0, 1.0), vec![0.0, 1.0, 2.0]);
        assert_eq!(solar_sizes(4.0, 8.0, 0.0), vec![4.0]);
    }

    #[test]
    fn options_start_with_no_battery() {
        let options = battery_options(&[model("a"), model("b")], 3);
        assert_eq!(options.len(), 7);
        assert!(options[0].is_empty());
        assert_eq!(options[3][0].quantity, 3);
        assert_eq!(options[4][0].model.id, "b");
    }

    #[test]
    fn empty_system_is_not_a_candidate() {
        let options = battery_options(&[model("a")], 1);
        let candidates = generate(&[0.0, 2.0], &options);
        assert_eq!(candidates.len(), 3);
        assert!(!candidates[0].batteries.is_empty());
        assert!(candidates.iter().enumerate().all(|(i, c)| c.index == i));
    }
}
