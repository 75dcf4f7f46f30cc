use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::sim::SimulationResult;

/// Objective the optimizer selects a system for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Lowest finite payback among candidates that save money.
    MinimumPayback,
    /// Largest horizon TCO difference.
    BestNetSavings,
    /// Lowest system cost that reaches a zero bill.
    CheapestZeroBill,
    /// Analytically sized system verified to need no grid import.
    OffGrid,
}

impl Strategy {
    pub const ALL: [Self; 4] = [
        Self::MinimumPayback,
        Self::BestNetSavings,
        Self::CheapestZeroBill,
        Self::OffGrid,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::MinimumPayback => "minimum_payback",
            Self::BestNetSavings => "best_net_savings",
            Self::CheapestZeroBill => "cheapest_zero_bill",
            Self::OffGrid => "off_grid",
        }
    }

    /// Selection metric for an evaluated candidate; lower is better.
    ///
    /// `None` when the candidate is not eligible under this strategy.
    pub fn score(self, result: &SimulationResult) -> Option<f64> {
        let finance = &result.finance;
        match self {
            Self::MinimumPayback => {
                if finance.monthly_savings <= 0.0 {
                    return None;
                }
                finance.payback.years()
            }
            Self::BestNetSavings => (finance.net_savings > 0.0).then_some(-finance.net_savings),
            Self::CheapestZeroBill => finance.zero_bill.then_some(finance.system_cost),
            Self::OffGrid => result
                .is_grid_independent()
                .then_some(finance.system_cost),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "minimum_payback" | "min_payback" | "payback" => Ok(Self::MinimumPayback),
            "best_net_savings" | "net_savings" | "savings" => Ok(Self::BestNetSavings),
            "cheapest_zero_bill" | "zero_bill" => Ok(Self::CheapestZeroBill),
            "off_grid" | "offgrid" => Ok(Self::OffGrid),
            other => Err(format!(
                "unknown strategy `{other}` (expected one of: {})",
                Strategy::ALL.map(Strategy::name).join(", ")
            )),
        }
    }
}

/// Sort key of an eligible candidate: metric, then system cost, then index.
///
/// Total over all inputs, so parallel reduction picks the same winner
/// regardless of evaluation order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionKey {
    pub metric: f64,
    pub system_cost: f64,
    pub index: usize,
}

impl SelectionKey {
    pub fn compare(&self, other: &Self) -> Ordering {
        self.metric
            .total_cmp(&other.metric)
            .then_with(|| self.system_cost.total_cmp(&other.system_cost))
            .then_with(|| self.index.cmp(&other.index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_and_aliases() {
        for s in Strategy::ALL {
            assert_eq!(s.name().parse::<Strategy>(), Ok(s));
        }
        assert_eq!("zero-bill".parse::<Strategy>(), Ok(Strategy::CheapestZeroBill));
        assert_eq!("OFF_GRID".parse::<Strategy>(), Ok(Strategy::OffGrid));
        assert!("fastest".parse::<Strategy>().is_err());
    }

    #[test]
    fn key_orders_by_metric_then_cost_then_index() {
        let key = |metric, system_cost, index| SelectionKey {
            metric,
            system_cost,
            index,
        };
        assert_eq!(key(1.0, 9.0, 5).compare(&key(2.0, 1.0, 0)), Ordering::Less);
        assert_eq!(key(1.0, 1.0, 5).compare(&key(1.0, 2.0, 0)), Ordering::Less);
        assert_eq!(key(1.0, 1.0, 0).compare(&key(1.0, 1.0, 5)), Ordering::Less);
    }
}
