//! Financial projection: monthly bills, payback, and total cost of ownership.

use std::fmt;

use serde::Serialize;

use crate::devices::InputIssue;
use crate::devices::types::{finite_or_zero, safe_div};
use crate::sim::aggregate::DailyTotals;
use crate::sim::kpi::EnergyKpis;
use crate::sim::result::DayTotals;
use crate::sim::types::{Assumptions, SystemConfiguration};

/// Monthly electricity bills at or below this count as zero.
pub const ZERO_BILL_THRESHOLD: f64 = 0.01;
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Years until cumulative savings cover the system cost.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Payback {
    Years(f64),
    /// Savings are non-positive, or insufficient within the search cap.
    Never,
}

impl Payback {
    pub fn years(self) -> Option<f64> {
        match self {
            Self::Years(y) => Some(y),
            Self::Never => None,
        }
    }

    pub fn is_never(self) -> bool {
        matches!(self, Self::Never)
    }
}

impl fmt::Display for Payback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Years(y) => write!(f, "{y:.1} years"),
            Self::Never => write!(f, "never"),
        }
    }
}

/// Monthly bill split by consumer category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BillBreakdown {
    pub household: f64,
    pub ev_home: f64,
    pub ev_public: f64,
}

impl BillBreakdown {
    pub fn total(&self) -> f64 {
        self.household + self.ev_home + self.ev_public
    }
}

/// Financial outcome of one simulated configuration, in the country's currency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialSummary {
    pub currency: &'static str,
    pub monthly_bill_without: f64,
    pub monthly_bill_with: f64,
    pub monthly_savings: f64,
    /// Cost of grid imports before export credit.
    pub monthly_grid_cost: f64,
    pub monthly_export_credit: f64,
    /// Home electricity bill after export credit, excluding public charging.
    pub monthly_electricity_bill: f64,
    pub breakdown_without: BillBreakdown,
    pub breakdown_with: BillBreakdown,
    /// Upfront solar + battery cost.
    pub system_cost: f64,
    pub annual_opex: f64,
    pub payback: Payback,
    pub tco_without: f64,
    pub tco_with: f64,
    /// `tco_without - tco_with`.
    pub net_savings: f64,
    pub co2_avoided_kg_per_year: f64,
    pub self_sufficiency_pct: f64,
    pub zero_bill: bool,
    pub zero_bill_days_per_year: f64,
}

/// Upfront cost of the PV array and every battery line item.
///
/// A battery without a price in the configuration's country costs zero and
/// is reported. Line items with zero quantity or unusable capacity are ignored.
pub fn system_cost(config: &SystemConfiguration, issues: &mut Vec<InputIssue>) -> f64 {
    let profile = config.country.profile();
    let solar = finite_or_zero(config.solar_kw).max(0.0) * profile.solar_cost_per_kw;

    let mut batteries = 0.0;
    for item in &config.batteries {
        let usable = item.model.usable_capacity_kwh;
        if item.quantity == 0 || !usable.is_finite() || usable <= 0.0 {
            continue;
        }
        match item.model.price_in(config.country) {
            Some(price) => batteries += price * f64::from(item.quantity),
            None => InputIssue::MissingBatteryPrice {
                battery: item.model.id.clone(),
                country: config.country,
            }
            .report(issues),
        }
    }
    solar + batteries
}

/// Walks years `1..=cap`, accumulating inflated savings net of opex.
///
/// Returns the fractional year at which the cumulative total first covers
/// `system_cost`, interpolated within that year.
pub fn payback_years(
    monthly_savings: f64,
    system_cost: f64,
    assumptions: &Assumptions,
) -> Payback {
    if monthly_savings.is_nan() || monthly_savings <= 0.0 {
        return Payback::Never;
    }
    if system_cost <= 0.0 {
        return Payback::Years(0.0);
    }
    let opex = system_cost * assumptions.opex_rate;
    let mut cumulative = 0.0;
    for year in 1..=assumptions.payback_cap_years {
        let gain = monthly_savings * 12.0 * assumptions.inflation_factor(year) - opex;
        let before = cumulative;
        cumulative += gain;
        if cumulative >= system_cost {
            let fraction = safe_div(system_cost - before, gain).clamp(0.0, 1.0);
            return Payback::Years(f64::from(year - 1) + fraction);
        }
    }
    Payback::Never
}

/// Sum of inflated yearly bills over the horizon, plus upfront cost and opex.
pub fn total_cost_of_ownership(
    monthly_bill: f64,
    system_cost: f64,
    assumptions: &Assumptions,
) -> f64 {
    let opex = system_cost * assumptions.opex_rate;
    (1..=assumptions.horizon_years).fold(system_cost, |total, year| {
        total + monthly_bill * 12.0 * assumptions.inflation_factor(year) + opex
    })
}

/// Spreads `credit` over categories in proportion to their grid cost.
fn offset_proportionally(costs: [f64; 2], credit: f64) -> [f64; 2] {
    let total = costs[0] + costs[1];
    let offset = credit.min(total);
    costs.map(|c| (c - offset * safe_div(c, total)).max(0.0))
}

/// Projects bills and long-run economics for one simulated day.
///
/// EV home charging that did not fit its window (`daily.ev_home_kwh` above
/// the hourly total) is billed at the public rate in both scenarios.
pub fn project(
    config: &SystemConfiguration,
    daily: &DailyTotals,
    day: &DayTotals,
    kpis: &EnergyKpis,
    assumptions: &Assumptions,
    issues: &mut Vec<InputIssue>,
) -> FinancialSummary {
    let profile = config.country.profile();
    let days = assumptions.days_per_month;
    let tariff = profile.tariff_per_kwh;
    let public = profile.public_charging_per_kwh;

    let ev_home_served = day.ev_home_kwh;
    let ev_public = daily.ev_public_kwh + (daily.ev_home_kwh - ev_home_served).max(0.0);

    let breakdown_without = BillBreakdown {
        household: daily.household_kwh() * tariff * days,
        ev_home: ev_home_served * tariff * days,
        ev_public: ev_public * public * days,
    };

    let monthly_grid_cost = day.grid_supply_kwh * tariff * days;
    let monthly_export_credit = if daily.export_multiplier > 0.0 {
        day.grid_export_kwh * days * tariff * daily.export_multiplier
    } else {
        0.0
    };
    let monthly_electricity_bill = (monthly_grid_cost - monthly_export_credit).max(0.0);

    let [household, ev_home] = offset_proportionally(
        [
            day.household_from_grid * tariff * days,
            day.ev_from_grid * tariff * days,
        ],
        monthly_export_credit,
    );
    let breakdown_with = BillBreakdown {
        household,
        ev_home,
        ev_public: breakdown_without.ev_public,
    };

    let monthly_bill_without = breakdown_without.total();
    let monthly_bill_with = monthly_electricity_bill + breakdown_with.ev_public;
    let monthly_savings = monthly_bill_without - monthly_bill_with;

    let system_cost = system_cost(config, issues);
    let tco_without = total_cost_of_ownership(monthly_bill_without, 0.0, assumptions);
    let tco_with = total_cost_of_ownership(monthly_bill_with, system_cost, assumptions);

    let grid_without = daily.household_kwh() + ev_home_served;
    let co2_avoided_kg_per_year =
        (grid_without - day.grid_supply_kwh).max(0.0) * profile.co2_kg_per_kwh * DAYS_PER_YEAR;

    let zero_bill = if daily.export_multiplier > 0.0 {
        monthly_electricity_bill <= ZERO_BILL_THRESHOLD
    } else {
        kpis.hours_with_import == 0
    };
    let zero_bill_days_per_year = if zero_bill {
        DAYS_PER_YEAR
    } else {
        kpis.self_sufficiency_pct / 100.0 * DAYS_PER_YEAR
    };

    FinancialSummary {
        currency: profile.currency,
        monthly_bill_without,
        monthly_bill_with,
        monthly_savings,
        monthly_grid_cost,
        monthly_export_credit,
        monthly_electricity_bill,
        breakdown_without,
        breakdown_with,
        system_cost,
        annual_opex: system_cost * assumptions.opex_rate,
        payback: payback_years(monthly_savings, system_cost, assumptions),
        tco_without,
        tco_with,
        net_savings: tco_without - tco_with,
        co2_avoided_kg_per_year,
        self_sufficiency_pct: kpis.self_sufficiency_pct,
        zero_bill,
        zero_bill_days_per_year,
    }
}

impl fmt::Display for FinancialSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = self.currency;
        writeln!(f, "--- Financials ({c}) ---")?;
        writeln!(f, "Bill without system:   {:.2}/month", self.monthly_bill_without)?;
        writeln!(f, "Bill with system:      {:.2}/month", self.monthly_bill_with)?;
        writeln!(f, "Export credit:         {:.2}/month", self.monthly_export_credit)?;
        writeln!(f, "System cost:           {:.2}", self.system_cost)?;
        writeln!(f, "Payback:               {}", self.payback)?;
        writeln!(f, "Net savings (TCO):     {:.2}", self.net_savings)?;
        writeln!(f, "CO2 avoided:           {:.0} kg/yr", self.co2_avoided_kg_per_year)?;
        write!(
            f,
            "Zero bill:             {} ({:.0} days/yr)",
            if self.zero_bill { "yes" } else { "no" },
            self.zero_bill_days_per_year
        )
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use approx::assert_relative_eq;

    use super::*;
    use crate::catalog::{BatteryModel, Country};

    fn assumptions() -> Assumptions {
        Assumptions {
            tariff_inflation: 0.0,
            opex_rate: 0.0,
            ..Assumptions::default()
        }
    }

    #[test]
    fn payback_without_inflation_is_linear() {
        // 100/month → 1200/yr against 3000 → 2.5 years
        let p = payback_years(100.0, 3000.0, &assumptions());
        assert_relative_eq!(p.years().unwrap(), 2.5, epsilon = 1e-9);
    }

    #[test]
    fn payback_never_for_non_positive_savings() {
        assert!(payback_years(0.0, 1000.0, &assumptions()).is_never());
        assert!(payback_years(-5.0, 1000.0, &assumptions()).is_never());
        assert!(payback_years(f64::NAN, 1000.0, &assumptions()).is_never());
    }

    #[test]
    fn payback_never_when_cap_reached() {
        // 12/yr for 50 years = 600 < 1000
        assert!(payback_years(1.0, 1000.0, &assumptions()).is_never());
    }

    #[test]
    fn opex_slows_payback() {
        let mut a = assumptions();
        let plain = payback_years(100.0, 3000.0, &a).years().unwrap();
        a.opex_rate = 0.05;
        let with_opex = payback_years(100.0, 3000.0, &a).years().unwrap();
        assert!(with_opex > plain);
    }

    #[test]
    fn tco_sums_horizon() {
        let a = Assumptions {
            horizon_years: 2,
            tariff_inflation: 0.1,
            opex_rate: 0.01,
            ..Assumptions::default()
        };
        // 1000 + 100×12×1.0 + 10 + 100×12×1.1 + 10
        assert_relative_eq!(
            total_cost_of_ownership(100.0, 1000.0, &a),
            1000.0 + 1200.0 + 10.0 + 1320.0 + 10.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn credit_offsets_proportionally() {
        let [a, b] = offset_proportionally([30.0, 10.0], 20.0);
        assert_relative_eq!(a, 15.0);
        assert_relative_eq!(b, 5.0);
        assert_eq!(offset_proportionally([30.0, 10.0], 100.0), [0.0, 0.0]);
        assert_eq!(offset_proportionally([0.0, 0.0], 5.0), [0.0, 0.0]);
    }

    #[test]
    fn system_cost_reports_missing_price() {
        let model = |id: &str, prices: BTreeMap<Country, f64>| {
            Arc::new(BatteryModel {
                id: id.into(),
                manufacturer: "Acme".into(),
                name: id.into(),
                capacity_kwh: 10.0,
                usable_capacity_kwh: 10.0,
                round_trip_efficiency: 0.9,
                warranty_cycles: 6000,
                warranty_years: 10,
                continuous_power_kw: 5.0,
                peak_power_kw: 7.0,
                prices,
                v2h: false,
            })
        };
        let priced = model("priced", BTreeMap::from([(Country::MY, 20_000.0)]));
        let unpriced = model("unpriced", BTreeMap::new());
        let cfg = SystemConfiguration::new(Country::MY)
            .with_solar_kw(5.0)
            .with_battery(priced, 2)
            .with_battery(unpriced, 1);
        let mut issues = Vec::new();
        let cost = system_cost(&cfg, &mut issues);
        assert_relative_eq!(cost, 5.0 * 4000.0 + 40_000.0);
        assert_eq!(issues.len(), 1);
        assert!(matches!(issues[0], InputIssue::MissingBatteryPrice { .. }));
    }
}
