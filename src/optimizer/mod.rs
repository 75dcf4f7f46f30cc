//! System optimizer: one evaluation harness, four selection strategies.
//!
//! The brute-force strategies enumerate `(solar size, battery option)`
//! candidates, simulate each in parallel with `rayon`, and reduce with the
//! strategy's total order. Off-grid sizing is analytic and verified by a
//! single simulation.

mod candidates;
pub mod off_grid;
mod strategy;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::finance::Payback;
use crate::sim::aggregate::aggregate;
use crate::sim::types::{Assumptions, BatteryLineItem, SystemConfiguration};
use crate::sim::{SimulationResult, simulate};

pub use candidates::{Candidate, OptimizerSettings, battery_options, generate, solar_sizes};
pub use strategy::{SelectionKey, Strategy};

/// Cooperative cancellation flag shared between the caller and a search.
///
/// Clones share the flag. Checked once per candidate; a cancelled search
/// returns the best of the candidates already evaluated.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// A recommended system and the metrics it was selected on.
#[derive(Debug, Clone, Serialize)]
pub struct OptimalSystemCandidate {
    pub strategy: Strategy,
    pub solar_kw: f64,
    pub batteries: Vec<BatteryLineItem>,
    pub system_cost: f64,
    pub monthly_savings: f64,
    pub monthly_bill_with: f64,
    pub payback: Payback,
    pub net_savings: f64,
    pub zero_bill: bool,
    /// Candidates simulated to reach this result.
    pub candidates_evaluated: usize,
    /// Full simulation of the recommended system.
    pub result: SimulationResult,
}

impl OptimalSystemCandidate {
    fn new(
        strategy: Strategy,
        config: &SystemConfiguration,
        result: SimulationResult,
        candidates_evaluated: usize,
    ) -> Self {
        let finance = &result.finance;
        Self {
            strategy,
            solar_kw: config.solar_kw,
            batteries: config.batteries.clone(),
            system_cost: finance.system_cost,
            monthly_savings: finance.monthly_savings,
            monthly_bill_with: finance.monthly_bill_with,
            payback: finance.payback,
            net_savings: finance.net_savings,
            zero_bill: finance.zero_bill,
            candidates_evaluated,
            result,
        }
    }

    /// Total battery units across line items.
    pub fn battery_units(&self) -> u32 {
        self.batteries.iter().map(|b| b.quantity).sum()
    }
}

struct Scored<'c> {
    key: SelectionKey,
    candidate: &'c Candidate,
    result: SimulationResult,
}

/// Searches for the best solar + battery system for a household.
///
/// Household loads, vehicles, roof, and net-metering mode come from `base`;
/// its PV size and batteries are replaced by each candidate.
///
/// # Examples
///
/// ```no_run
/// use home_energy_sim::catalog::{Catalog, Country};
/// use home_energy_sim::optimizer::{Optimizer, Strategy};
/// use home_energy_sim::sim::types::SystemConfiguration;
///
/// let base = SystemConfiguration::new(Country::MY);
/// let catalog = Catalog::default();
/// let best = Optimizer::new(&base, &catalog).run(Strategy::MinimumPayback);
/// ```
pub struct Optimizer<'a> {
    base: &'a SystemConfiguration,
    catalog: &'a Catalog,
    assumptions: Assumptions,
    settings: OptimizerSettings,
    cancel: CancellationToken,
}

impl<'a> Optimizer<'a> {
    pub fn new(base: &'a SystemConfiguration, catalog: &'a Catalog) -> Self {
        Self {
            base,
            catalog,
            assumptions: Assumptions::default(),
            settings: OptimizerSettings::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_assumptions(mut self, assumptions: Assumptions) -> Self {
        self.assumptions = assumptions;
        self
    }

    pub fn with_settings(mut self, settings: OptimizerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Runs one strategy. `None` means no eligible system was found.
    pub fn run(&self, strategy: Strategy) -> Option<OptimalSystemCandidate> {
        match strategy {
            Strategy::MinimumPayback | Strategy::BestNetSavings => {
                let sizes =
                    solar_sizes(0.0, self.settings.max_solar_kw, self.settings.solar_step_kw);
                self.search(strategy, &sizes)
            }
            Strategy::CheapestZeroBill => {
                let sizes = self.zero_bill_window();
                self.search(strategy, &sizes)
            }
            Strategy::OffGrid => self.off_grid(),
        }
    }

    /// Candidates generated for a brute-force strategy.
    pub fn candidates(&self, sizes: &[f64]) -> Vec<Candidate> {
        let models = self.catalog.batteries_sold_in(self.base.country);
        let options = battery_options(&models, self.settings.max_battery_units);
        generate(sizes, &options)
    }

    /// Solar sizes around the PV size that would match daily demand.
    pub fn zero_bill_window(&self) -> Vec<f64> {
        let daily = aggregate(self.base, &self.assumptions, &mut Vec::new());
        let yield_per_kw =
            self.base.country.profile().solar_yield_per_kw * self.base.roof.multiplier();
        let step = self.settings.zero_bill_step_kw;
        let need = daily.household_kwh() + daily.ev_home_kwh;
        if yield_per_kw <= 0.0 || step.is_nan() || step <= 0.0 {
            return vec![0.0];
        }
        let estimate = (need / yield_per_kw / step).round() * step;
        let half = self.settings.zero_bill_window_kw;
        let start = (estimate - half).max(0.0);
        solar_sizes(start, estimate + half, step)
    }

    fn search(&self, strategy: Strategy, sizes: &[f64]) -> Option<OptimalSystemCandidate> {
        let started = Instant::now();
        let candidates = self.candidates(sizes);
        info!(
            %strategy,
            country = %self.base.country,
            candidates = candidates.len(),
            "starting system search"
        );

        let evaluated = AtomicUsize::new(0);
        let best = candidates
            .par_iter()
            .filter_map(|candidate| {
                if self.cancel.is_cancelled() {
                    return None;
                }
                let result = simulate(&candidate.apply(self.base), &self.assumptions);
                evaluated.fetch_add(1, Ordering::Relaxed);
                let metric = strategy.score(&result)?;
                debug!(
                    index = candidate.index,
                    solar_kw = candidate.solar_kw,
                    metric,
                    "eligible candidate"
                );
                Some(Scored {
                    key: SelectionKey {
                        metric,
                        system_cost: result.finance.system_cost,
                        index: candidate.index,
                    },
                    candidate,
                    result,
                })
            })
            .reduce_with(|a, b| if a.key.compare(&b.key).is_le() { a } else { b });

        let evaluated = evaluated.into_inner();
        if self.cancel.is_cancelled() {
            warn!(%strategy, evaluated, total = candidates.len(), "system search cancelled");
        }

        let Some(best) = best else {
            info!(%strategy, evaluated, elapsed = ?started.elapsed(), "no eligible system found");
            return None;
        };
        info!(
            %strategy,
            evaluated,
            elapsed = ?started.elapsed(),
            solar_kw = best.candidate.solar_kw,
            metric = best.key.metric,
            "system search finished"
        );
        let config = best.candidate.apply(self.base);
        Some(OptimalSystemCandidate::new(strategy, &config, best.result, evaluated))
    }

    fn off_grid(&self) -> Option<OptimalSystemCandidate> {
        if self.cancel.is_cancelled() {
            warn!("off-grid sizing cancelled");
            return None;
        }
        let sizing = off_grid::size(self.base, self.catalog, &self.assumptions)?;
        info!(
            solar_kw = sizing.solar_kw,
            required_battery_kwh = sizing.required_battery_kwh,
            "off-grid sizing done"
        );
        let config = self
            .base
            .clone()
            .with_solar_kw(sizing.solar_kw)
            .with_batteries(sizing.battery.into_iter().collect());
        self.verify_off_grid(&config)
    }

    /// Re-simulates `config` and keeps it only if no hour imports from the grid.
    pub fn verify_off_grid(&self, config: &SystemConfiguration) -> Option<OptimalSystemCandidate> {
        let result = simulate(config, &self.assumptions);
        if !result.is_grid_independent() {
            info!(
                solar_kw = config.solar_kw,
                hours_with_import = result.kpis.hours_with_import,
                "off-grid system failed verification"
            );
            return None;
        }
        info!(solar_kw = config.solar_kw, "off-grid system verified");
        Some(OptimalSystemCandidate::new(Strategy::OffGrid, config, result, 1))
    }
}
