//! Home solar, battery, and EV energy simulator with a system optimizer.

/// Country tables and read-only battery/vehicle catalog records.
pub mod catalog;
pub mod config;
/// Hourly device curves and input sanitization.
pub mod devices;
pub mod finance;
pub mod io;
/// Candidate search under the four selection strategies.
pub mod optimizer;
/// Aggregation, allocation, hourly simulation, and results.
pub mod sim;

pub use optimizer::{CancellationToken, OptimalSystemCandidate, Optimizer, Strategy};
pub use sim::{Assumptions, SimulationResult, SystemConfiguration, simulate};
