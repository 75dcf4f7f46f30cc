/// Configuration → daily scalar totals.
pub mod aggregate;
/// Fixed-priority daily split.
pub mod allocator;
pub mod dispatch;
pub mod engine;
pub mod kpi;
pub mod result;
pub mod types;

pub use engine::{HourlySimulator, simulate};
pub use result::{HourRecord, SimulationResult};
pub use types::{Assumptions, SystemConfiguration};
