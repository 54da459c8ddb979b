//! BRD Kernel
//!
//! Operator tooling around the review engine:
//!
//! - [`config`]: engine configuration loading
//! - [`table`]: the role × state decision matrix, as text or JSON
//! - [`scenarios`]: the worked review scenarios, run end to end
//! - [`simulator`]: seeded concurrency simulator checking the quota,
//!   compare-and-swap and single-promotion guarantees

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod scenarios;
pub mod seed;
pub mod simulator;
pub mod table;

pub use config::{load_config, KernelError};
pub use scenarios::{run_scenario, Scenario, ScenarioReport};
pub use seed::SeededEngine;
pub use simulator::{run_simulator, SimulatorConfig, SimulatorReport, SimulatorStats, Violation};
