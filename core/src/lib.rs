//! fiscal-core: stochastic projection of Bolivia's public finances.
//!
//! One standard-normal draw per year drives every calibrated line item;
//! a path is projected year by year from the prior year's state, and the
//! Monte Carlo driver reduces many independent paths to distributions.

pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod monte_carlo;
pub mod params;
pub mod projection;
pub mod result;
pub mod rng;
pub mod scenario;
pub mod statistics;
#[cfg(feature = "archive")]
pub mod store;
pub mod types;

pub use config::EngineConfig;
pub use engine::SimEngine;
pub use error::{SimError, SimResult};
pub use monte_carlo::{MonteCarloDriver, MonteCarloResult};
pub use params::SimulationParameters;
pub use result::{AnnualResult, SimulationOutcome, SimulationStep};
