//! Monte Carlo driver: many independent single paths, reduced to
//! per-year distributions plus a composite "representative" path.
//!
//! RULES:
//!   - Iteration `i` draws from `RngBank::for_iteration(i)`, so a seeded
//!     run gives the same answer on any number of threads.
//!   - An iteration that fails in computation is dropped from the sample
//!     and counted; the run fails only when every iteration fails.
//!   - The cancel flag is checked before each iteration starts.
//!   - The representative path is a per-field median, not a real
//!     trajectory: its identities (deficit = spending − revenue, ...) need
//!     not hold exactly.

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Instant,
};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    config::EngineConfig,
    engine::SimEngine,
    error::{SimError, SimResult},
    params::SimulationParameters,
    projection::alerts_for,
    result::AnnualResult,
    rng::{fresh_seed, RngBank},
    statistics::{median, VariableStats},
    types::Year,
};

/// Variables summarised per year.
pub const TRACKED_VARIABLES: [&str; 14] = [
    "ingresos_totales",
    "gastos_totales",
    "deficit_superavit",
    "deuda_total",
    "deuda_pib_ratio",
    "rin",
    "rin_meses_importacion",
    "deficit_pib_ratio",
    "presion_tributaria",
    "ing_gas",
    "ing_mineria_total",
    "ing_iva",
    "ing_iue",
    "gasto_subsidio_combustibles",
];

/// One year's distribution summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloYear {
    pub ano: Year,
    /// Keyed by tracked variable name; flattened into the year object.
    #[serde(flatten)]
    pub estadisticas: BTreeMap<String, VariableStats>,
    pub distribucion_deficit:   Vec<f64>,
    pub distribucion_deuda_pib: Vec<f64>,
    pub distribucion_rin:       Vec<f64>,
}

impl MonteCarloYear {
    pub fn stats(&self, variable: &str) -> Option<&VariableStats> {
        self.estadisticas.get(variable)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloResult {
    /// Iterations requested.
    pub num_simulaciones: u32,
    /// Iterations dropped after a computation failure.
    pub iteraciones_fallidas: u32,
    /// Master seed; replaying it reproduces this result.
    pub semilla: u64,
    pub resultados_estadisticos: Vec<MonteCarloYear>,
    pub simulacion_representativa: Vec<AnnualResult>,
    pub metodo: String,
}

pub struct MonteCarloDriver {
    engine: SimEngine,
    cancel: Arc<AtomicBool>,
}

impl MonteCarloDriver {
    pub fn new(params: SimulationParameters, config: EngineConfig) -> SimResult<Self> {
        Ok(Self {
            engine: SimEngine::new(params, config)?,
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Share an externally owned cancel flag.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = flag;
        self
    }

    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn run(&self, iterations: u32, seed: Option<u64>) -> SimResult<MonteCarloResult> {
        let bounds = &self.engine.config().monte_carlo;
        if iterations < bounds.min_iterations || iterations > bounds.max_iterations {
            return Err(SimError::validation(
                "num_simulaciones",
                format!(
                    "must be between {} and {}, got {iterations}",
                    bounds.min_iterations, bounds.max_iterations
                ),
            ));
        }

        let bank = RngBank::new(seed.unwrap_or_else(fresh_seed));
        let started = Instant::now();
        log::info!(
            "monte carlo: {iterations} iterations x {} years, seed {}",
            self.engine.params().anos,
            bank.master_seed()
        );

        let outcomes = match bounds.threads {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| anyhow::anyhow!("Cannot build worker pool: {e}"))?;
                pool.install(|| self.run_iterations(&bank, iterations))
            }
            None => self.run_iterations(&bank, iterations),
        };

        if self.cancel.load(Ordering::Relaxed) {
            return Err(SimError::Cancelled);
        }

        let mut paths = Vec::with_capacity(outcomes.len());
        let mut failed = 0u32;
        let mut first_failure = None;
        for outcome in outcomes {
            match outcome {
                Ok(path) => paths.push(path),
                Err(e @ SimError::Computation { .. }) => {
                    failed += 1;
                    first_failure.get_or_insert(e);
                }
                Err(e) => return Err(e),
            }
        }
        if paths.is_empty() {
            return Err(first_failure.unwrap_or(SimError::Cancelled));
        }
        if failed > 0 {
            log::warn!("monte carlo: {failed}/{iterations} iterations failed and were dropped");
        }

        let years = self.engine.params().anos as usize;
        let mut resultados_estadisticos = Vec::with_capacity(years);
        let mut simulacion_representativa = Vec::with_capacity(years);
        for year_index in 0..years {
            let column: Vec<&AnnualResult> = paths.iter().map(|p| &p[year_index]).collect();
            resultados_estadisticos.push(summarise_year(&column));
            simulacion_representativa.push(self.representative_year(&column));
        }

        log::info!(
            "monte carlo: {} paths reduced in {:.2?}",
            paths.len(),
            started.elapsed()
        );

        Ok(MonteCarloResult {
            num_simulaciones: iterations,
            iteraciones_fallidas: failed,
            semilla: bank.master_seed(),
            resultados_estadisticos,
            simulacion_representativa,
            metodo: format!("Monte Carlo (Box-Muller, {iterations} iteraciones)"),
        })
    }

    fn run_iterations(
        &self,
        bank: &RngBank,
        iterations: u32,
    ) -> Vec<SimResult<Vec<AnnualResult>>> {
        (0..iterations)
            .into_par_iter()
            .map(|i| {
                if self.cancel.load(Ordering::Relaxed) {
                    return Err(SimError::Cancelled);
                }
                let mut draws = bank.for_iteration(u64::from(i));
                self.engine.run_path(&mut draws).map(|path| path.results)
            })
            .collect()
    }

    /// Per-field median of one year across paths, with alerts recomputed.
    fn representative_year(&self, column: &[&AnnualResult]) -> AnnualResult {
        let rows: Vec<[f64; AnnualResult::NUMERIC_FIELDS]> =
            column.iter().map(|r| r.numeric_values()).collect();
        let mut medians = [0.0; AnnualResult::NUMERIC_FIELDS];
        let mut samples = Vec::with_capacity(rows.len());
        for (k, slot) in medians.iter_mut().enumerate() {
            samples.clear();
            samples.extend(rows.iter().map(|row| row[k]));
            *slot = median(&samples);
        }

        // Optional ratios: median over the paths where they are defined.
        let mut optional = [None; AnnualResult::OPTIONAL_FIELDS];
        for (k, slot) in optional.iter_mut().enumerate() {
            samples.clear();
            samples.extend(
                column
                    .iter()
                    .filter_map(|r| r.optional_values()[k])
                    .filter(|v| v.is_finite()),
            );
            *slot = (!samples.is_empty()).then(|| median(&samples));
        }

        let mut year = AnnualResult::from_numeric_values(column[0].ano, medians, optional, Vec::new());
        year.cambios = alerts_for(&year, &self.engine.config().alerts);
        year
    }
}

fn summarise_year(column: &[&AnnualResult]) -> MonteCarloYear {
    let mut estadisticas = BTreeMap::new();
    for variable in TRACKED_VARIABLES {
        let samples: Vec<f64> = column
            .iter()
            .filter_map(|r| r.numeric_field(variable))
            .collect();
        if let Some(stats) = VariableStats::from_samples(&samples) {
            estadisticas.insert(variable.to_string(), stats);
        }
    }
    MonteCarloYear {
        ano: column[0].ano,
        estadisticas,
        distribucion_deficit:   column.iter().map(|r| r.deficit_superavit).collect(),
        distribucion_deuda_pib: column.iter().map(|r| r.deuda_pib_ratio).collect(),
        distribucion_rin:       column.iter().map(|r| r.rin).collect(),
    }
}
