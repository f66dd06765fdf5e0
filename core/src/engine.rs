//! The single-path simulator.
//!
//! EXECUTION ORDER (per path, never reordered):
//!   1. Validate parameters (once, in `SimEngine::new`)
//!   2. For each year index 0..anos: draw Z, project the year from the
//!      prior year's carried state
//!   3. Render the collected events as the step log
//!
//! RULES:
//!   - Exactly one Z per year, drawn in year order.
//!   - Year t reads only year t−1's carried state.
//!   - A failed year fails the whole path; no partial output.
//!   - When archived (`archive` feature), every event is recorded in the
//!     event log.

use crate::{
    config::EngineConfig,
    error::SimResult,
    event::SimEvent,
    params::SimulationParameters,
    projection::{CarriedState, Projector, YearProjection},
    result::{AnnualResult, SimulationOutcome, SimulationStep},
    rng::{BoxMuller, DrawSource},
};
#[cfg(feature = "archive")]
use crate::{
    event::EventLogEntry,
    store::{new_run_id, RunStatus, SimStore},
    types::RunId,
};

/// A projected path before the event log is rendered.
#[derive(Debug, Clone)]
pub struct PathRun {
    pub results: Vec<AnnualResult>,
    pub events:  Vec<SimEvent>,
}

impl PathRun {
    pub fn into_outcome(self) -> SimulationOutcome {
        SimulationOutcome {
            pasos:      steps_from_events(&self.events),
            resultados: self.results,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimEngine {
    params: SimulationParameters,
    config: EngineConfig,
}

impl SimEngine {
    pub fn new(params: SimulationParameters, config: EngineConfig) -> SimResult<Self> {
        params.validate()?;
        Ok(Self { params, config })
    }

    pub fn params(&self) -> &SimulationParameters {
        &self.params
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// One path on a fresh entropy stream.
    pub fn simulate(&self) -> SimResult<SimulationOutcome> {
        self.simulate_with(&mut BoxMuller::from_entropy())
    }

    /// One path on a reproducible stream.
    pub fn simulate_seeded(&self, seed: u64) -> SimResult<SimulationOutcome> {
        self.simulate_with(&mut BoxMuller::seeded(seed))
    }

    pub fn simulate_with<D: DrawSource + ?Sized>(
        &self,
        draws: &mut D,
    ) -> SimResult<SimulationOutcome> {
        Ok(self.run_path(draws)?.into_outcome())
    }

    /// Project every year, keeping raw events. Used directly by the
    /// Monte Carlo driver, which never renders steps.
    pub fn run_path<D: DrawSource + ?Sized>(&self, draws: &mut D) -> SimResult<PathRun> {
        let projector = Projector::new(&self.params, &self.config.policy, &self.config.alerts);
        let mut state = CarriedState::initial(&self.params);
        let mut results = Vec::with_capacity(self.params.anos as usize);
        let mut events = Vec::new();

        for year_index in 0..self.params.anos {
            let z = draws.next_z();
            let YearProjection { result, events: year_events } =
                projector.project(&state, year_index, z)?;
            state = CarriedState::from(&result);
            results.push(result);
            events.extend(year_events);
        }

        Ok(PathRun { results, events })
    }
}

#[cfg(feature = "archive")]
impl SimEngine {
    /// Seeded single path recorded in `store`: run header, every event,
    /// and the yearly results. A failing path is marked `failed` and its
    /// error returned.
    pub fn simulate_archived(
        &self,
        store: &SimStore,
        seed: u64,
    ) -> SimResult<(RunId, SimulationOutcome)> {
        let run_id = new_run_id();
        let parameters_json = serde_json::to_string(&self.params)?;
        store.insert_run(&run_id, Some(seed), self.params.anos, &parameters_json)?;
        record_event(
            store,
            &run_id,
            &SimEvent::RunInitialized {
                run_id: run_id.clone(),
                years:  self.params.anos,
            },
        )?;

        let path = match self.run_path(&mut BoxMuller::seeded(seed)) {
            Ok(path) => path,
            Err(e) => {
                log::warn!("run {run_id} failed: {e}");
                store.finish_run(&run_id, RunStatus::Failed)?;
                return Err(e);
            }
        };

        for event in &path.events {
            record_event(store, &run_id, event)?;
        }
        store.save_results(&run_id, &path.results)?;
        store.finish_run(&run_id, RunStatus::Completed)?;
        log::info!(
            "run {run_id} archived: {} years, {} events",
            path.results.len(),
            path.events.len()
        );

        Ok((run_id, path.into_outcome()))
    }
}

/// Number the explanatory events from 1, in emission order.
pub fn steps_from_events(events: &[SimEvent]) -> Vec<SimulationStep> {
    let mut steps = Vec::with_capacity(events.len());
    for event in events {
        if let Some(step) = event.to_step(steps.len() as u32 + 1) {
            steps.push(step);
        }
    }
    steps
}

#[cfg(feature = "archive")]
fn record_event(store: &SimStore, run_id: &str, event: &SimEvent) -> SimResult<()> {
    let entry = EventLogEntry {
        id:         None,
        run_id:     run_id.to_string(),
        year:       event.year(),
        event_type: event.type_name().to_string(),
        payload:    serde_json::to_string(event)?,
    };
    store.append_event(&entry)
}
