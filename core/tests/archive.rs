//! Run archive: an archived run can be read back in full.

use fiscal_core::{
    config::EngineConfig,
    engine::SimEngine,
    event::SimEvent,
    params::SimulationParameters,
    store::{RunStatus, SimStore},
};

fn store() -> SimStore {
    let store = SimStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    store
}

#[test]
fn archived_run_round_trips() {
    let store = store();
    let params = SimulationParameters {
        anos: 4,
        shock_tc: 10.0,
        ..SimulationParameters::default()
    };
    let engine = SimEngine::new(params.clone(), EngineConfig::default_test()).unwrap();

    let (run_id, outcome) = engine.simulate_archived(&store, 77).expect("archived run");

    let run = store.run(&run_id).unwrap().expect("run header stored");
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.seed, Some(77));
    assert_eq!(run.years, 4);
    assert!(run.finished_at.is_some());
    let stored_params: SimulationParameters = serde_json::from_str(&run.parameters).unwrap();
    assert_eq!(stored_params, params);

    let results = store.results_for_run(&run_id).unwrap();
    assert_eq!(results, outcome.resultados);

    // One run_initialized plus one entry per step.
    let events = store.events_for_run(&run_id).unwrap();
    assert_eq!(events.len(), outcome.pasos.len() + 1);
    assert_eq!(events[0].event_type, "run_initialized");
    assert_eq!(events[0].year, None);

    let first_year = store.events_for_year(&run_id, 2021).unwrap();
    let parsed: Vec<SimEvent> = first_year
        .iter()
        .map(|e| serde_json::from_str(&e.payload).expect("payload parses"))
        .collect();
    assert!(matches!(parsed[0], SimEvent::YearProjected { year: 2021, .. }));
    assert!(
        parsed.iter().any(|e| matches!(e, SimEvent::ShockApplied { shock, .. } if shock == "shock_tc")),
        "exchange-rate shock missing from the archive"
    );

    // Archived output is the seeded single path.
    assert_eq!(engine.simulate_seeded(77).unwrap(), outcome);
}

#[test]
fn failed_run_is_marked_failed() {
    let store = store();
    // GDP overflows in the first year whatever the draw.
    let runaway = SimulationParameters {
        anos: 3,
        pib_inicial: 1e308,
        crecimiento_pib: 100.0,
        ..SimulationParameters::default()
    };
    let engine = SimEngine::new(runaway, EngineConfig::default_test()).unwrap();

    let err = engine.simulate_archived(&store, 1).unwrap_err();
    assert!(!err.is_validation());

    let runs = store.runs().unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, RunStatus::Failed);
    assert!(store.results_for_run(&runs[0].run_id).unwrap().is_empty());
}

#[test]
fn each_archived_run_gets_its_own_id() {
    let store = store();
    let engine = SimEngine::new(SimulationParameters::default(), EngineConfig::default_test()).unwrap();

    let (a, _) = engine.simulate_archived(&store, 1).unwrap();
    let (b, _) = engine.simulate_archived(&store, 1).unwrap();

    assert_ne!(a, b);
    assert_eq!(store.run_count().unwrap(), 2);
}
