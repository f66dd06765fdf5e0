//! Monte Carlo driver: bounds, reduction to a single path, distribution
//! shape, failure accounting and cancellation.

use std::sync::{atomic::AtomicBool, Arc};

use fiscal_core::{
    config::EngineConfig,
    engine::SimEngine,
    error::SimError,
    monte_carlo::{MonteCarloDriver, TRACKED_VARIABLES},
    params::SimulationParameters,
};

fn params(anos: u32) -> SimulationParameters {
    SimulationParameters { anos, ..SimulationParameters::default() }
}

fn driver(p: SimulationParameters) -> MonteCarloDriver {
    // RUST_LOG=info shows per-run timing and dropped iterations.
    let _ = env_logger::builder().is_test(true).try_init();
    MonteCarloDriver::new(p, EngineConfig::default_test()).expect("valid parameters")
}

#[test]
fn iteration_count_outside_bounds_is_rejected() {
    let production = MonteCarloDriver::new(params(2), EngineConfig::default()).unwrap();
    for n in [0u32, 99, 10_001] {
        let err = production.run(n, Some(1)).unwrap_err();
        assert!(err.is_validation(), "{n} iterations should be rejected, got {err}");
    }
}

#[test]
fn single_iteration_equals_the_single_path() {
    const SEED: u64 = 31_337;
    let p = params(5);

    let single = SimEngine::new(p.clone(), EngineConfig::default_test())
        .unwrap()
        .simulate_seeded(SEED)
        .unwrap();
    let mc = driver(p).run(1, Some(SEED)).unwrap();

    assert_eq!(mc.num_simulaciones, 1);
    assert_eq!(mc.iteraciones_fallidas, 0);
    assert_eq!(mc.simulacion_representativa, single.resultados);

    for (year, path) in mc.resultados_estadisticos.iter().zip(&single.resultados) {
        for variable in TRACKED_VARIABLES {
            let s = year.stats(variable).expect("tracked");
            let v = path.numeric_field(variable).unwrap();
            for (label, stat) in [
                ("promedio", s.promedio),
                ("mediana", s.mediana),
                ("percentil_5", s.percentil_5),
                ("percentil_25", s.percentil_25),
                ("percentil_75", s.percentil_75),
                ("percentil_95", s.percentil_95),
                ("minimo", s.minimo),
                ("maximo", s.maximo),
            ] {
                assert_eq!(stat, v, "{variable}.{label} did not collapse in {}", year.ano);
            }
            assert_eq!(s.desviacion_estandar, 0.0);
        }
        assert_eq!(year.distribucion_deficit, vec![path.deficit_superavit]);
    }
}

#[test]
fn statistics_are_ordered_and_complete() {
    let mc = driver(params(4)).run(300, Some(99)).unwrap();

    assert_eq!(mc.resultados_estadisticos.len(), 4);
    assert_eq!(mc.simulacion_representativa.len(), 4);
    assert_eq!(mc.metodo, "Monte Carlo (Box-Muller, 300 iteraciones)");

    for year in &mc.resultados_estadisticos {
        assert_eq!(year.distribucion_deficit.len(), 300);
        assert_eq!(year.distribucion_deuda_pib.len(), 300);
        assert_eq!(year.distribucion_rin.len(), 300);

        for variable in TRACKED_VARIABLES {
            let s = year
                .stats(variable)
                .unwrap_or_else(|| panic!("{variable} missing in {}", year.ano));
            assert!(
                s.minimo <= s.percentil_5
                    && s.percentil_5 <= s.percentil_25
                    && s.percentil_25 <= s.mediana
                    && s.mediana <= s.percentil_75
                    && s.percentil_75 <= s.percentil_95
                    && s.percentil_95 <= s.maximo,
                "{variable} percentiles out of order in {}: {s:?}",
                year.ano
            );
            assert!(s.desviacion_estandar >= 0.0);
        }
    }
}

#[test]
fn representative_path_is_the_per_field_median() {
    let mc = driver(params(3)).run(101, Some(5)).unwrap();

    for (year, rep) in mc.resultados_estadisticos.iter().zip(&mc.simulacion_representativa) {
        assert_eq!(year.ano, rep.ano);
        assert_eq!(rep.deficit_superavit, year.stats("deficit_superavit").unwrap().mediana);
        assert_eq!(rep.rin, year.stats("rin").unwrap().mediana);
    }
}

#[test]
fn failed_iterations_are_dropped_and_counted() {
    // A steep exchange-rate coefficient makes TC negative for a large
    // share of draws.
    let fragile = SimulationParameters { anos: 1, tc_coef_z: 100.0, ..SimulationParameters::default() };
    let mc = driver(fragile).run(200, Some(8)).unwrap();

    assert!(mc.iteraciones_fallidas > 0, "expected some failed iterations");
    assert!(mc.iteraciones_fallidas < 200, "expected some surviving iterations");
    let survivors = (200 - mc.iteraciones_fallidas) as usize;
    assert_eq!(mc.resultados_estadisticos[0].distribucion_rin.len(), survivors);
}

#[test]
fn run_fails_when_every_iteration_fails() {
    // GDP overflows in the first year whatever the draw.
    let runaway = SimulationParameters {
        anos: 2,
        pib_inicial: 1e308,
        crecimiento_pib: 100.0,
        ..SimulationParameters::default()
    };
    let err = driver(runaway).run(10, Some(3)).unwrap_err();
    assert!(matches!(err, SimError::Computation { .. }), "got {err}");
}

#[test]
fn raised_cancel_flag_stops_the_run() {
    let flag = Arc::new(AtomicBool::new(true));
    let mc = driver(params(3)).with_cancel_flag(Arc::clone(&flag));

    let err = mc.run(50, Some(1)).unwrap_err();
    assert!(matches!(err, SimError::Cancelled), "got {err}");
}
