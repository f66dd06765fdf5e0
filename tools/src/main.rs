//! sim-runner: headless runner for the fiscal projection engine.
//!
//! Usage:
//!   sim-runner --years 10 --seed 12345
//!   sim-runner --scenario crisis_commodities --seed 7 --db runs.db
//!   sim-runner --iterations 2000 --seed 7 --json
//!   sim-runner --params params.json --config engine.json

use anyhow::{bail, Result};
use fiscal_core::{
    config::EngineConfig,
    engine::SimEngine,
    monte_carlo::{MonteCarloDriver, MonteCarloResult},
    params::SimulationParameters,
    result::SimulationOutcome,
    rng::fresh_seed,
    scenario,
    store::SimStore,
};
use std::env;

const FLAGS: [&str; 8] = [
    "--years", "--seed", "--iterations", "--scenario",
    "--params", "--config", "--db", "--json",
];

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    for flag in args.iter().skip(1).filter(|a| a.starts_with("--")) {
        if !FLAGS.contains(&flag.as_str()) {
            log::warn!("Ignoring unknown option {flag}");
        }
    }
    let json = args.iter().any(|a| a == "--json");
    let seed = parse_opt::<u64>(&args, "--seed").unwrap_or_else(fresh_seed);
    let iterations = parse_opt::<u32>(&args, "--iterations");

    let config = match find_arg(&args, "--config") {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    let mut params = match find_arg(&args, "--params") {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
            SimulationParameters::from_json(&content)?
        }
        None => SimulationParameters::default(),
    };
    if let Some(key) = find_arg(&args, "--scenario") {
        let Some(preset) = scenario::find(key) else {
            let known: Vec<&str> = scenario::PRESETS.iter().map(|s| s.clave).collect();
            bail!("Unknown scenario '{key}'. Known: {}", known.join(", "));
        };
        preset.apply(&mut params);
    }
    if let Some(years) = parse_opt::<u32>(&args, "--years") {
        params.anos = years;
    }

    if !json {
        println!("Simulador Fiscal Boliviano: sim-runner");
        println!("  years:      {}", params.anos);
        println!("  seed:       {seed}");
        match iterations {
            Some(n) => println!("  mode:       monte carlo ({n} iterations)"),
            None => println!("  mode:       single path"),
        }
        println!();
    }

    match iterations {
        Some(n) => {
            let result = MonteCarloDriver::new(params, config)?.run(n, Some(seed))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_monte_carlo(&result);
            }
        }
        None => {
            let engine = SimEngine::new(params, config)?;
            let outcome = match find_arg(&args, "--db") {
                Some(db) => {
                    let store = SimStore::open(db)?;
                    store.migrate()?;
                    let (run_id, outcome) = engine.simulate_archived(&store, seed)?;
                    if !json {
                        println!("  archived as {run_id} in {db}");
                        println!();
                    }
                    outcome
                }
                None => engine.simulate_seeded(seed)?,
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print_path(&outcome);
            }
        }
    }

    Ok(())
}

fn print_path(outcome: &SimulationOutcome) {
    println!("=== PROJECTION (M Bs / M USD) ===");
    println!(
        "  {:>4} {:>7} {:>7} {:>10} {:>10} {:>10} {:>8} {:>8} {:>6}",
        "año", "Z", "TC", "ingresos", "gastos", "déficit", "deu/PIB", "RIN", "meses"
    );
    for r in &outcome.resultados {
        println!(
            "  {:>4} {:>7.3} {:>7.2} {:>10.0} {:>10.0} {:>10.0} {:>7.1}% {:>8.0} {:>6.1}",
            r.ano,
            r.valor_z,
            r.tipo_cambio,
            r.ingresos_totales,
            r.gastos_totales,
            r.deficit_superavit,
            r.deuda_pib_ratio,
            r.rin,
            r.rin_meses_importacion,
        );
    }

    let alerts: Vec<_> = outcome
        .resultados
        .iter()
        .flat_map(|r| r.cambios.iter().map(move |c| (r.ano, c)))
        .collect();
    println!();
    println!("=== ALERTS ===");
    if alerts.is_empty() {
        println!("  (none)");
    }
    for (ano, alert) in alerts {
        println!("  {ano}: {alert}");
    }
    println!();
    println!("  {} steps recorded", outcome.pasos.len());
}

fn print_monte_carlo(result: &MonteCarloResult) {
    println!("=== MONTE CARLO (median [p5, p95]) ===");
    for year in &result.resultados_estadisticos {
        let band = |variable: &str| match year.stats(variable) {
            Some(s) => format!("{:.1} [{:.1}, {:.1}]", s.mediana, s.percentil_5, s.percentil_95),
            None => "-".to_string(),
        };
        println!("  {}", year.ano);
        println!("    déficit:    {}", band("deficit_superavit"));
        println!("    deuda/PIB:  {}", band("deuda_pib_ratio"));
        println!("    RIN:        {}", band("rin"));
    }
    println!();
    println!("  method:            {}", result.metodo);
    println!("  seed:              {}", result.semilla);
    println!("  failed iterations: {}", result.iteraciones_fallidas);
}

fn find_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_opt<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    let raw = find_arg(args, flag)?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!("Ignoring {flag} {raw}: not a valid value");
            None
        }
    }
}
