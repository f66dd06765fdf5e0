//! Environment configuration for the HTTP server.
//!
//! `FISCAL_PORT` (default 8000), `FISCAL_CONFIG` (optional engine config
//! JSON) and `RAYON_NUM_THREADS` (Monte Carlo worker pool).

use fiscal_core::config::EngineConfig;

pub const DEFAULT_PORT: u16 = 8000;

/// Read `FISCAL_PORT`.
pub fn server_port() -> u16 {
    std::env::var("FISCAL_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

/// Load the engine config named by `FISCAL_CONFIG`, or the defaults.
pub fn engine_config() -> anyhow::Result<EngineConfig> {
    match std::env::var("FISCAL_CONFIG") {
        Ok(path) => {
            log::info!("Loading engine config from {path}");
            EngineConfig::load(&path)
        }
        Err(_) => Ok(EngineConfig::default()),
    }
}

/// Size the global rayon pool from `RAYON_NUM_THREADS` when set.
/// Tolerates an already-initialized pool. Returns the thread count in use.
pub fn init_rayon_threads() -> usize {
    if let Some(n) = std::env::var("RAYON_NUM_THREADS")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
    {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .ok();
    }
    let threads = rayon::current_num_threads();
    log::info!("Rayon threads: {threads}");
    threads
}
