//! Projection events: what the engine noticed while computing a year.
//!
//! RULE: Events are explanatory only. Nothing downstream of the
//! projection reads them back to compute a number. The engine turns
//! them into `SimulationStep` entries and, when an archive is attached,
//! persists them.

use crate::{
    result::SimulationStep,
    types::{RunId, Year},
};
use serde::{Deserialize, Serialize};

/// Every event a projected year can emit.
/// Variants are appended only; the archive stores them by type name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    // ── Run events ─────────────────────────────────
    RunInitialized {
        run_id: RunId,
        years:  u32,
    },

    // ── Year events ────────────────────────────────
    YearProjected {
        year:              Year,
        z:                 f64,
        tipo_cambio:       f64,
        deficit_superavit: f64,
        rin:               f64,
        alerts:            Vec<String>,
    },
    /// A shock moved a variable away from its unshocked value.
    ShockApplied {
        year:     Year,
        shock:    String,
        variable: String,
        before:   f64,
        after:    f64,
        affects:  Vec<String>,
    },
    /// A tax instrument was switched off; its revenue is forced to zero.
    InstrumentDeactivated {
        year:      Year,
        flag:      String,
        variable:  String,
        forgone:   f64,
        affects:   Vec<String>,
    },
    /// A subsidy line was switched off; its expenditure is forced to zero.
    SubsidySuspended {
        year:     Year,
        flag:     String,
        variable: String,
        saved:    f64,
        affects:  Vec<String>,
    },
}

impl SimEvent {
    /// Stable type name, used for the `event_type` column in the archive.
    pub fn type_name(&self) -> &'static str {
        match self {
            SimEvent::RunInitialized { .. }        => "run_initialized",
            SimEvent::YearProjected { .. }         => "year_projected",
            SimEvent::ShockApplied { .. }          => "shock_applied",
            SimEvent::InstrumentDeactivated { .. } => "instrument_deactivated",
            SimEvent::SubsidySuspended { .. }      => "subsidy_suspended",
        }
    }

    pub fn year(&self) -> Option<Year> {
        match self {
            SimEvent::RunInitialized { .. } => None,
            SimEvent::YearProjected { year, .. }
            | SimEvent::ShockApplied { year, .. }
            | SimEvent::InstrumentDeactivated { year, .. }
            | SimEvent::SubsidySuspended { year, .. } => Some(*year),
        }
    }

    /// Render as a change-log step numbered `paso`.
    /// Run-level events have no step.
    pub fn to_step(&self, paso: u32) -> Option<SimulationStep> {
        let step = match self {
            SimEvent::RunInitialized { .. } => return None,
            SimEvent::YearProjected { year, z, tipo_cambio, deficit_superavit, rin, alerts } => {
                SimulationStep {
                    paso,
                    descripcion: format!(
                        "Año {year}: Z={z:.3}, TC={tipo_cambio:.2}, Déficit={deficit_superavit:.0}M, RIN={rin:.0}M USD"
                    ),
                    ano: *year,
                    variable_modificada: None,
                    valor_anterior: None,
                    valor_nuevo: None,
                    impacto_en: alerts.clone(),
                }
            }
            SimEvent::ShockApplied { year, shock, variable, before, after, affects } => {
                SimulationStep {
                    paso,
                    descripcion: format!("Año {year}: {shock} aplicado a {variable}"),
                    ano: *year,
                    variable_modificada: Some(variable.clone()),
                    valor_anterior: Some(*before),
                    valor_nuevo: Some(*after),
                    impacto_en: affects.clone(),
                }
            }
            SimEvent::InstrumentDeactivated { year, flag, variable, forgone, affects } => {
                SimulationStep {
                    paso,
                    descripcion: format!("Año {year}: {flag}=false, {variable} se anula"),
                    ano: *year,
                    variable_modificada: Some(variable.clone()),
                    valor_anterior: Some(*forgone),
                    valor_nuevo: Some(0.0),
                    impacto_en: affects.clone(),
                }
            }
            SimEvent::SubsidySuspended { year, flag, variable, saved, affects } => {
                SimulationStep {
                    paso,
                    descripcion: format!("Año {year}: {flag}=false, {variable} se anula"),
                    ano: *year,
                    variable_modificada: Some(variable.clone()),
                    valor_anterior: Some(*saved),
                    valor_nuevo: Some(0.0),
                    impacto_en: affects.clone(),
                }
            }
        };
        Some(step)
    }
}

/// A persisted event row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id:         Option<i64>,
    pub run_id:     RunId,
    pub year:       Option<Year>,
    pub event_type: String,
    pub payload:    String,
}
