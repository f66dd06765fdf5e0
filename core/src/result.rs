//! Output records: one `AnnualResult` per projected year and the
//! step-by-step change log.
//!
//! Units: fiscal flows and stocks in M Bs; external sector (exports,
//! imports, trade balance, RIN) in M USD; ratios in %.

use serde::{Deserialize, Serialize};

use crate::types::Year;

/// Declares `AnnualResult` with its numeric block listed once, so the
/// Monte Carlo reduction can walk every numeric field generically.
/// Optional fields are ratios with no finite value in some years; they
/// serialize as `null` there.
macro_rules! annual_result {
    (
        numeric { $( $(#[$meta:meta])* $field:ident ),* $(,)? }
        optional { $( $(#[$ometa:meta])* $opt:ident ),* $(,)? }
    ) => {
        /// One year's complete fiscal and macro snapshot.
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub struct AnnualResult {
            pub ano: Year,
            $( $(#[$meta])* pub $field: f64, )*
            $( $(#[$ometa])* pub $opt: Option<f64>, )*
            /// Warnings raised for this year.
            pub cambios: Vec<String>,
        }

        impl AnnualResult {
            pub const NUMERIC_FIELDS: usize = [$(stringify!($field)),*].len();

            pub const NUMERIC_FIELD_NAMES: [&'static str; Self::NUMERIC_FIELDS] =
                [$(stringify!($field)),*];

            pub const OPTIONAL_FIELDS: usize = [$(stringify!($opt)),*].len();

            pub const OPTIONAL_FIELD_NAMES: [&'static str; Self::OPTIONAL_FIELDS] =
                [$(stringify!($opt)),*];

            pub fn numeric_values(&self) -> [f64; Self::NUMERIC_FIELDS] {
                [$(self.$field),*]
            }

            pub fn optional_values(&self) -> [Option<f64>; Self::OPTIONAL_FIELDS] {
                [$(self.$opt),*]
            }

            pub fn from_numeric_values(
                ano: Year,
                values: [f64; Self::NUMERIC_FIELDS],
                optional: [Option<f64>; Self::OPTIONAL_FIELDS],
                cambios: Vec<String>,
            ) -> Self {
                let [$($field),*] = values;
                let [$($opt),*] = optional;
                Self { ano, $($field,)* $($opt,)* cambios }
            }
        }
    };
}

annual_result! {
    numeric {
        // ── Revenue by commodity ───────────────────────────────────
        /// IDH plus gas royalties.
        ing_gas,
        ing_idh,
        ing_regalias_gas,
        ing_oro,
        ing_plata,
        ing_zinc,
        ing_estano,
        ing_plomo,
        /// Not modelled; always zero.
        ing_litio,
        ing_hidrocarburos_total,
        ing_mineria_total,

        // ── Revenue by tax instrument ──────────────────────────────
        /// Domestic plus import VAT.
        ing_iva,
        ing_iue,
        ing_it,
        ing_itf,
        ing_rc_iva,
        /// Domestic plus import excise.
        ing_ice,
        ing_ga,
        ing_ij,
        ing_conceptos_varios,
        /// Domestic plus import hydrocarbons excise.
        ing_iehd,
        ing_impuestos_total,
        ingresos_totales,

        // ── Expenditure ────────────────────────────────────────────
        gasto_sueldos,
        gasto_bienes_servicios,
        gasto_inversion,
        gasto_subsidio_combustibles,
        gasto_subsidio_alimentos,
        intereses_deuda_externa,
        intereses_deuda_interna,
        intereses_totales,
        gastos_totales,

        // ── Balance (positive = deficit) ───────────────────────────
        deficit_superavit,
        resultado_primario,

        // ── Debt ───────────────────────────────────────────────────
        deuda_total,
        deuda_externa,
        deuda_interna,
        deuda_pib_ratio,
        delta_deuda_externa,
        delta_deuda_interna,
        deuda_externa_pib,
        deuda_interna_pib,
        ratio_externa_total,
        ratio_interna_total,

        // ── External sector (M USD) ────────────────────────────────
        exportaciones,
        importaciones,
        saldo_comercial,
        rin,
        rin_meses_importacion,

        // ── GDP ────────────────────────────────────────────────────
        pib,
        pib_real,
        crecimiento_pib_efectivo,

        // ── Sustainability ─────────────────────────────────────────
        deficit_pib_ratio,
        presion_tributaria,

        // ── Draw context ───────────────────────────────────────────
        /// Bs per USD after the exchange-rate shock.
        tipo_cambio,
        /// The year's standard-normal draw.
        valor_z,
    }
    optional {
        /// Revenues / interest. `None` when there is no interest to pay:
        /// coverage is unbounded.
        capacidad_pago,
        /// Interest as % of revenues. `None` when there is no revenue.
        intereses_ingresos_ratio,
    }
}

impl AnnualResult {
    /// Look a numeric field up by its wire name.
    pub fn numeric_field(&self, name: &str) -> Option<f64> {
        Self::NUMERIC_FIELD_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| self.numeric_values()[i])
    }
}

/// One entry of the explanatory change log. Not used for computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationStep {
    pub paso: u32,
    pub descripcion: String,
    pub ano: Year,
    pub variable_modificada: Option<String>,
    pub valor_anterior: Option<f64>,
    pub valor_nuevo: Option<f64>,
    pub impacto_en: Vec<String>,
}

/// Response of a single-path run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutcome {
    pub resultados: Vec<AnnualResult>,
    pub pasos: Vec<SimulationStep>,
}
