//! Annual projection step: one year's full fiscal and macro snapshot.
//!
//! COMPUTATION ORDER (fixed, each stage reads only earlier stages and the
//! prior year's carried state):
//!   1. Exchange rate
//!   2. Commodity revenues (gas IDH + royalties, mineral royalties), exports
//!   3. Tax revenues
//!   4. GDP
//!   5. Expenditure (current split, food subsidy, fuel subsidy)
//!   6. Interest on prior-year debt
//!   7. Balance
//!   8. Debt rollforward
//!   9. External sector and reserves
//!  10. Sustainability ratios and alerts
//!
//! RULES:
//!   - One Z per year drives every stochastic line (`base + coef · Z`).
//!   - A switched-off instrument or subsidy contributes exactly zero.
//!   - No non-finite number leaves this module; the year fails instead.
//!
//! Line items scale with the real economy through
//! `escala = (1 + crecimiento_pib/100)^year_index`, so the first projected
//! year reproduces the calibration exactly.

use crate::{
    config::{AlertThresholds, FiscalPolicy, SurplusPolicy},
    error::{SimError, SimResult},
    event::SimEvent,
    params::{Commodity, FuelProduct, SimulationParameters, TaxInstrument},
    result::AnnualResult,
    types::{calendar_year, YearIndex},
};

/// The fields one year hands to the next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarriedState {
    pub pib:            f64,
    pub pib_real:       f64,
    pub deuda_externa:  f64,
    pub deuda_interna:  f64,
    pub rin:            f64,
}

impl CarriedState {
    /// State before the first projected year.
    pub fn initial(params: &SimulationParameters) -> Self {
        Self {
            pib:           params.pib_inicial,
            pib_real:      params.pib_inicial,
            deuda_externa: params.deuda_externa_inicial,
            deuda_interna: params.deuda_interna_inicial,
            rin:           params.rin_inicial,
        }
    }
}

impl From<&AnnualResult> for CarriedState {
    fn from(r: &AnnualResult) -> Self {
        Self {
            pib:           r.pib,
            pib_real:      r.pib_real,
            deuda_externa: r.deuda_externa,
            deuda_interna: r.deuda_interna,
            rin:           r.rin,
        }
    }
}

/// A projected year plus the events that explain it.
#[derive(Debug, Clone)]
pub struct YearProjection {
    pub result: AnnualResult,
    pub events: Vec<SimEvent>,
}

#[derive(Debug, Clone, Copy, Default)]
struct CommodityFlows {
    /// M USD.
    exports:  f64,
    /// M Bs.
    royalty:  f64,
    /// M Bs.
    idh:      f64,
}

pub struct Projector<'a> {
    params: &'a SimulationParameters,
    policy: &'a FiscalPolicy,
    alerts: &'a AlertThresholds,
}

impl<'a> Projector<'a> {
    pub fn new(
        params: &'a SimulationParameters,
        policy: &'a FiscalPolicy,
        alerts: &'a AlertThresholds,
    ) -> Self {
        Self { params, policy, alerts }
    }

    /// Project year `year_index` from the prior year's carried state and
    /// that year's draw `z`.
    pub fn project(
        &self,
        prev: &CarriedState,
        year_index: YearIndex,
        z: f64,
    ) -> SimResult<YearProjection> {
        let p = self.params;
        let year = calendar_year(year_index);
        let scale = self.policy.monetary_scale;
        let escala = (1.0 + p.crecimiento_pib / 100.0).powi(year_index as i32);
        let mut events = Vec::new();

        // ── 1. Exchange rate ───────────────────────────────────
        let tc_drawn = p.exchange_rate().at(z);
        let tc = tc_drawn * (1.0 + p.shock_tc / 100.0);
        if !tc.is_finite() || tc <= 0.0 {
            return Err(SimError::computation(
                year,
                "tipo_cambio",
                format!("exchange rate must be positive, got {tc} (Z={z:.3})"),
            ));
        }
        if p.shock_tc != 0.0 {
            events.push(SimEvent::ShockApplied {
                year,
                shock:    "shock_tc".into(),
                variable: "tipo_cambio".into(),
                before:   tc_drawn,
                after:    tc,
                affects:  names(&[
                    "ing_hidrocarburos_total",
                    "ing_mineria_total",
                    "gasto_subsidio_combustibles",
                    "importaciones",
                    "rin",
                ]),
            });
        }

        // ── 2. Commodities ─────────────────────────────────────
        let mut flows = [CommodityFlows::default(); Commodity::ALL.len()];
        for (slot, commodity) in Commodity::ALL.iter().enumerate() {
            let c = p.commodity(*commodity);
            let volume = c.volumen.at_non_negative(z);
            let price_drawn = c.precio.at_non_negative(z);
            let price = price_drawn * (1.0 + c.shock_precio / 100.0);
            let exports = volume * price / scale;
            let gross = exports * tc;
            flows[slot] = CommodityFlows {
                exports,
                royalty: gross * c.tasa_regalias / 100.0,
                idh:     gross * c.tasa_idh / 100.0,
            };
            if c.shock_precio != 0.0 {
                let total_field = if commodity.is_hydrocarbon() {
                    "ing_hidrocarburos_total"
                } else {
                    "ing_mineria_total"
                };
                events.push(SimEvent::ShockApplied {
                    year,
                    shock:    commodity.shock_field().into(),
                    variable: format!("precio_{}", commodity.key()),
                    before:   price_drawn,
                    after:    price,
                    affects:  names(&[
                        commodity.revenue_field(),
                        total_field,
                        "ingresos_totales",
                        "exportaciones",
                        "deficit_superavit",
                    ]),
                });
            }
        }
        let flow = |c: Commodity| flows[c as usize];
        let gas = flow(Commodity::Gas);
        let ing_idh = gas.idh;
        let ing_regalias_gas = gas.royalty;
        let ing_gas = ing_idh + ing_regalias_gas;
        let ing_oro = flow(Commodity::Oro).royalty;
        let ing_plata = flow(Commodity::Plata).royalty;
        let ing_zinc = flow(Commodity::Zinc).royalty;
        let ing_estano = flow(Commodity::Estano).royalty;
        let ing_plomo = flow(Commodity::Plomo).royalty;
        let ing_hidrocarburos_total = ing_gas;
        let ing_mineria_total = ing_oro + ing_plata + ing_zinc + ing_estano + ing_plomo;
        let exportaciones: f64 = flows.iter().map(|f| f.exports).sum();

        // ── 3. Taxes ───────────────────────────────────────────
        let mut taxes = [0.0f64; TaxInstrument::ALL.len()];
        for instrument in TaxInstrument::ALL {
            let collected = p.tax(instrument).at_non_negative(z) * escala / scale;
            if p.tax_active(instrument) {
                taxes[instrument as usize] = collected;
            } else {
                events.push(SimEvent::InstrumentDeactivated {
                    year,
                    flag:     instrument.flag_field().into(),
                    variable: instrument.key().into(),
                    forgone:  collected,
                    affects:  names(&[
                        instrument.revenue_field(),
                        "ing_impuestos_total",
                        "ingresos_totales",
                        "deficit_superavit",
                    ]),
                });
            }
        }
        let tax = |t: TaxInstrument| taxes[t as usize];
        let ing_iva = tax(TaxInstrument::IvaMercadoInterno) + tax(TaxInstrument::IvaImportaciones);
        let ing_iue = tax(TaxInstrument::Iue);
        let ing_it = tax(TaxInstrument::It);
        let ing_ice = tax(TaxInstrument::IceMercadoInterno) + tax(TaxInstrument::IceImportaciones);
        let ing_rc_iva = tax(TaxInstrument::RcIva);
        let ing_itf = tax(TaxInstrument::Itf);
        let ing_ij = tax(TaxInstrument::Ij);
        let ing_conceptos_varios = tax(TaxInstrument::ConceptosVarios);
        let ing_ga = tax(TaxInstrument::Ga);
        let ing_iehd =
            tax(TaxInstrument::IehdMercadoInterno) + tax(TaxInstrument::IehdImportaciones);
        let ing_impuestos_total = ing_iva
            + ing_iue
            + ing_it
            + ing_ice
            + ing_rc_iva
            + ing_itf
            + ing_ij
            + ing_conceptos_varios
            + ing_ga
            + ing_iehd;
        let ingresos_totales = ing_hidrocarburos_total + ing_mineria_total + ing_impuestos_total;

        // ── 4. GDP ─────────────────────────────────────────────
        let pib = prev.pib * (1.0 + p.crecimiento_pib / 100.0);
        let deflator = (1.0 + p.inflacion / 100.0).powi(year_index as i32 + 1);
        let pib_real = pib / deflator;
        let crecimiento_pib_efectivo = (pib_real / prev.pib_real - 1.0) * 100.0;

        // ── 5. Expenditure ─────────────────────────────────────
        let corriente = p.current_expenditure().at_non_negative(z) * escala / scale;
        let weight_total = p.sueldos_salarios + p.bienes_servicios + p.inversion_publica;
        let gasto_sueldos = corriente * p.sueldos_salarios / weight_total;
        let gasto_bienes_servicios = corriente * p.bienes_servicios / weight_total;
        let gasto_inversion = corriente - gasto_sueldos - gasto_bienes_servicios;

        let food = p.food_subsidy().at_non_negative(z) * escala / scale;
        let gasto_subsidio_alimentos = if p.subsidio_alimentos_activo {
            food
        } else {
            events.push(SimEvent::SubsidySuspended {
                year,
                flag:     "subsidio_alimentos_activo".into(),
                variable: "gasto_subsidio_alimentos".into(),
                saved:    food,
                affects:  names(&["gastos_totales", "deficit_superavit"]),
            });
            0.0
        };

        let mut fuel_subsidy = 0.0;
        let mut fuel_imports = 0.0;
        for product in FuelProduct::ALL {
            let f = p.fuel(product);
            let price_usd = f.precio_importacion.at_non_negative(z);
            let volume = f.volumen_importacion.at_non_negative(z);
            fuel_imports += price_usd * volume / scale;
            fuel_subsidy += ((price_usd * tc - f.precio_venta) * volume / scale).max(0.0);
        }
        let gasto_subsidio_combustibles = if p.subsidio_combustibles_activo {
            fuel_subsidy
        } else {
            events.push(SimEvent::SubsidySuspended {
                year,
                flag:     "subsidio_combustibles_activo".into(),
                variable: "gasto_subsidio_combustibles".into(),
                saved:    fuel_subsidy,
                affects:  names(&["gastos_totales", "deficit_superavit"]),
            });
            0.0
        };

        // ── 6. Interest ────────────────────────────────────────
        let intereses_deuda_externa = prev.deuda_externa * p.tasa_interes_externa / 100.0;
        let intereses_deuda_interna = prev.deuda_interna * p.tasa_interes_interna / 100.0;
        let intereses_totales = intereses_deuda_externa + intereses_deuda_interna;

        let gastos_totales = gasto_sueldos
            + gasto_bienes_servicios
            + gasto_inversion
            + gasto_subsidio_combustibles
            + gasto_subsidio_alimentos
            + intereses_totales;

        // ── 7. Balance ─────────────────────────────────────────
        let deficit_superavit = gastos_totales - ingresos_totales;
        let resultado_primario = deficit_superavit - intereses_totales;

        // ── 8. Debt ────────────────────────────────────────────
        let (delta_deuda_externa, delta_deuda_interna) = self.financing(prev, deficit_superavit);
        let deuda_externa = prev.deuda_externa + delta_deuda_externa;
        let deuda_interna = prev.deuda_interna + delta_deuda_interna;
        let deuda_total = deuda_externa + deuda_interna;
        let deuda_pib_ratio = deuda_total / pib * 100.0;
        let deuda_externa_pib = deuda_externa / pib * 100.0;
        let deuda_interna_pib = deuda_interna / pib * 100.0;
        let (ratio_externa_total, ratio_interna_total) = if deuda_total > 0.0 {
            (deuda_externa / deuda_total * 100.0, deuda_interna / deuda_total * 100.0)
        } else {
            (0.0, 0.0)
        };
        let intereses_ingresos_ratio =
            (ingresos_totales > 0.0).then(|| intereses_totales / ingresos_totales * 100.0);

        // ── 9. External sector ─────────────────────────────────
        let importaciones = p.importaciones_base * escala * (p.tc_base / tc) + fuel_imports;
        let saldo_comercial = exportaciones - importaciones;
        let external_service_usd = intereses_deuda_externa / tc;
        let external_financing_usd = delta_deuda_externa / tc;
        let rin_raw = prev.rin
            + self.policy.trade_balance_retention * saldo_comercial
            - external_service_usd
            + external_financing_usd;
        let rin = if self.policy.floor_reserves_at_zero {
            rin_raw.max(0.0)
        } else {
            rin_raw
        };
        // Imports stay positive: validation requires importaciones_base > 0.
        let rin_meses_importacion = rin / (importaciones / 12.0);

        // ── 10. Ratios ─────────────────────────────────────────
        let deficit_pib_ratio = deficit_superavit / pib * 100.0;
        let presion_tributaria = ing_impuestos_total / pib * 100.0;
        let capacidad_pago = if intereses_totales > 0.0 {
            Some(ingresos_totales / intereses_totales)
        } else {
            None
        };

        let mut result = AnnualResult {
            ano: year,
            ing_gas,
            ing_idh,
            ing_regalias_gas,
            ing_oro,
            ing_plata,
            ing_zinc,
            ing_estano,
            ing_plomo,
            ing_litio: 0.0,
            ing_hidrocarburos_total,
            ing_mineria_total,
            ing_iva,
            ing_iue,
            ing_it,
            ing_itf,
            ing_rc_iva,
            ing_ice,
            ing_ga,
            ing_ij,
            ing_conceptos_varios,
            ing_iehd,
            ing_impuestos_total,
            ingresos_totales,
            gasto_sueldos,
            gasto_bienes_servicios,
            gasto_inversion,
            gasto_subsidio_combustibles,
            gasto_subsidio_alimentos,
            intereses_deuda_externa,
            intereses_deuda_interna,
            intereses_totales,
            gastos_totales,
            deficit_superavit,
            resultado_primario,
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
            intereses_ingresos_ratio,
            exportaciones,
            importaciones,
            saldo_comercial,
            rin,
            rin_meses_importacion,
            pib,
            pib_real,
            crecimiento_pib_efectivo,
            deficit_pib_ratio,
            presion_tributaria,
            tipo_cambio: tc,
            valor_z: z,
            capacidad_pago,
            cambios: Vec::new(),
        };
        ensure_finite(&result)?;
        result.cambios = alerts_for(&result, self.alerts);

        log::debug!(
            "year={year} z={z:.3} tc={tc:.3} ingresos={ingresos_totales:.0} gastos={gastos_totales:.0} deuda/pib={deuda_pib_ratio:.1}% rin={rin:.0}"
        );

        let mut all_events = Vec::with_capacity(events.len() + 1);
        all_events.push(SimEvent::YearProjected {
            year,
            z,
            tipo_cambio: tc,
            deficit_superavit,
            rin,
            alerts: result.cambios.clone(),
        });
        all_events.extend(events);

        Ok(YearProjection {
            result,
            events: all_events,
        })
    }

    /// New borrowing (positive) or repayment (negative) per debt component.
    fn financing(&self, prev: &CarriedState, deficit: f64) -> (f64, f64) {
        let share = self.policy.external_financing_share;
        if deficit > 0.0 {
            return (deficit * share, deficit * (1.0 - share));
        }
        match self.policy.surplus_policy {
            SurplusPolicy::HoldDebt => (0.0, 0.0),
            SurplusPolicy::ReduceDebt => {
                let surplus = -deficit;
                (
                    -(surplus * share).min(prev.deuda_externa),
                    -(surplus * (1.0 - share)).min(prev.deuda_interna),
                )
            }
        }
    }
}

/// Warnings for a finished year. Also applied to Monte Carlo composites.
pub fn alerts_for(r: &AnnualResult, thresholds: &AlertThresholds) -> Vec<String> {
    let mut alerts = Vec::new();
    if r.deuda_pib_ratio > thresholds.debt_to_gdp {
        alerts.push(format!("Deuda/PIB {:.1}% supera límite prudencial", r.deuda_pib_ratio));
    }
    if r.deficit_pib_ratio > thresholds.deficit_to_gdp {
        alerts.push(format!("Déficit/PIB {:.1}% elevado", r.deficit_pib_ratio));
    }
    if r.gasto_subsidio_combustibles > r.ing_gas {
        alerts.push(format!(
            "Subsidios ({:.0}M) superan ingresos gas",
            r.gasto_subsidio_combustibles
        ));
    }
    if r.rin_meses_importacion < thresholds.min_reserve_months {
        alerts.push(format!(
            "RIN ({:.1} meses) por debajo del mínimo recomendado",
            r.rin_meses_importacion
        ));
    }
    alerts
}

fn ensure_finite(r: &AnnualResult) -> SimResult<()> {
    let values = r.numeric_values();
    for (name, value) in AnnualResult::NUMERIC_FIELD_NAMES.iter().zip(values) {
        if !value.is_finite() {
            return Err(SimError::computation(r.ano, *name, format!("non-finite value {value}")));
        }
    }
    let optional = r.optional_values();
    for (name, value) in AnnualResult::OPTIONAL_FIELD_NAMES.iter().zip(optional) {
        if let Some(value) = value.filter(|v| !v.is_finite()) {
            return Err(SimError::computation(r.ano, *name, format!("non-finite value {value}")));
        }
    }
    Ok(())
}

fn names(fields: &[&str]) -> Vec<String> {
    fields.iter().map(|f| f.to_string()).collect()
}
