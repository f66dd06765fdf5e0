//! Simulation parameters: the complete coefficient set for one run.
//!
//! RULE: A run sees exactly one immutable `SimulationParameters` value.
//! Every coefficient is required on the wire; a missing coefficient is a
//! configuration error, never a silent zero (zero means "policy off").
//! Legacy field names used by the parameter editor are resolved here, in
//! `from_value`, and nowhere else (see `LEGACY_NAMES`).
//!
//! Units: stocks and flows in millions of bolivianos (M Bs) unless the
//! field says USD. Line-item coefficients (`*_base`, `*_coef_z`) are in the
//! raw units of the calibration (bolivianos, tonnes, USD per tonne) and are
//! scaled to millions by the projection.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{SimError, SimResult};

pub const MIN_YEARS: u32 = 1;
pub const MAX_YEARS: u32 = 20;

fn activo() -> bool {
    true
}

/// `(legacy, canonical)` wire names. The editor reads and writes the legacy
/// names, so both are served and both are accepted. When a request carries
/// both, the legacy value wins: it is the one the editor just changed.
pub const LEGACY_NAMES: [(&str, &str); 14] = [
    ("cv_base",                             "conceptos_varios_base"),
    ("cv_coef_z",                           "conceptos_varios_coef_z"),
    ("gasto_corriente_base",                "corriente_base"),
    ("gasto_corriente_coef_z",              "corriente_coef_z"),
    ("gasolina_precio_importacion_base",    "subsidio_gasolina_precio_base"),
    ("gasolina_precio_importacion_coef_z",  "subsidio_gasolina_precio_coef_z"),
    ("gasolina_volumen_importacion_base",   "subsidio_gasolina_volumen_base"),
    ("gasolina_volumen_importacion_coef_z", "subsidio_gasolina_volumen_coef_z"),
    ("gasolina_precio_venta_domestico",     "subsidio_gasolina_venta"),
    ("diesel_precio_importacion_base",      "subsidio_diesel_precio_base"),
    ("diesel_precio_importacion_coef_z",    "subsidio_diesel_precio_coef_z"),
    ("diesel_volumen_importacion_base",     "subsidio_diesel_volumen_base"),
    ("diesel_volumen_importacion_coef_z",   "subsidio_diesel_volumen_coef_z"),
    ("diesel_precio_venta_domestico",       "subsidio_diesel_venta"),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationParameters {
    // ── Horizon and initial stocks ─────────────────────────────
    pub anos: u32,
    pub pib_inicial: f64,
    /// Nominal GDP growth, % per year.
    pub crecimiento_pib: f64,
    /// GDP deflator growth, % per year.
    pub inflacion: f64,
    pub deuda_externa_inicial: f64,
    pub deuda_interna_inicial: f64,
    /// % per year.
    pub tasa_interes_externa: f64,
    /// % per year.
    pub tasa_interes_interna: f64,
    /// M USD.
    pub rin_inicial: f64,
    /// Non-fuel imports in the base year, M USD.
    pub importaciones_base: f64,

    // ── Shocks (% applied multiplicatively) ───────────────────
    pub shock_tc: f64,
    pub shock_precio_gas: f64,
    pub shock_precio_oro: f64,
    pub shock_precio_plata: f64,
    pub shock_precio_zinc: f64,
    pub shock_precio_estano: f64,
    pub shock_precio_plomo: f64,

    // ── Exchange rate: TC = base + coef · Z ────────────────────
    pub tc_base: f64,
    pub tc_coef_z: f64,

    // ── Natural gas ────────────────────────────────────────────
    pub gas_volumen_base: f64,
    pub gas_volumen_coef_z: f64,
    pub gas_precio_base: f64,
    pub gas_precio_coef_z: f64,
    pub gas_tasa_idh: f64,
    pub gas_tasa_regalias: f64,

    // ── Gold ───────────────────────────────────────────────────
    pub oro_volumen_base: f64,
    pub oro_volumen_coef_z: f64,
    pub oro_precio_base: f64,
    pub oro_precio_coef_z: f64,
    pub oro_tasa_regalias: f64,

    // ── Silver ─────────────────────────────────────────────────
    pub plata_volumen_base: f64,
    pub plata_volumen_coef_z: f64,
    pub plata_precio_base: f64,
    pub plata_precio_coef_z: f64,
    pub plata_tasa_regalias: f64,

    // ── Zinc ───────────────────────────────────────────────────
    pub zinc_volumen_base: f64,
    pub zinc_volumen_coef_z: f64,
    pub zinc_precio_base: f64,
    pub zinc_precio_coef_z: f64,
    pub zinc_tasa_regalias: f64,

    // ── Tin ────────────────────────────────────────────────────
    pub estano_volumen_base: f64,
    pub estano_volumen_coef_z: f64,
    pub estano_precio_base: f64,
    pub estano_precio_coef_z: f64,
    pub estano_tasa_regalias: f64,

    // ── Lead ───────────────────────────────────────────────────
    pub plomo_volumen_base: f64,
    pub plomo_volumen_coef_z: f64,
    pub plomo_precio_base: f64,
    pub plomo_precio_coef_z: f64,
    pub plomo_tasa_regalias: f64,

    // ── Tax instruments (Bs per year) ──────────────────────────
    pub iva_mi_base: f64,
    pub iva_mi_coef_z: f64,
    pub iva_i_base: f64,
    pub iva_i_coef_z: f64,
    pub iue_base: f64,
    pub iue_coef_z: f64,
    pub it_base: f64,
    pub it_coef_z: f64,
    pub ice_mi_base: f64,
    pub ice_mi_coef_z: f64,
    pub ice_i_base: f64,
    pub ice_i_coef_z: f64,
    pub rc_iva_base: f64,
    pub rc_iva_coef_z: f64,
    pub itf_base: f64,
    pub itf_coef_z: f64,
    pub ij_base: f64,
    pub ij_coef_z: f64,
    pub conceptos_varios_base: f64,
    pub conceptos_varios_coef_z: f64,
    pub ga_base: f64,
    pub ga_coef_z: f64,
    pub iehd_mi_base: f64,
    pub iehd_mi_coef_z: f64,
    pub iehd_i_base: f64,
    pub iehd_i_coef_z: f64,

    // ── Tax activation flags ───────────────────────────────────
    #[serde(default = "activo")]
    pub iva_activo: bool,
    #[serde(default = "activo")]
    pub iue_activo: bool,
    #[serde(default = "activo")]
    pub it_activo: bool,
    #[serde(default = "activo")]
    pub itf_activo: bool,
    #[serde(default = "activo")]
    pub rc_iva_activo: bool,
    #[serde(default = "activo")]
    pub ice_activo: bool,
    #[serde(default = "activo")]
    pub ga_activo: bool,
    #[serde(default = "activo")]
    pub ij_activo: bool,
    #[serde(default = "activo")]
    pub conceptos_varios_activo: bool,
    #[serde(default = "activo")]
    pub iehd_activo: bool,

    // ── Expenditure ────────────────────────────────────────────
    pub corriente_base: f64,
    pub corriente_coef_z: f64,
    /// Flat figures that weight the split of current expenditure.
    pub sueldos_salarios: f64,
    pub bienes_servicios: f64,
    pub inversion_publica: f64,
    pub subsidio_alimentos_base: f64,
    pub subsidio_alimentos_coef_z: f64,
    #[serde(default = "activo")]
    pub subsidio_alimentos_activo: bool,

    // ── Fuel subsidy ───────────────────────────────────────────
    #[serde(default = "activo")]
    pub subsidio_combustibles_activo: bool,
    /// Import price, USD per tonne.
    pub subsidio_gasolina_precio_base: f64,
    pub subsidio_gasolina_precio_coef_z: f64,
    /// Import volume, tonnes.
    pub subsidio_gasolina_volumen_base: f64,
    pub subsidio_gasolina_volumen_coef_z: f64,
    /// Domestic sale price, Bs per tonne.
    pub subsidio_gasolina_venta: f64,
    pub subsidio_diesel_precio_base: f64,
    pub subsidio_diesel_precio_coef_z: f64,
    pub subsidio_diesel_volumen_base: f64,
    pub subsidio_diesel_volumen_coef_z: f64,
    pub subsidio_diesel_venta: f64,
}

impl Default for SimulationParameters {
    /// Baseline calibration (General State Budget, Bolivia).
    fn default() -> Self {
        Self {
            anos: 6,
            pib_inicial: 420_000.0,
            crecimiento_pib: 3.2,
            inflacion: 1.5,
            deuda_externa_inicial: 100_000.0,
            deuda_interna_inicial: 50_000.0,
            tasa_interes_externa: 4.3,
            tasa_interes_interna: 3.1,
            rin_inicial: 3_500.0,
            importaciones_base: 10_200.0,

            shock_tc: 0.0,
            shock_precio_gas: 0.0,
            shock_precio_oro: 0.0,
            shock_precio_plata: 0.0,
            shock_precio_zinc: 0.0,
            shock_precio_estano: 0.0,
            shock_precio_plomo: 0.0,

            tc_base: 12.4125,
            tc_coef_z: 1.835528988,

            gas_volumen_base: 16_515_000.0,
            gas_volumen_coef_z: 6_202_447.464,
            gas_precio_base: 871.208,
            gas_precio_coef_z: 729.0108468,
            gas_tasa_idh: 32.0,
            gas_tasa_regalias: 18.0,

            oro_volumen_base: 33.86,
            oro_volumen_coef_z: 17.43482148,
            oro_precio_base: 62_377_907.29,
            oro_precio_coef_z: 8_328_119.788,
            oro_tasa_regalias: 12.0,

            plata_volumen_base: 1_227.708333,
            plata_volumen_coef_z: 146.1280268,
            plata_precio_base: 864_265.5598,
            plata_precio_coef_z: 260_978.7337,
            plata_tasa_regalias: 12.0,

            zinc_volumen_base: 469_430.4,
            zinc_volumen_coef_z: 67_671.09523,
            zinc_precio_base: 2_826.32284,
            zinc_precio_coef_z: 427.3211028,
            zinc_tasa_regalias: 12.0,

            estano_volumen_base: 16_195.4,
            estano_volumen_coef_z: 3_060.343739,
            estano_precio_base: 27_438.70052,
            estano_precio_coef_z: 6_279.561218,
            estano_tasa_regalias: 12.0,

            plomo_volumen_base: 90_045.0,
            plomo_volumen_coef_z: 19_231.45031,
            plomo_precio_base: 2_081.16128,
            plomo_precio_coef_z: 148.3825547,
            plomo_tasa_regalias: 12.0,

            iva_mi_base: 9_946_000_000.0,
            iva_mi_coef_z: 1_048_843_554.0,
            iva_i_base: 10_566_333_333.0,
            iva_i_coef_z: 2_157_826_468.0,
            iue_base: 8_053_000_000.0,
            iue_coef_z: 1_504_402_074.0,
            it_base: 5_336_333_333.0,
            it_coef_z: 811_801_125.1,
            ice_mi_base: 1_826_333_333.0,
            ice_mi_coef_z: 202_134_278.8,
            ice_i_base: 761_666_666.7,
            ice_i_coef_z: 120_392_137.1,
            rc_iva_base: 633_500_000.0,
            rc_iva_coef_z: 230_075_422.4,
            itf_base: 433_666_666.7,
            itf_coef_z: 128_233_640.9,
            ij_base: 48_000_000.0,
            ij_coef_z: 20_386_269.89,
            conceptos_varios_base: 4_110_000_000.0,
            conceptos_varios_coef_z: 1_427_622_359.0,
            ga_base: 3_473_166_667.0,
            ga_coef_z: 833_990_987.2,
            iehd_mi_base: 2_200_333_333.0,
            iehd_mi_coef_z: 275_045_935.6,
            iehd_i_base: 32_666_666.67,
            iehd_i_coef_z: 17_305_105.22,

            iva_activo: true,
            iue_activo: true,
            it_activo: true,
            itf_activo: true,
            rc_iva_activo: true,
            ice_activo: true,
            ga_activo: true,
            ij_activo: true,
            conceptos_varios_activo: true,
            iehd_activo: true,

            corriente_base: 111_953_166_667.0,
            corriente_coef_z: 13_443_318_019.0,
            sueldos_salarios: 14_200.0,
            bienes_servicios: 8_900.0,
            inversion_publica: 6_200.0,
            subsidio_alimentos_base: 401_142_857.1,
            subsidio_alimentos_coef_z: 238_077_318.4,
            subsidio_alimentos_activo: true,

            subsidio_combustibles_activo: true,
            subsidio_gasolina_precio_base: 961.0769231,
            subsidio_gasolina_precio_coef_z: 188.465191,
            subsidio_gasolina_volumen_base: 439_256.5537,
            subsidio_gasolina_volumen_coef_z: 318_706.3029,
            subsidio_gasolina_venta: 4_986.67,
            subsidio_diesel_precio_base: 812.6923077,
            subsidio_diesel_precio_coef_z: 170.6858262,
            subsidio_diesel_volumen_base: 1_194_994.527,
            subsidio_diesel_volumen_coef_z: 519_808.993,
            subsidio_diesel_venta: 4_376.47,
        }
    }
}

// ── Linear-in-Z coefficients ─────────────────────────────────────────

/// `value = base + coef_z · Z`, the rule every stochastic line follows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearCoefficient {
    pub base:   f64,
    pub coef_z: f64,
}

impl LinearCoefficient {
    pub fn new(base: f64, coef_z: f64) -> Self {
        Self { base, coef_z }
    }

    pub fn at(&self, z: f64) -> f64 {
        self.base + self.coef_z * z
    }

    /// Same rule, floored at zero. Volumes, prices and collections
    /// cannot go negative however deep the draw.
    pub fn at_non_negative(&self, z: f64) -> f64 {
        self.at(z).max(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Commodity {
    Gas,
    Oro,
    Plata,
    Zinc,
    Estano,
    Plomo,
}

impl Commodity {
    pub const ALL: [Commodity; 6] = [
        Commodity::Gas,
        Commodity::Oro,
        Commodity::Plata,
        Commodity::Zinc,
        Commodity::Estano,
        Commodity::Plomo,
    ];

    pub const MINERALS: [Commodity; 5] = [
        Commodity::Oro,
        Commodity::Plata,
        Commodity::Zinc,
        Commodity::Estano,
        Commodity::Plomo,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Gas    => "gas",
            Self::Oro    => "oro",
            Self::Plata  => "plata",
            Self::Zinc   => "zinc",
            Self::Estano => "estano",
            Self::Plomo  => "plomo",
        }
    }

    pub fn shock_field(&self) -> &'static str {
        match self {
            Self::Gas    => "shock_precio_gas",
            Self::Oro    => "shock_precio_oro",
            Self::Plata  => "shock_precio_plata",
            Self::Zinc   => "shock_precio_zinc",
            Self::Estano => "shock_precio_estano",
            Self::Plomo  => "shock_precio_plomo",
        }
    }

    /// The `AnnualResult` field holding this commodity's fiscal revenue.
    pub fn revenue_field(&self) -> &'static str {
        match self {
            Self::Gas    => "ing_gas",
            Self::Oro    => "ing_oro",
            Self::Plata  => "ing_plata",
            Self::Zinc   => "ing_zinc",
            Self::Estano => "ing_estano",
            Self::Plomo  => "ing_plomo",
        }
    }

    pub fn is_hydrocarbon(&self) -> bool {
        matches!(self, Self::Gas)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommodityCoefficients {
    /// Tonnes exported.
    pub volumen: LinearCoefficient,
    /// USD per tonne.
    pub precio: LinearCoefficient,
    /// Royalty rate, %.
    pub tasa_regalias: f64,
    /// Direct hydrocarbons tax rate, %. Zero for minerals.
    pub tasa_idh: f64,
    /// Price shock, %.
    pub shock_precio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxInstrument {
    IvaMercadoInterno,
    IvaImportaciones,
    Iue,
    It,
    IceMercadoInterno,
    IceImportaciones,
    RcIva,
    Itf,
    Ij,
    ConceptosVarios,
    Ga,
    IehdMercadoInterno,
    IehdImportaciones,
}

impl TaxInstrument {
    pub const ALL: [TaxInstrument; 13] = [
        TaxInstrument::IvaMercadoInterno,
        TaxInstrument::IvaImportaciones,
        TaxInstrument::Iue,
        TaxInstrument::It,
        TaxInstrument::IceMercadoInterno,
        TaxInstrument::IceImportaciones,
        TaxInstrument::RcIva,
        TaxInstrument::Itf,
        TaxInstrument::Ij,
        TaxInstrument::ConceptosVarios,
        TaxInstrument::Ga,
        TaxInstrument::IehdMercadoInterno,
        TaxInstrument::IehdImportaciones,
    ];

    /// Coefficient prefix on the wire (`{key}_base`, `{key}_coef_z`).
    pub fn key(&self) -> &'static str {
        match self {
            Self::IvaMercadoInterno  => "iva_mi",
            Self::IvaImportaciones   => "iva_i",
            Self::Iue                => "iue",
            Self::It                 => "it",
            Self::IceMercadoInterno  => "ice_mi",
            Self::IceImportaciones   => "ice_i",
            Self::RcIva              => "rc_iva",
            Self::Itf                => "itf",
            Self::Ij                 => "ij",
            Self::ConceptosVarios    => "conceptos_varios",
            Self::Ga                 => "ga",
            Self::IehdMercadoInterno => "iehd_mi",
            Self::IehdImportaciones  => "iehd_i",
        }
    }

    /// The activation flag governing this instrument. Domestic and import
    /// legs of VAT, excise and IEHD share one flag.
    pub fn flag_field(&self) -> &'static str {
        match self {
            Self::IvaMercadoInterno | Self::IvaImportaciones   => "iva_activo",
            Self::Iue                                          => "iue_activo",
            Self::It                                           => "it_activo",
            Self::IceMercadoInterno | Self::IceImportaciones   => "ice_activo",
            Self::RcIva                                        => "rc_iva_activo",
            Self::Itf                                          => "itf_activo",
            Self::Ij                                           => "ij_activo",
            Self::ConceptosVarios                              => "conceptos_varios_activo",
            Self::Ga                                           => "ga_activo",
            Self::IehdMercadoInterno | Self::IehdImportaciones => "iehd_activo",
        }
    }

    /// The `AnnualResult` field this instrument is reported under.
    pub fn revenue_field(&self) -> &'static str {
        match self {
            Self::IvaMercadoInterno | Self::IvaImportaciones   => "ing_iva",
            Self::Iue                                          => "ing_iue",
            Self::It                                           => "ing_it",
            Self::IceMercadoInterno | Self::IceImportaciones   => "ing_ice",
            Self::RcIva                                        => "ing_rc_iva",
            Self::Itf                                          => "ing_itf",
            Self::Ij                                           => "ing_ij",
            Self::ConceptosVarios                              => "ing_conceptos_varios",
            Self::Ga                                           => "ing_ga",
            Self::IehdMercadoInterno | Self::IehdImportaciones => "ing_iehd",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuelProduct {
    Gasolina,
    Diesel,
}

impl FuelProduct {
    pub const ALL: [FuelProduct; 2] = [FuelProduct::Gasolina, FuelProduct::Diesel];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Gasolina => "subsidio_gasolina",
            Self::Diesel   => "subsidio_diesel",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuelCoefficients {
    /// Import price, USD per tonne.
    pub precio_importacion: LinearCoefficient,
    /// Import volume, tonnes.
    pub volumen_importacion: LinearCoefficient,
    /// Regulated domestic price, Bs per tonne.
    pub precio_venta: f64,
}

impl SimulationParameters {
    pub fn exchange_rate(&self) -> LinearCoefficient {
        LinearCoefficient::new(self.tc_base, self.tc_coef_z)
    }

    pub fn commodity(&self, commodity: Commodity) -> CommodityCoefficients {
        let (vb, vc, pb, pc, regalias, idh, shock) = match commodity {
            Commodity::Gas => (
                self.gas_volumen_base, self.gas_volumen_coef_z,
                self.gas_precio_base, self.gas_precio_coef_z,
                self.gas_tasa_regalias, self.gas_tasa_idh, self.shock_precio_gas,
            ),
            Commodity::Oro => (
                self.oro_volumen_base, self.oro_volumen_coef_z,
                self.oro_precio_base, self.oro_precio_coef_z,
                self.oro_tasa_regalias, 0.0, self.shock_precio_oro,
            ),
            Commodity::Plata => (
                self.plata_volumen_base, self.plata_volumen_coef_z,
                self.plata_precio_base, self.plata_precio_coef_z,
                self.plata_tasa_regalias, 0.0, self.shock_precio_plata,
            ),
            Commodity::Zinc => (
                self.zinc_volumen_base, self.zinc_volumen_coef_z,
                self.zinc_precio_base, self.zinc_precio_coef_z,
                self.zinc_tasa_regalias, 0.0, self.shock_precio_zinc,
            ),
            Commodity::Estano => (
                self.estano_volumen_base, self.estano_volumen_coef_z,
                self.estano_precio_base, self.estano_precio_coef_z,
                self.estano_tasa_regalias, 0.0, self.shock_precio_estano,
            ),
            Commodity::Plomo => (
                self.plomo_volumen_base, self.plomo_volumen_coef_z,
                self.plomo_precio_base, self.plomo_precio_coef_z,
                self.plomo_tasa_regalias, 0.0, self.shock_precio_plomo,
            ),
        };
        CommodityCoefficients {
            volumen:       LinearCoefficient::new(vb, vc),
            precio:        LinearCoefficient::new(pb, pc),
            tasa_regalias: regalias,
            tasa_idh:      idh,
            shock_precio:  shock,
        }
    }

    pub fn tax(&self, instrument: TaxInstrument) -> LinearCoefficient {
        let (base, coef_z) = match instrument {
            TaxInstrument::IvaMercadoInterno  => (self.iva_mi_base, self.iva_mi_coef_z),
            TaxInstrument::IvaImportaciones   => (self.iva_i_base, self.iva_i_coef_z),
            TaxInstrument::Iue                => (self.iue_base, self.iue_coef_z),
            TaxInstrument::It                 => (self.it_base, self.it_coef_z),
            TaxInstrument::IceMercadoInterno  => (self.ice_mi_base, self.ice_mi_coef_z),
            TaxInstrument::IceImportaciones   => (self.ice_i_base, self.ice_i_coef_z),
            TaxInstrument::RcIva              => (self.rc_iva_base, self.rc_iva_coef_z),
            TaxInstrument::Itf                => (self.itf_base, self.itf_coef_z),
            TaxInstrument::Ij                 => (self.ij_base, self.ij_coef_z),
            TaxInstrument::ConceptosVarios    => (self.conceptos_varios_base, self.conceptos_varios_coef_z),
            TaxInstrument::Ga                 => (self.ga_base, self.ga_coef_z),
            TaxInstrument::IehdMercadoInterno => (self.iehd_mi_base, self.iehd_mi_coef_z),
            TaxInstrument::IehdImportaciones  => (self.iehd_i_base, self.iehd_i_coef_z),
        };
        LinearCoefficient::new(base, coef_z)
    }

    pub fn tax_active(&self, instrument: TaxInstrument) -> bool {
        match instrument {
            TaxInstrument::IvaMercadoInterno | TaxInstrument::IvaImportaciones => self.iva_activo,
            TaxInstrument::Iue => self.iue_activo,
            TaxInstrument::It => self.it_activo,
            TaxInstrument::IceMercadoInterno | TaxInstrument::IceImportaciones => self.ice_activo,
            TaxInstrument::RcIva => self.rc_iva_activo,
            TaxInstrument::Itf => self.itf_activo,
            TaxInstrument::Ij => self.ij_activo,
            TaxInstrument::ConceptosVarios => self.conceptos_varios_activo,
            TaxInstrument::Ga => self.ga_activo,
            TaxInstrument::IehdMercadoInterno | TaxInstrument::IehdImportaciones => self.iehd_activo,
        }
    }

    pub fn fuel(&self, product: FuelProduct) -> FuelCoefficients {
        match product {
            FuelProduct::Gasolina => FuelCoefficients {
                precio_importacion: LinearCoefficient::new(
                    self.subsidio_gasolina_precio_base,
                    self.subsidio_gasolina_precio_coef_z,
                ),
                volumen_importacion: LinearCoefficient::new(
                    self.subsidio_gasolina_volumen_base,
                    self.subsidio_gasolina_volumen_coef_z,
                ),
                precio_venta: self.subsidio_gasolina_venta,
            },
            FuelProduct::Diesel => FuelCoefficients {
                precio_importacion: LinearCoefficient::new(
                    self.subsidio_diesel_precio_base,
                    self.subsidio_diesel_precio_coef_z,
                ),
                volumen_importacion: LinearCoefficient::new(
                    self.subsidio_diesel_volumen_base,
                    self.subsidio_diesel_volumen_coef_z,
                ),
                precio_venta: self.subsidio_diesel_venta,
            },
        }
    }

    pub fn current_expenditure(&self) -> LinearCoefficient {
        LinearCoefficient::new(self.corriente_base, self.corriente_coef_z)
    }

    pub fn food_subsidy(&self) -> LinearCoefficient {
        LinearCoefficient::new(self.subsidio_alimentos_base, self.subsidio_alimentos_coef_z)
    }

    /// Parse a JSON parameter object. Missing or mistyped fields surface as
    /// a validation error naming the field where serde reports one.
    pub fn from_json(json: &str) -> SimResult<Self> {
        let object: Map<String, Value> = serde_json::from_str(json)
            .map_err(|e| SimError::validation("parametros", e.to_string()))?;
        Self::from_value(object)
    }

    /// Resolve legacy names, deserialize and validate.
    pub fn from_value(mut object: Map<String, Value>) -> SimResult<Self> {
        for (legacy, canonical) in LEGACY_NAMES {
            if let Some(value) = object.remove(legacy) {
                object.insert(canonical.to_string(), value);
            }
        }
        let params: Self = serde_json::from_value(Value::Object(object)).map_err(|e| {
            let message = e.to_string();
            let field = reported_field(&message).unwrap_or("parametros").to_string();
            SimError::validation(field, message)
        })?;
        params.validate()?;
        Ok(params)
    }

    /// Canonical JSON plus every legacy name, as served to clients.
    pub fn to_wire_json(&self) -> SimResult<Value> {
        let mut value = serde_json::to_value(self)?;
        if let Value::Object(object) = &mut value {
            for (legacy, canonical) in LEGACY_NAMES {
                if let Some(v) = object.get(canonical).cloned() {
                    object.insert(legacy.to_string(), v);
                }
            }
        }
        Ok(value)
    }

    /// Reject out-of-range parameters before any computation starts.
    pub fn validate(&self) -> SimResult<()> {
        if !(MIN_YEARS..=MAX_YEARS).contains(&self.anos) {
            return Err(SimError::validation(
                "anos",
                format!("must be between {MIN_YEARS} and {MAX_YEARS}, got {}", self.anos),
            ));
        }

        let scalars = [
            ("pib_inicial", self.pib_inicial),
            ("crecimiento_pib", self.crecimiento_pib),
            ("inflacion", self.inflacion),
            ("deuda_externa_inicial", self.deuda_externa_inicial),
            ("deuda_interna_inicial", self.deuda_interna_inicial),
            ("tasa_interes_externa", self.tasa_interes_externa),
            ("tasa_interes_interna", self.tasa_interes_interna),
            ("rin_inicial", self.rin_inicial),
            ("importaciones_base", self.importaciones_base),
            ("shock_tc", self.shock_tc),
            ("tc_base", self.tc_base),
            ("tc_coef_z", self.tc_coef_z),
            ("corriente_base", self.corriente_base),
            ("corriente_coef_z", self.corriente_coef_z),
            ("sueldos_salarios", self.sueldos_salarios),
            ("bienes_servicios", self.bienes_servicios),
            ("inversion_publica", self.inversion_publica),
            ("subsidio_alimentos_base", self.subsidio_alimentos_base),
            ("subsidio_alimentos_coef_z", self.subsidio_alimentos_coef_z),
        ];
        for (field, value) in scalars {
            require_finite(field, value)?;
        }

        require_positive("pib_inicial", self.pib_inicial)?;
        require_positive("tc_base", self.tc_base)?;
        require_positive("importaciones_base", self.importaciones_base)?;
        require_above_minus_100("crecimiento_pib", self.crecimiento_pib)?;
        require_above_minus_100("inflacion", self.inflacion)?;
        require_above_minus_100("shock_tc", self.shock_tc)?;
        for (field, value) in [
            ("deuda_externa_inicial", self.deuda_externa_inicial),
            ("deuda_interna_inicial", self.deuda_interna_inicial),
            ("tasa_interes_externa", self.tasa_interes_externa),
            ("tasa_interes_interna", self.tasa_interes_interna),
            ("rin_inicial", self.rin_inicial),
            ("importaciones_base", self.importaciones_base),
            ("corriente_base", self.corriente_base),
            ("sueldos_salarios", self.sueldos_salarios),
            ("bienes_servicios", self.bienes_servicios),
            ("inversion_publica", self.inversion_publica),
            ("subsidio_alimentos_base", self.subsidio_alimentos_base),
        ] {
            require_non_negative(field, value)?;
        }
        if self.sueldos_salarios + self.bienes_servicios + self.inversion_publica <= 0.0 {
            return Err(SimError::validation(
                "sueldos_salarios",
                "wages, goods and services and investment cannot all be zero",
            ));
        }

        for commodity in Commodity::ALL {
            let key = commodity.key();
            let c = self.commodity(commodity);
            require_finite(&format!("{key}_volumen_coef_z"), c.volumen.coef_z)?;
            require_finite(&format!("{key}_precio_coef_z"), c.precio.coef_z)?;
            require_non_negative(&format!("{key}_volumen_base"), c.volumen.base)?;
            require_non_negative(&format!("{key}_precio_base"), c.precio.base)?;
            require_rate(&format!("{key}_tasa_regalias"), c.tasa_regalias)?;
            require_above_minus_100(commodity.shock_field(), c.shock_precio)?;
        }
        require_rate("gas_tasa_idh", self.gas_tasa_idh)?;

        for instrument in TaxInstrument::ALL {
            let key = instrument.key();
            let t = self.tax(instrument);
            require_non_negative(&format!("{key}_base"), t.base)?;
            require_finite(&format!("{key}_coef_z"), t.coef_z)?;
        }

        for product in FuelProduct::ALL {
            let key = product.key();
            let f = self.fuel(product);
            require_non_negative(&format!("{key}_precio_base"), f.precio_importacion.base)?;
            require_finite(&format!("{key}_precio_coef_z"), f.precio_importacion.coef_z)?;
            require_non_negative(&format!("{key}_volumen_base"), f.volumen_importacion.base)?;
            require_finite(&format!("{key}_volumen_coef_z"), f.volumen_importacion.coef_z)?;
            require_non_negative(&format!("{key}_venta"), f.precio_venta)?;
        }

        Ok(())
    }
}

/// The field serde names in a missing/duplicate field error.
fn reported_field(message: &str) -> Option<&str> {
    let rest = message
        .strip_prefix("missing field `")
        .or_else(|| message.strip_prefix("duplicate field `"))?;
    rest.split('`').next()
}

fn require_finite(field: &str, value: f64) -> SimResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SimError::validation(field, format!("must be a finite number, got {value}")))
    }
}

fn require_non_negative(field: &str, value: f64) -> SimResult<()> {
    require_finite(field, value)?;
    if value < 0.0 {
        return Err(SimError::validation(field, format!("must not be negative, got {value}")));
    }
    Ok(())
}

fn require_positive(field: &str, value: f64) -> SimResult<()> {
    if value <= 0.0 {
        return Err(SimError::validation(field, format!("must be positive, got {value}")));
    }
    Ok(())
}

fn require_rate(field: &str, value: f64) -> SimResult<()> {
    require_finite(field, value)?;
    if !(0.0..=100.0).contains(&value) {
        return Err(SimError::validation(field, format!("must be a percentage in [0, 100], got {value}")));
    }
    Ok(())
}

fn require_above_minus_100(field: &str, value: f64) -> SimResult<()> {
    require_finite(field, value)?;
    if value <= -100.0 {
        return Err(SimError::validation(field, format!("must be greater than -100%, got {value}")));
    }
    Ok(())
}
