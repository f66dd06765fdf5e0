//! Named shock presets. Applying one overwrites the seven shock fields
//! and nothing else.

use serde::Serialize;

use crate::params::SimulationParameters;

/// The seven shock percentages.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ShockSet {
    pub shock_tc:            f64,
    pub shock_precio_gas:    f64,
    pub shock_precio_oro:    f64,
    pub shock_precio_plata:  f64,
    pub shock_precio_zinc:   f64,
    pub shock_precio_estano: f64,
    pub shock_precio_plomo:  f64,
}

impl ShockSet {
    pub fn of(params: &SimulationParameters) -> Self {
        Self {
            shock_tc:            params.shock_tc,
            shock_precio_gas:    params.shock_precio_gas,
            shock_precio_oro:    params.shock_precio_oro,
            shock_precio_plata:  params.shock_precio_plata,
            shock_precio_zinc:   params.shock_precio_zinc,
            shock_precio_estano: params.shock_precio_estano,
            shock_precio_plomo:  params.shock_precio_plomo,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Scenario {
    pub clave:       &'static str,
    pub nombre:      &'static str,
    pub descripcion: &'static str,
    pub shocks:      ShockSet,
}

impl Scenario {
    pub fn apply(&self, params: &mut SimulationParameters) {
        let s = self.shocks;
        params.shock_tc = s.shock_tc;
        params.shock_precio_gas = s.shock_precio_gas;
        params.shock_precio_oro = s.shock_precio_oro;
        params.shock_precio_plata = s.shock_precio_plata;
        params.shock_precio_zinc = s.shock_precio_zinc;
        params.shock_precio_estano = s.shock_precio_estano;
        params.shock_precio_plomo = s.shock_precio_plomo;
    }
}

const fn shocks(tc: f64, gas: f64, oro: f64, plata: f64, zinc: f64, estano: f64, plomo: f64) -> ShockSet {
    ShockSet {
        shock_tc:            tc,
        shock_precio_gas:    gas,
        shock_precio_oro:    oro,
        shock_precio_plata:  plata,
        shock_precio_zinc:   zinc,
        shock_precio_estano: estano,
        shock_precio_plomo:  plomo,
    }
}

pub const PRESETS: [Scenario; 8] = [
    Scenario {
        clave:       "normal",
        nombre:      "Escenario Normal",
        descripcion: "Sin shocks externos",
        shocks:      shocks(0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0),
    },
    Scenario {
        clave:       "crisis_commodities",
        nombre:      "Crisis de Commodities",
        descripcion: "Caída de precios internacionales",
        shocks:      shocks(5.0, -30.0, -20.0, -25.0, -30.0, -25.0, -28.0),
    },
    Scenario {
        clave:       "auge_minerales",
        nombre:      "Auge de Minerales",
        descripcion: "Aumento de precios de minerales",
        shocks:      shocks(0.0, 0.0, 25.0, 30.0, 20.0, 22.0, 18.0),
    },
    Scenario {
        clave:       "crisis_energetica",
        nombre:      "Crisis Energética",
        descripcion: "Aumento de precios de hidrocarburos",
        shocks:      shocks(0.0, 40.0, 0.0, 0.0, 0.0, 0.0, 0.0),
    },
    Scenario {
        clave:       "caida_commodities",
        nombre:      "Caída de Commodities",
        descripcion: "Reducción del 30% en precios de gas y minerales",
        shocks:      shocks(0.0, -30.0, -25.0, -25.0, -30.0, -30.0, -30.0),
    },
    Scenario {
        clave:       "auge_commodities",
        nombre:      "Auge de Commodities",
        descripcion: "Aumento del 40% en precios de gas y minerales",
        shocks:      shocks(0.0, 40.0, 35.0, 35.0, 40.0, 40.0, 40.0),
    },
    Scenario {
        clave:       "devaluacion",
        nombre:      "Devaluación Cambiaria",
        descripcion: "Devaluación del tipo de cambio del 15%",
        shocks:      shocks(15.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0),
    },
    Scenario {
        clave:       "crisis_combinada",
        nombre:      "Crisis Combinada",
        descripcion: "Caída de commodities + devaluación",
        shocks:      shocks(20.0, -25.0, -20.0, -20.0, -25.0, -25.0, -25.0),
    },
];

pub fn find(clave: &str) -> Option<&'static Scenario> {
    PRESETS.iter().find(|s| s.clave == clave)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preset_keys_are_unique() {
        for (i, a) in PRESETS.iter().enumerate() {
            for b in &PRESETS[i + 1..] {
                assert_ne!(a.clave, b.clave);
            }
        }
    }

    #[test]
    fn apply_touches_only_shocks() {
        let mut params = SimulationParameters::default();
        let before = params.clone();
        find("crisis_commodities").unwrap().apply(&mut params);

        assert_eq!(params.shock_precio_gas, -30.0);
        assert_eq!(params.shock_tc, 5.0);

        // Restoring the old shocks must give back the original parameters.
        let mut restored = params.clone();
        Scenario { shocks: ShockSet::of(&before), ..PRESETS[0] }.apply(&mut restored);
        assert_eq!(restored, before);
    }

    #[test]
    fn unknown_preset_is_none() {
        assert!(find("no_existe").is_none());
    }
}
