//! Parameter store: defaults, JSON wire format, legacy field names and
//! validation.

use fiscal_core::{
    error::SimError,
    params::{Commodity, SimulationParameters, TaxInstrument, LEGACY_NAMES},
    scenario,
};

#[test]
fn defaults_round_trip_through_json() {
    let defaults = SimulationParameters::default();
    let json = serde_json::to_string(&defaults).expect("serialize");
    let back = SimulationParameters::from_json(&json).expect("defaults are valid");
    assert_eq!(back, defaults);
}

#[test]
fn defaults_are_valid_and_all_switches_on() {
    let p = SimulationParameters::default();
    p.validate().expect("defaults must validate");
    assert_eq!(p.anos, 6);
    for instrument in TaxInstrument::ALL {
        assert!(p.tax_active(instrument), "{} should default to active", instrument.key());
    }
    assert!(p.subsidio_combustibles_activo);
    assert!(p.subsidio_alimentos_activo);
}

#[test]
fn missing_switches_default_to_active() {
    let mut value = serde_json::to_value(SimulationParameters::default()).unwrap();
    let obj = value.as_object_mut().unwrap();
    obj.remove("iva_activo");
    obj.remove("subsidio_combustibles_activo");

    let p = SimulationParameters::from_json(&value.to_string()).expect("parse");
    assert!(p.iva_activo);
    assert!(p.subsidio_combustibles_activo);
}

#[test]
fn legacy_field_names_are_accepted() {
    let mut value = serde_json::to_value(SimulationParameters::default()).unwrap();
    let obj = value.as_object_mut().unwrap();
    for (current, legacy, v) in [
        ("conceptos_varios_base", "cv_base", 1.0e9),
        ("corriente_base", "gasto_corriente_base", 2.0e11),
        ("subsidio_gasolina_precio_base", "gasolina_precio_importacion_base", 1_000.0),
        ("subsidio_diesel_venta", "diesel_precio_venta_domestico", 4_500.0),
    ] {
        obj.remove(current);
        obj.insert(legacy.to_string(), serde_json::json!(v));
    }

    let p = SimulationParameters::from_json(&value.to_string()).expect("legacy names parse");
    assert_eq!(p.conceptos_varios_base, 1.0e9);
    assert_eq!(p.corriente_base, 2.0e11);
    assert_eq!(p.subsidio_gasolina_precio_base, 1_000.0);
    assert_eq!(p.subsidio_diesel_venta, 4_500.0);
}

#[test]
fn served_defaults_carry_legacy_names() {
    let wire = SimulationParameters::default().to_wire_json().expect("serialize");
    for (legacy, canonical) in LEGACY_NAMES {
        assert_eq!(wire[legacy], wire[canonical], "{legacy} must mirror {canonical}");
        assert!(wire[legacy].is_number(), "{legacy} missing from served defaults");
    }
}

#[test]
fn served_defaults_with_an_edited_legacy_field_are_accepted() {
    // The editor keeps both names in its state and changes the legacy one.
    let mut wire = SimulationParameters::default().to_wire_json().expect("serialize");
    wire["cv_base"] = serde_json::json!(4.2e9);
    wire["gasto_corriente_coef_z"] = serde_json::json!(1.0e10);

    let p = SimulationParameters::from_json(&wire.to_string()).expect("both names accepted");
    assert_eq!(p.conceptos_varios_base, 4.2e9);
    assert_eq!(p.corriente_coef_z, 1.0e10);
    assert_eq!(p.subsidio_diesel_venta, SimulationParameters::default().subsidio_diesel_venta);
}

#[test]
fn missing_coefficient_is_a_validation_error_naming_it() {
    for name in ["tc_base", "iva_mi_coef_z", "plomo_tasa_regalias", "anos"] {
        let mut value = serde_json::to_value(SimulationParameters::default()).unwrap();
        value.as_object_mut().unwrap().remove(name);

        match SimulationParameters::from_json(&value.to_string()) {
            Err(SimError::Validation { field, message }) => {
                assert_eq!(field, name, "wrong field blamed: {message}");
            }
            other => panic!("missing {name} must be rejected, got {other:?}"),
        }
    }
}

#[test]
fn malformed_json_is_a_validation_error() {
    let err = SimulationParameters::from_json("{\"anos\": \"seis\"}").unwrap_err();
    assert!(err.is_validation(), "got {err}");
}

#[test]
fn out_of_range_values_are_rejected() {
    let cases: Vec<(&str, SimulationParameters)> = vec![
        ("pib_inicial", SimulationParameters { pib_inicial: 0.0, ..Default::default() }),
        ("tc_base", SimulationParameters { tc_base: -1.0, ..Default::default() }),
        ("importaciones_base", SimulationParameters { importaciones_base: 0.0, ..Default::default() }),
        ("deuda_externa_inicial", SimulationParameters { deuda_externa_inicial: -5.0, ..Default::default() }),
        ("gas_tasa_regalias", SimulationParameters { gas_tasa_regalias: 120.0, ..Default::default() }),
        ("shock_precio_oro", SimulationParameters { shock_precio_oro: -100.0, ..Default::default() }),
        ("inflacion", SimulationParameters { inflacion: f64::NAN, ..Default::default() }),
        (
            "sueldos_salarios",
            SimulationParameters {
                sueldos_salarios: 0.0,
                bienes_servicios: 0.0,
                inversion_publica: 0.0,
                ..Default::default()
            },
        ),
    ];

    for (expected_field, params) in cases {
        match params.validate() {
            Err(SimError::Validation { field, .. }) => {
                assert_eq!(field, expected_field, "wrong field blamed");
            }
            other => panic!("{expected_field}: expected a validation error, got {other:?}"),
        }
    }
}

#[test]
fn commodity_views_follow_the_flat_fields() {
    let p = SimulationParameters::default();
    let gas = p.commodity(Commodity::Gas);
    assert_eq!(gas.volumen.base, p.gas_volumen_base);
    assert_eq!(gas.tasa_idh, p.gas_tasa_idh);

    let zinc = p.commodity(Commodity::Zinc);
    assert_eq!(zinc.precio.coef_z, p.zinc_precio_coef_z);
    assert_eq!(zinc.tasa_idh, 0.0);
    assert!(!Commodity::Zinc.is_hydrocarbon());
}

#[test]
fn every_preset_validates() {
    for preset in scenario::PRESETS {
        let mut p = SimulationParameters::default();
        preset.apply(&mut p);
        p.validate()
            .unwrap_or_else(|e| panic!("preset {} is invalid: {e}", preset.clave));
    }
}
