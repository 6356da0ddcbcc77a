//! Unit tests for the scaling engine

use approx::assert_relative_eq;

use super::*;
use crate::error::DomainError;
use crate::renal::Sex;
use crate::species::{Species, SpeciesTable};

// ============================================================================
// Helpers
// ============================================================================

fn table() -> SpeciesTable {
    SpeciesTable::default()
}

fn mouse_to_human(method: ScalingMethod) -> ScalingRequest {
    ScalingRequest::new("mouse", "human", 10.0, method)
}

/// Same species, 100 mg, so every PK step acts on a round number
fn identity_100mg(pk: PkAdjustments) -> ScalingResult {
    let request =
        ScalingRequest::new("human", "human", 100.0, ScalingMethod::Allometric).with_pk(pk);
    scale(&table(), &request).unwrap()
}

// ============================================================================
// Base scaling
// ============================================================================

#[test]
fn allometric_mouse_to_human() {
    let result = scale(&table(), &mouse_to_human(ScalingMethod::Allometric)).unwrap();
    assert_relative_eq!(result.weight_ratio, 3500.0, epsilon = 1e-9);
    assert_relative_eq!(result.dose_mg, 10.0 * 3500f64.powf(0.75), epsilon = 1e-9);
    assert_relative_eq!(result.dose_mg, 4550.415, epsilon = 1e-3);
    assert_eq!(result.scaling_factor, 0.75);
    assert_eq!(result.method_description, "Allometric scaling (0.75)");
    assert_eq!(result.steps.len(), 1);
}

#[test]
fn allometric_uses_custom_exponent() {
    let request = mouse_to_human(ScalingMethod::Allometric).with_exponent(0.67);
    let result = scale(&table(), &request).unwrap();
    assert_relative_eq!(result.dose_mg, 10.0 * 3500f64.powf(0.67), epsilon = 1e-9);
}

#[test]
fn molecular_weight_overrides_exponent() {
    let pk = PkAdjustments::new().with_molecular_weight(850.0);
    let request = mouse_to_human(ScalingMethod::Allometric)
        .with_exponent(0.9)
        .with_pk(pk);
    let result = scale(&table(), &request).unwrap();
    assert_eq!(result.scaling_factor, 0.70);
    assert!(result.method_description.contains("MW adjustment"));
    assert_relative_eq!(result.dose_mg, 10.0 * 3500f64.powf(0.70), epsilon = 1e-9);
}

#[test]
fn molecular_weight_breakpoints_are_a_step_function() {
    assert_eq!(molecular_weight_exponent(100.0), 0.80);
    assert_eq!(molecular_weight_exponent(400.0), 0.80);
    assert_eq!(molecular_weight_exponent(400.5), 0.75);
    assert_eq!(molecular_weight_exponent(700.0), 0.75);
    assert_eq!(molecular_weight_exponent(700.01), 0.70);
}

#[test]
fn brain_weight_reduces_to_brain_ratio_power() {
    // w^((2/3) ln R / ln w) == R^(2/3) for any w != 1
    let result = scale(&table(), &mouse_to_human(ScalingMethod::BrainWeight)).unwrap();
    let expected = 10.0 * (1350.0f64 / 0.4).powf(2.0 / 3.0);
    assert_relative_eq!(result.dose_mg, expected, max_relative = 1e-9);
    assert_relative_eq!(
        result.scaling_factor,
        (2.0 / 3.0) * (1350.0f64 / 0.4).ln() / 3500f64.ln(),
        epsilon = 1e-12
    );
}

#[test]
fn life_span_scaling() {
    let result = scale(&table(), &mouse_to_human(ScalingMethod::LifeSpan)).unwrap();
    assert_relative_eq!(result.dose_mg, 10.0 * 80.0 / 2.0, max_relative = 1e-9);
    assert_eq!(result.method_description, "Life-span scaling");
}

#[test]
fn hepatic_flow_scaling() {
    let result = scale(&table(), &mouse_to_human(ScalingMethod::HepaticFlow)).unwrap();
    // Q * (CL / Q) collapses to hepatic clearance: 15 / 90
    assert_relative_eq!(result.dose_mg, 10.0 * 15.0 / 90.0, max_relative = 1e-9);
}

#[test]
fn bsa_scaling_is_a_direct_ratio() {
    let result = scale(&table(), &mouse_to_human(ScalingMethod::Bsa)).unwrap();
    assert_relative_eq!(result.dose_mg, 10.0 * 1.9 / 0.006, epsilon = 1e-9);
    assert_relative_eq!(result.dose_mg, 3166.6667, epsilon = 1e-4);
    assert_relative_eq!(result.scaling_factor, 1.9 / 0.006, epsilon = 1e-12);
    assert!(!result.steps[0].params.contains('^'));
}

#[test]
fn bsa_ignores_weight_overrides() {
    let request = mouse_to_human(ScalingMethod::Bsa)
        .with_source_weight(0.03)
        .with_target_weight(90.0);
    let result = scale(&table(), &request).unwrap();
    assert_relative_eq!(result.dose_mg, 10.0 * 1.9 / 0.006, epsilon = 1e-9);
}

// ============================================================================
// Identity and the weight ratio of one
// ============================================================================

#[test]
fn identity_for_every_method() {
    for method in ScalingMethod::ALL {
        let request = ScalingRequest::new("dog", "dog", 42.0, method);
        let result = scale(&table(), &request).unwrap();
        assert_relative_eq!(result.dose_mg, 42.0, epsilon = 1e-12);
        assert!(result.dose_mg.is_finite(), "{method} produced a non-finite dose");
    }
}

#[test]
fn log_ratio_methods_guard_equal_weights() {
    for method in [
        ScalingMethod::BrainWeight,
        ScalingMethod::LifeSpan,
        ScalingMethod::HepaticFlow,
    ] {
        let request = ScalingRequest::new("rat", "rat", 5.0, method);
        let result = scale(&table(), &request).unwrap();
        assert_eq!(result.weight_ratio, 1.0);
        assert_eq!(result.scaling_factor, 1.0);
        assert!(result.method_description.contains("equal weights"));
    }
}

#[test]
fn equal_weights_across_species_apply_the_physiological_ratio() {
    let request = mouse_to_human(ScalingMethod::LifeSpan).with_target_weight(0.02);
    let result = scale(&table(), &request).unwrap();
    assert_eq!(result.weight_ratio, 1.0);
    assert_relative_eq!(result.dose_mg, 400.0, max_relative = 1e-12);

    // Approaching from either side gives the same value
    let near = mouse_to_human(ScalingMethod::LifeSpan).with_target_weight(0.020001);
    let near = scale(&table(), &near).unwrap();
    assert_relative_eq!(near.dose_mg, result.dose_mg, max_relative = 1e-6);
}

// ============================================================================
// Monotonicity
// ============================================================================

#[test]
fn allometric_dose_increases_with_target_weight() {
    let mut previous = 0.0;
    for i in 1..=200 {
        let weight = 0.02 + i as f64 * 0.5;
        let request = mouse_to_human(ScalingMethod::Allometric).with_target_weight(weight);
        let dose = scale(&table(), &request).unwrap().dose_mg;
        assert!(dose > previous, "dose not increasing at {weight} kg");
        previous = dose;
    }
}

// ============================================================================
// PK adjustments
// ============================================================================

#[test]
fn protein_binding_multiplies_by_free_fraction() {
    let result = identity_100mg(PkAdjustments::new().with_protein_binding(20.0));
    assert_relative_eq!(result.dose_mg, 80.0, epsilon = 1e-9);
    assert_eq!(result.steps[1].to_string(), "Protein binding (20%): × 0.8000 = 80.0000 mg");
}

#[test]
fn oral_bioavailability_divides_the_dose() {
    let result = identity_100mg(PkAdjustments::new().with_bioavailability(Bioavailability::Oral));
    assert_relative_eq!(result.dose_mg, 200.0, epsilon = 1e-9);
    assert_eq!(result.steps[1].operator, Operator::Divide);
    assert_eq!(
        result.steps[1].to_string(),
        "Bioavailability (oral 50%): ÷ 0.5000 = 200.0000 mg"
    );
}

#[test]
fn bioavailability_modes_resolve_to_fixed_percentages() {
    assert_eq!(Bioavailability::Iv.percent(), 100.0);
    assert_eq!(Bioavailability::Oral.percent(), 50.0);
    assert_eq!(Bioavailability::Other.percent(), 75.0);
    assert_eq!(Bioavailability::Manual(33.0).percent(), 33.0);

    let iv = identity_100mg(PkAdjustments::new().with_bioavailability(Bioavailability::Iv));
    assert_eq!(iv.steps.len(), 1);

    let other = identity_100mg(PkAdjustments::new().with_bioavailability(Bioavailability::Other));
    assert_relative_eq!(other.dose_mg, 100.0 / 0.75, epsilon = 1e-9);

    let manual =
        identity_100mg(PkAdjustments::new().with_bioavailability(Bioavailability::Manual(25.0)));
    assert_relative_eq!(manual.dose_mg, 400.0, epsilon = 1e-9);
}

#[test]
fn manual_kidney_function() {
    let pk = PkAdjustments::new().with_kidney_function(KidneyFunction::Manual(50.0));
    let result = identity_100mg(pk);
    assert_relative_eq!(result.dose_mg, 50.0, epsilon = 1e-9);
}

#[test]
fn cockcroft_gault_kidney_function_uses_target_weight() {
    let normal = KidneyFunction::CockcroftGault {
        age_years: 40.0,
        serum_creatinine: 1.0,
        sex: Sex::Male,
    };
    let result = identity_100mg(PkAdjustments::new().with_kidney_function(normal));
    assert_relative_eq!(result.dose_mg, 100.0, epsilon = 1e-9);
    assert!(result.steps[1].params.contains("stage G1"));

    // (140 - 80) * 70 / (72 * 2) * 0.85 = 24.79 mL/min
    let impaired = KidneyFunction::CockcroftGault {
        age_years: 80.0,
        serum_creatinine: 2.0,
        sex: Sex::Female,
    };
    let result = identity_100mg(PkAdjustments::new().with_kidney_function(impaired));
    assert_relative_eq!(result.dose_mg, 50.0, epsilon = 1e-9);
    assert!(result.steps[1].params.contains("24.8 mL/min"));
}

#[test]
fn cockcroft_gault_errors_propagate() {
    let kidney = KidneyFunction::CockcroftGault {
        age_years: 40.0,
        serum_creatinine: 0.0,
        sex: Sex::Male,
    };
    let request = ScalingRequest::new("human", "human", 100.0, ScalingMethod::Allometric)
        .with_pk(PkAdjustments::new().with_kidney_function(kidney));
    assert!(matches!(
        scale(&table(), &request),
        Err(DomainError::InvalidInput { .. })
    ));
}

#[test]
fn volume_of_distribution_uses_target_weight() {
    let result = identity_100mg(PkAdjustments::new().with_volume_of_distribution(0.7));
    assert_relative_eq!(result.dose_mg, 100.0 * 0.7 / 70.0, epsilon = 1e-9);

    let request = ScalingRequest::new("human", "human", 100.0, ScalingMethod::Allometric)
        .with_source_weight(35.0)
        .with_target_weight(35.0)
        .with_pk(PkAdjustments::new().with_volume_of_distribution(0.7));
    let result = scale(&table(), &request).unwrap();
    assert_relative_eq!(result.dose_mg, 100.0 * 0.7 / 35.0, epsilon = 1e-9);
}

#[test]
fn lipophilicity_uses_absolute_log_p() {
    let positive = identity_100mg(PkAdjustments::new().with_log_p(2.0));
    let negative = identity_100mg(PkAdjustments::new().with_log_p(-2.0));
    assert_relative_eq!(positive.dose_mg, 120.0, epsilon = 1e-9);
    assert_relative_eq!(negative.dose_mg, 120.0, epsilon = 1e-9);
}

#[test]
fn adjustments_apply_in_fixed_order_and_replay() {
    let pk = PkAdjustments::new()
        .with_protein_binding(10.0)
        .with_bioavailability(Bioavailability::Other)
        .with_kidney_function(KidneyFunction::Manual(80.0))
        .with_volume_of_distribution(1.4)
        .with_log_p(3.0);
    let request = mouse_to_human(ScalingMethod::Allometric).with_pk(pk);
    let result = scale(&table(), &request).unwrap();

    let labels: Vec<&str> = result.steps.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(
        labels,
        vec![
            "Base scaling",
            "Protein binding",
            "Bioavailability",
            "Kidney function",
            "Volume distribution",
            "Lipophilicity",
        ]
    );

    let expected = 10.0 * 3500f64.powf(0.75) * 0.9 / 0.75 * 0.8 * (1.4 / 70.0) * 1.3;
    assert_relative_eq!(result.dose_mg, expected, max_relative = 1e-12);
    assert_relative_eq!(result.replay(), result.dose_mg, max_relative = 1e-12);
    assert_relative_eq!(
        result.steps.last().unwrap().running_dose_mg,
        result.dose_mg,
        epsilon = 0.0
    );
    assert_relative_eq!(result.scaled_dose_mg, 10.0 * 3500f64.powf(0.75), max_relative = 1e-12);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn unknown_species_fails() {
    let request = ScalingRequest::new("mouse", "unicorn", 10.0, ScalingMethod::Allometric);
    match scale(&table(), &request) {
        Err(DomainError::UnknownSpecies(key)) => assert_eq!(key, "unicorn"),
        other => panic!("expected UnknownSpecies, got {:?}", other),
    }
}

#[test]
fn non_positive_weights_fail() {
    let request = mouse_to_human(ScalingMethod::Allometric).with_source_weight(0.0);
    assert!(matches!(
        scale(&table(), &request),
        Err(DomainError::InvalidWeight { role: "source", .. })
    ));

    let request = mouse_to_human(ScalingMethod::Bsa).with_target_weight(-3.0);
    assert!(matches!(
        scale(&table(), &request),
        Err(DomainError::InvalidWeight { role: "target", .. })
    ));

    let request = mouse_to_human(ScalingMethod::Allometric).with_target_weight(f64::NAN);
    assert!(matches!(
        scale(&table(), &request),
        Err(DomainError::InvalidWeight { .. })
    ));
}

#[test]
fn non_positive_base_dose_fails() {
    let request = ScalingRequest::new("mouse", "rat", 0.0, ScalingMethod::Allometric);
    assert!(matches!(
        scale(&table(), &request),
        Err(DomainError::InvalidDose(_))
    ));
}

#[test]
fn out_of_range_pk_parameters_fail() {
    let cases = [
        PkAdjustments::new().with_protein_binding(120.0),
        PkAdjustments::new().with_protein_binding(-1.0),
        PkAdjustments::new().with_bioavailability(Bioavailability::Manual(0.0)),
        PkAdjustments::new().with_bioavailability(Bioavailability::Manual(101.0)),
        PkAdjustments::new().with_kidney_function(KidneyFunction::Manual(150.0)),
        PkAdjustments::new().with_volume_of_distribution(-0.5),
        PkAdjustments::new().with_molecular_weight(-10.0),
        PkAdjustments::new().with_log_p(f64::INFINITY),
    ];
    for pk in cases {
        let request = mouse_to_human(ScalingMethod::Allometric).with_pk(pk);
        assert!(
            matches!(scale(&table(), &request), Err(DomainError::InvalidInput { .. })),
            "{:?} was accepted",
            pk
        );
    }
}

#[test]
fn zero_physiological_parameter_fails_for_the_method_that_needs_it() {
    let source = Species::new("Synthetic", 1.0, 0.0, 0.0, 50.0, 30.0, 0.0, 0.1);
    let target = Species::new("Other", 2.0, 3.0, 4.0, 50.0, 30.0, 0.0, 0.2);
    let request = ScalingRequest::new("synthetic", "other", 1.0, ScalingMethod::BrainWeight);

    match scale_between(&source, 1.0, &target, 2.0, &request) {
        Err(DomainError::InvalidPhysiologicalParameter { field, species, .. }) => {
            assert_eq!(field, "brain_weight_g");
            assert_eq!(species, "Synthetic");
        }
        other => panic!("expected InvalidPhysiologicalParameter, got {:?}", other),
    }

    let life = ScalingRequest {
        method: ScalingMethod::LifeSpan,
        ..request.clone()
    };
    assert!(matches!(
        scale_between(&source, 1.0, &target, 2.0, &life),
        Err(DomainError::InvalidPhysiologicalParameter { field: "life_span_years", .. })
    ));

    // Allometric and BSA do not read brain weight or life span
    let allometric = ScalingRequest {
        method: ScalingMethod::Allometric,
        ..request
    };
    assert!(scale_between(&source, 1.0, &target, 2.0, &allometric).is_ok());
}

#[test]
fn method_names_parse() {
    assert_eq!("allometric".parse::<ScalingMethod>().unwrap(), ScalingMethod::Allometric);
    assert_eq!("brainWeight".parse::<ScalingMethod>().unwrap(), ScalingMethod::BrainWeight);
    assert_eq!("life_span".parse::<ScalingMethod>().unwrap(), ScalingMethod::LifeSpan);
    assert_eq!("HepaticFlow".parse::<ScalingMethod>().unwrap(), ScalingMethod::HepaticFlow);
    assert_eq!("BSA".parse::<ScalingMethod>().unwrap(), ScalingMethod::Bsa);
    match "kidney".parse::<ScalingMethod>() {
        Err(DomainError::InvalidMethod(name)) => assert_eq!(name, "kidney"),
        other => panic!("expected InvalidMethod, got {:?}", other),
    }
}
