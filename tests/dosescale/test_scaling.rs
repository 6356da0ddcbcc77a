//! Scaling scenarios through the public API
//!
//! - Allometric, BSA and log-ratio methods
//! - PK adjustment chain
//! - Renal banding
//! - Dose-versus-weight curves

use approx::assert_relative_eq;
use dosescale::prelude::chart::*;
use dosescale::prelude::*;

#[test]
fn test_allometric_mouse_to_human() {
    let table = SpeciesTable::default();
    let request = ScalingRequest::new("mouse", "human", 10.0, ScalingMethod::Allometric);
    let result = scale(&table, &request).unwrap();

    // 10 * (70 / 0.02)^0.75 = 10 * 3500^0.75
    assert_relative_eq!(result.weight_ratio, 3500.0, epsilon = 1e-9);
    assert_relative_eq!(result.dose_mg, 4550.415, epsilon = 1e-3);
}

#[test]
fn test_bsa_mouse_to_human() {
    let table = SpeciesTable::default();
    let request = ScalingRequest::new("mouse", "human", 10.0, ScalingMethod::Bsa);
    let result = scale(&table, &request).unwrap();

    // 10 * 1.9 / 0.006
    assert_relative_eq!(result.dose_mg, 3166.7, epsilon = 0.05);
    assert!(result.steps[0].params.contains("BSA"));
}

#[test]
fn test_oral_bioavailability_doubles_dose() {
    let table = SpeciesTable::default();
    let pk = PkAdjustments::new().with_bioavailability(Bioavailability::Oral);
    let request =
        ScalingRequest::new("human", "human", 100.0, ScalingMethod::Allometric).with_pk(pk);
    let result = scale(&table, &request).unwrap();

    // 100 / 0.5
    assert_relative_eq!(result.dose_mg, 200.0, epsilon = 1e-9);
}

#[test]
fn test_identity_for_every_method() {
    let table = SpeciesTable::default();
    for method in ScalingMethod::ALL {
        let request = ScalingRequest::new("rabbit", "rabbit", 42.0, method);
        let result = scale(&table, &request).unwrap();
        assert_relative_eq!(result.dose_mg, 42.0, epsilon = 1e-9);
        assert!(result.dose_mg.is_finite());
    }
}

#[test]
fn test_log_ratio_methods_never_produce_nan() {
    let table = SpeciesTable::default();
    for method in [
        ScalingMethod::BrainWeight,
        ScalingMethod::LifeSpan,
        ScalingMethod::HepaticFlow,
    ] {
        // Equal weights across different species
        let request = ScalingRequest::new("mouse", "human", 10.0, method)
            .with_source_weight(1.0)
            .with_target_weight(1.0);
        let result = scale(&table, &request).unwrap();
        assert!(result.dose_mg.is_finite());
        assert!(result.method_description.ends_with("(equal weights: direct ratio)"));
    }
}

#[test]
fn test_full_adjustment_chain_replays() {
    let table = SpeciesTable::default();
    let pk = PkAdjustments::new()
        .with_protein_binding(20.0)
        .with_bioavailability(Bioavailability::Manual(80.0))
        .with_kidney_function(KidneyFunction::CockcroftGault {
            age_years: 65.0,
            serum_creatinine: 1.4,
            sex: Sex::Female,
        })
        .with_volume_of_distribution(0.7)
        .with_molecular_weight(450.0)
        .with_log_p(2.0);
    let request = ScalingRequest::new("rat", "human", 5.0, ScalingMethod::Allometric).with_pk(pk);
    let result = scale(&table, &request).unwrap();

    let labels: Vec<&str> = result.steps.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(
        labels,
        [
            "Base scaling",
            "Protein binding",
            "Bioavailability",
            "Kidney function",
            "Volume distribution",
            "Lipophilicity",
        ]
    );
    assert_relative_eq!(result.replay(), result.dose_mg, max_relative = 1e-12);
    assert_eq!(result.derivation_steps().len(), result.steps.len());
    assert_eq!(result.scaling_factor, 0.75);
}

#[test]
fn test_unknown_species_is_reported() {
    let table = SpeciesTable::default();
    let request = ScalingRequest::new("mouse", "dragon", 10.0, ScalingMethod::Allometric);
    assert!(matches!(
        scale(&table, &request),
        Err(DomainError::UnknownSpecies(key)) if key == "dragon"
    ));
}

#[test]
fn test_method_names_parse() {
    assert_eq!("brainWeight".parse::<ScalingMethod>().unwrap(), ScalingMethod::BrainWeight);
    assert_eq!("hepatic_flow".parse::<ScalingMethod>().unwrap(), ScalingMethod::HepaticFlow);
    assert!(matches!(
        "pixie dust".parse::<ScalingMethod>(),
        Err(DomainError::InvalidMethod(_))
    ));
}

#[test]
fn test_gfr_banding() {
    assert_eq!(gfr_to_dose_fraction(60.0), 1.0);
    assert_eq!(gfr_to_dose_fraction(59.999), 0.75);
    assert_eq!(gfr_to_dose_fraction(30.0), 0.75);
    assert_eq!(gfr_to_dose_fraction(14.999), 0.25);

    let gfr = estimate_gfr(70.0, 40.0, 1.0, Sex::Female).unwrap();
    // (140 - 40) * 70 / 72 * 0.85
    assert_relative_eq!(gfr, 7000.0 / 72.0 * 0.85, epsilon = 1e-9);
    assert_eq!(GfrStage::from_gfr(gfr), GfrStage::G2);
}

#[test]
fn test_curve_export() {
    let table = SpeciesTable::default();
    let request = ScalingRequest::new("dog", "human", 50.0, ScalingMethod::Allometric);
    let points = generate_curve(&table, &request, &CurveOptions::default().with_num_points(11))
        .unwrap();
    assert_eq!(points.len(), table.len() + 11);

    let dog = points.iter().find(|p| p.label == "Dog").unwrap();
    assert_relative_eq!(dog.dose_mg, 50.0, epsilon = 1e-9);

    let mut csv = Vec::new();
    write_curve_csv(&points, &mut csv).unwrap();
    let text = String::from_utf8(csv).unwrap();
    assert_eq!(text.lines().count(), points.len() + 1);
}
