//! Study planning through the public API
//!
//! - Requirements for mixed treatment, placebo and comparator arms
//! - Arms seeded from a scaled dose
//! - Report rendering

use approx::assert_relative_eq;
use chrono::{TimeZone, Utc};
use dosescale::prelude::export::*;
use dosescale::prelude::study::*;
use dosescale::prelude::*;

fn rat_arm(name: &str) -> StudyArm {
    StudyArm::new(name, "rat", 0.25)
        .with_subjects(8)
        .with_dose(5.0, DoseUnit::MgPerKg)
        .with_duration(4.0, DurationUnit::Weeks)
        .with_frequency(Frequency::Twice)
}

#[test]
fn test_mixed_study_requirements() {
    let formulation = Formulation::new(2.0, ConcentrationUnit::MgPerMl)
        .with_overage(10.0)
        .with_dilution(DilutionStep::new(4.0, Vehicle::Pbs));
    let arms = [
        rat_arm("Low"),
        rat_arm("Vehicle").with_arm_type(ArmType::Placebo),
        rat_arm("Reference").with_arm_type(ArmType::Comparator(ComparatorDetails {
            name: "Drug X".to_string(),
            concentration: 0.5,
            concentration_unit: ConcentrationUnit::PercentWv,
        })),
    ];
    let req = compute_requirements(&arms, &formulation, &StudyOptions::default()).unwrap();

    // 28 days * 2 per day * 8 subjects
    assert_eq!(req.arms[0].total_doses, 448);
    // 5 mg/kg * 0.25 kg = 1.25 mg; 1.25 * 448 * 1.1
    assert_relative_eq!(req.arms[0].product_required_mg, 616.0, epsilon = 1e-9);
    assert_relative_eq!(req.arms[0].admin_volume_ml.unwrap(), 0.625, epsilon = 1e-12);
    // 560 mg / 2 mg/mL * 1.1 = 308 mL, diluted 4x with PBS
    let step = &req.arms[0].dilution_steps[0];
    assert_relative_eq!(step.start_volume_ml, 308.0, epsilon = 1e-9);
    assert_relative_eq!(step.added_volume_ml, 924.0, epsilon = 1e-9);
    assert_relative_eq!(step.final_concentration_mg_per_ml, 0.5, epsilon = 1e-12);

    assert_eq!(req.arms[1].product_required_mg, 0.0);
    assert_eq!(req.arms[1].dose_per_subject_mg, None);

    // 0.5 % w/v = 5 mg/mL
    assert_relative_eq!(req.arms[2].admin_volume_ml.unwrap(), 0.25, epsilon = 1e-12);

    assert_relative_eq!(req.total_product_required_mg, 616.0, epsilon = 1e-9);
    assert_relative_eq!(req.comparator_required_mg, 616.0, epsilon = 1e-9);
    assert_eq!(req.total_doses, 3 * 448);
}

#[test]
fn test_scaled_dose_flows_into_plan() {
    let table = SpeciesTable::default();
    let request = ScalingRequest::new("mouse", "dog", 2.0, ScalingMethod::Allometric);
    let result = scale(&table, &request).unwrap();

    let mut plan = StudyPlan::with_default_arm(&table).unwrap();
    plan.add_arm_from_scaling(&table, "dog", &result).unwrap();
    let req = plan.requirements().unwrap();

    let dog = req.arms.iter().find(|a| a.name == "Dog Dose").unwrap();
    assert_relative_eq!(dog.dose_per_subject_mg.unwrap(), result.dose_mg, epsilon = 1e-12);
    assert_eq!(dog.total_doses, 140);
}

#[test]
fn test_reports_render() {
    let table = SpeciesTable::default();
    let generated = Utc.with_ymd_and_hms(2025, 1, 15, 9, 0, 0).unwrap();

    let request = ScalingRequest::new("mouse", "human", 10.0, ScalingMethod::Bsa);
    let result = scale(&table, &request).unwrap();
    let dose_report = DoseReport::new(&request, &result, generated).to_string();
    assert!(dose_report.contains("Base Calculated Dose: 3166.6667 mg"));
    assert!(dose_report.contains("1. Body surface area scaling\n"));

    let mut plan = StudyPlan::with_default_arm(&table).unwrap();
    plan.set_species(&table, "Dose Group 1", "dog").unwrap();
    let report = StudyPlanReport::new(&plan, generated).unwrap();
    // 10 mg/kg * 20 kg * 140 doses * 1.15 = 32.2 g
    assert!(report
        .to_string()
        .contains("Total Active Compound Required: 32.200 g\n"));
}
