//! Custom species tables

use approx::assert_relative_eq;
use dosescale::prelude::*;

const CUSTOM_TABLE: &str = r#"[
    {
        "key": "zebrafish",
        "name": "Zebrafish",
        "weightKg": 0.0005,
        "brainWeightG": 0.01,
        "lifeSpanYears": 5.0,
        "hepaticFlow": 100.0,
        "hepaticClearance": 50.0,
        "renalClearance": 0.0,
        "bodySurfaceAreaM2": 0.0004
    },
    {
        "key": "twin",
        "name": "Twin",
        "weightKg": 0.0005,
        "brainWeightG": 0.02,
        "lifeSpanYears": 10.0,
        "hepaticFlow": 100.0,
        "hepaticClearance": 25.0,
        "renalClearance": 0.0,
        "bodySurfaceAreaM2": 0.0004
    }
]"#;

#[test]
fn test_custom_table_drives_the_engine() {
    let table = SpeciesTable::from_json(CUSTOM_TABLE).unwrap();
    assert_eq!(table.len(), 2);
    assert!(!table.contains("mouse"));

    // Same weight, so the life-span ratio is applied directly: 10 / 5
    let request = ScalingRequest::new("zebrafish", "twin", 3.0, ScalingMethod::LifeSpan);
    let result = scale(&table, &request).unwrap();
    assert_relative_eq!(result.dose_mg, 6.0, epsilon = 1e-9);

    // (100 * 0.25) / (100 * 0.5)
    let request = ScalingRequest::new("zebrafish", "twin", 3.0, ScalingMethod::HepaticFlow);
    let result = scale(&table, &request).unwrap();
    assert_relative_eq!(result.dose_mg, 1.5, epsilon = 1e-9);
}

#[test]
fn test_custom_table_rejects_invalid_species() {
    let bad = CUSTOM_TABLE.replacen("\"brainWeightG\": 0.01", "\"brainWeightG\": 0.0", 1);
    assert!(matches!(
        SpeciesTable::from_json(&bad),
        Err(DomainError::InvalidPhysiologicalParameter { .. })
    ));
    assert!(matches!(
        SpeciesTable::from_json("{ not json"),
        Err(DomainError::SpeciesTable(_))
    ));
}

#[test]
fn test_builtin_table_round_trips_through_json() {
    let table = SpeciesTable::default();
    let json = table.to_json().unwrap();
    assert_eq!(SpeciesTable::from_json(&json).unwrap(), table);
}
