//! Study types: arms, units, schedules, formulation and requirement results

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{DomainError, Result};

// ============================================================================
// Units
// ============================================================================

/// Unit of an arm's dose level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DoseUnit {
    #[serde(rename = "mg")]
    Mg,
    #[default]
    #[serde(rename = "mg/kg")]
    MgPerKg,
    #[serde(rename = "mcg")]
    Mcg,
    #[serde(rename = "mcg/kg")]
    McgPerKg,
}

impl DoseUnit {
    /// Convert a dose level to mg per subject
    pub fn to_mg(&self, dose_level: f64, weight_kg: f64) -> f64 {
        match self {
            DoseUnit::Mg => dose_level,
            DoseUnit::MgPerKg => dose_level * weight_kg,
            DoseUnit::Mcg => dose_level / 1000.0,
            DoseUnit::McgPerKg => dose_level * weight_kg / 1000.0,
        }
    }
}

impl fmt::Display for DoseUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DoseUnit::Mg => "mg",
            DoseUnit::MgPerKg => "mg/kg",
            DoseUnit::Mcg => "mcg",
            DoseUnit::McgPerKg => "mcg/kg",
        };
        write!(f, "{s}")
    }
}

/// Average Gregorian month length in days, used for every month conversion
pub const DAYS_PER_MONTH: f64 = 30.44;

/// Unit of a duration or custom dosing period
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    #[default]
    Days,
    Weeks,
    Months,
}

impl DurationUnit {
    pub fn days(&self) -> f64 {
        match self {
            DurationUnit::Days => 1.0,
            DurationUnit::Weeks => 7.0,
            DurationUnit::Months => DAYS_PER_MONTH,
        }
    }
}

impl fmt::Display for DurationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DurationUnit::Days => "days",
            DurationUnit::Weeks => "weeks",
            DurationUnit::Months => "months",
        };
        write!(f, "{s}")
    }
}

/// Unit of a stock or comparator concentration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConcentrationUnit {
    #[default]
    #[serde(rename = "mg/mL")]
    MgPerMl,
    #[serde(rename = "mcg/mL")]
    McgPerMl,
    /// Percent weight per volume (g/100 mL)
    #[serde(rename = "%w/v")]
    PercentWv,
    #[serde(rename = "g/mL")]
    GPerMl,
    #[serde(rename = "mg/g")]
    MgPerG,
}

impl ConcentrationUnit {
    /// Convert a concentration to mg/mL
    ///
    /// `density` (g/mL) only applies to %w/v. mg/g passes through unchanged.
    pub fn to_mg_per_ml(&self, value: f64, density: f64) -> f64 {
        match self {
            ConcentrationUnit::MgPerMl | ConcentrationUnit::MgPerG => value,
            ConcentrationUnit::McgPerMl => value / 1000.0,
            ConcentrationUnit::PercentWv => value * 10.0 * density,
            ConcentrationUnit::GPerMl => value * 1000.0,
        }
    }
}

impl fmt::Display for ConcentrationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConcentrationUnit::MgPerMl => "mg/mL",
            ConcentrationUnit::McgPerMl => "mcg/mL",
            ConcentrationUnit::PercentWv => "% w/v",
            ConcentrationUnit::GPerMl => "g/mL",
            ConcentrationUnit::MgPerG => "mg/g",
        };
        write!(f, "{s}")
    }
}

// ============================================================================
// Schedule
// ============================================================================

/// Dosing frequency
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Frequency {
    /// Once daily
    #[default]
    Once,
    /// Twice daily
    Twice,
    /// Three times daily
    Thrice,
    Weekly,
    /// Every two weeks
    Biweekly,
    Monthly,
    /// `doses_per_period` doses every `period_value` `period_unit`
    #[serde(rename_all = "camelCase")]
    Custom {
        doses_per_period: f64,
        period_value: f64,
        period_unit: DurationUnit,
    },
}

impl Frequency {
    /// Number of doses per day
    pub fn doses_per_day(&self) -> Result<f64> {
        Ok(match self {
            Frequency::Once => 1.0,
            Frequency::Twice => 2.0,
            Frequency::Thrice => 3.0,
            Frequency::Weekly => 1.0 / 7.0,
            Frequency::Biweekly => 1.0 / 14.0,
            Frequency::Monthly => 1.0 / DAYS_PER_MONTH,
            Frequency::Custom {
                doses_per_period,
                period_value,
                period_unit,
            } => {
                if !(doses_per_period.is_finite() && *doses_per_period >= 0.0) {
                    return Err(DomainError::invalid_input(
                        "doses_per_period",
                        format!("{doses_per_period} (must be >= 0)"),
                    ));
                }
                let period_days = period_value * period_unit.days();
                if !(period_days.is_finite() && period_days > 0.0) {
                    return Err(DomainError::invalid_input(
                        "period_value",
                        format!("{period_value} {period_unit} (must be > 0)"),
                    ));
                }
                doses_per_period / period_days
            }
        })
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::Once => write!(f, "once daily"),
            Frequency::Twice => write!(f, "twice daily"),
            Frequency::Thrice => write!(f, "three times daily"),
            Frequency::Weekly => write!(f, "weekly"),
            Frequency::Biweekly => write!(f, "bi-weekly"),
            Frequency::Monthly => write!(f, "monthly"),
            Frequency::Custom {
                doses_per_period,
                period_value,
                period_unit,
            } => write!(f, "{doses_per_period} doses every {period_value} {period_unit}"),
        }
    }
}

// ============================================================================
// Arms
// ============================================================================

/// Comparator product administered in a comparator arm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparatorDetails {
    pub name: String,
    pub concentration: f64,
    pub concentration_unit: ConcentrationUnit,
}

impl Default for ComparatorDetails {
    fn default() -> Self {
        Self {
            name: "Standard Comparator".to_string(),
            concentration: 10.0,
            concentration_unit: ConcentrationUnit::MgPerMl,
        }
    }
}

/// Role of an arm in the study
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ArmType {
    #[default]
    Treatment,
    Placebo,
    Comparator(ComparatorDetails),
}

impl ArmType {
    pub fn label(&self) -> &'static str {
        match self {
            ArmType::Treatment => "Treatment",
            ArmType::Placebo => "Placebo",
            ArmType::Comparator(_) => "Comparator",
        }
    }

    pub fn is_treatment(&self) -> bool {
        matches!(self, ArmType::Treatment)
    }

    pub fn is_placebo(&self) -> bool {
        matches!(self, ArmType::Placebo)
    }

    pub fn comparator(&self) -> Option<&ComparatorDetails> {
        match self {
            ArmType::Comparator(details) => Some(details),
            _ => None,
        }
    }
}

impl fmt::Display for ArmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One group of subjects receiving the same regimen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyArm {
    /// Unique within a study
    pub name: String,
    /// Species key
    pub species: String,
    pub subject_count: u32,
    pub weight_kg: f64,
    pub arm_type: ArmType,
    pub dose_level: f64,
    pub dose_unit: DoseUnit,
    pub duration_value: f64,
    pub duration_unit: DurationUnit,
    pub frequency: Frequency,
}

impl StudyArm {
    /// Treatment arm with the default regimen: 10 subjects, 10 mg/kg once daily for 14 days
    pub fn new(name: impl Into<String>, species: impl Into<String>, weight_kg: f64) -> Self {
        Self {
            name: name.into(),
            species: species.into(),
            subject_count: 10,
            weight_kg,
            arm_type: ArmType::Treatment,
            dose_level: 10.0,
            dose_unit: DoseUnit::MgPerKg,
            duration_value: 14.0,
            duration_unit: DurationUnit::Days,
            frequency: Frequency::Once,
        }
    }

    pub fn with_subjects(mut self, subject_count: u32) -> Self {
        self.subject_count = subject_count;
        self
    }

    /// Set the arm type; a placebo arm always carries a zero dose
    pub fn with_arm_type(mut self, arm_type: ArmType) -> Self {
        self.set_arm_type(arm_type);
        self
    }

    /// Placebo arms keep a zero dose level
    pub fn with_dose(mut self, dose_level: f64, dose_unit: DoseUnit) -> Self {
        self.dose_level = if self.arm_type.is_placebo() {
            0.0
        } else {
            dose_level
        };
        self.dose_unit = dose_unit;
        self
    }

    pub fn with_duration(mut self, duration_value: f64, duration_unit: DurationUnit) -> Self {
        self.duration_value = duration_value;
        self.duration_unit = duration_unit;
        self
    }

    pub fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = frequency;
        self
    }

    /// Change the arm type, zeroing the dose on a transition to placebo
    pub fn set_arm_type(&mut self, arm_type: ArmType) {
        if arm_type.is_placebo() {
            self.dose_level = 0.0;
        }
        self.arm_type = arm_type;
    }

    /// Dose per administration in mg
    pub fn dose_per_subject_mg(&self) -> f64 {
        self.dose_unit.to_mg(self.dose_level, self.weight_kg)
    }

    /// Study duration in days
    pub fn total_days(&self) -> f64 {
        self.duration_value * self.duration_unit.days()
    }
}

// ============================================================================
// Formulation and options
// ============================================================================

/// Diluent for a serial dilution step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vehicle {
    #[default]
    Saline,
    Water,
    Pbs,
    Custom(String),
}

impl fmt::Display for Vehicle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Vehicle::Saline => write!(f, "saline"),
            Vehicle::Water => write!(f, "water"),
            Vehicle::Pbs => write!(f, "PBS"),
            Vehicle::Custom(name) => write!(f, "{name}"),
        }
    }
}

/// One configured step of a serial dilution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DilutionStep {
    /// Dilution factor, within `[1, max_dilution_factor]`
    pub factor: f64,
    pub vehicle: Vehicle,
}

impl DilutionStep {
    pub fn new(factor: f64, vehicle: Vehicle) -> Self {
        Self { factor, vehicle }
    }
}

/// Stock formulation shared by every treatment arm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Formulation {
    pub stock_concentration: f64,
    pub stock_unit: ConcentrationUnit,
    /// Serial dilutions, applied in order
    pub dilutions: Vec<DilutionStep>,
    /// Extra material prepared beyond the computed requirement, in percent
    pub overage_pct: f64,
}

impl Default for Formulation {
    fn default() -> Self {
        Self {
            stock_concentration: 10.0,
            stock_unit: ConcentrationUnit::MgPerMl,
            dilutions: Vec::new(),
            overage_pct: 15.0,
        }
    }
}

impl Formulation {
    pub fn new(stock_concentration: f64, stock_unit: ConcentrationUnit) -> Self {
        Self {
            stock_concentration,
            stock_unit,
            ..Default::default()
        }
    }

    pub fn with_overage(mut self, overage_pct: f64) -> Self {
        self.overage_pct = overage_pct;
        self
    }

    pub fn with_dilution(mut self, step: DilutionStep) -> Self {
        self.dilutions.push(step);
        self
    }

    pub fn overage_multiplier(&self) -> f64 {
        1.0 + self.overage_pct / 100.0
    }
}

/// Largest accepted dilution factor by default
pub const MAX_DILUTION_FACTOR: f64 = 1000.0;

/// Study calculation options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyOptions {
    /// Upper bound for each dilution factor (default: 1000)
    pub max_dilution_factor: f64,
    /// Density (g/mL) used to convert %w/v to mg/mL (default: 1.0)
    pub density_factor: f64,
    /// Totals at or above this many mg are reported in grams (default: 1000)
    pub gram_threshold_mg: f64,
}

impl Default for StudyOptions {
    fn default() -> Self {
        Self {
            max_dilution_factor: MAX_DILUTION_FACTOR,
            density_factor: 1.0,
            gram_threshold_mg: 1000.0,
        }
    }
}

impl StudyOptions {
    pub fn with_max_dilution_factor(mut self, max: f64) -> Self {
        self.max_dilution_factor = max;
        self
    }

    pub fn with_density_factor(mut self, density: f64) -> Self {
        self.density_factor = density;
        self
    }

    pub fn with_gram_threshold(mut self, threshold_mg: f64) -> Self {
        self.gram_threshold_mg = threshold_mg;
        self
    }
}

// ============================================================================
// Results
// ============================================================================

/// Result of one simulated dilution step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DilutionResult {
    pub start_volume_ml: f64,
    pub added_volume_ml: f64,
    pub vehicle: Vehicle,
    pub final_volume_ml: f64,
    pub final_concentration_mg_per_ml: f64,
}

/// Material requirement derived from one arm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmRequirement {
    pub name: String,
    pub arm_type: ArmType,
    pub subjects: u32,
    /// Dose per administration (mg), `None` for placebo
    pub dose_per_subject_mg: Option<f64>,
    /// Doses across all subjects and the whole duration
    pub total_doses: u64,
    /// Active compound including overage (mg); zero for placebo
    pub product_required_mg: f64,
    /// Volume per administration (mL), `None` for placebo
    pub admin_volume_ml: Option<f64>,
    pub dilution_steps: Vec<DilutionResult>,
}

/// Mass unit for reported totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MassUnit {
    #[serde(rename = "mg")]
    Mg,
    #[serde(rename = "g")]
    G,
}

impl fmt::Display for MassUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MassUnit::Mg => write!(f, "mg"),
            MassUnit::G => write!(f, "g"),
        }
    }
}

/// A mass with its display unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    pub value: f64,
    pub unit: MassUnit,
}

impl Quantity {
    /// Express `mg` in grams when it reaches `threshold_mg`
    pub fn from_mg(mg: f64, threshold_mg: f64) -> Self {
        if mg >= threshold_mg {
            Self {
                value: mg / 1000.0,
                unit: MassUnit::G,
            }
        } else {
            Self {
                value: mg,
                unit: MassUnit::Mg,
            }
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3} {}", self.value, self.unit)
    }
}

/// Requirements for a whole study
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyRequirements {
    pub arms: Vec<ArmRequirement>,
    /// Active compound for treatment arms only (mg)
    pub total_product_required_mg: f64,
    /// `total_product_required_mg`, in grams when large
    pub total_product: Quantity,
    /// Comparator product, tracked apart from the study compound (mg)
    pub comparator_required_mg: f64,
    /// Doses across every arm, placebo included
    pub total_doses: u64,
}
