//! Scaling types: requests, PK adjustments, derivation steps and results

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::DomainError;
use crate::renal::Sex;

// ============================================================================
// Method
// ============================================================================

/// Interspecies scaling method
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScalingMethod {
    /// Body-weight power law, `dose * ratio^b`
    #[default]
    Allometric,
    /// Exponent derived from the brain-weight ratio (2/3 power)
    BrainWeight,
    /// Exponent derived from the maximum life-span ratio
    LifeSpan,
    /// Exponent derived from hepatic flow times extraction
    HepaticFlow,
    /// Direct body-surface-area ratio, no weight exponent
    Bsa,
}

impl ScalingMethod {
    pub const ALL: [ScalingMethod; 5] = [
        ScalingMethod::Allometric,
        ScalingMethod::BrainWeight,
        ScalingMethod::LifeSpan,
        ScalingMethod::HepaticFlow,
        ScalingMethod::Bsa,
    ];

    /// Methods whose exponent is `ln(ratio) / ln(weight ratio)`
    pub fn is_log_ratio(&self) -> bool {
        matches!(
            self,
            ScalingMethod::BrainWeight | ScalingMethod::LifeSpan | ScalingMethod::HepaticFlow
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScalingMethod::Allometric => "allometric",
            ScalingMethod::BrainWeight => "brainWeight",
            ScalingMethod::LifeSpan => "lifeSpan",
            ScalingMethod::HepaticFlow => "hepaticFlow",
            ScalingMethod::Bsa => "bsa",
        }
    }
}

impl fmt::Display for ScalingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ScalingMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-' && *c != ' ')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "allometric" => Ok(ScalingMethod::Allometric),
            "brainweight" => Ok(ScalingMethod::BrainWeight),
            "lifespan" => Ok(ScalingMethod::LifeSpan),
            "hepaticflow" => Ok(ScalingMethod::HepaticFlow),
            "bsa" | "bodysurfacearea" => Ok(ScalingMethod::Bsa),
            _ => Err(DomainError::InvalidMethod(s.to_string())),
        }
    }
}

// ============================================================================
// PK adjustments
// ============================================================================

/// Bioavailability assumption for the administered dose
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Bioavailability {
    /// Explicit percentage in (0, 100]
    Manual(f64),
    /// Intravenous, 100%
    #[default]
    Iv,
    /// Oral, 50%
    Oral,
    /// Other extravascular routes, 75%
    Other,
}

impl Bioavailability {
    /// Effective bioavailability in percent
    pub fn percent(&self) -> f64 {
        match self {
            Bioavailability::Manual(pct) => *pct,
            Bioavailability::Iv => 100.0,
            Bioavailability::Oral => 50.0,
            Bioavailability::Other => 75.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Bioavailability::Manual(_) => "manual",
            Bioavailability::Iv => "IV",
            Bioavailability::Oral => "oral",
            Bioavailability::Other => "other",
        }
    }
}

/// Renal function adjustment
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KidneyFunction {
    /// No adjustment
    #[default]
    None,
    /// Remaining kidney function in percent, [0, 100]
    Manual(f64),
    /// Estimate eGFR from patient data and map it to a dose fraction
    #[serde(rename_all = "camelCase")]
    CockcroftGault {
        age_years: f64,
        serum_creatinine: f64,
        sex: Sex,
    },
}

/// Secondary pharmacokinetic adjustments, applied after base scaling
///
/// Zero values disable the corresponding step.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PkAdjustments {
    /// Plasma protein binding in percent, [0, 100]
    pub protein_binding_pct: f64,
    /// Bioavailability mode (default: IV, no adjustment)
    pub bioavailability: Bioavailability,
    /// Kidney function mode (default: none)
    pub kidney_function: KidneyFunction,
    /// Volume of distribution (L/kg), 0 to skip
    pub volume_of_distribution: f64,
    /// Molecular weight (g/mol), 0 to use the request's allometric exponent
    pub molecular_weight: f64,
    /// Lipophilicity (LogP), 0 to skip
    pub log_p: f64,
}

impl PkAdjustments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_protein_binding(mut self, pct: f64) -> Self {
        self.protein_binding_pct = pct;
        self
    }

    pub fn with_bioavailability(mut self, bioavailability: Bioavailability) -> Self {
        self.bioavailability = bioavailability;
        self
    }

    pub fn with_kidney_function(mut self, kidney_function: KidneyFunction) -> Self {
        self.kidney_function = kidney_function;
        self
    }

    pub fn with_volume_of_distribution(mut self, vd: f64) -> Self {
        self.volume_of_distribution = vd;
        self
    }

    pub fn with_molecular_weight(mut self, mw: f64) -> Self {
        self.molecular_weight = mw;
        self
    }

    pub fn with_log_p(mut self, log_p: f64) -> Self {
        self.log_p = log_p;
        self
    }
}

// ============================================================================
// Request
// ============================================================================

/// Default allometric exponent (3/4 power law)
pub const DEFAULT_ALLOMETRIC_EXPONENT: f64 = 0.75;

/// Input to [`scale`](super::scale)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalingRequest {
    /// Species key of the known dose
    pub source_species: String,
    /// Species key to scale to
    pub target_species: String,
    /// Explicit source weight (kg), overrides the species default
    pub source_weight: Option<f64>,
    /// Explicit target weight (kg), overrides the species default
    pub target_weight: Option<f64>,
    /// Known dose in the source species (mg)
    pub base_dose_mg: f64,
    pub method: ScalingMethod,
    /// Allometric exponent, used only when no molecular weight is set
    pub scaling_exponent: f64,
    pub pk: PkAdjustments,
}

impl ScalingRequest {
    pub fn new(
        source_species: impl Into<String>,
        target_species: impl Into<String>,
        base_dose_mg: f64,
        method: ScalingMethod,
    ) -> Self {
        Self {
            source_species: source_species.into(),
            target_species: target_species.into(),
            source_weight: None,
            target_weight: None,
            base_dose_mg,
            method,
            scaling_exponent: DEFAULT_ALLOMETRIC_EXPONENT,
            pk: PkAdjustments::default(),
        }
    }

    pub fn with_source_weight(mut self, weight_kg: f64) -> Self {
        self.source_weight = Some(weight_kg);
        self
    }

    pub fn with_target_weight(mut self, weight_kg: f64) -> Self {
        self.target_weight = Some(weight_kg);
        self
    }

    pub fn with_exponent(mut self, exponent: f64) -> Self {
        self.scaling_exponent = exponent;
        self
    }

    pub fn with_pk(mut self, pk: PkAdjustments) -> Self {
        self.pk = pk;
        self
    }
}

// ============================================================================
// Derivation trace
// ============================================================================

/// Arithmetic operator applied by a derivation step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    Multiply,
    Divide,
}

impl Operator {
    /// Apply this operator to a running value
    pub fn apply(&self, value: f64, factor: f64) -> f64 {
        match self {
            Operator::Multiply => value * factor,
            Operator::Divide => value / factor,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Multiply => "×",
            Operator::Divide => "÷",
        }
    }
}

/// One multiplicative or divisive transformation of the running dose
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivationStep {
    pub label: String,
    pub params: String,
    pub operator: Operator,
    pub factor: f64,
    /// Dose after this step (mg)
    pub running_dose_mg: f64,
}

impl fmt::Display for DerivationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {} {:.4} = {:.4} mg",
            self.label,
            self.params,
            self.operator.symbol(),
            self.factor,
            self.running_dose_mg
        )
    }
}

// ============================================================================
// Result
// ============================================================================

/// Scaled dose with its derivation trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingResult {
    /// Final adjusted dose (mg)
    pub dose_mg: f64,
    /// Input dose (mg)
    pub base_dose_mg: f64,
    /// Dose after base scaling, before PK adjustments (mg)
    pub scaled_dose_mg: f64,
    pub source_weight_kg: f64,
    pub target_weight_kg: f64,
    /// `target_weight / source_weight`
    pub weight_ratio: f64,
    /// Exponent for power-law methods, multiplier for BSA and the equal-weight guard
    pub scaling_factor: f64,
    pub method: ScalingMethod,
    pub method_description: String,
    /// Transformations in application order, starting from `base_dose_mg`
    pub steps: Vec<DerivationStep>,
}

impl ScalingResult {
    /// Render the derivation trace as text lines
    pub fn derivation_steps(&self) -> Vec<String> {
        self.steps.iter().map(|s| s.to_string()).collect()
    }

    /// Re-apply every step's arithmetic to the base dose
    pub fn replay(&self) -> f64 {
        self.steps
            .iter()
            .fold(self.base_dose_mg, |dose, step| step.operator.apply(dose, step.factor))
    }
}
