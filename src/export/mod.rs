//! Plain-text reports
//!
//! [`DoseReport`] renders a single scaling calculation and [`StudyPlanReport`]
//! renders a study plan with its material requirements. Both implement
//! [`std::fmt::Display`]; the generation timestamp is supplied by the caller so
//! output is reproducible.

use chrono::{DateTime, Utc};
use std::fmt;

use crate::error::Result;
use crate::scaling::{ScalingRequest, ScalingResult};
use crate::study::{
    validate_dilution_factor, ArmType, Quantity, StudyPlan, StudyRequirements,
    MAX_DILUTION_FACTOR,
};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";
const FILE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%S";

/// Numbered calculation summary for a scaling result
///
/// Method description, weight-ratio line, then every derivation step. When a
/// dilution factor other than 1 is given a final dilution line is appended.
pub fn calculation_summary(result: &ScalingResult, dilution_factor: Option<f64>) -> Vec<String> {
    let mut lines = vec![
        result.method_description.clone(),
        format!(
            "Weight ratio = {:.3} kg / {:.3} kg = {:.4}",
            result.target_weight_kg, result.source_weight_kg, result.weight_ratio
        ),
    ];
    lines.extend(result.derivation_steps());
    if let Some(factor) = dilution_factor.filter(|f| *f != 1.0) {
        lines.push(format!(
            "Dilution adjustment: {:.4} mg × {} = {:.4} mg",
            result.dose_mg,
            factor,
            result.dose_mg * factor
        ));
    }
    lines
        .into_iter()
        .enumerate()
        .map(|(i, line)| format!("{}. {line}", i + 1))
        .collect()
}

// ============================================================================
// Dose report
// ============================================================================

/// Report for one scaling calculation
#[derive(Debug, Clone)]
pub struct DoseReport<'a> {
    request: &'a ScalingRequest,
    result: &'a ScalingResult,
    dilution_factor: Option<f64>,
    generated_at: DateTime<Utc>,
}

impl<'a> DoseReport<'a> {
    pub fn new(
        request: &'a ScalingRequest,
        result: &'a ScalingResult,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            request,
            result,
            dilution_factor: None,
            generated_at,
        }
    }

    /// Show a dilution factor and the diluted dose
    ///
    /// # Errors
    ///
    /// [`crate::DomainError::InvalidDilutionFactor`] outside `[1, 1000]`.
    pub fn with_dilution(mut self, factor: f64) -> Result<Self> {
        self.dilution_factor = Some(validate_dilution_factor(factor, MAX_DILUTION_FACTOR)?);
        Ok(self)
    }

    /// Dose after dilution, when a dilution factor other than 1 is shown
    pub fn diluted_dose_mg(&self) -> Option<f64> {
        self.dilution_factor
            .filter(|f| *f != 1.0)
            .map(|f| self.result.dose_mg * f)
    }

    pub fn file_name(&self) -> String {
        format!(
            "dosefinder-calculation-{}.txt",
            self.generated_at.format(FILE_TIMESTAMP_FORMAT)
        )
    }
}

impl fmt::Display for DoseReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.result;
        writeln!(f, "DoseFinder Calculation Report")?;
        writeln!(f, "Generated: {}", self.generated_at.format(TIMESTAMP_FORMAT))?;
        writeln!(f)?;
        writeln!(f, "Parameters:")?;
        writeln!(f, "-----------")?;
        writeln!(
            f,
            "Source Animal: {} ({} kg)",
            self.request.source_species, r.source_weight_kg
        )?;
        writeln!(
            f,
            "Target Animal: {} ({} kg)",
            self.request.target_species, r.target_weight_kg
        )?;
        writeln!(f, "Base Dose: {} mg", r.base_dose_mg)?;
        writeln!(f, "Scaling Method: {}", r.method)?;
        if let Some(factor) = self.dilution_factor {
            writeln!(f, "Dilution Factor: {factor}")?;
        }
        writeln!(f)?;
        writeln!(f, "Calculation Steps:")?;
        writeln!(f, "------------------")?;
        for line in calculation_summary(r, self.dilution_factor) {
            writeln!(f, "{line}")?;
        }
        writeln!(f)?;
        writeln!(f, "Results:")?;
        writeln!(f, "--------")?;
        writeln!(f, "Base Calculated Dose: {:.4} mg", r.dose_mg)?;
        if let Some(diluted) = self.diluted_dose_mg() {
            writeln!(f, "Final Dose with Dilution: {diluted:.4} mg")?;
        }
        Ok(())
    }
}

// ============================================================================
// Study plan report
// ============================================================================

/// Report for a study plan and its computed requirements
#[derive(Debug, Clone)]
pub struct StudyPlanReport<'a> {
    plan: &'a StudyPlan,
    requirements: StudyRequirements,
    generated_at: DateTime<Utc>,
}

impl<'a> StudyPlanReport<'a> {
    /// Compute the plan's requirements and prepare the report
    pub fn new(plan: &'a StudyPlan, generated_at: DateTime<Utc>) -> Result<Self> {
        Ok(Self {
            plan,
            requirements: plan.requirements()?,
            generated_at,
        })
    }

    pub fn requirements(&self) -> &StudyRequirements {
        &self.requirements
    }

    pub fn file_name(&self) -> String {
        format!(
            "dosefinder-study-plan-{}.txt",
            self.generated_at.format(FILE_TIMESTAMP_FORMAT)
        )
    }
}

impl fmt::Display for StudyPlanReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plan = self.plan;
        let formulation = &plan.formulation;
        let threshold = plan.options.gram_threshold_mg;

        writeln!(f, "DoseFinder Study Planner Report")?;
        writeln!(f, "Generated: {}", self.generated_at.format(TIMESTAMP_FORMAT))?;
        writeln!(f)?;
        writeln!(f, "Study Design:")?;
        writeln!(f, "-------------")?;
        writeln!(f, "Study Type: {}", plan.design.study_type)?;
        writeln!(f, "Number of Arms: {}", plan.arms().len())?;
        writeln!(f, "Overage Factor: {}%", formulation.overage_pct)?;
        writeln!(f, "Stability Buffer: {} days", plan.design.stability_buffer_days)?;
        writeln!(f)?;
        writeln!(f, "Formulation:")?;
        writeln!(f, "------------")?;
        writeln!(
            f,
            "Stock Concentration: {} {}",
            formulation.stock_concentration, formulation.stock_unit
        )?;
        writeln!(f, "Administration Route: {}", plan.design.route)?;
        if !formulation.dilutions.is_empty() {
            writeln!(f, "Dilution Steps: {}", formulation.dilutions.len())?;
        }
        writeln!(f)?;
        writeln!(f, "Arm Requirements:")?;
        writeln!(f, "-----------------")?;

        for req in &self.requirements.arms {
            writeln!(f)?;
            writeln!(f, "Arm: {} ({})", req.name, req.arm_type)?;
            writeln!(f, "Subjects: {}", req.subjects)?;
            match (&req.arm_type, req.dose_per_subject_mg, req.admin_volume_ml) {
                (ArmType::Treatment, Some(dose), Some(volume)) => {
                    writeln!(f, "Dose per Subject: {dose:.3} mg")?;
                    writeln!(f, "Total Doses: {}", req.total_doses)?;
                    writeln!(
                        f,
                        "Product Required: {}",
                        Quantity::from_mg(req.product_required_mg, threshold)
                    )?;
                    writeln!(f, "Administration Volume: {volume:.2} mL")?;
                    if !req.dilution_steps.is_empty() {
                        writeln!(f, "Dilution Steps:")?;
                        for (i, step) in req.dilution_steps.iter().enumerate() {
                            writeln!(
                                f,
                                "  {}. Start with {:.2} mL, add {:.2} mL of {}",
                                i + 1,
                                step.start_volume_ml,
                                step.added_volume_ml,
                                step.vehicle
                            )?;
                            writeln!(
                                f,
                                "     Final concentration: {:.3} mg/mL",
                                step.final_concentration_mg_per_ml
                            )?;
                        }
                    }
                }
                (ArmType::Comparator(details), Some(dose), Some(volume)) => {
                    writeln!(f, "Dose per Subject: {dose:.3} mg")?;
                    writeln!(f, "Total Doses: {}", req.total_doses)?;
                    writeln!(
                        f,
                        "Product: {} ({} {})",
                        details.name, details.concentration, details.concentration_unit
                    )?;
                    writeln!(f, "Administration Volume: {volume:.2} mL")?;
                }
                _ => {
                    writeln!(f, "Dose per Subject: N/A (Placebo)")?;
                    writeln!(f, "Total Doses: {}", req.total_doses)?;
                    writeln!(f, "Product Required: N/A (Placebo)")?;
                }
            }
        }

        let (treatment, placebo, comparator) = plan.count_by_type();
        writeln!(f)?;
        writeln!(f, "Summary:")?;
        writeln!(f, "--------")?;
        writeln!(f, "Total Doses to Prepare: {}", self.requirements.total_doses)?;
        writeln!(
            f,
            "Total Active Compound Required: {}",
            self.requirements.total_product
        )?;
        writeln!(f, "Treatment Arms: {treatment}")?;
        writeln!(f, "Placebo Arms: {placebo}")?;
        writeln!(f, "Comparator Arms: {comparator}")?;
        Ok(())
    }
}
