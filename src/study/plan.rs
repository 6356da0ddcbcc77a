//! Study plan: design metadata and an arm collection with unique names

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{DomainError, Result};
use crate::scaling::ScalingResult;
use crate::species::SpeciesTable;

use super::calc::compute_requirements;
use super::types::{
    ArmType, ComparatorDetails, DoseUnit, Formulation, StudyArm, StudyOptions, StudyRequirements,
};

/// Species used for newly added arms
const DEFAULT_ARM_SPECIES: &str = "mouse";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudyType {
    #[default]
    Preclinical,
    Phase1,
    Phase2,
    Phase3,
}

impl fmt::Display for StudyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StudyType::Preclinical => "Preclinical",
            StudyType::Phase1 => "Clinical Phase I",
            StudyType::Phase2 => "Clinical Phase II",
            StudyType::Phase3 => "Clinical Phase III",
        };
        write!(f, "{s}")
    }
}

/// Route of administration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminRoute {
    #[default]
    Oral,
    Iv,
    Ip,
    Sc,
    Im,
    Other,
}

impl fmt::Display for AdminRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AdminRoute::Oral => "Oral",
            AdminRoute::Iv => "Intravenous",
            AdminRoute::Ip => "Intraperitoneal",
            AdminRoute::Sc => "Subcutaneous",
            AdminRoute::Im => "Intramuscular",
            AdminRoute::Other => "Other",
        };
        write!(f, "{s}")
    }
}

/// Descriptive study metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyDesign {
    pub study_type: StudyType,
    pub route: AdminRoute,
    /// Days of formulation stability to budget for
    pub stability_buffer_days: u32,
}

impl Default for StudyDesign {
    fn default() -> Self {
        Self {
            study_type: StudyType::Preclinical,
            route: AdminRoute::Oral,
            stability_buffer_days: 7,
        }
    }
}

/// A study: design, formulation and arms
///
/// Arm names are unique. At least one arm is always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyPlan {
    pub design: StudyDesign,
    pub formulation: Formulation,
    pub options: StudyOptions,
    arms: Vec<StudyArm>,
}

impl StudyPlan {
    /// Create a plan with a single arm
    pub fn new(first_arm: StudyArm) -> Self {
        Self {
            design: StudyDesign::default(),
            formulation: Formulation::default(),
            options: StudyOptions::default(),
            arms: vec![first_arm],
        }
    }

    /// Create a plan with the default "Dose Group 1" arm on the default species
    pub fn with_default_arm(table: &SpeciesTable) -> Result<Self> {
        let weight = table.get(DEFAULT_ARM_SPECIES)?.weight_kg;
        Ok(Self::new(StudyArm::new("Dose Group 1", DEFAULT_ARM_SPECIES, weight)))
    }

    pub fn with_design(mut self, design: StudyDesign) -> Self {
        self.design = design;
        self
    }

    pub fn with_formulation(mut self, formulation: Formulation) -> Self {
        self.formulation = formulation;
        self
    }

    pub fn with_options(mut self, options: StudyOptions) -> Self {
        self.options = options;
        self
    }

    pub fn arms(&self) -> &[StudyArm] {
        &self.arms
    }

    pub fn arm(&self, name: &str) -> Result<&StudyArm> {
        self.arms
            .iter()
            .find(|a| a.name == name)
            .ok_or_else(|| DomainError::UnknownArm(name.to_string()))
    }

    fn arm_mut(&mut self, name: &str) -> Result<&mut StudyArm> {
        self.arms
            .iter_mut()
            .find(|a| a.name == name)
            .ok_or_else(|| DomainError::UnknownArm(name.to_string()))
    }

    /// Add an arm, rejecting duplicate names
    pub fn add_arm(&mut self, mut arm: StudyArm) -> Result<()> {
        if self.arms.iter().any(|a| a.name == arm.name) {
            return Err(DomainError::DuplicateArm(arm.name));
        }
        // Re-apply so a placebo built by hand still carries a zero dose
        let arm_type = arm.arm_type.clone();
        arm.set_arm_type(arm_type);
        self.arms.push(arm);
        Ok(())
    }

    /// Add an arm of `arm_type` with a generated name and the default regimen
    ///
    /// Placebo arms start at a zero dose.
    pub fn add_default_arm(
        &mut self,
        table: &SpeciesTable,
        arm_type: ArmType,
    ) -> Result<&StudyArm> {
        let weight = table.get(DEFAULT_ARM_SPECIES)?.weight_kg;
        let name = self.generate_name(&arm_type);
        let arm = StudyArm::new(name, DEFAULT_ARM_SPECIES, weight).with_arm_type(arm_type);
        self.arms.push(arm);
        Ok(&self.arms[self.arms.len() - 1])
    }

    /// Add a treatment arm dosed with a scaled dose, in mg, on the target species
    pub fn add_arm_from_scaling(
        &mut self,
        table: &SpeciesTable,
        target_species: &str,
        result: &ScalingResult,
    ) -> Result<&StudyArm> {
        let species = table.get(target_species)?;
        let mut name = format!("{} Dose", species.name);
        let mut n = 2;
        while self.arms.iter().any(|a| a.name == name) {
            name = format!("{} Dose {n}", species.name);
            n += 1;
        }
        let arm = StudyArm::new(name, target_species, result.target_weight_kg)
            .with_dose(result.dose_mg, DoseUnit::Mg);
        self.arms.push(arm);
        Ok(&self.arms[self.arms.len() - 1])
    }

    /// Overwrite an existing arm's species, weight and dose with a scaled dose
    ///
    /// Placebo arms are refused with [`DomainError::InvalidInput`].
    pub fn apply_scaling(
        &mut self,
        name: &str,
        target_species: &str,
        result: &ScalingResult,
    ) -> Result<()> {
        let arm = self.arm_mut(name)?;
        if arm.arm_type.is_placebo() {
            return Err(DomainError::invalid_input(
                "arm_type",
                format!("placebo arm '{name}' cannot take a scaled dose"),
            ));
        }
        arm.species = target_species.to_string();
        arm.weight_kg = result.target_weight_kg;
        arm.dose_level = result.dose_mg;
        arm.dose_unit = DoseUnit::Mg;
        Ok(())
    }

    /// Remove an arm; the last remaining arm cannot be removed
    pub fn remove_arm(&mut self, name: &str) -> Result<StudyArm> {
        let index = self
            .arms
            .iter()
            .position(|a| a.name == name)
            .ok_or_else(|| DomainError::UnknownArm(name.to_string()))?;
        if self.arms.len() == 1 {
            return Err(DomainError::invalid_input("arms", "a study needs at least one arm"));
        }
        Ok(self.arms.remove(index))
    }

    pub fn rename_arm(&mut self, name: &str, new_name: &str) -> Result<()> {
        if name != new_name && self.arms.iter().any(|a| a.name == new_name) {
            return Err(DomainError::DuplicateArm(new_name.to_string()));
        }
        self.arm_mut(name)?.name = new_name.to_string();
        Ok(())
    }

    /// Change an arm's type
    ///
    /// Switching to placebo zeroes the dose. Switching to comparator keeps the
    /// arm's existing comparator details when the new type carries defaults.
    pub fn set_arm_type(&mut self, name: &str, arm_type: ArmType) -> Result<()> {
        let arm = self.arm_mut(name)?;
        let arm_type = match (&arm.arm_type, arm_type) {
            (ArmType::Comparator(existing), ArmType::Comparator(new))
                if new == ComparatorDetails::default() =>
            {
                ArmType::Comparator(existing.clone())
            }
            (_, other) => other,
        };
        arm.set_arm_type(arm_type);
        Ok(())
    }

    /// Change an arm's species and reset its weight to the species default
    pub fn set_species(&mut self, table: &SpeciesTable, name: &str, species: &str) -> Result<()> {
        let weight = table.get(species)?.weight_kg;
        let arm = self.arm_mut(name)?;
        arm.species = species.to_string();
        arm.weight_kg = weight;
        Ok(())
    }

    /// Replace an arm wholesale, keeping names unique and placebo doses at zero
    pub fn update_arm(&mut self, name: &str, mut arm: StudyArm) -> Result<()> {
        if arm.name != name && self.arms.iter().any(|a| a.name == arm.name) {
            return Err(DomainError::DuplicateArm(arm.name));
        }
        let arm_type = arm.arm_type.clone();
        arm.set_arm_type(arm_type);
        *self.arm_mut(name)? = arm;
        Ok(())
    }

    /// Recompute every requirement from the current arms and formulation
    pub fn requirements(&self) -> Result<StudyRequirements> {
        compute_requirements(&self.arms, &self.formulation, &self.options)
    }

    pub fn count_by_type(&self) -> (usize, usize, usize) {
        self.arms.iter().fold((0, 0, 0), |(t, p, c), arm| match arm.arm_type {
            ArmType::Treatment => (t + 1, p, c),
            ArmType::Placebo => (t, p + 1, c),
            ArmType::Comparator(_) => (t, p, c + 1),
        })
    }

    fn generate_name(&self, arm_type: &ArmType) -> String {
        let prefix = match arm_type {
            ArmType::Treatment => "Dose Group",
            ArmType::Placebo => "Placebo",
            ArmType::Comparator(_) => "Comparator",
        };
        let same_type = self
            .arms
            .iter()
            .filter(|a| a.arm_type.label() == arm_type.label())
            .count();
        let mut n = same_type + 1;
        loop {
            let name = format!("{prefix} {n}");
            if !self.arms.iter().any(|a| a.name == name) {
                return name;
            }
            n += 1;
        }
    }
}
