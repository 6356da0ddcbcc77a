//! Dose-versus-weight curves
//!
//! [`generate_curve`] evaluates the scaling engine once per species in the
//! table (exact points) and at `num_points` target weights log-spaced between
//! the lightest and heaviest species. The result is sorted by weight and ready
//! for plotting on log-log axes.
//!
//! For the allometric method every sampled weight is evaluated directly. The
//! other methods depend on physiological constants that only exist for real
//! species, so sampled weights are interpolated in log-log space between the
//! neighbouring exact points instead.

use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::error::Result;
use crate::scaling::{scale_between, ScalingMethod, ScalingRequest};
use crate::species::{Species, SpeciesTable};

/// Number of sampled weights in the default sweep
pub const DEFAULT_CURVE_POINTS: usize = 51;

/// Curve generation options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveOptions {
    /// Number of log-spaced samples between the lightest and heaviest species
    pub num_points: usize,
}

impl Default for CurveOptions {
    fn default() -> Self {
        Self {
            num_points: DEFAULT_CURVE_POINTS,
        }
    }
}

impl CurveOptions {
    pub fn with_num_points(mut self, num_points: usize) -> Self {
        self.num_points = num_points;
        self
    }
}

/// A point on a dose-versus-weight curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub weight_kg: f64,
    pub dose_mg: f64,
    /// `true` for a species at its table weight, `false` for a sampled weight
    pub is_exact_species_point: bool,
    /// Species name for exact points, empty otherwise
    pub label: String,
}

/// Generate a dose-versus-weight curve
///
/// The request's target species and target weight are ignored; every other
/// field (source, base dose, method, exponent, PK adjustments) is honoured.
/// Weights the engine rejects are skipped rather than failing the whole curve.
///
/// # Errors
///
/// Only when the source species is not in the table.
pub fn generate_curve(
    table: &SpeciesTable,
    request: &ScalingRequest,
    options: &CurveOptions,
) -> Result<Vec<ChartPoint>> {
    let source = table.get(&request.source_species)?;
    let source_weight = request.source_weight.unwrap_or(source.weight_kg);

    let mut exact = Vec::with_capacity(table.len());
    for (key, species) in table.iter() {
        match scale_between(source, source_weight, species, species.weight_kg, request) {
            Ok(result) => exact.push(ChartPoint {
                weight_kg: species.weight_kg,
                dose_mg: result.dose_mg,
                is_exact_species_point: true,
                label: species.name.clone(),
            }),
            Err(e) => {
                tracing::debug!(species = key, error = %e, "skipping species point");
            }
        }
    }

    let samples = match table.weight_range() {
        Some((lo, hi)) => log_spaced(lo, hi, options.num_points),
        None => Vec::new(),
    };

    let mut sampled = Vec::with_capacity(samples.len());
    if request.method == ScalingMethod::Allometric {
        for weight in samples {
            let nominal = nearest_species(table, weight).unwrap_or(source);
            match scale_between(source, source_weight, nominal, weight, request) {
                Ok(result) => sampled.push(sampled_point(weight, result.dose_mg)),
                Err(e) => {
                    tracing::debug!(weight_kg = weight, error = %e, "skipping sampled weight");
                }
            }
        }
    } else {
        let mut anchors: Vec<(f64, f64)> = exact
            .iter()
            .map(|p| (p.weight_kg, p.dose_mg))
            .collect();
        anchors.sort_by(|a, b| a.0.total_cmp(&b.0));
        for weight in samples {
            match interpolate_log_log(&anchors, weight) {
                Some(dose) => sampled.push(sampled_point(weight, dose)),
                None => {
                    tracing::debug!(weight_kg = weight, "no anchors to interpolate sampled weight");
                }
            }
        }
    }

    // Stable sort keeps species points ahead of samples at the same weight
    let mut points = exact;
    points.extend(sampled);
    points.sort_by(|a, b| a.weight_kg.total_cmp(&b.weight_kg));
    Ok(points)
}

/// Write a curve as CSV with a header row
pub fn write_curve_csv<W: Write>(points: &[ChartPoint], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["weight_kg", "dose_mg", "is_exact_species_point", "label"])?;
    for point in points {
        wtr.write_record([
            point.weight_kg.to_string(),
            point.dose_mg.to_string(),
            point.is_exact_species_point.to_string(),
            point.label.clone(),
        ])?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

fn sampled_point(weight_kg: f64, dose_mg: f64) -> ChartPoint {
    ChartPoint {
        weight_kg,
        dose_mg,
        is_exact_species_point: false,
        label: String::new(),
    }
}

/// `n` weights geometrically spaced over `[lo, hi]`, both ends included
fn log_spaced(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![lo],
        _ => {
            let last = (n - 1) as f64;
            (0..n)
                .map(|i| {
                    if i == n - 1 {
                        hi
                    } else {
                        lo * (hi / lo).powf(i as f64 / last)
                    }
                })
                .collect()
        }
    }
}

fn nearest_species(table: &SpeciesTable, weight: f64) -> Option<&Species> {
    table
        .iter()
        .map(|(_, s)| s)
        .min_by(|a, b| {
            let da = (a.weight_kg.ln() - weight.ln()).abs();
            let db = (b.weight_kg.ln() - weight.ln()).abs();
            da.total_cmp(&db)
        })
}

/// Linear interpolation of ln(dose) against ln(weight)
///
/// `anchors` must be sorted by weight. Weights outside the anchor range clamp
/// to the nearest end; coincident anchor weights take the first dose.
fn interpolate_log_log(anchors: &[(f64, f64)], weight: f64) -> Option<f64> {
    let (first, last) = (anchors.first()?, anchors.last()?);
    if weight <= first.0 {
        return Some(first.1);
    }
    if weight >= last.0 {
        return Some(last.1);
    }
    let upper = anchors.iter().position(|(w, _)| *w >= weight)?;
    let (w1, d1) = anchors[upper - 1];
    let (w2, d2) = anchors[upper];
    if w2 <= w1 {
        return Some(d1);
    }
    if d1 <= 0.0 || d2 <= 0.0 {
        // Log space is undefined for a zero dose, fall back to linear
        let t = (weight - w1) / (w2 - w1);
        return Some(d1 + t * (d2 - d1));
    }
    let t = (weight.ln() - w1.ln()) / (w2.ln() - w1.ln());
    Some((d1.ln() + t * (d2.ln() - d1.ln())).exp())
}
