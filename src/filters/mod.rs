//! Multi-scale medialness responses
//!
//! Both filters walk a radius set, turn each radius' tensor field into
//! eigenvalues and a scalar feature, and keep the per-voxel feature of
//! largest magnitude:
//! - `bg_response`: anisotropy-gated feature over bi-Gaussian Hessians
//! - `oof_response`: largest-magnitude eigenvalue of the OOF tensor

pub mod bg;
pub mod oof;

pub use bg::*;
pub use oof::*;

use crate::error::{check_len, OofError};
use crate::tensor::TensorField;
use crate::utils::eigen::eigval33;

/// Running max-magnitude response with the radius that produced it
#[derive(Clone, Debug)]
pub struct ResponseVolume {
    /// Feature of largest magnitude seen so far at each voxel
    pub response: Vec<f64>,
    /// Radius that produced `response`; 0 where no radius has won yet
    pub scale: Vec<f64>,
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
}

impl ResponseVolume {
    /// Empty accumulator: zero response everywhere
    pub fn new(nx: usize, ny: usize, nz: usize) -> Self {
        let n_total = nx * ny * nz;
        Self {
            response: vec![0.0; n_total],
            scale: vec![0.0; n_total],
            nx, ny, nz,
        }
    }

    /// Fold one radius' feature volume into the running response
    pub fn update(&mut self, feature: &[f64], radius: f64) -> Result<(), OofError> {
        check_len(feature.len(), self.nx, self.ny, self.nz)?;

        for ((rsp, scale), &feat) in self.response.iter_mut().zip(self.scale.iter_mut()).zip(feature) {
            let best = max_by_magnitude(*rsp, feat);
            if best != *rsp {
                *rsp = best;
                *scale = radius;
            }
        }
        Ok(())
    }

    /// Combine with a response computed over another subset of radii
    ///
    /// The per-voxel rule is `max_by_magnitude`, so merging partial results
    /// gives the same response as a single sequential run, up to exact ties in
    /// magnitude.
    pub fn merge(&mut self, other: &ResponseVolume) -> Result<(), OofError> {
        if (self.nx, self.ny, self.nz) != (other.nx, other.ny, other.nz) {
            return Err(OofError::ShapeMismatch {
                expected: self.response.len(),
                actual: other.response.len(),
            });
        }

        for i in 0..self.response.len() {
            let merged = max_by_magnitude(self.response[i], other.response[i]);
            if merged != self.response[i] {
                self.response[i] = merged;
                self.scale[i] = other.scale[i];
            }
        }
        Ok(())
    }
}

/// Keep `candidate` only when its magnitude strictly exceeds `current`'s
///
/// NaN never wins.
#[inline]
pub fn max_by_magnitude(current: f64, candidate: f64) -> f64 {
    if candidate.abs() > current.abs() {
        candidate
    } else {
        current
    }
}

/// Largest and smallest of three eigenvalues by absolute value
///
/// Ties keep the earlier value.
#[inline]
pub fn extremes_by_magnitude(e1: f64, e2: f64, e3: f64) -> (f64, f64) {
    let mut maxe = e1;
    let mut mine = e1;
    for e in [e2, e3] {
        if e.abs() > maxe.abs() {
            maxe = e;
        }
        if e.abs() < mine.abs() {
            mine = e;
        }
    }
    (maxe, mine)
}

/// Radius set used by the parameter defaults
pub const DEFAULT_RADII: [f64; 5] = [1.0, 2.0, 3.0, 4.0, 5.0];

/// Upper bound on the number of radii `radii_from_range` will generate
pub const MAX_RADII: usize = 1024;

/// Radii `min, min + step, ...` up to and including `max`
///
/// Falls back to `[min]` when the range is empty or `step` is not positive.
///
/// # Errors
/// `InvalidParameter` when a bound or the step is not finite, or when the
/// range would hold more than `MAX_RADII` radii.
pub fn radii_from_range(min: f64, max: f64, step: f64) -> Result<Vec<f64>, OofError> {
    if !(min.is_finite() && max.is_finite() && step.is_finite()) {
        return Err(OofError::InvalidParameter(format!(
            "radius range {}..={} step {} must be finite",
            min, max, step
        )));
    }
    if step <= 0.0 || max < min {
        return Ok(vec![min]);
    }

    // Tolerance keeps the last radius despite rounding in (max - min) / step
    let steps = ((max - min) / step + 1e-9).floor();
    if steps >= MAX_RADII as f64 {
        return Err(OofError::InvalidParameter(format!(
            "radius range {}..={} step {} gives more than {} radii",
            min, max, step, MAX_RADII
        )));
    }

    Ok((0..=steps as usize).map(|i| min + i as f64 * step).collect())
}

/// Drive a tensor generator through the eigen solve and feature reduction
///
/// Each field and its eigenvalues are dropped before the next radius is built.
/// The first failure aborts the run.
pub(crate) fn accumulate_response<I, Feat, F>(
    fields: I,
    nx: usize, ny: usize, nz: usize,
    radii: &[f64],
    feature: Feat,
    mut progress_callback: F,
) -> Result<ResponseVolume, OofError>
where
    I: Iterator<Item = Result<TensorField, OofError>>,
    Feat: Fn(f64, f64, f64) -> f64,
    F: FnMut(usize, usize),
{
    let total = radii.len();
    let mut acc = ResponseVolume::new(nx, ny, nz);
    progress_callback(0, total);

    for (i, (field, &radius)) in fields.zip(radii.iter()).enumerate() {
        let field = field?;
        let eig = eigval33(&field)?;
        drop(field);

        let feat: Vec<f64> = eig.e1.iter()
            .zip(eig.e2.iter())
            .zip(eig.e3.iter())
            .map(|((&e1, &e2), &e3)| feature(e1, e2, e3))
            .collect();
        drop(eig);

        acc.update(&feat, radius)?;
        progress_callback(i + 1, total);
    }

    Ok(acc)
}
