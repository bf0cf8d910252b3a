//! Per-radius symmetric tensor fields
//!
//! This module provides the two scale-space tensor generators:
//! - `bg_tensor`: Hessian of the bi-Gaussian smoothed image
//! - `oof_tensor`: Optimally Oriented Flux tensor evaluated in k-space
//!
//! Both are lazy iterators yielding one `TensorField` per radius. A field is
//! built when requested and owned by the caller, so at most one radius' tensors
//! are alive at any time.

pub mod bg;
pub mod oof;

pub use bg::{bg_tensor, BgTensorIter};
pub use oof::{oof_tensor, OofTensorIter};

use crate::error::{check_len, OofError};

/// Upper triangle of a symmetric 3x3 matrix at every voxel
///
/// Lower triangle is implied: f21 = f12, f31 = f13, f32 = f23.
#[derive(Clone, Debug)]
pub struct TensorField {
    pub f11: Vec<f64>,
    pub f12: Vec<f64>,
    pub f13: Vec<f64>,
    pub f22: Vec<f64>,
    pub f23: Vec<f64>,
    pub f33: Vec<f64>,
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
}

impl TensorField {
    /// Build a field from its six components, checking every component's size
    pub fn new(
        components: [Vec<f64>; 6],
        nx: usize, ny: usize, nz: usize,
    ) -> Result<Self, OofError> {
        let [f11, f12, f13, f22, f23, f33] = components;
        let field = Self { f11, f12, f13, f22, f23, f33, nx, ny, nz };
        field.validate()?;
        Ok(field)
    }

    /// All-zero field of the given shape
    pub fn zeros(nx: usize, ny: usize, nz: usize) -> Self {
        let n_total = nx * ny * nz;
        Self {
            f11: vec![0.0; n_total],
            f12: vec![0.0; n_total],
            f13: vec![0.0; n_total],
            f22: vec![0.0; n_total],
            f23: vec![0.0; n_total],
            f33: vec![0.0; n_total],
            nx, ny, nz,
        }
    }

    /// Number of voxels
    pub fn len(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Components in storage order (f11, f12, f13, f22, f23, f33)
    pub fn components(&self) -> [&[f64]; 6] {
        [&self.f11, &self.f12, &self.f13, &self.f22, &self.f23, &self.f33]
    }

    /// Ensure all six components hold exactly `nx * ny * nz` samples
    pub fn validate(&self) -> Result<(), OofError> {
        for component in self.components() {
            check_len(component.len(), self.nx, self.ny, self.nz)?;
        }
        Ok(())
    }

    /// Full 3x3 matrix at a flat voxel index
    #[inline]
    pub fn matrix_at(&self, idx: usize) -> [[f64; 3]; 3] {
        [
            [self.f11[idx], self.f12[idx], self.f13[idx]],
            [self.f12[idx], self.f22[idx], self.f23[idx]],
            [self.f13[idx], self.f23[idx], self.f33[idx]],
        ]
    }
}

/// Reject non-finite or non-positive radii before any work starts
pub fn validate_radii(radii: &[f64]) -> Result<(), OofError> {
    if let Some(&r) = radii.iter().find(|&&r| !(r.is_finite() && r > 0.0)) {
        return Err(OofError::InvalidParameter(format!(
            "radius must be positive and finite, got {}",
            r
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_mismatched_component() {
        let n = 2 * 2 * 2;
        let mut components = [
            vec![0.0; n], vec![0.0; n], vec![0.0; n],
            vec![0.0; n], vec![0.0; n], vec![0.0; n],
        ];
        components[4] = vec![0.0; n - 1];

        let result = TensorField::new(components, 2, 2, 2);
        assert_eq!(result.err(), Some(OofError::ShapeMismatch { expected: 8, actual: 7 }));
    }

    #[test]
    fn test_validate_radii() {
        assert!(validate_radii(&[]).is_ok());
        assert!(validate_radii(&[0.5, 2.0, 2.0]).is_ok());
        assert!(matches!(validate_radii(&[1.0, 0.0]), Err(OofError::InvalidParameter(_))));
        assert!(matches!(validate_radii(&[-1.0]), Err(OofError::InvalidParameter(_))));
        assert!(matches!(validate_radii(&[f64::NAN]), Err(OofError::InvalidParameter(_))));
    }

    #[test]
    fn test_matrix_at_is_symmetric() {
        let mut field = TensorField::zeros(1, 1, 1);
        field.f11[0] = 1.0;
        field.f12[0] = 2.0;
        field.f13[0] = 3.0;
        field.f22[0] = 4.0;
        field.f23[0] = 5.0;
        field.f33[0] = 6.0;

        let m = field.matrix_at(0);
        for r in 0..3 {
            for c in 0..3 {
                assert_eq!(m[r][c], m[c][r], "Matrix not symmetric at ({}, {})", r, c);
            }
        }
        assert_eq!(m[1][2], 5.0);
    }
}
