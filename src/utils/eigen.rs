//! Eigenvalues of symmetric 3x3 tensor fields
//!
//! Two paths are provided:
//! - `eigval33`: closed-form trigonometric (Cardano) solution applied to every
//!   voxel of a `TensorField` in one pass. Used by the response filters, where
//!   millions of matrices are solved per radius.
//! - `eigsparse3`: general dense decomposition (nalgebra `SymmetricEigen`) for a
//!   handful of selected voxels, returning eigenvectors as well.

use nalgebra::Matrix3;

use crate::error::OofError;
use crate::fft::idx3d;
use crate::tensor::TensorField;

/// Added to the diagonal so exactly-zero matrices keep a well defined cubic
const DIAGONAL_EPS: f64 = 1e-50;

/// Three eigenvalue volumes in the solver's algebraic order
///
/// For each voxel `e1 >= e3 >= e2`: `e1` is the largest root, `e2` the smallest
/// and `e3` the middle one. Callers ranking by magnitude must compare `abs()`.
#[derive(Clone, Debug)]
pub struct EigenTriple {
    pub e1: Vec<f64>,
    pub e2: Vec<f64>,
    pub e3: Vec<f64>,
}

/// Eigen-decomposition of the tensor at one voxel
#[derive(Clone, Debug, PartialEq)]
pub struct SparseEigen {
    /// Voxel coordinate (i, j, k)
    pub index: (usize, usize, usize),
    /// Eigenvalues, ascending
    pub eigenvalues: [f64; 3],
    /// Unit eigenvectors stored as columns: `eigenvectors[row][col]`
    pub eigenvectors: [[f64; 3]; 3],
}

impl SparseEigen {
    /// Eigenvector belonging to `eigenvalues[n]`
    pub fn eigenvector(&self, n: usize) -> [f64; 3] {
        [self.eigenvectors[0][n], self.eigenvectors[1][n], self.eigenvectors[2][n]]
    }
}

/// Eigenvalues of every voxel's symmetric matrix
///
/// Never fails on numerical grounds: degenerate discriminants are clamped.
/// NaN components propagate to NaN eigenvalues.
///
/// # Errors
/// `ShapeMismatch` if the six components do not share the field's shape.
pub fn eigval33(field: &TensorField) -> Result<EigenTriple, OofError> {
    field.validate()?;

    let n_total = field.len();
    let mut e1 = Vec::with_capacity(n_total);
    let mut e2 = Vec::with_capacity(n_total);
    let mut e3 = Vec::with_capacity(n_total);

    let components = field.f11.iter()
        .zip(field.f12.iter())
        .zip(field.f13.iter())
        .zip(field.f22.iter())
        .zip(field.f23.iter())
        .zip(field.f33.iter());

    for (((((&a11, &a12), &a13), &a22), &a23), &a33) in components {
        let (l1, l2, l3) = eigval_sym33(a11, a12, a13, a22, a23, a33);
        e1.push(l1);
        e2.push(l2);
        e3.push(l3);
    }

    Ok(EigenTriple { e1, e2, e3 })
}

/// Closed-form eigenvalues of one symmetric 3x3 matrix
///
/// Matrix is:
/// | a11 a12 a13 |
/// | a12 a22 a23 |
/// | a13 a23 a33 |
///
/// The characteristic polynomial `l^3 + b l^2 + c l + d` is depressed with
/// `l = t - b/3` and solved with `t = 2 m cos(theta - 2 pi n / 3)`.
///
/// Returns (largest, smallest, middle).
#[inline]
pub fn eigval_sym33(a11: f64, a12: f64, a13: f64, a22: f64, a23: f64, a33: f64) -> (f64, f64, f64) {
    let p11 = a11 + DIAGONAL_EPS;
    let p22 = a22 + DIAGONAL_EPS;
    let p33 = a33 + DIAGONAL_EPS;

    let a12_sq = a12 * a12;
    let a13_sq = a13 * a13;
    let a23_sq = a23 * a23;

    // Second invariant and negated determinant
    let c = p11 * p22 + p22 * p33 + p33 * p11 - a12_sq - a13_sq - a23_sq;
    let neg_det = -p11 * p22 * p33 + a23_sq * p11 + a13_sq * p22 + a12_sq * p33
        - 2.0 * a12 * a13 * a23;
    let b = -a11 - a22 - a33 - 3.0 * DIAGONAL_EPS;

    // Depressed cubic t^3 + p t + q = 0
    let q = neg_det + (2.0 * b * b * b - 9.0 * b * c) / 27.0;
    let mut minus_p_third_cubed = (b * b / 3.0 - c).powi(3) / 27.0;
    if minus_p_third_cubed < 0.0 {
        minus_p_third_cubed = 0.0;
    }
    let radius_cubed = minus_p_third_cubed.sqrt();
    let m = radius_cubed.cbrt();

    let denom = if radius_cubed == 0.0 { 1.0 } else { radius_cubed };
    let mut cos3 = -q / 2.0 / denom;
    if cos3 > 1.0 {
        cos3 = 1.0;
    }
    if cos3 < -1.0 {
        cos3 = -1.0;
    }
    let theta = cos3.acos() / 3.0;

    let mc = m * theta.cos();
    let ms = m * 3.0f64.sqrt() * theta.sin();
    let shift = -b / 3.0;

    (2.0 * mc + shift, -mc - ms + shift, -mc + ms + shift)
}

/// Exact eigen-decomposition at selected voxels
///
/// # Arguments
/// * `field` - Tensor field
/// * `indices` - Voxel coordinates (i, j, k); output keeps this order
///
/// # Errors
/// `ShapeMismatch` for an inconsistent field, `InvalidParameter` for an index
/// outside the volume.
pub fn eigsparse3(
    field: &TensorField,
    indices: &[(usize, usize, usize)],
) -> Result<Vec<SparseEigen>, OofError> {
    field.validate()?;
    let (nx, ny, nz) = (field.nx, field.ny, field.nz);

    if let Some(&(i, j, k)) = indices.iter().find(|&&(i, j, k)| i >= nx || j >= ny || k >= nz) {
        return Err(OofError::InvalidParameter(format!(
            "voxel index ({}, {}, {}) outside {}x{}x{} volume",
            i, j, k, nx, ny, nz
        )));
    }

    Ok(indices
        .iter()
        .map(|&(i, j, k)| {
            let a = field.matrix_at(idx3d(i, j, k, nx, ny));
            let eigen = Matrix3::from_fn(|r, c| a[r][c]).symmetric_eigen();

            let mut order = [0usize, 1, 2];
            order.sort_by(|&p, &q| eigen.eigenvalues[p].total_cmp(&eigen.eigenvalues[q]));

            let eigenvalues = order.map(|n| eigen.eigenvalues[n]);
            let eigenvectors = [0, 1, 2].map(|r| order.map(|n| eigen.eigenvectors[(r, n)]));

            SparseEigen { index: (i, j, k), eigenvalues, eigenvectors }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_voxel(m: [f64; 6]) -> TensorField {
        let [a11, a12, a13, a22, a23, a33] = m;
        TensorField::new(
            [vec![a11], vec![a12], vec![a13], vec![a22], vec![a23], vec![a33]],
            1, 1, 1,
        ).unwrap()
    }

    fn det(m: [f64; 6]) -> f64 {
        let [a11, a12, a13, a22, a23, a33] = m;
        a11 * (a22 * a33 - a23 * a23) - a12 * (a12 * a33 - a23 * a13) + a13 * (a12 * a23 - a22 * a13)
    }

    #[test]
    fn test_diagonal_golden_order() {
        let (l1, l2, l3) = eigval_sym33(1.0, 0.0, 0.0, 2.0, 0.0, 3.0);
        assert!((l1 - 3.0).abs() < 1e-10, "largest should be 3, got {}", l1);
        assert!((l2 - 1.0).abs() < 1e-10, "smallest should be 1, got {}", l2);
        assert!((l3 - 2.0).abs() < 1e-10, "middle should be 2, got {}", l3);
    }

    #[test]
    fn test_negative_diagonal() {
        let (l1, l2, l3) = eigval_sym33(-4.0, 0.0, 0.0, 0.5, 0.0, -1.0);
        assert!((l1 - 0.5).abs() < 1e-10);
        assert!((l2 + 4.0).abs() < 1e-10);
        assert!((l3 + 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_trace_and_determinant_invariants() {
        let matrices = [
            [0.0, 1.0, 1.0, 0.0, 1.0, 0.0],
            [2.0, -0.3, 0.7, 1.5, 0.2, -1.1],
            [1e-3, 4e-4, -2e-4, 3e-3, 1e-4, -5e-4],
            [10.0, 3.0, -2.0, -7.0, 5.0, 1.0],
            [-1.0, 0.0, 0.0, -1.0, 0.0, -1.0],
        ];

        for m in matrices {
            let (l1, l2, l3) = eigval_sym33(m[0], m[1], m[2], m[3], m[4], m[5]);
            let trace = m[0] + m[3] + m[5];
            let scale = m.iter().fold(1e-12f64, |acc, v| acc.max(v.abs()));

            assert!(
                (l1 + l2 + l3 - trace).abs() < 1e-8 * scale,
                "sum {} != trace {} for {:?}", l1 + l2 + l3, trace, m
            );
            assert!(
                (l1 * l2 * l3 - det(m)).abs() < 1e-7 * scale.powi(3),
                "product {} != det {} for {:?}", l1 * l2 * l3, det(m), m
            );
            assert!(l1 >= l3 - 1e-12 * scale && l3 >= l2 - 1e-12 * scale, "order broken for {:?}", m);
        }
    }

    #[test]
    fn test_repeated_eigenvalues() {
        let (l1, l2, l3) = eigval_sym33(2.0, 0.0, 0.0, 2.0, 0.0, 2.0);
        for l in [l1, l2, l3] {
            assert!((l - 2.0).abs() < 1e-10, "isotropic matrix should give 2, got {}", l);
        }
    }

    #[test]
    fn test_zero_matrix_is_finite() {
        let (l1, l2, l3) = eigval_sym33(0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        for l in [l1, l2, l3] {
            assert!(l.is_finite() && l.abs() < 1e-40, "zero matrix gave {}", l);
        }
    }

    #[test]
    fn test_nan_propagates() {
        let (l1, l2, l3) = eigval_sym33(f64::NAN, 0.0, 0.0, 1.0, 0.0, 1.0);
        assert!(l1.is_nan() && l2.is_nan() && l3.is_nan());
    }

    #[test]
    fn test_eigval33_volume() {
        let field = single_voxel([1.0, 0.0, 0.0, 2.0, 0.0, 3.0]);
        let eig = eigval33(&field).unwrap();
        assert_eq!(eig.e1.len(), 1);
        assert!((eig.e1[0] - 3.0).abs() < 1e-10);
        assert!((eig.e2[0] - 1.0).abs() < 1e-10);
        assert!((eig.e3[0] - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_eigval33_shape_mismatch() {
        let mut field = TensorField::zeros(2, 2, 2);
        field.f23.pop();
        assert!(matches!(eigval33(&field), Err(OofError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_eigsparse3_matches_closed_form() {
        let m = [2.0, -0.3, 0.7, 1.5, 0.2, -1.1];
        let field = single_voxel(m);
        let result = eigsparse3(&field, &[(0, 0, 0)]).unwrap();
        assert_eq!(result.len(), 1);

        let (l1, l2, l3) = eigval_sym33(m[0], m[1], m[2], m[3], m[4], m[5]);
        let expected = [l2, l3, l1];
        for (got, want) in result[0].eigenvalues.iter().zip(expected.iter()) {
            assert!((got - want).abs() < 1e-9, "sparse {} vs closed form {}", got, want);
        }
    }

    #[test]
    fn test_eigsparse3_eigenvectors() {
        let m = [10.0, 3.0, -2.0, -7.0, 5.0, 1.0];
        let field = single_voxel(m);
        let result = eigsparse3(&field, &[(0, 0, 0)]).unwrap();
        let a = field.matrix_at(0);

        for n in 0..3 {
            let vec = result[0].eigenvector(n);
            let lambda = result[0].eigenvalues[n];
            let norm = (vec[0] * vec[0] + vec[1] * vec[1] + vec[2] * vec[2]).sqrt();
            assert!((norm - 1.0).abs() < 1e-10, "eigenvector {} not unit: {}", n, norm);

            for r in 0..3 {
                let av = a[r][0] * vec[0] + a[r][1] * vec[1] + a[r][2] * vec[2];
                assert!((av - lambda * vec[r]).abs() < 1e-9, "A v != lambda v for eigenpair {}", n);
            }
        }
    }

    #[test]
    fn test_eigsparse3_keeps_index_order() {
        let (nx, ny, nz) = (3, 2, 2);
        let mut field = TensorField::zeros(nx, ny, nz);
        for idx in 0..field.len() {
            field.f11[idx] = idx as f64;
            field.f22[idx] = -(idx as f64);
        }

        let indices = [(2, 1, 1), (0, 0, 0), (1, 1, 0)];
        let result = eigsparse3(&field, &indices).unwrap();
        for (res, &(i, j, k)) in result.iter().zip(indices.iter()) {
            assert_eq!(res.index, (i, j, k));
            let v = idx3d(i, j, k, nx, ny) as f64;
            assert!((res.eigenvalues[0] + v).abs() < 1e-12);
            assert!((res.eigenvalues[2] - v).abs() < 1e-12);
        }
    }

    #[test]
    fn test_eigsparse3_rejects_out_of_bounds() {
        let field = TensorField::zeros(2, 2, 2);
        let result = eigsparse3(&field, &[(0, 0, 0), (0, 2, 0)]);
        assert!(matches!(result, Err(OofError::InvalidParameter(_))));
    }
}
