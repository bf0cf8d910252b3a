//! Finite difference derivatives
//!
//! Central differences in the interior and one-sided first-order differences at
//! the borders, matching numpy.gradient with unit spacing. Used to form the
//! Hessian of the bi-Gaussian smoothed image.

use crate::fft::idx3d;
use crate::tensor::TensorField;

/// Gradient along one axis (0 = x, 1 = y, 2 = z)
///
/// An axis of length 1 has no neighbours and yields a zero derivative.
pub fn gradient_3d(data: &[f64], nx: usize, ny: usize, nz: usize, axis: usize) -> Vec<f64> {
    let n_total = nx * ny * nz;
    let mut grad = vec![0.0f64; n_total];

    let (n, stride) = match axis {
        0 => (nx, 1),
        1 => (ny, nx),
        _ => (nz, nx * ny),
    };
    if n < 2 {
        return grad;
    }

    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                let idx = idx3d(i, j, k, nx, ny);
                let pos = match axis {
                    0 => i,
                    1 => j,
                    _ => k,
                };

                grad[idx] = if pos == 0 {
                    // Forward difference at the leading edge
                    data[idx + stride] - data[idx]
                } else if pos == n - 1 {
                    // Backward difference at the trailing edge
                    data[idx] - data[idx - stride]
                } else {
                    (data[idx + stride] - data[idx - stride]) / 2.0
                };
            }
        }
    }

    grad
}

/// Hessian of a volume as a gradient-of-gradient tensor field
///
/// f11 = d/dx(dx), f12 = d/dy(dx), f13 = d/dz(dx),
/// f22 = d/dy(dy), f23 = d/dz(dy), f33 = d/dz(dz).
pub fn hessian3(data: &[f64], nx: usize, ny: usize, nz: usize) -> TensorField {
    let dx = gradient_3d(data, nx, ny, nz, 0);
    let f11 = gradient_3d(&dx, nx, ny, nz, 0);
    let f12 = gradient_3d(&dx, nx, ny, nz, 1);
    let f13 = gradient_3d(&dx, nx, ny, nz, 2);
    drop(dx);

    let dy = gradient_3d(data, nx, ny, nz, 1);
    let f22 = gradient_3d(&dy, nx, ny, nz, 1);
    let f23 = gradient_3d(&dy, nx, ny, nz, 2);
    drop(dy);

    let dz = gradient_3d(data, nx, ny, nz, 2);
    let f33 = gradient_3d(&dz, nx, ny, nz, 2);

    TensorField { f11, f12, f13, f22, f23, f33, nx, ny, nz }
}
