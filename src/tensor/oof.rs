//! Optimally Oriented Flux tensors
//!
//! For a ball of radius r the flux tensor is the image convolved with the
//! second derivatives of the OOF kernel. In k-space this is a product with
//! `k_i * k_j * K(|k|)`:
//!
//! f_ij = Re(IFFT(k_i * k_j * K * FFT(image)))
//!
//! The image spectrum and |k| are computed once and shared by every radius.

use log::debug;
use num_complex::Complex64;

use crate::error::{check_len, OofError};
use crate::fft::{fftfreq, idx3d, ifftshifted_coor_matrix, Fft3dWorkspace};
use crate::kernels::{oof_kernel_volume, spectral_radius};
use crate::tensor::{validate_radii, TensorField};

/// Axis pairs of the six stored components, in (f11, f12, f13, f22, f23, f33) order
const COMPONENT_AXES: [(usize, usize); 6] = [(0, 0), (0, 1), (0, 2), (1, 1), (1, 2), (2, 2)];

/// Lazy generator of OOF tensor fields, one per radius
pub struct OofTensorIter {
    radii: Vec<f64>,
    sigma: f64,
    ntype: i32,
    fimg: Vec<Complex64>,
    kernel_radius: Vec<f64>,
    /// Per-axis frequencies `[x, y, z]`
    freqs: [Vec<f64>; 3],
    /// Frequency coordinate volumes, only held when not saving memory
    coords: Option<[Vec<f64>; 3]>,
    workspace: Fft3dWorkspace,
    next_radius: usize,
}

/// Prepare the OOF tensor generator for `image`
///
/// # Arguments
/// * `image` - Volume in Fortran order (nx * ny * nz)
/// * `radii` - Ball radii, processed in order
/// * `memory_save` - Build and invert one component at a time instead of
///   holding all six spectral products together
/// * `sigma` - Width of the Gaussian smoothing applied with the ball
/// * `ntype` - Exponent of the radius normalisation; 0 disables it
///
/// # Errors
/// `ShapeMismatch` for a wrong-sized image. `InvalidParameter` for non-positive
/// radii or sigma, or, when `ntype != 0`, a radius with `2 r sigma - sigma^2 <= 0`.
#[allow(clippy::too_many_arguments)]
pub fn oof_tensor(
    image: &[f64],
    nx: usize, ny: usize, nz: usize,
    radii: &[f64],
    memory_save: bool,
    sigma: f64,
    ntype: i32,
) -> Result<OofTensorIter, OofError> {
    check_len(image.len(), nx, ny, nz)?;
    validate_radii(radii)?;
    if !(sigma.is_finite() && sigma > 0.0) {
        return Err(OofError::InvalidParameter(format!(
            "sigma must be positive and finite, got {}",
            sigma
        )));
    }
    if ntype != 0 {
        if let Some(&r) = radii.iter().find(|&&r| 2.0 * r * sigma - sigma * sigma <= 0.0) {
            return Err(OofError::InvalidParameter(format!(
                "radius {} must exceed sigma / 2 = {} for normalisation",
                r,
                sigma / 2.0
            )));
        }
    }

    let mut workspace = Fft3dWorkspace::new(nx, ny, nz);
    let fimg = workspace.fft3d_real(image);
    let kernel_radius = spectral_radius(nx, ny, nz);
    let freqs = [fftfreq(nx), fftfreq(ny), fftfreq(nz)];
    let coords = if memory_save {
        None
    } else {
        Some(ifftshifted_coor_matrix(nx, ny, nz))
    };

    Ok(OofTensorIter {
        radii: radii.to_vec(),
        sigma,
        ntype,
        fimg,
        kernel_radius,
        freqs,
        coords,
        workspace,
        next_radius: 0,
    })
}

impl OofTensorIter {
    /// Radii this generator walks through
    pub fn radii(&self) -> &[f64] {
        &self.radii
    }

    pub fn memory_save(&self) -> bool {
        self.coords.is_none()
    }

    fn tensor_at(&mut self, radius: f64) -> Result<TensorField, OofError> {
        let (nx, ny, nz) = self.workspace.dims();
        debug!(
            "OOF tensor: radius={}, sigma={}, memory_save={}",
            radius,
            self.sigma,
            self.memory_save()
        );

        let kernel = oof_kernel_volume(&self.kernel_radius, radius, self.sigma, self.ntype);
        if kernel.iter().any(|v| !v.is_finite()) {
            return Err(OofError::KernelConstructionFailure {
                radius,
                reason: "kernel contains non-finite values".to_string(),
            });
        }

        // Image spectrum filtered by the kernel, shared by all six components
        let filtered: Vec<Complex64> = self
            .fimg
            .iter()
            .zip(kernel.iter())
            .map(|(&f, &k)| f * k)
            .collect();
        drop(kernel);

        let components = match self.coords.as_ref() {
            None => {
                let freqs = &self.freqs;
                let workspace = &mut self.workspace;
                COMPONENT_AXES.map(|(a, b)| {
                    let mut buffer = vec![Complex64::new(0.0, 0.0); filtered.len()];
                    for k in 0..nz {
                        for j in 0..ny {
                            for i in 0..nx {
                                let f = [freqs[0][i], freqs[1][j], freqs[2][k]];
                                let idx = idx3d(i, j, k, nx, ny);
                                buffer[idx] = filtered[idx] * (f[a] * f[b]);
                            }
                        }
                    }
                    for axis in 0..3 {
                        workspace.ifft_axis(&mut buffer, axis);
                    }
                    buffer.iter().map(|c| c.re).collect::<Vec<f64>>()
                })
            }
            Some(coords) => {
                let products = COMPONENT_AXES.map(|(a, b)| {
                    filtered
                        .iter()
                        .zip(coords[a].iter().zip(coords[b].iter()))
                        .map(|(&v, (&x, &y))| v * (x * y))
                        .collect::<Vec<Complex64>>()
                });
                let workspace = &mut self.workspace;
                products.map(|mut buffer| {
                    workspace.ifft3d(&mut buffer);
                    buffer.iter().map(|c| c.re).collect::<Vec<f64>>()
                })
            }
        };

        TensorField::new(components, nx, ny, nz)
    }
}

impl Iterator for OofTensorIter {
    type Item = Result<TensorField, OofError>;

    fn next(&mut self) -> Option<Self::Item> {
        let radius = *self.radii.get(self.next_radius)?;
        self.next_radius += 1;

        let result = self.tensor_at(radius);
        if result.is_err() {
            self.next_radius = self.radii.len();
        }
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.radii.len() - self.next_radius;
        (0, Some(remaining))
    }
}
