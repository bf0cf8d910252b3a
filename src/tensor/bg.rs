//! Bi-Gaussian Hessian tensors
//!
//! The image is transformed once. Each radius then costs one kernel FFT, one
//! spectral product, one inverse FFT and a finite-difference Hessian of the
//! smoothed image.

use log::debug;
use num_complex::Complex64;

use crate::error::{check_len, OofError};
use crate::fft::Fft3dWorkspace;
use crate::kernels::bg_kernel_volume;
use crate::tensor::{validate_radii, TensorField};
use crate::utils::gradient::hessian3;

/// Lazy generator of bi-Gaussian Hessian fields, one per radius
pub struct BgTensorIter {
    radii: Vec<f64>,
    rho: f64,
    fimg: Vec<Complex64>,
    workspace: Fft3dWorkspace,
    next_radius: usize,
}

/// Prepare the bi-Gaussian tensor generator for `image`
///
/// Validates the inputs and performs the single forward FFT of the image;
/// tensors are produced as the iterator is advanced.
///
/// # Arguments
/// * `image` - Volume in Fortran order (nx * ny * nz)
/// * `radii` - Foreground Gaussian widths, processed in order
/// * `rho` - Ratio of background to foreground width, > 0
///
/// # Errors
/// `ShapeMismatch` for a wrong-sized image, `InvalidParameter` for bad radii
/// or `rho`.
pub fn bg_tensor(
    image: &[f64],
    nx: usize, ny: usize, nz: usize,
    radii: &[f64],
    rho: f64,
) -> Result<BgTensorIter, OofError> {
    check_len(image.len(), nx, ny, nz)?;
    validate_radii(radii)?;
    if !(rho.is_finite() && rho > 0.0) {
        return Err(OofError::InvalidParameter(format!(
            "rho must be positive and finite, got {}",
            rho
        )));
    }

    let mut workspace = Fft3dWorkspace::new(nx, ny, nz);
    let fimg = workspace.fft3d_real(image);

    Ok(BgTensorIter {
        radii: radii.to_vec(),
        rho,
        fimg,
        workspace,
        next_radius: 0,
    })
}

impl BgTensorIter {
    /// Radii this generator walks through
    pub fn radii(&self) -> &[f64] {
        &self.radii
    }

    fn tensor_at(&mut self, sigma: f64) -> Result<TensorField, OofError> {
        let (nx, ny, nz) = self.workspace.dims();
        debug!("bi-Gaussian tensor: sigma={}, rho={}", sigma, self.rho);

        let kernel = bg_kernel_volume(nx, ny, nz, sigma, self.rho)?;
        let mut buffer = self.workspace.fft3d_real(&kernel);
        drop(kernel);

        for (b, &f) in buffer.iter_mut().zip(self.fimg.iter()) {
            *b *= f;
        }
        self.workspace.ifft3d(&mut buffer);

        let smoothed: Vec<f64> = buffer.iter().map(|c| c.re).collect();
        drop(buffer);

        Ok(hessian3(&smoothed, nx, ny, nz))
    }
}

impl Iterator for BgTensorIter {
    type Item = Result<TensorField, OofError>;

    fn next(&mut self) -> Option<Self::Item> {
        let sigma = *self.radii.get(self.next_radius)?;
        self.next_radius += 1;

        let result = self.tensor_at(sigma);
        if result.is_err() {
            // Stop after the first failure
            self.next_radius = self.radii.len();
        }
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.radii.len() - self.next_radius;
        (0, Some(remaining))
    }
}
