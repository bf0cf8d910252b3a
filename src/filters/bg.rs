//! Bi-Gaussian medialness response
//!
//! Per radius the Hessian of the bi-Gaussian smoothed image is diagonalised.
//! With `maxe`/`mine` the eigenvalues of largest/smallest magnitude and `mide`
//! the remaining one, the feature is
//!
//! -mide / maxe * (mide + maxe)
//!
//! and is zeroed wherever the eigenvalue sum is non-negative: bright tubes
//! have a negative-sum Hessian.

use log::info;

use crate::error::OofError;
use crate::filters::{accumulate_response, extremes_by_magnitude, ResponseVolume, DEFAULT_RADII};
use crate::tensor::{bg_tensor, validate_radii};

/// Shift applied to the first eigenvalue so `maxe` is never exactly zero
const FEATURE_EPS: f64 = 1e-12;

/// Parameters for the bi-Gaussian response
#[derive(Clone, Debug)]
pub struct BgParams {
    /// Foreground Gaussian widths, processed in order
    pub radii: Vec<f64>,
    /// Background to foreground width ratio (default 0.2)
    pub rho: f64,
}

impl Default for BgParams {
    fn default() -> Self {
        Self {
            radii: DEFAULT_RADII.to_vec(),
            rho: 0.2,
        }
    }
}

impl BgParams {
    pub fn validate(&self) -> Result<(), OofError> {
        validate_radii(&self.radii)?;
        if !(self.rho.is_finite() && self.rho > 0.0) {
            return Err(OofError::InvalidParameter(format!(
                "rho must be positive and finite, got {}",
                self.rho
            )));
        }
        Ok(())
    }
}

/// Anisotropy-gated medialness of one voxel's eigenvalues
#[inline]
pub fn bg_feature(e1: f64, e2: f64, e3: f64) -> f64 {
    let e1 = e1 - FEATURE_EPS;
    let sume = e1 + e2 + e3;
    if sume >= 0.0 {
        return 0.0;
    }

    let (maxe, mine) = extremes_by_magnitude(e1, e2, e3);
    let mide = sume - maxe - mine;
    -mide / maxe * (mide + maxe)
}

/// Bi-Gaussian response over all radii
///
/// # Arguments
/// * `image` - Input volume (nx * ny * nz), Fortran order
/// * `nx`, `ny`, `nz` - Volume dimensions
/// * `params` - Radii and rho
///
/// # Returns
/// Max-magnitude feature per voxel and the radius that produced it
pub fn bg_response(
    image: &[f64],
    nx: usize, ny: usize, nz: usize,
    params: &BgParams,
) -> Result<ResponseVolume, OofError> {
    bg_response_with_progress(image, nx, ny, nz, params, |_, _| {})
}

/// Bi-Gaussian response with progress reporting
///
/// `progress_callback(done, total)` is called with `(0, total)` before the
/// first radius and `(i + 1, total)` after radius `i`.
pub fn bg_response_with_progress<F>(
    image: &[f64],
    nx: usize, ny: usize, nz: usize,
    params: &BgParams,
    progress_callback: F,
) -> Result<ResponseVolume, OofError>
where
    F: FnMut(usize, usize),
{
    params.validate()?;
    info!(
        "Bi-Gaussian response: {}x{}x{}, {} radii, rho={}",
        nx, ny, nz, params.radii.len(), params.rho
    );

    let fields = bg_tensor(image, nx, ny, nz, &params.radii, params.rho)?;
    let result = accumulate_response(fields, nx, ny, nz, &params.radii, bg_feature, progress_callback)?;

    info!("Bi-Gaussian response complete");
    Ok(result)
}
