//! Optimally Oriented Flux response
//!
//! The feature is the OOF tensor eigenvalue of largest magnitude, with no
//! anisotropy gating.

use log::info;

use crate::error::OofError;
use crate::filters::{accumulate_response, extremes_by_magnitude, ResponseVolume, DEFAULT_RADII};
use crate::tensor::{oof_tensor, validate_radii};

/// Parameters for the OOF response
#[derive(Clone, Debug)]
pub struct OofParams {
    /// Ball radii, processed in order
    pub radii: Vec<f64>,
    /// Invert one tensor component at a time (default true)
    pub memory_save: bool,
    /// Gaussian smoothing width of the kernel (default 1.0)
    pub sigma: f64,
    /// Exponent of the radius normalisation, 0 disables it (default 1)
    pub ntype: i32,
}

impl Default for OofParams {
    fn default() -> Self {
        Self {
            radii: DEFAULT_RADII.to_vec(),
            memory_save: true,
            sigma: 1.0,
            ntype: 1,
        }
    }
}

impl OofParams {
    pub fn validate(&self) -> Result<(), OofError> {
        validate_radii(&self.radii)?;
        if !(self.sigma.is_finite() && self.sigma > 0.0) {
            return Err(OofError::InvalidParameter(format!(
                "sigma must be positive and finite, got {}",
                self.sigma
            )));
        }
        if self.ntype != 0 {
            let sigma = self.sigma;
            if let Some(&r) = self.radii.iter().find(|&&r| 2.0 * r * sigma - sigma * sigma <= 0.0) {
                return Err(OofError::InvalidParameter(format!(
                    "radius {} too small for normalisation with sigma {}",
                    r, sigma
                )));
            }
        }
        Ok(())
    }
}

/// Largest-magnitude eigenvalue
#[inline]
pub fn oof_feature(e1: f64, e2: f64, e3: f64) -> f64 {
    extremes_by_magnitude(e1, e2, e3).0
}

/// OOF response over all radii
///
/// # Arguments
/// * `image` - Input volume (nx * ny * nz), Fortran order
/// * `nx`, `ny`, `nz` - Volume dimensions
/// * `params` - Radii, memory mode and kernel settings
pub fn oof_response(
    image: &[f64],
    nx: usize, ny: usize, nz: usize,
    params: &OofParams,
) -> Result<ResponseVolume, OofError> {
    oof_response_with_progress(image, nx, ny, nz, params, |_, _| {})
}

/// OOF response with progress reporting
///
/// `progress_callback(done, total)` is called with `(0, total)` before the
/// first radius and `(i + 1, total)` after radius `i`.
pub fn oof_response_with_progress<F>(
    image: &[f64],
    nx: usize, ny: usize, nz: usize,
    params: &OofParams,
    progress_callback: F,
) -> Result<ResponseVolume, OofError>
where
    F: FnMut(usize, usize),
{
    params.validate()?;
    info!(
        "OOF response: {}x{}x{}, {} radii, memory_save={}",
        nx, ny, nz, params.radii.len(), params.memory_save
    );

    let fields = oof_tensor(
        image, nx, ny, nz,
        &params.radii, params.memory_save, params.sigma, params.ntype,
    )?;
    let result = accumulate_response(fields, nx, ny, nz, &params.radii, oof_feature, progress_callback)?;

    info!("OOF response complete");
    Ok(result)
}
