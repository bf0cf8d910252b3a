//! Optimally Oriented Flux kernel in k-space
//!
//! The OOF kernel is the Fourier transform of a Gaussian-smoothed ball of radius
//! `r`, normalised so responses at different radii are comparable:
//!
//! K(k) = N(r) * exp(-2 pi^2 sigma^2 |k|^2) * J_{3/2}(2 pi r |k|) / |k|^{3/2}
//!
//! with J_{3/2}(x) = sqrt(2 / (pi x)) * (sin(x)/x - cos(x)). It is evaluated
//! directly on the frequency grid, no real-space kernel is built.
//!
//! Reference:
//! Law MWK, Chung ACS. Three Dimensional Curvilinear Structure Detection using
//! Optimally Oriented Flux. ECCV 2008, pp. 368-382.

use std::f64::consts::PI;

use statrs::function::gamma::gamma;

use crate::fft::ifftshifted_coor_matrix;

/// Guards |k| = 0 and the small-argument Bessel limit
pub const KERNEL_EPS: f64 = 1e-12;

/// Below this argument the closed form of J_{3/2} loses all precision to cancellation
const SMALL_ARGUMENT: f64 = 1e-3;

/// Bessel function of the first kind of order 3/2, for `z >= 0`
///
/// Closed form `sqrt(2 / (pi z)) * (sin(z)/z - cos(z))`, replaced near zero by
/// its leading term `(z/2)^{3/2} / Gamma(5/2)`.
pub fn bessel_j_three_halves(z: f64) -> f64 {
    if z < SMALL_ARGUMENT {
        (z / 2.0).powf(1.5) / gamma(2.5)
    } else {
        (2.0 / (PI * z)).sqrt() * (z.sin() / z - z.cos())
    }
}

/// Radius-dependent normalisation N(r)
///
/// `4/3 pi r^3 / (J_{3/2}(2 pi r eps) / eps^{3/2}) / r^2 * (r / sqrt(2 r sigma - sigma^2))^ntype`
///
/// The Bessel ratio is the eps -> 0 limit (pi r)^{3/2} / Gamma(5/2), taken at
/// a finite eps. `ntype = 0` disables the scale term.
pub fn oof_normalisation(radius: f64, sigma: f64, ntype: i32) -> f64 {
    let bessel_limit = bessel_j_three_halves(2.0 * PI * radius * KERNEL_EPS) / KERNEL_EPS.powf(1.5);
    let volume = 4.0 / 3.0 * PI * radius.powi(3);
    let scale = radius / (2.0 * radius * sigma - sigma * sigma).sqrt();

    volume / bessel_limit / (radius * radius) * scale.powi(ntype)
}

/// OOF kernel value at spectral radius |k| for ball radius `radius`
///
/// Finite at |k| = 0: the distance is floored at `KERNEL_EPS`.
pub fn oofftkernel(kernel_radius: f64, radius: f64, sigma: f64, ntype: i32) -> f64 {
    let normalisation = oof_normalisation(radius, sigma, ntype);
    oofftkernel_normalised(kernel_radius, radius, sigma, normalisation)
}

#[inline]
fn oofftkernel_normalised(kernel_radius: f64, radius: f64, sigma: f64, normalisation: f64) -> f64 {
    let k = kernel_radius.max(KERNEL_EPS);
    let gaussian = (-2.0 * sigma * sigma * PI * PI * k * k).exp();

    normalisation * gaussian * bessel_j_three_halves(2.0 * PI * radius * k) / k.powf(1.5)
}

/// |k| at every voxel of the frequency grid, offset by `KERNEL_EPS`
pub fn spectral_radius(nx: usize, ny: usize, nz: usize) -> Vec<f64> {
    let [x, y, z] = ifftshifted_coor_matrix(nx, ny, nz);
    x.iter()
        .zip(y.iter())
        .zip(z.iter())
        .map(|((&kx, &ky), &kz)| (kx * kx + ky * ky + kz * kz).sqrt() + KERNEL_EPS)
        .collect()
}

/// OOF kernel evaluated over a precomputed spectral radius volume
pub fn oof_kernel_volume(kernel_radius: &[f64], radius: f64, sigma: f64, ntype: i32) -> Vec<f64> {
    let normalisation = oof_normalisation(radius, sigma, ntype);
    kernel_radius
        .iter()
        .map(|&k| oofftkernel_normalised(k, radius, sigma, normalisation))
        .collect()
}
