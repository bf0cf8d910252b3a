//! Bi-Gaussian kernel
//!
//! A radially symmetric kernel whose core (distance <= sigma) is a Gaussian of
//! width `sigma` and whose tail is a Gaussian of width `rho * sigma`, scaled by
//! `rho^2` and centred at `sigma - rho * sigma`. The tail is offset so both
//! pieces meet at the boundary sphere, which also makes the slopes agree there.
//!
//! Reference:
//! Xiao C, et al. Bi-Gaussian filtering for tubular structure detection.
//! Medical Image Analysis. 2013.

use crate::error::OofError;
use crate::fft::idx3d;

/// Gaussian density of mean `mu` and standard deviation `sigma` at `dist`
#[inline]
pub fn gkern3(dist: f64, mu: f64, sigma: f64) -> f64 {
    let z = (dist - mu) / sigma;
    (-0.5 * z * z).exp() / (sigma * (2.0 * std::f64::consts::PI).sqrt())
}

/// Side length of the cubic bi-Gaussian kernel for a given sigma
pub fn bg_kernel_len(sigma: f64) -> usize {
    sigma.ceil() as usize * 6 + 1
}

/// Largest kernel side accepted by `bg_kernel_volume` (sigma up to 85)
pub const MAX_KERNEL_LEN: usize = 511;

/// Radial profile with the tail offset precomputed
fn profile_fn(sigma: f64, rho: f64) -> impl Fn(f64) -> f64 {
    let sigma_b = rho * sigma;
    let k = rho * rho;
    let mu_b = sigma - sigma_b;

    // Offset lifting the tail onto the core at the boundary sphere
    let offset = gkern3(sigma, 0.0, sigma) - k * gkern3(sigma, mu_b, sigma_b);

    move |dist| {
        // Central sphere keeps the pure foreground Gaussian
        if dist <= sigma {
            gkern3(dist, 0.0, sigma)
        } else {
            k * gkern3(dist, mu_b, sigma_b) + offset
        }
    }
}

/// Radial profile sampled by `bgkern3`
///
/// Core: `G(d)`. Tail: `rho^2 * Gb(d) + c`, where `c` closes the gap between
/// the two pieces at `d = sigma`.
pub fn bigaussian_profile(dist: f64, sigma: f64, rho: f64) -> f64 {
    profile_fn(sigma, rho)(dist)
}

/// Generate a cubic bi-Gaussian kernel of side `kerlen`
///
/// The kernel centre sits at index `(kerlen - 1) / 2` on every axis; storage is
/// Fortran order.
///
/// # Arguments
/// * `kerlen` - Odd side length, normally `bg_kernel_len(sigma)`
/// * `sigma` - Width of the foreground Gaussian
/// * `rho` - Ratio of background to foreground width
pub fn bgkern3(kerlen: usize, sigma: f64, rho: f64) -> Vec<f64> {
    let profile = profile_fn(sigma, rho);
    let kr = (kerlen as f64 - 1.0) / 2.0;

    let mut kernel = vec![0.0; kerlen * kerlen * kerlen];
    for c in 0..kerlen {
        let z = c as f64 - kr;
        for b in 0..kerlen {
            let y = b as f64 - kr;
            for a in 0..kerlen {
                let x = a as f64 - kr;
                kernel[idx3d(a, b, c, kerlen, kerlen)] = profile((x * x + y * y + z * z).sqrt());
            }
        }
    }

    kernel
}

/// Bi-Gaussian kernel wrapped into an image-sized volume, centred at (0, 0, 0)
///
/// Taps are placed modulo the volume shape, so a kernel wider than the image is
/// folded onto it and the product with the image spectrum is an exact circular
/// convolution.
///
/// # Errors
/// `KernelConstructionFailure` when the kernel side exceeds `MAX_KERNEL_LEN`
/// or a value is non-finite.
pub fn bg_kernel_volume(
    nx: usize, ny: usize, nz: usize,
    sigma: f64, rho: f64,
) -> Result<Vec<f64>, OofError> {
    if sigma.ceil() * 6.0 + 1.0 > MAX_KERNEL_LEN as f64 {
        return Err(OofError::KernelConstructionFailure {
            radius: sigma,
            reason: format!("kernel side exceeds {}", MAX_KERNEL_LEN),
        });
    }

    let kerlen = bg_kernel_len(sigma);
    let kr = (kerlen - 1) / 2;
    let profile = profile_fn(sigma, rho);

    // Signed offset and wrapped volume position of every tap along one axis
    let taps = |n: usize| -> Vec<(f64, usize)> {
        (0..kerlen)
            .map(|t| ((t as f64 - kr as f64), (t % n + n - kr % n) % n))
            .collect()
    };
    let (tx, ty, tz) = (taps(nx), taps(ny), taps(nz));

    let mut volume = vec![0.0; nx * ny * nz];
    for &(z, k) in &tz {
        for &(y, j) in &ty {
            for &(x, i) in &tx {
                let value = profile((x * x + y * y + z * z).sqrt());
                if !value.is_finite() {
                    return Err(OofError::KernelConstructionFailure {
                        radius: sigma,
                        reason: "kernel contains non-finite values".to_string(),
                    });
                }
                volume[idx3d(i, j, k, nx, ny)] += value;
            }
        }
    }

    Ok(volume)
}
