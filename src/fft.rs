//! FFT wrapper for 3D transforms using rustfft
//!
//! Provides 3D FFT/IFFT operations compatible with NumPy's FFT conventions,
//! plus the zero-frequency-shifted coordinate grids used to build spectral
//! kernels. Uses Fortran (column-major) order indexing: axis 0 (x) has stride 1.

use num_complex::Complex64;
use rustfft::{Fft, FftDirection, FftPlanner};
use std::sync::Arc;

/// FFT workspace that caches plans and scratch buffers for reuse
///
/// One workspace serves every radius of a filter run, so plans are built once
/// per volume shape.
pub struct Fft3dWorkspace {
    nx: usize,
    ny: usize,
    nz: usize,
    n_total: usize,
    // Forward FFT plans
    fft_x: Arc<dyn Fft<f64>>,
    fft_y: Arc<dyn Fft<f64>>,
    fft_z: Arc<dyn Fft<f64>>,
    // Inverse FFT plans
    ifft_x: Arc<dyn Fft<f64>>,
    ifft_y: Arc<dyn Fft<f64>>,
    ifft_z: Arc<dyn Fft<f64>>,
    // Scratch buffers
    scratch_x: Vec<Complex64>,
    scratch_y: Vec<Complex64>,
    scratch_z: Vec<Complex64>,
    buffer_y: Vec<Complex64>,
    buffer_z: Vec<Complex64>,
}

impl Fft3dWorkspace {
    /// Create a new FFT workspace for the given dimensions
    pub fn new(nx: usize, ny: usize, nz: usize) -> Self {
        let mut planner = FftPlanner::new();

        let fft_x = planner.plan_fft(nx, FftDirection::Forward);
        let fft_y = planner.plan_fft(ny, FftDirection::Forward);
        let fft_z = planner.plan_fft(nz, FftDirection::Forward);

        let ifft_x = planner.plan_fft(nx, FftDirection::Inverse);
        let ifft_y = planner.plan_fft(ny, FftDirection::Inverse);
        let ifft_z = planner.plan_fft(nz, FftDirection::Inverse);

        let scratch_x = vec![Complex64::new(0.0, 0.0); fft_x.get_inplace_scratch_len().max(ifft_x.get_inplace_scratch_len())];
        let scratch_y = vec![Complex64::new(0.0, 0.0); fft_y.get_inplace_scratch_len().max(ifft_y.get_inplace_scratch_len())];
        let scratch_z = vec![Complex64::new(0.0, 0.0); fft_z.get_inplace_scratch_len().max(ifft_z.get_inplace_scratch_len())];

        Self {
            nx, ny, nz,
            n_total: nx * ny * nz,
            fft_x, fft_y, fft_z,
            ifft_x, ifft_y, ifft_z,
            scratch_x, scratch_y, scratch_z,
            buffer_y: vec![Complex64::new(0.0, 0.0); ny],
            buffer_z: vec![Complex64::new(0.0, 0.0); nz],
        }
    }

    /// Volume dimensions this workspace was planned for
    pub fn dims(&self) -> (usize, usize, usize) {
        (self.nx, self.ny, self.nz)
    }

    /// In-place forward 3D FFT
    pub fn fft3d(&mut self, data: &mut [Complex64]) {
        debug_assert_eq!(data.len(), self.n_total);
        for axis in 0..3 {
            self.transform_axis(data, axis, FftDirection::Forward);
        }
    }

    /// In-place inverse 3D FFT (with normalization)
    pub fn ifft3d(&mut self, data: &mut [Complex64]) {
        debug_assert_eq!(data.len(), self.n_total);
        for axis in 0..3 {
            self.transform_axis(data, axis, FftDirection::Inverse);
        }

        let n_total = self.n_total as f64;
        for val in data.iter_mut() {
            *val /= n_total;
        }
    }

    /// In-place inverse 1D FFT along a single axis, normalized by that axis' length
    ///
    /// Matches numpy.fft.ifft(data, axis=axis); applying it to axes 0, 1 and 2
    /// in turn is equivalent to `ifft3d`.
    pub fn ifft_axis(&mut self, data: &mut [Complex64], axis: usize) {
        debug_assert_eq!(data.len(), self.n_total);
        self.transform_axis(data, axis, FftDirection::Inverse);

        let n = match axis {
            0 => self.nx,
            1 => self.ny,
            _ => self.nz,
        } as f64;
        for val in data.iter_mut() {
            *val /= n;
        }
    }

    /// Forward FFT of a real volume into a new complex buffer
    pub fn fft3d_real(&mut self, data: &[f64]) -> Vec<Complex64> {
        let mut complex_data: Vec<Complex64> = data.iter()
            .map(|&x| Complex64::new(x, 0.0))
            .collect();
        self.fft3d(&mut complex_data);
        complex_data
    }

    /// Unnormalized 1D transforms along one axis
    fn transform_axis(&mut self, data: &mut [Complex64], axis: usize, direction: FftDirection) {
        let (nx, ny, nz) = (self.nx, self.ny, self.nz);
        let forward = direction == FftDirection::Forward;

        match axis {
            0 => {
                // Contiguous rows, stride 1
                let plan = if forward { &self.fft_x } else { &self.ifft_x };
                for k in 0..nz {
                    for j in 0..ny {
                        let start = idx3d(0, j, k, nx, ny);
                        plan.process_with_scratch(&mut data[start..start + nx], &mut self.scratch_x);
                    }
                }
            }
            1 => {
                // Gather along y (stride nx)
                let plan = if forward { &self.fft_y } else { &self.ifft_y };
                for k in 0..nz {
                    for i in 0..nx {
                        for j in 0..ny {
                            self.buffer_y[j] = data[idx3d(i, j, k, nx, ny)];
                        }
                        plan.process_with_scratch(&mut self.buffer_y, &mut self.scratch_y);
                        for j in 0..ny {
                            data[idx3d(i, j, k, nx, ny)] = self.buffer_y[j];
                        }
                    }
                }
            }
            _ => {
                // Gather along z (stride nx*ny)
                let plan = if forward { &self.fft_z } else { &self.ifft_z };
                for j in 0..ny {
                    for i in 0..nx {
                        for k in 0..nz {
                            self.buffer_z[k] = data[idx3d(i, j, k, nx, ny)];
                        }
                        plan.process_with_scratch(&mut self.buffer_z, &mut self.scratch_z);
                        for k in 0..nz {
                            data[idx3d(i, j, k, nx, ny)] = self.buffer_z[k];
                        }
                    }
                }
            }
        }
    }
}

/// Index into a 3D array stored in Fortran order (column-major)
/// index = x + y*nx + z*nx*ny
#[inline(always)]
pub fn idx3d(i: usize, j: usize, k: usize, nx: usize, ny: usize) -> usize {
    i + j * nx + k * nx * ny
}

/// Generate FFT frequency values for a given dimension, in cycles per voxel
/// Matches numpy.fft.fftfreq(n)
///
/// Even n: [0, 1, ..., n/2-1, -n/2, ..., -1] / n
/// Odd n:  [0, 1, ..., (n-1)/2, -(n-1)/2, ..., -1] / n
pub fn fftfreq(n: usize) -> Vec<f64> {
    let val = 1.0 / n as f64;
    // First index that wraps to a negative frequency
    let split = n - n / 2;

    (0..n)
        .map(|i| {
            if i < split {
                i as f64 * val
            } else {
                (i as i64 - n as i64) as f64 * val
            }
        })
        .collect()
}

/// Dimensionless frequency coordinate of one axis, broadcast to the full volume
///
/// Every voxel holds `fftfreq(n_axis)[index along axis]`, so products of two
/// of these volumes give the spectral cross terms `x*y`, `y*z`, ...
pub fn ifftshifted_coordinate(nx: usize, ny: usize, nz: usize, axis: usize) -> Vec<f64> {
    let n_axis = match axis {
        0 => nx,
        1 => ny,
        _ => nz,
    };
    let freq = fftfreq(n_axis);

    let mut coord = vec![0.0; nx * ny * nz];
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                let along = match axis {
                    0 => i,
                    1 => j,
                    _ => k,
                };
                coord[idx3d(i, j, k, nx, ny)] = freq[along];
            }
        }
    }
    coord
}

/// Frequency coordinate volumes for all three axes: `[x, y, z]`
pub fn ifftshifted_coor_matrix(nx: usize, ny: usize, nz: usize) -> [Vec<f64>; 3] {
    [
        ifftshifted_coordinate(nx, ny, nz, 0),
        ifftshifted_coordinate(nx, ny, nz, 1),
        ifftshifted_coordinate(nx, ny, nz, 2),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fft_ifft_roundtrip() {
        let (nx, ny, nz) = (4, 5, 6);

        let original: Vec<f64> = (0..nx * ny * nz).map(|i| (i as f64 * 0.37).sin()).collect();

        let mut ws = Fft3dWorkspace::new(nx, ny, nz);
        let mut data = ws.fft3d_real(&original);
        ws.ifft3d(&mut data);

        for (i, (&orig, result)) in original.iter().zip(data.iter()).enumerate() {
            assert!(
                (result.re - orig).abs() < 1e-10,
                "Mismatch at index {}: expected {}, got {}",
                i, orig, result.re
            );
            assert!(
                result.im.abs() < 1e-10,
                "Imaginary part not zero at index {}: {}",
                i, result.im
            );
        }
    }

    #[test]
    fn test_ifft_axis_composes_to_ifft3d() {
        let (nx, ny, nz) = (6, 4, 5);
        let signal: Vec<f64> = (0..nx * ny * nz).map(|i| ((i * 7) % 11) as f64 - 5.0).collect();

        let mut ws = Fft3dWorkspace::new(nx, ny, nz);
        let spectrum = ws.fft3d_real(&signal);

        let mut full = spectrum.clone();
        ws.ifft3d(&mut full);

        let mut per_axis = spectrum;
        ws.ifft_axis(&mut per_axis, 0);
        ws.ifft_axis(&mut per_axis, 1);
        ws.ifft_axis(&mut per_axis, 2);

        for (i, (a, b)) in full.iter().zip(per_axis.iter()).enumerate() {
            assert!((a - b).norm() < 1e-10, "Per-axis inverse differs at {}: {} vs {}", i, a, b);
        }
    }

    #[test]
    fn test_fft_dc_component() {
        let (nx, ny, nz) = (3, 3, 3);
        let mut ws = Fft3dWorkspace::new(nx, ny, nz);
        let spectrum = ws.fft3d_real(&vec![2.0; nx * ny * nz]);

        assert!((spectrum[0].re - 54.0).abs() < 1e-10, "DC should be the sum, got {}", spectrum[0]);
        for c in &spectrum[1..] {
            assert!(c.norm() < 1e-10, "Non-DC bins of a constant should vanish, got {}", c);
        }
    }

    #[test]
    fn test_fftfreq() {
        // Test even n=4
        let freq = fftfreq(4);
        assert!((freq[0] - 0.0).abs() < 1e-10);
        assert!((freq[1] - 0.25).abs() < 1e-10);
        assert!((freq[2] - (-0.5)).abs() < 1e-10);
        assert!((freq[3] - (-0.25)).abs() < 1e-10);

        // Test odd n=5
        let freq = fftfreq(5);
        assert!((freq[0] - 0.0).abs() < 1e-10);
        assert!((freq[1] - 0.2).abs() < 1e-10);
        assert!((freq[2] - 0.4).abs() < 1e-10);
        assert!((freq[3] - (-0.4)).abs() < 1e-10);
        assert!((freq[4] - (-0.2)).abs() < 1e-10);
    }

    #[test]
    fn test_ifftshifted_coordinate_broadcast() {
        let (nx, ny, nz) = (4, 3, 2);
        let y = ifftshifted_coordinate(nx, ny, nz, 1);
        assert_eq!(y.len(), nx * ny * nz);

        let freq = fftfreq(ny);
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    assert_eq!(y[idx3d(i, j, k, nx, ny)], freq[j]);
                }
            }
        }
    }

    #[test]
    fn test_ifftshifted_coor_matrix_matches_single_axis() {
        let (nx, ny, nz) = (5, 4, 6);
        let [x, y, z] = ifftshifted_coor_matrix(nx, ny, nz);

        assert_eq!(x, ifftshifted_coordinate(nx, ny, nz, 0));
        assert_eq!(y, ifftshifted_coordinate(nx, ny, nz, 1));
        assert_eq!(z, ifftshifted_coordinate(nx, ny, nz, 2));

        // Origin is the zero frequency, last voxel is the most negative-adjacent one
        assert_eq!(x[0], 0.0);
        assert!((z[idx3d(0, 0, nz - 1, nx, ny)] - (-1.0 / 6.0)).abs() < 1e-12);
        assert!((x[idx3d(3, 0, 0, nx, ny)] - (-0.4)).abs() < 1e-12);
    }
}
