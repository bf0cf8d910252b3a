//! Common test utilities for tubular response integration tests

#![allow(dead_code)]

use oof_wasm::fft::idx3d;

/// Bright straight cylinder along z, centred on voxel (cx, cy), in a zero background
pub fn tube_volume(nx: usize, ny: usize, nz: usize, cx: f64, cy: f64, radius: f64) -> Vec<f64> {
    let mut data = vec![0.0; nx * ny * nz];
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                let (dx, dy) = (i as f64 - cx, j as f64 - cy);
                if dx * dx + dy * dy <= radius * radius {
                    data[idx3d(i, j, k, nx, ny)] = 1.0;
                }
            }
        }
    }
    data
}

/// Distance from voxel (i, j, *) to the axis of a z-aligned tube
pub fn axis_distance(i: usize, j: usize, cx: f64, cy: f64) -> f64 {
    let (dx, dy) = (i as f64 - cx, j as f64 - cy);
    (dx * dx + dy * dy).sqrt()
}

/// Flat index of the largest absolute value
pub fn argmax_abs(data: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in data.iter().enumerate() {
        if v.abs() > data[best].abs() {
            best = i;
        }
    }
    best
}

/// Inverse of `idx3d`
pub fn unravel(idx: usize, nx: usize, ny: usize) -> (usize, usize, usize) {
    (idx % nx, (idx / nx) % ny, idx / (nx * ny))
}

/// Largest absolute value
pub fn max_abs(data: &[f64]) -> f64 {
    data.iter().fold(0.0f64, |m, v| m.max(v.abs()))
}
