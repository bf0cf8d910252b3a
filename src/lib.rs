//! OOF-WASM: tubular structure detection in 3D volumes
//!
//! Multi-scale medialness filters for vessel-like structures, usable as a Rust
//! library and compiled to WebAssembly for in-browser processing.
//!
//! # Modules
//! - `fft`: 3D FFT operations using rustfft, frequency coordinate grids
//! - `kernels`: Bi-Gaussian and Optimally Oriented Flux kernels
//! - `tensor`: Per-radius tensor field generators
//! - `filters`: Bi-Gaussian and OOF responses
//! - `utils`: Finite differences and 3x3 symmetric eigen solvers
//! - `error`: Crate error type

// Core modules
pub mod error;
pub mod fft;

// Algorithm modules
pub mod kernels;
pub mod tensor;
pub mod filters;
pub mod utils;

pub use error::OofError;
pub use filters::{
    bg_response, bg_response_with_progress, oof_response, oof_response_with_progress,
    BgParams, OofParams, ResponseVolume,
};
pub use tensor::{bg_tensor, oof_tensor, TensorField};
pub use utils::eigen::{eigsparse3, eigval33, EigenTriple, SparseEigen};

use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    fn log(s: &str);
}

#[allow(unused_macros)]
macro_rules! console_log {
    ($($t:tt)*) => (log(&format_args!($($t)*).to_string()))
}

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn to_js_error(err: OofError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Flatten a response as `[response..., scale...]`
fn flatten_response(result: ResponseVolume) -> Vec<f64> {
    let mut out = result.response;
    out.extend(result.scale);
    out
}

fn js_progress(callback: &js_sys::Function) -> impl FnMut(usize, usize) + '_ {
    move |current, total| {
        let this = JsValue::null();
        let _ = callback.call2(&this,
            &JsValue::from(current as u32),
            &JsValue::from(total as u32));
    }
}

// ============================================================================
// WASM Exports: Optimally Oriented Flux
// ============================================================================

/// WASM-accessible OOF response
///
/// # Arguments
/// * `image` - Float64Array volume (nx * ny * nz)
/// * `nx`, `ny`, `nz` - Array dimensions
/// * `radii` - Ball radii in voxels
/// * `memory_save` - Invert one tensor component at a time
/// * `sigma` - Kernel smoothing width (1.0 by default)
/// * `ntype` - Radius normalisation exponent (1 by default)
///
/// # Returns
/// Response (nx * ny * nz) followed by the winning radius per voxel (nx * ny * nz)
#[wasm_bindgen]
#[allow(clippy::too_many_arguments)]
pub fn oof_response_wasm(
    image: &[f64],
    nx: usize, ny: usize, nz: usize,
    radii: &[f64],
    memory_save: bool,
    sigma: f64,
    ntype: i32,
) -> Result<Vec<f64>, JsValue> {
    console_log!("WASM OOF: {}x{}x{}, {} radii, memory_save={}", nx, ny, nz, radii.len(), memory_save);

    let params = OofParams { radii: radii.to_vec(), memory_save, sigma, ntype };
    let result = filters::oof_response(image, nx, ny, nz, &params).map_err(to_js_error)?;

    console_log!("WASM OOF complete");
    Ok(flatten_response(result))
}

/// OOF response with progress callback
#[wasm_bindgen]
#[allow(clippy::too_many_arguments)]
pub fn oof_response_wasm_with_progress(
    image: &[f64],
    nx: usize, ny: usize, nz: usize,
    radii: &[f64],
    memory_save: bool,
    sigma: f64,
    ntype: i32,
    progress_callback: &js_sys::Function,
) -> Result<Vec<f64>, JsValue> {
    console_log!("WASM OOF with progress: {}x{}x{}, {} radii", nx, ny, nz, radii.len());

    let params = OofParams { radii: radii.to_vec(), memory_save, sigma, ntype };
    let result = filters::oof_response_with_progress(
        image, nx, ny, nz, &params, js_progress(progress_callback),
    ).map_err(to_js_error)?;

    console_log!("WASM OOF complete");
    Ok(flatten_response(result))
}

// ============================================================================
// WASM Exports: Bi-Gaussian
// ============================================================================

/// WASM-accessible bi-Gaussian response
///
/// # Arguments
/// * `image` - Float64Array volume (nx * ny * nz)
/// * `nx`, `ny`, `nz` - Array dimensions
/// * `radii` - Foreground Gaussian widths in voxels
/// * `rho` - Background to foreground width ratio (0.2 by default)
///
/// # Returns
/// Response (nx * ny * nz) followed by the winning radius per voxel (nx * ny * nz)
#[wasm_bindgen]
pub fn bg_response_wasm(
    image: &[f64],
    nx: usize, ny: usize, nz: usize,
    radii: &[f64],
    rho: f64,
) -> Result<Vec<f64>, JsValue> {
    console_log!("WASM bi-Gaussian: {}x{}x{}, {} radii, rho={:.3}", nx, ny, nz, radii.len(), rho);

    let params = BgParams { radii: radii.to_vec(), rho };
    let result = filters::bg_response(image, nx, ny, nz, &params).map_err(to_js_error)?;

    console_log!("WASM bi-Gaussian complete");
    Ok(flatten_response(result))
}

/// Bi-Gaussian response with progress callback
#[wasm_bindgen]
pub fn bg_response_wasm_with_progress(
    image: &[f64],
    nx: usize, ny: usize, nz: usize,
    radii: &[f64],
    rho: f64,
    progress_callback: &js_sys::Function,
) -> Result<Vec<f64>, JsValue> {
    console_log!("WASM bi-Gaussian with progress: {}x{}x{}, {} radii", nx, ny, nz, radii.len());

    let params = BgParams { radii: radii.to_vec(), rho };
    let result = filters::bg_response_with_progress(
        image, nx, ny, nz, &params, js_progress(progress_callback),
    ).map_err(to_js_error)?;

    console_log!("WASM bi-Gaussian complete");
    Ok(flatten_response(result))
}

// ============================================================================
// WASM Exports: Utilities
// ============================================================================

/// Closed-form eigenvalues of a symmetric tensor field
///
/// # Arguments
/// * `components` - f11, f12, f13, f22, f23, f33 concatenated (6 * nx * ny * nz)
///
/// # Returns
/// e1, e2, e3 concatenated (3 * nx * ny * nz), in solver order
#[wasm_bindgen]
pub fn eigval33_wasm(
    components: &[f64],
    nx: usize, ny: usize, nz: usize,
) -> Result<Vec<f64>, JsValue> {
    let n_total = nx * ny * nz;
    error::check_len(components.len(), 6 * nx, ny, nz).map_err(to_js_error)?;

    let [f11, f12, f13, f22, f23, f33] = [0, 1, 2, 3, 4, 5]
        .map(|c| components[c * n_total..(c + 1) * n_total].to_vec());
    let field = TensorField::new([f11, f12, f13, f22, f23, f33], nx, ny, nz).map_err(to_js_error)?;
    let eig = eigval33(&field).map_err(to_js_error)?;

    let mut result = Vec::with_capacity(3 * n_total);
    result.extend(eig.e1);
    result.extend(eig.e2);
    result.extend(eig.e3);
    Ok(result)
}

/// Get version string
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

// ============================================================================
// Tests
// ============================================================================
