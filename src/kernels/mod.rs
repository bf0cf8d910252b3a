//! Convolution kernels for tubular structure detection
//!
//! This module provides the two kernel families scanned over radii:
//! - Bi-Gaussian kernel, built in image space and transformed per radius
//! - Optimally Oriented Flux kernel, evaluated in closed form in k-space

pub mod bigaussian;
pub mod oof;

pub use bigaussian::*;
pub use oof::*;
