//! Numerical helpers shared by the tensor generators and filters
//!
//! - Gradient and Hessian operators (numpy.gradient conventions)
//! - Eigenvalues of symmetric 3x3 tensor fields (closed form and exact sparse)

pub mod gradient;
pub mod eigen;

pub use gradient::*;
pub use eigen::*;
