//! Error type shared by the tensor generators and response filters

use thiserror::Error;

/// Failures raised at the API boundary or while building a radius' kernel
#[derive(Clone, Debug, PartialEq, Error)]
pub enum OofError {
    /// A volume does not have `nx * ny * nz` samples, or two volumes disagree
    #[error("shape mismatch: expected {expected} samples, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    /// Building or transforming the kernel for one radius failed; the run is aborted
    #[error("failed to construct kernel for radius {radius}: {reason}")]
    KernelConstructionFailure { radius: f64, reason: String },
}

/// Check that a flat volume holds exactly `nx * ny * nz` samples
pub fn check_len(len: usize, nx: usize, ny: usize, nz: usize) -> Result<(), OofError> {
    let expected = nx * ny * nz;
    if len != expected {
        return Err(OofError::ShapeMismatch { expected, actual: len });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_len() {
        assert!(check_len(24, 2, 3, 4).is_ok());
        assert_eq!(
            check_len(23, 2, 3, 4),
            Err(OofError::ShapeMismatch { expected: 24, actual: 23 })
        );
    }

    #[test]
    fn test_error_messages() {
        let err = OofError::InvalidParameter("radius must be positive".to_string());
        assert_eq!(err.to_string(), "invalid parameter: radius must be positive");

        let err = OofError::KernelConstructionFailure { radius: 2.5, reason: "too large".to_string() };
        assert!(err.to_string().contains("radius 2.5"), "unexpected message: {}", err);
    }
}
