pub mod scalar;

// Re-export types for convenience.
pub use crate::types::scalar::Scalar;
