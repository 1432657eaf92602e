pub mod error;
pub mod types;

#[cfg(feature = "valuation")]
pub mod valuation;

#[cfg(feature = "acquisition")]
pub mod acquisition;

pub use error::IntrinsicError;
pub use types::*;

/// Standard result type for all intrinsic-value operations
pub type IntrinsicResult<T> = Result<T, IntrinsicError>;
