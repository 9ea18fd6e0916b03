//! Error types for stack probing and region lookup

use thiserror::Error;

/// Errors raised by the library side of stackprobe
///
/// Reading the register itself cannot fail; these cover the best-effort
/// stack region lookup and parsing of printed values.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Invalid stack region: low 0x{low:x} must be below high 0x{high:x}")]
    InvalidRegion { low: usize, high: usize },

    #[error("Stack pointer {samples} outside thread stack [0x{low:x}, 0x{high:x})")]
    OutsideRegion {
        samples: String,
        low: usize,
        high: usize,
    },

    #[error("Stack region unavailable: {0}")]
    RegionUnavailable(String),

    #[error("Invalid stack pointer {input:?}: {reason}")]
    ParseStackPointer { input: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ProbeError>;
