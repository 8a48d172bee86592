use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecodeError {
    #[error("Truncated data: needed {needed} bytes at position {position}, only {available} available")]
    Truncated {
        position: usize,
        needed: usize,
        available: usize,
    },

    #[error("Invalid magic number {found} (expected {expected})")]
    BadMagic { expected: i32, found: i32 },

    #[error("Unsupported floating-point precision of {0} bytes")]
    InvalidPrecision(i64),

    #[error("Invalid frame size: {0}")]
    InvalidFrameSize(String),

    #[error("Compressed atom count {compressed} does not match header atom count {header}")]
    AtomCountMismatch { header: u32, compressed: i32 },

    #[error("Corrupt compressed payload: {0}")]
    CorruptPayload(String),
}
