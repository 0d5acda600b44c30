use thiserror::Error;

/// Errors produced while decoding primitive wire values.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PrimitiveError {
    #[error("buffer underrun at offset {offset} reading {context}: need {needed} bytes, {available} available")]
    BufferUnderrun {
        offset: usize,
        needed: usize,
        available: usize,
        context: &'static str,
    },

    #[error("invalid {context} encoding at offset {offset}: {reason}")]
    InvalidEncoding {
        offset: usize,
        context: &'static str,
        reason: String,
    },
}

impl PrimitiveError {
    /// Byte offset at which the failing read started.
    pub fn offset(&self) -> usize {
        match self {
            Self::BufferUnderrun { offset, .. } | Self::InvalidEncoding { offset, .. } => *offset,
        }
    }
}

pub type PrimitiveResult<T> = Result<T, PrimitiveError>;
