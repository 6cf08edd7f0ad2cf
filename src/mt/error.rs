//! Error type for the multi-threaded driver.
//!
//! Follows the same pattern `frame::types::Lz4FError` already uses in this
//! crate: a plain enum with `Display`/`Error` impls, no `anyhow`/`thiserror`
//! (those are CLI-argument-parsing glue, dropped along with the CLI — see
//! `SPEC_FULL.md`'s Non-goals).

use core::fmt;

use crate::frame::types::Lz4FError;

/// Errors surfaced by `mt::`'s public entry points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MtError {
    /// A pool or scratch allocation failed.
    MemoryAllocation,
    /// Caller-supplied destination buffer is smaller than `compress_bound`
    /// (or the frame bound) requires.
    DstSizeTooSmall,
    /// A requested parameter combination is not supported by this driver
    /// (e.g. an `overlap_log` or `job_size` outside its valid range after
    /// normalization still reached a code path that assumes it's in range).
    ParameterUnsupported,
    /// A streaming call was made while the context was in the wrong stage
    /// (e.g. `compress_stream` before `init_c_stream`).
    StageWrong,
    /// A dictionary/cdict argument was invalid for the requested operation.
    DictionaryWrong,
    /// Wraps any error surfaced by the underlying single-threaded collaborator.
    Frame(Lz4FError),
}

impl fmt::Display for MtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MtError::MemoryAllocation => write!(f, "allocation failed"),
            MtError::DstSizeTooSmall => write!(f, "destination buffer too small"),
            MtError::ParameterUnsupported => write!(f, "unsupported parameter"),
            MtError::StageWrong => write!(f, "operation called in the wrong stage"),
            MtError::DictionaryWrong => write!(f, "invalid dictionary"),
            MtError::Frame(e) => write!(f, "frame error: {e}"),
        }
    }
}

impl std::error::Error for MtError {}

impl From<Lz4FError> for MtError {
    fn from(e: Lz4FError) -> Self {
        MtError::Frame(e)
    }
}

pub type MtResult<T> = Result<T, MtError>;
