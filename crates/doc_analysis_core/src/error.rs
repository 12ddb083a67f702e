//! crates/doc_analysis_core/src/error.rs
//!
//! The error type returned by the pipeline operations.

use crate::ports::PortError;
use crate::upload::ValidationError;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The upload was refused before any state changed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// An error that propagated up from one of the ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    #[error("{0} not found: {1}")]
    NotFound(&'static str, Uuid),

    #[error("No document is currently selected")]
    NoCurrentDocument,

    /// The same kind of operation is already in flight.
    #[error("{0} is already in progress")]
    Busy(&'static str),

    #[error("The operation was cancelled")]
    Cancelled,

    #[error("{0} must not be empty")]
    EmptyInput(&'static str),
}

pub type CoreResult<T> = Result<T, CoreError>;
