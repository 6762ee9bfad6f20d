use thiserror::Error;

use crate::constants::ENOSYS;

/// Failure of [`OffloadPreparer::prepare`](crate::OffloadPreparer::prepare).
///
/// On `NestedEncapsulation` the packet has already been released; callers
/// must treat it as gone.
#[derive(Debug, Error)]
pub enum PrepareError<E> {
    #[error("nested UDP tunnel segmentation is not supported")]
    NestedEncapsulation,
    #[error(transparent)]
    Engine(E),
}

impl<E> PrepareError<E> {
    /// Kernel-style reason code for drop accounting. Engine errors carry their own.
    pub fn errno(&self) -> Option<i32> {
        match self {
            PrepareError::NestedEncapsulation => Some(ENOSYS),
            PrepareError::Engine(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HeaderError {
    #[error("header truncated: need {needed} bytes, have {have} bytes")]
    Truncated { needed: usize, have: usize },
}
