//! Errors surfaced by the RGA mutators and by replicas admitting messages.

use thiserror::Error;

/// Hard failures of the core. Every other unmet precondition yields "no
/// operation" instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RgaError {
    #[error("nothing at position {position} (live length {len})")]
    OutOfRange { position: usize, len: usize },
    /// A message carried an id too close to the end of the counter space.
    #[error("vertex id counter {counter} is out of range")]
    CounterOutOfRange { counter: u64 },
}
