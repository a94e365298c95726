//! Cancellation propagation: "invoking `cancel()` on any
//! stage propagates `markAsDone` upstream and `onError(Cancelled)`
//! downstream." [`tokio_util::sync::CancellationToken`] gives the same
//! shape natively: a child token observes the parent's cancellation, and
//! every pipeline stage below selects on it alongside its I/O.

pub use tokio_util::sync::CancellationToken;

use crate::error::{PipelineError, PipelineResult};

/// Returns `Err(Cancelled)` if `token` has fired, otherwise `Ok(())`. Stages
/// call this at each loop iteration so cancellation is observed promptly
/// even mid-stream, without requiring every I/O call to be cancel-aware.
pub fn check(token: &CancellationToken) -> PipelineResult<()> {
    if token.is_cancelled() {
        Err(PipelineError::Cancelled)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_passes_before_cancellation() {
        let token = CancellationToken::new();
        assert!(check(&token).is_ok());
    }

    #[test]
    fn check_fails_after_cancellation() {
        let token = CancellationToken::new();
        token.cancel();
        assert!(matches!(check(&token), Err(PipelineError::Cancelled)));
    }
}
