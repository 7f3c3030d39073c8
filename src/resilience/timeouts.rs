//! Timeout enforcement.
//!
//! Every outbound probe attempt gets a deadline. Timeout errors stay
//! distinct from transport errors so they can be reported as such.

use std::future::Future;
use std::time::Duration;
use tokio::time;

use crate::probe::ProbeError;

/// Run `fut` with a deadline, mapping expiry to [`ProbeError::Timeout`].
pub async fn with_timeout<F, T>(timeout: Duration, fut: F) -> Result<T, ProbeError>
where
    F: Future<Output = Result<T, ProbeError>>,
{
    match time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(ProbeError::Timeout(timeout)),
    }
}
