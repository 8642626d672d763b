// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Caller-owned polling loop for a single signing payload.

use std::time::Duration;

use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::gateway::{SigningGateway, SigningResult};
use super::SigningError;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1500);
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// How a wait for a payload ended.
#[derive(Debug)]
pub enum PollOutcome {
    Resolved(SigningResult),
    /// Nobody signed in time; the payload is abandoned.
    TimedOut,
    Cancelled,
}

/// Poll `uuid` every `interval` until it resolves, `timeout` elapses or
/// `cancel` fires.
///
/// Transient provider failures are retried until the deadline. Any other
/// error ends the wait.
pub async fn await_resolution(
    gateway: &SigningGateway<'_>,
    uuid: &str,
    interval: Duration,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<PollOutcome, SigningError> {
    let deadline = Instant::now() + timeout;

    loop {
        match gateway.poll(uuid).await {
            Ok(result) if result.is_resolved() => return Ok(PollOutcome::Resolved(result)),
            Ok(_) => debug!(uuid, "Awaiting signature"),
            Err(SigningError::Provider(e)) => {
                warn!(uuid, error = %e, "Signing provider poll failed, retrying")
            }
            Err(e) => return Err(e),
        }

        tokio::select! {
            _ = sleep(interval) => {},
            _ = sleep_until(deadline) => return Ok(PollOutcome::TimedOut),
            _ = cancel.cancelled() => return Ok(PollOutcome::Cancelled),
        }
    }
}
