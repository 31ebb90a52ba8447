//! Polling a resource until it settles into a target provisioning state.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tracing::debug;

use crate::client::ClientError;
use crate::models::provisioning_state;

/// Why waiting for a state failed.
#[derive(Debug, Error)]
pub enum PollError {
    /// The target state was not reached in time.
    #[error("timeout after {waited:?} while waiting for state to become target (last state: {last_state:?})")]
    Timeout {
        /// How long we waited.
        waited: Duration,
        /// The last state observed, if any.
        last_state: Option<String>,
    },

    /// The resource reported a state that is neither pending nor target.
    #[error("unexpected state {state:?}, wanted target {expected:?}")]
    UnexpectedState {
        /// The observed state.
        state: String,
        /// The target states.
        expected: Vec<String>,
    },

    /// The resource did not report a state at all.
    #[error("unable to read provisioning state")]
    MissingState,

    /// Refreshing the resource failed.
    #[error("refreshing state: {0}")]
    Refresh(ClientError),
}

/// Pending and target states plus timing for [`wait_for_state`].
#[derive(Debug, Clone)]
pub struct StateChangeConf {
    /// States that mean "keep waiting".
    pub pending: Vec<String>,
    /// States that mean "done".
    pub target: Vec<String>,
    /// Delay between refreshes.
    pub interval: Duration,
    /// Give up after this long.
    pub timeout: Duration,
    /// Number of consecutive target observations required.
    pub continuous_target_occurrence: u32,
}

impl StateChangeConf {
    /// Waits for a SignalR service to report `Succeeded`.
    pub fn provisioning(interval: Duration, timeout: Duration, continuous_target_occurrence: u32) -> Self {
        Self {
            pending: [
                provisioning_state::UPDATING,
                provisioning_state::CREATING,
                provisioning_state::MOVING,
                provisioning_state::RUNNING,
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            target: vec![provisioning_state::SUCCEEDED.to_string()],
            interval,
            timeout,
            continuous_target_occurrence: continuous_target_occurrence.max(1),
        }
    }
}

/// Call `refresh` until it reports a target state `continuous_target_occurrence`
/// times in a row, returning that state.
///
/// `refresh` yields `Ok(None)` when the resource has no state to report. A
/// pending state in between target observations resets the count.
pub async fn wait_for_state<F, Fut>(conf: &StateChangeConf, mut refresh: F) -> Result<String, PollError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<String>, ClientError>>,
{
    let started = Instant::now();
    let mut last_state: Option<String> = None;

    let outcome = tokio::time::timeout(
        conf.timeout,
        poll_until_target(conf, &mut refresh, &mut last_state),
    )
    .await;

    match outcome {
        Ok(result) => result,
        Err(_) => Err(PollError::Timeout {
            waited: started.elapsed(),
            last_state,
        }),
    }
}

async fn poll_until_target<F, Fut>(
    conf: &StateChangeConf,
    refresh: &mut F,
    last_state: &mut Option<String>,
) -> Result<String, PollError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<String>, ClientError>>,
{
    let required = conf.continuous_target_occurrence.max(1);
    let mut target_count = 0u32;

    loop {
        let state = refresh()
            .await
            .map_err(PollError::Refresh)?
            .ok_or(PollError::MissingState)?;
        *last_state = Some(state.clone());

        if conf.target.contains(&state) {
            target_count += 1;
            debug!(state = %state, target_count, required, "observed target state");
            if target_count >= required {
                return Ok(state);
            }
        } else if conf.pending.contains(&state) {
            target_count = 0;
            debug!(state = %state, "waiting on pending state");
        } else {
            return Err(PollError::UnexpectedState {
                state,
                expected: conf.target.clone(),
            });
        }

        tokio::time::sleep(conf.interval).await;
    }
}
