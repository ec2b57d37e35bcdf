//! Message types for actor communication

use tokio::sync::oneshot;

use crate::poller::ProbeOutcome;
use crate::storage::schema::AlertChannelConfig;

/// Commands that can be sent to the PollerActor
#[derive(Debug)]
pub enum PollerCommand {
    /// Run one cycle now and reply with its outcome
    ///
    /// Queued behind any cycle already in progress.
    RunCycle {
        /// Channels that "Service Down" alerts of this cycle go to
        channels: AlertChannelConfig,

        /// Channel to send the result back
        respond_to: oneshot::Sender<anyhow::Result<Vec<ProbeOutcome>>>,
    },

    /// Change the timer period
    ///
    /// `None` stops timer-driven cycles; requested cycles keep working.
    UpdateInterval { interval_secs: Option<u64> },

    /// Gracefully shut down the poller
    ///
    /// The actor will finish any in-flight cycle and then exit.
    Shutdown,
}
