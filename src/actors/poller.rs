//! PollerActor - serializes poll cycles
//!
//! ## Message Flow
//!
//! ```text
//! Timer tick ──────────────┐
//!                          ├──► HealthPoller::run_cycle ──► (reply on oneshot for RunCycle)
//! RunCycle { channels } ───┘
//!     ↑
//!     └─── Commands (RunCycle, UpdateInterval, Shutdown)
//! ```
//!
//! Timer-driven cycles use the stored alert settings of the configured user;
//! requested cycles use the channels sent along with the command.

use std::time::Duration;

use anyhow::Result;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Interval, MissedTickBehavior, interval};
use tracing::{debug, error, instrument, warn};

use crate::poller::{HealthPoller, ProbeOutcome};
use crate::storage::schema::AlertChannelConfig;

use super::messages::PollerCommand;

/// Period used for the idle ticker while the timer is disabled
const IDLE_PERIOD: Duration = Duration::from_secs(3600);

/// Actor owning the health poller
pub struct PollerActor {
    poller: HealthPoller,

    /// User whose alert settings timer-driven cycles dispatch to
    user_id: i64,

    /// Command receiver for control messages
    command_rx: mpsc::Receiver<PollerCommand>,

    /// Current timer period, `None` when cycles only run on request
    interval_duration: Option<Duration>,
}

fn ticker_for(period: Option<Duration>) -> Interval {
    let mut ticker = interval(period.unwrap_or(IDLE_PERIOD));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

impl PollerActor {
    pub fn new(
        poller: HealthPoller,
        user_id: i64,
        command_rx: mpsc::Receiver<PollerCommand>,
        interval_duration: Option<Duration>,
    ) -> Self {
        Self {
            poller,
            user_id,
            command_rx,
            interval_duration,
        }
    }

    /// Run the actor's main loop
    ///
    /// This is the entry point for the actor. It runs until:
    /// - A Shutdown command is received
    /// - The command channel is closed
    #[instrument(skip(self), fields(user_id = self.user_id))]
    pub async fn run(mut self) {
        debug!("starting poller actor");

        let mut ticker = ticker_for(self.interval_duration);

        loop {
            tokio::select! {
                // Timer tick - run a cycle with the stored settings
                _ = ticker.tick(), if self.interval_duration.is_some() => {
                    self.timer_cycle().await;
                }

                cmd = self.command_rx.recv() => {
                    let Some(cmd) = cmd else {
                        warn!("command channel closed, shutting down");
                        break;
                    };

                    match cmd {
                        PollerCommand::RunCycle { channels, respond_to } => {
                            debug!("received RunCycle command");
                            let result = self.poller.run_cycle(&channels).await;
                            let _ = respond_to.send(result);
                        }

                        PollerCommand::UpdateInterval { interval_secs } => {
                            debug!("updating interval to {interval_secs:?}s");
                            self.interval_duration =
                                interval_secs.filter(|&s| s > 0).map(Duration::from_secs);
                            ticker = ticker_for(self.interval_duration);
                        }

                        PollerCommand::Shutdown => {
                            debug!("received shutdown command");
                            break;
                        }
                    }
                }
            }
        }

        debug!("poller actor stopped");
    }

    async fn timer_cycle(&self) {
        let channels = match self.poller.storage().channel_config(self.user_id).await {
            Ok(channels) => channels,
            Err(e) => {
                error!("failed to load alert settings, alerts disabled for this cycle: {e}");
                AlertChannelConfig::disabled()
            }
        };

        match self.poller.run_cycle(&channels).await {
            Ok(outcomes) => debug!("timer cycle checked {} services", outcomes.len()),
            Err(e) => error!("poll cycle failed: {e:#}"),
        }
    }
}

/// Handle for controlling the PollerActor
#[derive(Clone)]
pub struct PollerHandle {
    sender: mpsc::Sender<PollerCommand>,
}

impl PollerHandle {
    /// Spawn a new poller actor
    ///
    /// With `interval` set, the actor also runs a cycle right away and then
    /// once per period.
    pub fn spawn(poller: HealthPoller, user_id: i64, interval: Option<Duration>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);

        let actor = PollerActor::new(poller, user_id, cmd_rx, interval);

        tokio::spawn(actor.run());

        Self { sender: cmd_tx }
    }

    /// Run a cycle, waiting behind any cycle already in progress
    pub async fn run_cycle(&self, channels: AlertChannelConfig) -> Result<Vec<ProbeOutcome>> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(PollerCommand::RunCycle {
                channels,
                respond_to: tx,
            })
            .await?;

        rx.await?
    }

    /// Update the timer period; `None` or 0 disables the timer
    pub async fn update_interval(&self, interval_secs: Option<u64>) -> Result<()> {
        self.sender
            .send(PollerCommand::UpdateInterval { interval_secs })
            .await?;
        Ok(())
    }

    /// Shut down the poller
    pub async fn shutdown(&self) {
        let _ = self.sender.send(PollerCommand::Shutdown).await;
    }
}
