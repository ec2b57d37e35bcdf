//! Actor-based scheduling of poll cycles
//!
//! Poll cycles run inside a single actor task that owns the [`HealthPoller`]
//! and consumes commands from one mpsc queue. Because there is exactly one
//! consumer, cycles never overlap, whether they are requested by the API
//! (pull) or fired by the actor's own timer (push).
//!
//! ```text
//!   GET /api/services ──┐
//!                       ├──► mpsc ──► PollerActor ──► HealthPoller::run_cycle
//!   interval timer ─────┘                  │
//!                                          └──► oneshot reply (pull only)
//! ```
//!
//! ## Communication Patterns
//!
//! 1. **Commands**: the actor has an mpsc command channel for control messages
//! 2. **Request/Response**: oneshot channels carry cycle results back
//!
//! [`HealthPoller`]: crate::poller::HealthPoller

pub mod messages;
pub mod poller;

pub use poller::PollerHandle;
