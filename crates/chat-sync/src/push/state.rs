//! Push channel connection state machine.
//!
//! Transport-free: every method takes an event and returns the action the
//! driver must perform. Each transport attempt and each retry timer carries
//! the epoch that was current when it was started; events from an older
//! epoch are ignored, so a late socket callback or a timer that outlived a
//! `disconnect()` can never move the machine.

use super::backoff::{ReconnectPolicy, RetryDecision};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Connecting,
    Open,
    Reconnecting,
    Closed,
}

/// Observable snapshot of one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionState {
    pub phase: Phase,
    /// Retries made since the last successful open.
    pub attempt: u32,
    pub last_opened_at: Option<Instant>,
}

/// What the driver has to do after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Open a transport for this epoch.
    Open { epoch: u64 },
    /// Arm a retry timer for this epoch.
    ScheduleRetry { epoch: u64, delay: Duration },
    /// Retries are exhausted; the machine is now `Closed`.
    GiveUp { attempts: u32 },
    /// Cancel timers and drop the transport; the machine is now `Closed`.
    Shutdown,
}

#[derive(Debug)]
pub struct ConnectionMachine {
    policy: ReconnectPolicy,
    state: ConnectionState,
    epoch: u64,
}

impl ConnectionMachine {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            state: ConnectionState {
                phase: Phase::Idle,
                attempt: 0,
                last_opened_at: None,
            },
            epoch: 0,
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Whether `epoch` still owns the channel.
    pub fn is_current(&self, epoch: u64) -> bool {
        self.epoch == epoch
    }

    /// `connect()` from `Idle` or `Closed`; a no-op while a connection is live
    /// or being established. The retry counter is left untouched.
    pub fn connect(&mut self) -> Option<Action> {
        match self.state.phase {
            Phase::Idle | Phase::Closed => {
                self.epoch += 1;
                self.state.phase = Phase::Connecting;
                Some(Action::Open { epoch: self.epoch })
            }
            Phase::Connecting | Phase::Open | Phase::Reconnecting => None,
        }
    }

    /// The transport for `epoch` finished its handshake.
    pub fn opened(&mut self, epoch: u64) -> bool {
        if !self.is_current(epoch) || self.state.phase != Phase::Connecting {
            return false;
        }
        self.state.phase = Phase::Open;
        self.state.attempt = 0;
        self.state.last_opened_at = Some(Instant::now());
        true
    }

    /// The transport for `epoch` failed to open, errored or closed.
    pub fn lost(&mut self, epoch: u64) -> Option<Action> {
        if !self.is_current(epoch) {
            return None;
        }
        match self.state.phase {
            Phase::Connecting | Phase::Open => {}
            Phase::Idle | Phase::Reconnecting | Phase::Closed => return None,
        }

        match self.policy.decide(self.state.attempt) {
            RetryDecision::Retry { delay, .. } => {
                self.state.phase = Phase::Reconnecting;
                Some(Action::ScheduleRetry { epoch, delay })
            }
            RetryDecision::GiveUp => {
                self.epoch += 1;
                self.state.phase = Phase::Closed;
                Some(Action::GiveUp {
                    attempts: self.state.attempt,
                })
            }
        }
    }

    /// The retry timer armed for `epoch` fired.
    pub fn timer_fired(&mut self, epoch: u64) -> Option<Action> {
        if !self.is_current(epoch) || self.state.phase != Phase::Reconnecting {
            return None;
        }
        if self.state.attempt >= self.policy.max_attempts {
            self.epoch += 1;
            self.state.phase = Phase::Closed;
            return Some(Action::GiveUp {
                attempts: self.state.attempt,
            });
        }
        self.state.attempt += 1;
        self.epoch += 1;
        self.state.phase = Phase::Connecting;
        Some(Action::Open { epoch: self.epoch })
    }

    /// `disconnect()` from any phase. Idempotent.
    pub fn disconnect(&mut self) -> Action {
        self.epoch += 1;
        self.state.phase = Phase::Closed;
        Action::Shutdown
    }
}
