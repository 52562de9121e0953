//! Flush gate: the depth-1 state machine arbitrating the blit engine.
//!
//! There is one DMA2D engine and no hardware queue, so at most one transfer
//! is ever in flight. The gate tracks that with a two-state machine:
//!
//! ```text
//!            try_begin / try_begin_notified
//!      Idle ────────────────────────────────▶ InFlight
//!        ▲                                       │
//!        └───────── complete (ISR) / cancel ─────┘
//! ```
//!
//! A begin attempt while a transfer is in flight is rejected with
//! [`FlushError::Busy`] — the gate never queues. Callers that want to block
//! call [`FlushGate::wait_idle`] with an explicit timeout first, so a wedged
//! engine surfaces as [`FlushError::Timeout`] instead of a silent hang.
//!
//! GUI-driven flushes use [`FlushGate::try_begin_notified`]: when that
//! transfer completes, the gate latches a one-shot flush event instead of
//! calling back into GUI code from interrupt context. The main loop drains
//! it with [`FlushGate::take_flush_event`] and acknowledges the GUI there.
//!
//! All fields are atomics; the gate is shared by reference between task
//! context and the DMA2D interrupt handler.

use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use embassy_futures::yield_now;
use embassy_time::{Duration, Instant};
use thiserror_no_std::Error;

/// Gate-level errors.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlushError {
    /// A transfer is already in flight; the request was not queued.
    #[error("blit engine busy, transfer already in flight")]
    Busy,
    /// The in-flight transfer did not complete within the deadline.
    #[error("timed out waiting for transfer completion")]
    Timeout,
}

/// Observable gate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferState {
    /// No transfer in flight; the engine may be claimed.
    Idle,
    /// A transfer owns the engine until the completion interrupt.
    InFlight,
}

const IDLE: u8 = 0;
const IN_FLIGHT: u8 = 1;

/// Depth-1 transfer gate shared between tasks and the completion interrupt.
#[derive(Debug)]
pub struct FlushGate {
    state: AtomicU8,
    /// Whether the in-flight transfer should latch a flush event on
    /// completion.
    notify_armed: AtomicBool,
    /// One-shot completion event, set by the interrupt, drained by the main
    /// loop.
    flush_event: AtomicBool,
}

impl FlushGate {
    /// A gate in the idle state. `const` so it can live in a `static`.
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(IDLE),
            notify_armed: AtomicBool::new(false),
            flush_event: AtomicBool::new(false),
        }
    }

    /// Claim the engine for one transfer. Fails with [`FlushError::Busy`]
    /// if a transfer is already in flight; nothing is queued.
    pub fn try_begin(&self) -> Result<(), FlushError> {
        self.state
            .compare_exchange(IDLE, IN_FLIGHT, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| FlushError::Busy)?;
        self.notify_armed.store(false, Ordering::Release);
        Ok(())
    }

    /// Claim the engine and arm the one-shot flush event for when this
    /// transfer completes.
    pub fn try_begin_notified(&self) -> Result<(), FlushError> {
        self.state
            .compare_exchange(IDLE, IN_FLIGHT, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| FlushError::Busy)?;
        self.notify_armed.store(true, Ordering::Release);
        Ok(())
    }

    /// Mark the in-flight transfer finished. Called from the
    /// transfer-complete interrupt (or inline by host engines). If the
    /// transfer was armed for notification, latches the flush event.
    ///
    /// Idempotent on an idle gate: a spurious completion leaves the gate
    /// idle and latches nothing.
    pub fn complete(&self) {
        if self.notify_armed.swap(false, Ordering::AcqRel) {
            self.flush_event.store(true, Ordering::Release);
        }
        self.state.store(IDLE, Ordering::Release);
    }

    /// Release a claim whose submit failed before the engine started.
    /// Returns the gate to idle without latching any event.
    pub fn cancel(&self) {
        self.notify_armed.store(false, Ordering::Release);
        self.state.store(IDLE, Ordering::Release);
    }

    /// Drain the one-shot flush event. Returns `true` at most once per
    /// notified transfer.
    pub fn take_flush_event(&self) -> bool {
        self.flush_event.swap(false, Ordering::AcqRel)
    }

    /// Current state.
    pub fn state(&self) -> TransferState {
        if self.is_idle() {
            TransferState::Idle
        } else {
            TransferState::InFlight
        }
    }

    /// Whether the engine may be claimed right now.
    pub fn is_idle(&self) -> bool {
        self.state.load(Ordering::Acquire) == IDLE
    }

    /// Wait until the gate is idle, polling cooperatively, for at most
    /// `timeout`. A transfer of the full panel takes well under a
    /// millisecond; a timeout here means the engine or its interrupt is
    /// wedged.
    pub async fn wait_idle(&self, timeout: Duration) -> Result<(), FlushError> {
        let deadline = Instant::now()
            .checked_add(timeout)
            .ok_or(FlushError::Timeout)?;
        while !self.is_idle() {
            if Instant::now() >= deadline {
                return Err(FlushError::Timeout);
            }
            yield_now().await;
        }
        Ok(())
    }
}

impl Default for FlushGate {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
//
// Async behaviour (wait_idle deadlines, cross-thread completion) is covered
// in tests/flush_protocol.rs; this module pins the synchronous state machine.

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn begin_complete_cycle() {
        let gate = FlushGate::new();
        assert_eq!(gate.state(), TransferState::Idle);
        gate.try_begin().unwrap();
        assert_eq!(gate.state(), TransferState::InFlight);
        gate.complete();
        assert_eq!(gate.state(), TransferState::Idle);
    }

    #[test]
    fn second_begin_while_in_flight_is_rejected() {
        let gate = FlushGate::new();
        gate.try_begin().unwrap();
        assert_eq!(gate.try_begin(), Err(FlushError::Busy));
        assert_eq!(gate.try_begin_notified(), Err(FlushError::Busy));
        // The rejected attempts must not have disturbed the in-flight claim.
        assert_eq!(gate.state(), TransferState::InFlight);
        gate.complete();
        assert!(gate.try_begin().is_ok());
    }

    #[test]
    fn notified_transfer_latches_event_exactly_once() {
        let gate = FlushGate::new();
        gate.try_begin_notified().unwrap();
        assert!(!gate.take_flush_event(), "event before completion");
        gate.complete();
        assert!(gate.take_flush_event());
        assert!(!gate.take_flush_event(), "event drained twice");
    }

    #[test]
    fn plain_transfer_latches_no_event() {
        let gate = FlushGate::new();
        gate.try_begin().unwrap();
        gate.complete();
        assert!(!gate.take_flush_event());
    }

    #[test]
    fn notify_arming_does_not_leak_into_next_transfer() {
        let gate = FlushGate::new();
        gate.try_begin_notified().unwrap();
        gate.complete();
        assert!(gate.take_flush_event());
        // A later plain transfer must not re-latch.
        gate.try_begin().unwrap();
        gate.complete();
        assert!(!gate.take_flush_event());
    }

    #[test]
    fn cancel_returns_to_idle_without_event() {
        let gate = FlushGate::new();
        gate.try_begin_notified().unwrap();
        gate.cancel();
        assert_eq!(gate.state(), TransferState::Idle);
        assert!(!gate.take_flush_event());
        // A completion after cancel (late interrupt) must not latch either.
        gate.complete();
        assert!(!gate.take_flush_event());
    }

    #[test]
    fn spurious_complete_on_idle_gate_is_harmless() {
        let gate = FlushGate::new();
        gate.complete();
        assert_eq!(gate.state(), TransferState::Idle);
        assert!(!gate.take_flush_event());
        assert!(gate.try_begin().is_ok());
    }
}
