//! Display-path core for the Tabula board: frame buffers, blits, flush sync.
//!
//! This crate holds every part of the display pipeline that has design
//! content, written against traits so the whole pipeline runs (and is tested)
//! on the host without hardware.
//!
//! # Architecture Layers
//!
//! ```text
//! Application / GUI consumer (firmware crate, demo loop)
//!         ↓
//! FrameManager (this crate — rect math, sync fills, async blit dispatch)
//!         ↓
//! PixelStore + BlitEngine + FlushGate (this crate — trait seams)
//!         ↓
//! Hardware Layer (firmware crate — FMC SDRAM window, DMA2D, DMA2D IRQ)
//! ```
//!
//! # The flush protocol
//!
//! One [`FlushGate`] arbitrates the single DMA2D engine. Asynchronous fills
//! and copies move the gate `Idle → InFlight`; the transfer-complete interrupt
//! moves it back and, for GUI-driven flushes, latches a one-shot "flush done"
//! event that the main loop consumes with [`FlushGate::take_flush_event`].
//! Strict depth-1: a second request while in flight is rejected with
//! [`FlushError::Busy`] — callers that want to block use
//! [`FlushGate::wait_idle`] with a timeout first.
//!
//! # Features
//!
//! - `defmt`: `defmt::Format` derives on all public types (hardware builds)

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)]
// Pedantic lints suppressed for this crate:
#![allow(clippy::doc_markdown)] // register names and hex addresses in doc comments
#![allow(clippy::must_use_candidate)] // accessors — callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod blit;
pub mod config;
pub mod flush;
pub mod frame;
pub mod rect;
pub mod store;

pub use blit::{BlitEngine, CopyOp, CopySource, FillOp};
pub use flush::{FlushError, FlushGate, TransferState};
pub use frame::{BufferMode, FlushNotify, FrameError, FrameLayout, FrameManager};
pub use rect::{Rect, Rotation};
pub use store::{PixelStore, SelfTestFault, SliceStore, StoreError};
