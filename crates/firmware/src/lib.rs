//! Tabula board firmware — STM32H743 display path.
//!
//! Brings the board's display pipeline up and keeps it fed:
//!
//! ```text
//! main.rs demo loop
//!         ↓
//! tabula_platform::FrameManager (validated fills, presents, flush gate)
//!         ↓
//! SdramStore (FMC window)   Dma2d (blit engine)   DMA2D IRQ → FlushGate
//! ```
//!
//! Everything that touches a hardware register sits behind the `hardware`
//! cargo feature; `cargo test -p tabula-firmware` on the host exercises the
//! pure parts (SDRAM chip constants, mode-register math, boot sequencing
//! data) without linking any Cortex-M code.
//!
//! # Building
//!
//! ```bash
//! cargo build --release --target thumbv7em-none-eabihf --features hardware
//! ```

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::await_holding_lock)] // holding a blocking Mutex across .await is a bug
#![deny(unsafe_op_in_unsafe_fn)]
// Intentional allows for this crate:
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)] // register names and part numbers in doc comments
#![allow(clippy::must_use_candidate)]
// Pedantic cast lints are noise in register-level code; the workspace-level
// cast warns still apply.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_lossless)]

pub mod boot;
pub mod sdram;

#[cfg(feature = "hardware")]
pub mod dma2d;

#[cfg(feature = "hardware")]
pub mod lcd;

pub use sdram::W9825G6KH6;

#[cfg(feature = "hardware")]
pub use dma2d::{Dma2d, FLUSH_GATE};

#[cfg(feature = "hardware")]
pub use lcd::PanelControl;
