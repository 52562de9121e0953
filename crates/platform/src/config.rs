//! Board-level display geometry and SDRAM region layout.
//!
//! # Hardware
//!
//! - Panel: 10.1" MIPI-bridged LCD, 800×1280 portrait scan, RGB565
//! - Store: W9825G6KH-6 (Winbond) — 32 MB (16M × 16-bit) SDRAM on FMC bank 1,
//!   mapped at `0xC000_0000`
//!
//! # SDRAM Region Layout (32 MB)
//!
//! ```text
//! 0xC000_0000  ┌──────────────────────┐
//!              │  Front frame buffer  │  2,048,000 B (800×1280 × RGB565)
//! 0xC01F_4000  ├──────────────────────┤
//!              │  Back frame buffer   │  2,048,000 B
//! 0xC03E_8000  ├──────────────────────┤
//!              │  Spare               │  remainder (~28 MB)
//! 0xC200_0000  └──────────────────────┘
//! ```
//!
//! Both frame buffers sit at fixed byte offsets so the DMA2D engine and the
//! CPU agree on addresses without any allocator.

/// Panel width in pixels (physical scan order).
pub const PANEL_WIDTH: u16 = 800;

/// Panel height in pixels (number of scan lines).
pub const PANEL_HEIGHT: u16 = 1280;

/// Bytes per RGB565 pixel.
pub const BYTES_PER_PIXEL: usize = 2;

/// Pixels in one full frame.
pub const FRAME_PIXELS: usize = PANEL_WIDTH as usize * PANEL_HEIGHT as usize;

/// Bytes in one full frame buffer.
pub const FRAME_BYTES: usize = FRAME_PIXELS * BYTES_PER_PIXEL;

/// SDRAM base address on the FMC bus (bank 1).
pub const SDRAM_BASE_ADDRESS: u32 = 0xC000_0000;

/// Total SDRAM capacity in bytes (W9825G6KH-6: 16M × 16-bit).
pub const SDRAM_SIZE_BYTES: usize = 32 * 1024 * 1024;

/// A fixed region inside the SDRAM store.
///
/// Offsets are relative to [`SDRAM_BASE_ADDRESS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameRegion {
    /// Byte offset from the SDRAM base.
    pub offset: usize,
    /// Region length in bytes.
    pub len: usize,
}

impl FrameRegion {
    /// Front (displayed) frame buffer.
    pub const FRONT: Self = Self {
        offset: 0,
        len: FRAME_BYTES,
    };

    /// Back (composition) frame buffer.
    pub const BACK: Self = Self {
        offset: FRAME_BYTES,
        len: FRAME_BYTES,
    };

    /// Everything after the frame buffers — free for application use.
    pub const SPARE: Self = Self {
        offset: 2 * FRAME_BYTES,
        len: SDRAM_SIZE_BYTES - 2 * FRAME_BYTES,
    };

    /// Bus address of the region start.
    #[allow(clippy::arithmetic_side_effects)] // offsets lie inside the 32 MB window
    pub const fn bus_address(&self) -> u32 {
        SDRAM_BASE_ADDRESS + self.offset as u32
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
