//! Panel bring-up: reset/backlight sequencing and display construction.
//!
//! The 10.1" MIPI-bridged panel only needs two GPIOs from us — reset and
//! backlight enable. The bridge latches its configuration on the rising
//! edge of reset; pixel data then flows from the front frame buffer without
//! further involvement, so "driving the panel" reduces to keeping that
//! buffer correct (the frame manager's job).

use embassy_stm32::gpio::Output;
use embassy_time::Timer;
use tabula_platform::{BufferMode, FrameError, FrameLayout, FrameManager};

use crate::dma2d::{Dma2d, FLUSH_GATE};
use crate::sdram::hardware::SdramStore;

/// The board's display: both frame buffers in SDRAM, DMA2D blits, shared
/// flush gate.
pub type Display = FrameManager<'static, SdramStore, Dma2d>;

/// Reset and backlight lines of the panel bridge.
pub struct PanelControl {
    rst: Output<'static>,
    backlight: Output<'static>,
}

impl PanelControl {
    /// Take ownership of the two control lines. Backlight should start low
    /// so the first visible frame is a composed one, not SDRAM noise.
    pub fn new(rst: Output<'static>, backlight: Output<'static>) -> Self {
        Self { rst, backlight }
    }

    /// Pulse the bridge's reset line: high, low, high, 1 ms per phase.
    pub async fn reset(&mut self) {
        self.rst.set_high();
        Timer::after_millis(1).await;
        self.rst.set_low();
        Timer::after_millis(1).await;
        self.rst.set_high();
        Timer::after_millis(1).await;
    }

    /// Turn the backlight on. Call after the first present.
    pub fn backlight_on(&mut self) {
        self.backlight.set_high();
    }

    /// Turn the backlight off.
    pub fn backlight_off(&mut self) {
        self.backlight.set_low();
    }
}

/// Lay the double-buffered 800×1280 display out over the SDRAM store.
///
/// Fails only if the store is smaller than two frames, which on this board
/// means the SDRAM did not come up.
pub fn display(store: SdramStore, engine: Dma2d) -> Result<Display, FrameError<core::convert::Infallible>> {
    FrameManager::new(
        store,
        engine,
        &FLUSH_GATE,
        FrameLayout::PANEL,
        BufferMode::Double,
    )
}
