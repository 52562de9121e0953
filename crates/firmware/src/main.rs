//! Hardware entry point: boot the board, verify SDRAM, bring the panel up,
//! then run the color-band demo loop, alternating the CPU and DMA2D paths
//! every frame so both stay exercised.

#![no_std]
#![no_main]

use defmt::info;
use defmt_rtt as _;
use panic_probe as _;

use embassy_executor::Spawner;
use embassy_stm32::bind_interrupts;
use embassy_stm32::fmc::Fmc;
use embassy_stm32::gpio::{Level, Output, Speed};
use embassy_stm32::wdg::IndependentWatchdog;
use embassy_time::{Delay, Duration, Timer};
use embedded_graphics::pixelcolor::raw::RawU16;
use embedded_graphics::pixelcolor::Rgb565;

use tabula_firmware::boot;
use tabula_firmware::dma2d::{self, Dma2d};
use tabula_firmware::lcd::{self, PanelControl};
use tabula_firmware::sdram::{self, hardware::SdramStore, W9825G6KH6};
use tabula_platform::config::{PANEL_HEIGHT, PANEL_WIDTH};
use tabula_platform::{FrameError, Rect};

bind_interrupts!(struct Irqs {
    DMA2D => dma2d::InterruptHandler;
});

/// Demo palette: red, green, blue, white in RGB565.
const BAND_COLORS: [u16; 4] = [0xF800, 0x07E0, 0x001F, 0xFFFF];

const BAND_HEIGHT: u16 = PANEL_HEIGHT / 4;
const BANDS: [Rect; 4] = [
    Rect::new(0, 0, PANEL_WIDTH, BAND_HEIGHT),
    Rect::new(0, BAND_HEIGHT, PANEL_WIDTH, BAND_HEIGHT),
    Rect::new(0, 2 * BAND_HEIGHT, PANEL_WIDTH, BAND_HEIGHT),
    Rect::new(0, 3 * BAND_HEIGHT, PANEL_WIDTH, BAND_HEIGHT),
];

/// Bound on any single DMA2D transfer; a full frame completes well under
/// this. Exceeding it means the engine or its interrupt is wedged, and the
/// watchdog stops being petted.
const TRANSFER_DEADLINE: Duration = Duration::from_millis(100);

fn rgb565(raw: u16) -> Rgb565 {
    Rgb565::from(RawU16::new(raw))
}

/// Demo rectangles are static and valid; an error here is a programming
/// mistake worth a log line, not a reboot.
fn check<E>(result: Result<(), FrameError<E>>) {
    if result.is_err() {
        defmt::error!("display: op rejected");
    }
}

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    let p = embassy_stm32::init(boot::build_embassy_config());
    info!("boot: {=str}", boot::BOOT_SEQUENCE_STEPS[0]);

    // embassy_stm32::init() enables the I/D caches on STM32H7. The display
    // path keeps SDRAM coherent through the store's cache hooks, which need
    // an SCB handle.
    //
    // SAFETY: embassy holds the Cortex-M peripherals after init; this handle
    // is used only for the SCB cache-maintenance interface, which embassy
    // does not touch afterwards.
    let cp = unsafe { cortex_m::Peripherals::steal() };
    info!("boot: {=str}", boot::BOOT_SEQUENCE_STEPS[1]);

    // FMC bring-up. The driver executes the JEDEC sequence in
    // sdram::INIT_SEQUENCE against bank 1 and returns the raw window.
    let mut fmc = Fmc::sdram_a13bits_d16bits_4banks_bank1(
        p.FMC,
        // A0-A12
        p.PF0, p.PF1, p.PF2, p.PF3, p.PF4, p.PF5, p.PF12, p.PF13, p.PF14, p.PF15, p.PG0, p.PG1,
        p.PG2,
        // BA0-BA1
        p.PG4, p.PG5,
        // D0-D15
        p.PD14, p.PD15, p.PD0, p.PD1, p.PE7, p.PE8, p.PE9, p.PE10, p.PE11, p.PE12, p.PE13,
        p.PE14, p.PE15, p.PD8, p.PD9, p.PD10,
        // NBL0-NBL1
        p.PE0, p.PE1,
        p.PC5,  // SDCKE0
        p.PG8,  // SDCLK
        p.PG15, // SDNCAS
        p.PC4,  // SDNE0
        p.PF11, // SDNRAS
        p.PC0,  // SDNWE
        W9825G6KH6,
    );
    let mut delay = Delay;
    let base = fmc.init(&mut delay) as *mut u8;
    for step in sdram::INIT_SEQUENCE {
        info!("sdram: {=str}", step.name());
    }

    // SAFETY: `base` is the initialized FMC bank-1 window; the store is the
    // sole owner of it from here on.
    let mut store = unsafe { SdramStore::new(base, cp.SCB) };
    defmt::unwrap!(sdram::hardware::cover_fill(&mut store));
    let code = sdram::hardware::report_self_test(&mut store);
    if code != 0 {
        defmt::panic!("sdram unusable, self-test code {}", code);
    }
    info!("boot: {=str}", boot::BOOT_SEQUENCE_STEPS[2]);

    let engine = Dma2d::new(p.DMA2D, Irqs);
    let mut display = match lcd::display(store, engine) {
        Ok(d) => d,
        Err(_) => defmt::panic!("frame layout does not fit the SDRAM window"),
    };
    let mut panel = PanelControl::new(
        Output::new(p.PB6, Level::Low, Speed::Low),
        Output::new(p.PB7, Level::Low, Speed::Low),
    );
    panel.reset().await;
    info!("boot: {=str}", boot::BOOT_SEQUENCE_STEPS[3]);

    let mut wdg = IndependentWatchdog::new(p.IWDG1, boot::WATCHDOG_TIMEOUT_US);
    wdg.unleash();
    info!("boot: {=str}", boot::BOOT_SEQUENCE_STEPS[4]);
    info!("boot: {=str}", boot::BOOT_SEQUENCE_STEPS[5]);

    let mut shift = 0usize;
    let mut use_engine = false;
    let mut backlight_pending = true;
    loop {
        // Compose four color bands into the back buffer, palette rotated
        // one slot per frame.
        for (band, rect) in BANDS.iter().enumerate() {
            #[allow(clippy::indexing_slicing)] // mask keeps the index < 4
            let color = rgb565(BAND_COLORS[band.wrapping_add(shift) & 3]);
            if use_engine {
                defmt::unwrap!(display.wait_idle(TRANSFER_DEADLINE).await);
                check(display.fill_color_async(*rect, color));
            } else {
                check(display.fill_color_sync(*rect, color));
            }
        }

        // Publish the frame.
        if use_engine {
            defmt::unwrap!(display.wait_idle(TRANSFER_DEADLINE).await);
            check(display.present_back_async());
            defmt::unwrap!(display.wait_idle(TRANSFER_DEADLINE).await);
        } else {
            check(display.present_back_sync());
        }

        if backlight_pending {
            // First real frame is on screen; now it is safe to light up.
            panel.backlight_on();
            backlight_pending = false;
        }

        wdg.pet();
        shift = shift.wrapping_add(1);
        use_engine = !use_engine;
        Timer::after_millis(500).await;
    }
}
