//! Hardware boot sequence for the Tabula board.
//!
//! Initialization order (order matters for correctness):
//!   1. RCC: PLL1 → 400 MHz core, PLL2R → 200 MHz FMC kernel clock
//!   2. Caches: I-cache + D-cache on (the display path does explicit
//!      clean/invalidate over SDRAM, see the store's cache hooks)
//!   3. FMC/SDRAM: bring the W9825G6KH-6 up, cover-fill, self-test
//!   4. LCD: panel reset pulse, frame manager over the SDRAM window
//!   5. Watchdog: IWDG armed, petted once per composed frame
//!   6. Demo loop

/// Ordered boot steps, as data. `main` logs each step as it completes and
/// the host tests pin the ordering constraints.
pub const BOOT_SEQUENCE_STEPS: [&str; 6] = [
    "1. RCC: PLL1 sys 400 MHz, PLL2R 200 MHz -> FMC SDCLK 100 MHz",
    "2. Caches: enable I-cache and D-cache",
    "3. FMC/SDRAM: init W9825G6KH-6, cover-fill, self-test",
    "4. LCD: reset pulse, frame manager over SDRAM window",
    "5. IWDG: arm watchdog",
    "6. Demo loop: compose, present, alternate sync/async",
];

/// IWDG timeout. A frame takes a few milliseconds; two seconds of silence
/// means the pipeline is wedged and the board should reboot.
pub const WATCHDOG_TIMEOUT_US: u32 = 2_000_000;

/// Build the `embassy_stm32::Config` with the board's RCC settings.
///
/// # Clock tree (HSI → 400 MHz core)
///
/// HSI (64 MHz) / prediv(4) × mul(50) = 800 MHz VCO
///   PLL1_P = /2 → 400 MHz system clock
/// HSI (64 MHz) / prediv(8) × mul(100) = 800 MHz VCO
///   PLL2_R = /4 → 200 MHz FMC kernel clock
///   FMC internal /2 divider → SDCLK = 100 MHz at the W9825G6KH-6
/// AHB /2 → 200 MHz, APB1/2/3/4 /2 → 100 MHz
///
/// Do not call `embassy_stm32::init(Default::default())`: the default
/// config leaves PLL2 off, the FMC falls back to a bus clock the SDRAM
/// timing constants were not derived for, and every timing field in
/// `sdram.rs` is silently wrong.
#[cfg(feature = "hardware")]
pub fn build_embassy_config() -> embassy_stm32::Config {
    use embassy_stm32::rcc::*;

    let mut config = embassy_stm32::Config::default();

    config.rcc.hsi = Some(HSIPrescaler::DIV1);

    // PLL1: system clock.
    config.rcc.pll1 = Some(Pll {
        source: PllSource::HSI,
        prediv: PllPreDiv::DIV4,
        mul: PllMul::MUL50,
        divp: Some(PllDiv::DIV2), // 400 MHz — system clock
        divq: None,
        divr: None,
    });

    // PLL2: FMC (SDRAM) kernel clock.
    // SDCLK = PLL2R / 2 = 100 MHz; sdram::FMC_CLK_HZ must match.
    config.rcc.pll2 = Some(Pll {
        source: PllSource::HSI,
        prediv: PllPreDiv::DIV8,
        mul: PllMul::MUL100,
        divp: None,
        divq: None,
        divr: Some(PllDiv::DIV4), // 200 MHz — FMC kernel clock
    });

    config.rcc.sys = Sysclk::PLL1_P; // 400 MHz
    config.rcc.ahb_pre = AHBPrescaler::DIV2; // 200 MHz
    config.rcc.apb1_pre = APBPrescaler::DIV2; // 100 MHz
    config.rcc.apb2_pre = APBPrescaler::DIV2; // 100 MHz
    config.rcc.apb3_pre = APBPrescaler::DIV2; // 100 MHz
    config.rcc.apb4_pre = APBPrescaler::DIV2; // 100 MHz
    config.rcc.voltage_scale = VoltageScale::Scale1;

    config
}

// ─── Tests ───────────────────────────────────────────────────────────────────
