//! W9825G6KH-6 SDRAM description and bring-up for the FMC.
//!
//! Target device: W9825G6KH-6 (Winbond) — 32 MB (16M × 16-bit), TSOP-54,
//! on FMC SDRAM bank 1, mapped at 0xC000_0000.
//!
//! The FMC kernel clock is PLL2R = 200 MHz (see `boot.rs`); the FMC divides
//! it by 2, so SDCLK = 100 MHz and every timing field below counts ~10 ns
//! cycles. The chip itself is rated to 166 MHz, so 100 MHz leaves margin on
//! every datasheet minimum.
//!
//! The [`W9825G6KH6`] chip description feeds
//! `embassy_stm32::fmc::Fmc::sdram_a13bits_d16bits_4banks_bank1`, which runs
//! the JEDEC bring-up (documented here as [`INIT_SEQUENCE`]) and hands back
//! the raw bank-1 window. Everything in this module except the `hardware`
//! submodule is plain data with host tests.
//!
//! # References
//!
//! - W9825G6KH-6 datasheet Rev I, Table 13 (AC characteristics, CL=3, 3.3 V)
//! - STM32H7 RM0433 Rev 9 §22.7.3 (SDRAM initialization sequence)

use stm32_fmc::{SdramChip, SdramConfiguration, SdramTiming};

/// FMC clock (SDCLK) in Hz: PLL2R (200 MHz) / 2.
pub const FMC_CLK_HZ: u32 = 100_000_000;

// ---- Datasheet minimums in nanoseconds ------------------------------------
// W9825G6KH-6 Rev I, Table 13, -6 speed grade at CL=3.

/// tRCD — active-to-read/write delay.
pub const T_RCD_NS: u32 = 18;
/// tRP — precharge period.
pub const T_RP_NS: u32 = 18;
/// tRAS — active-to-precharge, minimum.
pub const T_RAS_NS: u32 = 42;
/// tRC — active-to-active, same bank.
pub const T_RC_NS: u32 = 60;
/// tXSR — exit self-refresh to active.
pub const T_XSR_NS: u32 = 70;
/// tMRD — load-mode-register to active, already in clock cycles.
pub const T_MRD_CYCLES: u32 = 2;

/// Whole refresh period: 8192 rows in 64 ms.
pub const REFRESH_PERIOD_MS: u32 = 64;
/// Rows per refresh cycle (13-bit row address).
pub const REFRESH_ROWS: u32 = 8192;
/// SDCLK cycles of safety margin subtracted from the per-row refresh budget,
/// RM0433 §22.7.7: the refresh request must be issued before the row deadline.
pub const REFRESH_MARGIN_CYCLES: u32 = 20;

/// Datasheet nanoseconds to SDCLK cycles, rounded up, at least 1.
#[allow(clippy::arithmetic_side_effects)] // u64 intermediates cannot overflow
pub const fn cycles(ns: u32) -> u32 {
    let exact = (ns as u64 * FMC_CLK_HZ as u64 + 999_999_999) / 1_000_000_000;
    if exact < 1 {
        1
    } else {
        exact as u32
    }
}

/// Per-row refresh budget in nanoseconds: 64 ms / 8192 rows, floored, minus
/// [`REFRESH_MARGIN_CYCLES`] of SDCLK.
///
/// The FMC turns this into the SDRTR COUNT value; flooring and the margin
/// keep the programmed interval strictly under the datasheet period.
#[allow(clippy::arithmetic_side_effects)] // constant operands, margin well under budget
pub const fn refresh_period_ns() -> u32 {
    let budget = REFRESH_PERIOD_MS * 1_000_000 / REFRESH_ROWS;
    let margin = (REFRESH_MARGIN_CYCLES as u64 * 1_000_000_000 / FMC_CLK_HZ as u64) as u32;
    budget - margin
}

// ---- SDRAM mode register ---------------------------------------------------

/// Compose the JEDEC SDRAM mode register.
///
/// | Bits | Field           | Value used                        |
/// |------|-----------------|-----------------------------------|
/// | 2:0  | Burst length    | `burst_len_log2` (0 → length 1)   |
/// | 3    | Burst type      | 0 — sequential                    |
/// | 6:4  | CAS latency     | `cas_latency`                     |
/// | 8:7  | Operating mode  | 0 — standard                      |
/// | 9    | Write burst     | 1 — single-location write         |
pub const fn mode_register(burst_len_log2: u16, cas_latency: u16, single_write: bool) -> u16 {
    let wb = if single_write { 1 << 9 } else { 0 };
    burst_len_log2 | (cas_latency << 4) | wb
}

/// Mode register for this board: burst length 1, sequential, CAS 3,
/// single-location writes. Reads burst through the FMC read FIFO instead.
pub const MODE_REGISTER: u16 = mode_register(0, 3, true);

// ---- JEDEC bring-up sequence (documentation + boot log) --------------------

/// One step of the SDRAM power-up sequence, RM0433 §22.7.3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitCommand {
    /// SDCMR MODE=001 — start driving SDCLK, then wait the 100 µs power-up
    /// delay.
    ClockEnable,
    /// SDCMR MODE=010 — precharge all banks.
    PrechargeAll,
    /// SDCMR MODE=011 — issue consecutive auto-refresh cycles.
    AutoRefresh {
        /// Number of refresh cycles (chip requires at least 2; 8 issued).
        count: u8,
    },
    /// SDCMR MODE=100 — write [`MODE_REGISTER`] into the chip.
    LoadMode {
        /// Mode register value.
        value: u16,
    },
    /// SDRTR COUNT — program the periodic refresh timer.
    SetRefreshRate {
        /// Per-row refresh budget in nanoseconds.
        period_ns: u32,
    },
}

impl InitCommand {
    /// Short name for the boot log.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ClockEnable => "clock enable",
            Self::PrechargeAll => "precharge all",
            Self::AutoRefresh { .. } => "auto refresh",
            Self::LoadMode { .. } => "load mode register",
            Self::SetRefreshRate { .. } => "set refresh rate",
        }
    }
}

/// The ordered bring-up sequence the FMC driver executes. Kept as data so
/// the boot log and the host tests agree with RM0433 §22.7.3.
pub const INIT_SEQUENCE: [InitCommand; 5] = [
    InitCommand::ClockEnable,
    InitCommand::PrechargeAll,
    InitCommand::AutoRefresh { count: 8 },
    InitCommand::LoadMode {
        value: MODE_REGISTER,
    },
    InitCommand::SetRefreshRate {
        period_ns: refresh_period_ns(),
    },
];

// ---- Chip description for the FMC driver -----------------------------------

/// W9825G6KH-6 as the FMC driver sees it: 9 column bits, 13 row bits,
/// 16-bit bus, 4 banks, CL=3.
#[derive(Debug, Clone, Copy, Default)]
pub struct W9825G6KH6;

impl SdramChip for W9825G6KH6 {
    const MODE_REGISTER: u16 = MODE_REGISTER;

    const CONFIG: SdramConfiguration = SdramConfiguration {
        column_bits: 9,
        row_bits: 13,
        memory_data_width: 16,
        internal_banks: 4,
        cas_latency: 3,
        write_protection: false,
        read_burst: true,
        read_pipe_delay_cycles: 0,
    };

    const TIMING: SdramTiming = SdramTiming {
        startup_delay_ns: 100_000,
        max_sd_clock_hz: FMC_CLK_HZ,
        refresh_period_ns: refresh_period_ns(),
        mode_register_to_active: T_MRD_CYCLES,
        exit_self_refresh: cycles(T_XSR_NS),
        active_to_precharge: cycles(T_RAS_NS),
        row_cycle: cycles(T_RC_NS),
        row_precharge: cycles(T_RP_NS),
        row_to_column: cycles(T_RCD_NS),
    };
}

// ---- Hardware store --------------------------------------------------------

#[cfg(feature = "hardware")]
pub mod hardware {
    //! The FMC bank-1 window as a [`PixelStore`], with real Cortex-M7 cache
    //! maintenance behind the store's cache hooks.

    use core::slice;

    use cortex_m::peripheral::SCB;
    use tabula_platform::config::{SDRAM_BASE_ADDRESS, SDRAM_SIZE_BYTES};
    use tabula_platform::store;
    use tabula_platform::{PixelStore, SliceStore, StoreError};

    /// The 32 MB SDRAM window with D-cache clean/invalidate by address.
    ///
    /// CPU writes land in the D-cache first; the DMA2D reads SDRAM directly.
    /// The cache hooks bridge the two: `clean_cache` before handing a region
    /// to the engine, `invalidate_cache` before reading back a region the
    /// engine wrote.
    pub struct SdramStore {
        window: SliceStore<'static>,
        scb: SCB,
    }

    impl SdramStore {
        /// Wrap the initialized bank-1 window.
        ///
        /// # Safety
        ///
        /// `base` must be the pointer returned by the FMC driver's `init`
        /// (the 0xC000_0000 window) with the SDRAM bring-up complete, and
        /// this must be the only owner of that window.
        pub unsafe fn new(base: *mut u8, scb: SCB) -> Self {
            // SAFETY: caller guarantees the window is live, sized
            // SDRAM_SIZE_BYTES and exclusively owned.
            let window = unsafe { slice::from_raw_parts_mut(base, SDRAM_SIZE_BYTES) };
            Self {
                window: SliceStore::new(window),
                scb,
            }
        }
    }

    impl PixelStore for SdramStore {
        fn capacity(&self) -> usize {
            self.window.capacity()
        }

        fn read(&self, offset: usize, buf: &mut [u8]) -> Result<(), StoreError> {
            self.window.read(offset, buf)
        }

        fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), StoreError> {
            self.window.write(offset, data)
        }

        fn fill_u8(&mut self, offset: usize, value: u8, len: usize) -> Result<(), StoreError> {
            self.window.fill_u8(offset, value, len)
        }

        fn fill_u16(&mut self, offset: usize, value: u16, count: usize) -> Result<(), StoreError> {
            self.window.fill_u16(offset, value, count)
        }

        fn write_u16_stream(&mut self, offset: usize, data: &[u16]) -> Result<(), StoreError> {
            self.window.write_u16_stream(offset, data)
        }

        fn copy_within(
            &mut self,
            src_offset: usize,
            dst_offset: usize,
            len: usize,
        ) -> Result<(), StoreError> {
            self.window.copy_within(src_offset, dst_offset, len)
        }

        fn clean_cache(&mut self, offset: usize, len: usize) {
            #[allow(clippy::arithmetic_side_effects)] // offset < 32 MB, base fixed
            self.scb
                .clean_dcache_by_address(SDRAM_BASE_ADDRESS as usize + offset, len);
        }

        fn invalidate_cache(&mut self, offset: usize, len: usize) {
            // SAFETY: the range lies inside the SDRAM window; dirty lines
            // over it were cleaned before the engine wrote, so dropping
            // them cannot lose CPU data.
            #[allow(clippy::arithmetic_side_effects)] // offset < 32 MB, base fixed
            unsafe {
                self.scb
                    .invalidate_dcache_by_address(SDRAM_BASE_ADDRESS as usize + offset, len);
            }
        }
    }

    /// Cover the whole region with a known value before first use, as the
    /// bring-up has always done. Returns the store error on a wiring fault.
    pub fn cover_fill(store: &mut SdramStore) -> Result<(), StoreError> {
        store.fill_u8(0, 0xFF, store.capacity())?;
        store.clean_cache(0, store.capacity());
        Ok(())
    }

    /// Run the boot self-test and report the result code over defmt.
    /// Returns 0 on pass, 1–7 on fault (see [`store::SelfTestFault`]).
    pub fn report_self_test(store: &mut SdramStore) -> u8 {
        match store::self_test(store) {
            Ok(()) => {
                defmt::info!("sdram: self-test pass (code 0)");
                0
            }
            Err(fault) => {
                defmt::error!("sdram: self-test fault {} (code {})", fault, fault.code());
                fault.code()
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
