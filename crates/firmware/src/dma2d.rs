//! DMA2D as the board's blit engine, plus its transfer-complete interrupt.
//!
//! The engine runs two of the DMA2D's modes:
//!
//! - register-to-memory for solid fills (OCOLR replicated across the
//!   rectangle), and
//! - memory-to-memory for copies (foreground channel in RGB565, no pixel
//!   format conversion).
//!
//! Rectangles that are narrower than the 800-pixel frame stride are handled
//! with the line-offset registers: OOR/FGOR hold the number of pixels to
//! skip between lines, exactly the `dst_skip`/`src_skip` fields of the op
//! descriptors.
//!
//! Completion is interrupt-driven. The handler clears TCIF and releases the
//! shared [`FLUSH_GATE`]; it never calls into GUI or task code — consumers
//! poll [`FlushGate::take_flush_event`] from task context instead.
//!
//! Submission never fails: by the time an op reaches the engine the gate is
//! already held and the descriptor validated, so `Error = Infallible`.

use core::convert::Infallible;

use embassy_stm32::interrupt;
use embassy_stm32::interrupt::typelevel::{Binding, Handler, Interrupt};
use embassy_stm32::pac;
use embassy_stm32::pac::dma2d::vals;
use embassy_stm32::peripherals::DMA2D;
use tabula_platform::config::SDRAM_BASE_ADDRESS;
use tabula_platform::{BlitEngine, CopyOp, CopySource, FillOp, FlushGate};

/// The one gate arbitrating the one engine. Shared between task context
/// (through the frame manager) and the DMA2D interrupt handler.
pub static FLUSH_GATE: FlushGate = FlushGate::new();

/// Bus address of a byte offset inside the SDRAM store.
#[allow(clippy::arithmetic_side_effects)] // offsets are validated against the 32 MB window
const fn bus_address(offset: usize) -> u32 {
    SDRAM_BASE_ADDRESS + offset as u32
}

/// Transfer-complete interrupt handler. Bind with:
///
/// ```rust,ignore
/// bind_interrupts!(struct Irqs {
///     DMA2D => tabula_firmware::dma2d::InterruptHandler;
/// });
/// ```
pub struct InterruptHandler;

impl Handler<interrupt::typelevel::DMA2D> for InterruptHandler {
    unsafe fn on_interrupt() {
        let isr = pac::DMA2D.isr().read();
        if isr.teif() {
            // Transfer error: a misprogrammed address or a bus fault.
            // Release the gate so the pipeline does not wedge; the frame is
            // lost.
            pac::DMA2D.ifcr().write(|w| w.set_cteif(true));
            defmt::error!("dma2d: transfer error");
            FLUSH_GATE.complete();
        }
        if isr.tcif() {
            pac::DMA2D.ifcr().write(|w| w.set_ctcif(true));
            FLUSH_GATE.complete();
        }
    }
}

/// The DMA2D peripheral as a [`BlitEngine`].
pub struct Dma2d {
    _peri: DMA2D,
}

impl Dma2d {
    /// Claim the peripheral, enable its clock, and unmask the
    /// transfer-complete interrupt.
    pub fn new(peri: DMA2D, _irq: impl Binding<interrupt::typelevel::DMA2D, InterruptHandler>) -> Self {
        pac::RCC.ahb3enr().modify(|w| w.set_dma2den(true));
        interrupt::typelevel::DMA2D::unpend();
        // SAFETY: the handler only touches DMA2D flag registers and the
        // lock-free gate; unmasking before first submit is sound.
        unsafe { interrupt::typelevel::DMA2D::enable() };
        Self { _peri: peri }
    }
}

impl BlitEngine for Dma2d {
    type Error = Infallible;

    fn submit_fill(&mut self, op: &FillOp) -> Result<(), Infallible> {
        let r = pac::DMA2D;
        r.opfccr().write(|w| w.set_cm(vals::OpfccrCm::RGB565));
        r.omar().write(|w| w.set_ma(bus_address(op.dst_offset)));
        r.oor().write(|w| w.set_lo(op.dst_skip));
        r.nlr().write(|w| {
            w.set_pl(op.width);
            w.set_nl(op.height);
        });
        // OCOLR in RGB565 output mode takes the raw pixel in the low half.
        r.ocolr().write(|w| w.0 = u32::from(op.color));
        r.cr().write(|w| {
            w.set_mode(vals::Mode::REGISTERTOMEMORY);
            w.set_tcie(true);
            w.set_teie(true);
            w.set_start(true);
        });
        Ok(())
    }

    fn submit_copy(&mut self, op: &CopyOp) -> Result<(), Infallible> {
        let src_addr = match op.src {
            CopySource::Frame(offset) => bus_address(offset),
            CopySource::External(addr) => addr,
        };
        let r = pac::DMA2D;
        r.fgpfccr().write(|w| w.set_cm(vals::FgpfccrCm::RGB565));
        r.fgmar().write(|w| w.set_ma(src_addr));
        r.fgor().write(|w| w.set_lo(op.src_skip));
        r.opfccr().write(|w| w.set_cm(vals::OpfccrCm::RGB565));
        r.omar().write(|w| w.set_ma(bus_address(op.dst_offset)));
        r.oor().write(|w| w.set_lo(op.dst_skip));
        r.nlr().write(|w| {
            w.set_pl(op.width);
            w.set_nl(op.height);
        });
        r.cr().write(|w| {
            w.set_mode(vals::Mode::MEMORYTOMEMORY);
            w.set_tcie(true);
            w.set_teie(true);
            w.set_start(true);
        });
        Ok(())
    }
}
