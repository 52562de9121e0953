//! Fill/copy correctness: sync paths, async equivalence, and the boot
//! scenario, all over a loopback engine that applies blit ops to host
//! memory the way the DMA2D applies them to SDRAM.

#![allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::arithmetic_side_effects)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use embedded_graphics::pixelcolor::raw::RawU16;
use embedded_graphics::pixelcolor::Rgb565;
use proptest::prelude::*;
use tabula_platform::{
    BlitEngine, BufferMode, CopyOp, CopySource, FillOp, FlushError, FlushGate, FlushNotify,
    FrameError, FrameLayout, FrameManager, PixelStore, Rect, StoreError,
};

/// Host memory shared between the store handed to the manager and the
/// loopback engine, the way SDRAM is shared between the CPU and the DMA2D.
#[derive(Clone)]
struct SharedStore(Rc<RefCell<Vec<u8>>>);

impl SharedStore {
    fn new(len: usize) -> Self {
        Self(Rc::new(RefCell::new(vec![0u8; len])))
    }

    fn snapshot(&self) -> Vec<u8> {
        self.0.borrow().clone()
    }
}

impl PixelStore for SharedStore {
    fn capacity(&self) -> usize {
        self.0.borrow().len()
    }

    fn read(&self, offset: usize, buf: &mut [u8]) -> Result<(), StoreError> {
        let mem = self.0.borrow();
        let end = offset.checked_add(buf.len()).ok_or(StoreError::OutOfRange {
            offset,
            len: buf.len(),
            capacity: mem.len(),
        })?;
        if end > mem.len() {
            return Err(StoreError::OutOfRange {
                offset,
                len: buf.len(),
                capacity: mem.len(),
            });
        }
        buf.copy_from_slice(&mem[offset..end]);
        Ok(())
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), StoreError> {
        let mut mem = self.0.borrow_mut();
        let end = offset.checked_add(data.len()).ok_or(StoreError::OutOfRange {
            offset,
            len: data.len(),
            capacity: mem.len(),
        })?;
        if end > mem.len() {
            return Err(StoreError::OutOfRange {
                offset,
                len: data.len(),
                capacity: mem.len(),
            });
        }
        mem[offset..end].copy_from_slice(data);
        Ok(())
    }

    fn fill_u8(&mut self, offset: usize, value: u8, len: usize) -> Result<(), StoreError> {
        let mut mem = self.0.borrow_mut();
        let end = offset.checked_add(len).ok_or(StoreError::OutOfRange {
            offset,
            len,
            capacity: mem.len(),
        })?;
        if end > mem.len() {
            return Err(StoreError::OutOfRange {
                offset,
                len,
                capacity: mem.len(),
            });
        }
        mem[offset..end].fill(value);
        Ok(())
    }
}

/// Applies ops to the shared memory immediately, like the hardware engine —
/// but leaves the gate in flight. Tests call `FlushGate::complete()`
/// themselves to play the transfer-complete interrupt.
struct LoopbackEngine {
    mem: SharedStore,
    /// Packed pixel buffers reachable via `CopySource::External`.
    external: HashMap<u32, Vec<u16>>,
}

impl LoopbackEngine {
    fn new(mem: SharedStore) -> Self {
        Self {
            mem,
            external: HashMap::new(),
        }
    }

    fn register_external(&mut self, addr: u32, data: Vec<u16>) {
        self.external.insert(addr, data);
    }
}

impl BlitEngine for LoopbackEngine {
    type Error = StoreError;

    fn submit_fill(&mut self, op: &FillOp) -> Result<(), StoreError> {
        let line_stride = (op.width as usize + op.dst_skip as usize) * 2;
        let bytes = op.color.to_le_bytes();
        let mut mem = self.mem.0.borrow_mut();
        for line in 0..op.height as usize {
            let start = op.dst_offset + line * line_stride;
            for px in 0..op.width as usize {
                mem[start + px * 2..start + px * 2 + 2].copy_from_slice(&bytes);
            }
        }
        Ok(())
    }

    fn submit_copy(&mut self, op: &CopyOp) -> Result<(), StoreError> {
        let src_stride = (op.width as usize + op.src_skip as usize) * 2;
        let dst_stride = (op.width as usize + op.dst_skip as usize) * 2;
        let mut mem = self.mem.0.borrow_mut();
        match op.src {
            CopySource::Frame(src_offset) => {
                for line in 0..op.height as usize {
                    let s = src_offset + line * src_stride;
                    let d = op.dst_offset + line * dst_stride;
                    let row: Vec<u8> = mem[s..s + op.width as usize * 2].to_vec();
                    mem[d..d + row.len()].copy_from_slice(&row);
                }
            }
            CopySource::External(addr) => {
                let data = self.external.get(&addr).cloned().unwrap();
                for line in 0..op.height as usize {
                    let d = op.dst_offset + line * dst_stride;
                    for px in 0..op.width as usize {
                        let value = data[line * op.width as usize + px];
                        mem[d + px * 2..d + px * 2 + 2].copy_from_slice(&value.to_le_bytes());
                    }
                }
            }
        }
        Ok(())
    }
}

const W: u16 = 64;
const H: u16 = 48;
const LAYOUT: FrameLayout = FrameLayout { width: W, height: H };

fn manager(
    gate: &FlushGate,
    mode: BufferMode,
) -> (FrameManager<'_, SharedStore, LoopbackEngine>, SharedStore) {
    let buffers = match mode {
        BufferMode::Single => 1,
        BufferMode::Double => 2,
    };
    let mem = SharedStore::new(buffers * LAYOUT.byte_len());
    let engine = LoopbackEngine::new(mem.clone());
    let fm = FrameManager::new(mem.clone(), engine, gate, LAYOUT, mode).unwrap();
    (fm, mem)
}

fn pixel_at(mem: &[u8], buffer_offset: usize, x: u16, y: u16) -> u16 {
    let o = buffer_offset + LAYOUT.byte_offset(x, y);
    u16::from_le_bytes([mem[o], mem[o + 1]])
}

fn rgb565(raw: u16) -> Rgb565 {
    Rgb565::from(RawU16::new(raw))
}

// ── Depth-1 protocol ────────────────────────────────────────────────────────

#[test]
fn second_async_request_is_rejected_while_in_flight() {
    let gate = FlushGate::new();
    let (mut fm, _mem) = manager(&gate, BufferMode::Single);
    fm.fill_color_async(Rect::new(0, 0, 8, 8), rgb565(0x001F))
        .unwrap();
    let err = fm
        .fill_color_async(Rect::new(8, 0, 8, 8), rgb565(0xF800))
        .unwrap_err();
    assert_eq!(err, FrameError::Gate(FlushError::Busy));
    gate.complete();
    // Idle again: the next request goes through.
    fm.fill_color_async(Rect::new(8, 0, 8, 8), rgb565(0xF800))
        .unwrap();
    gate.complete();
}

#[test]
fn rejected_request_does_not_disturb_the_in_flight_transfer() {
    let gate = FlushGate::new();
    let (mut fm, mem) = manager(&gate, BufferMode::Single);
    fm.fill_color_async(Rect::full(W, H), rgb565(0x07E0)).unwrap();
    let _ = fm.fill_color_async(Rect::full(W, H), rgb565(0xF800));
    gate.complete();
    let snap = mem.snapshot();
    assert_eq!(pixel_at(&snap, 0, 0, 0), 0x07E0);
    assert_eq!(pixel_at(&snap, 0, W - 1, H - 1), 0x07E0);
}

// ── Sync/async equivalence ──────────────────────────────────────────────────

#[test]
fn async_fill_matches_sync_fill() {
    let gate_a = FlushGate::new();
    let gate_b = FlushGate::new();
    let (mut sync_fm, sync_mem) = manager(&gate_a, BufferMode::Single);
    let (mut async_fm, async_mem) = manager(&gate_b, BufferMode::Single);

    let rect = Rect::new(5, 7, 20, 11);
    sync_fm.fill_color_sync(rect, rgb565(0xF800)).unwrap();
    async_fm.fill_color_async(rect, rgb565(0xF800)).unwrap();
    gate_b.complete();

    assert_eq!(sync_mem.snapshot(), async_mem.snapshot());
}

#[test]
fn async_external_copy_matches_sync_data_fill() {
    let gate_a = FlushGate::new();
    let gate_b = FlushGate::new();
    let (mut sync_fm, sync_mem) = manager(&gate_a, BufferMode::Single);

    let rect = Rect::new(3, 2, 10, 6);
    let data: Vec<u16> = (0..rect.pixel_count() as u16).collect();
    sync_fm.fill_data_sync(rect, &data).unwrap();

    // The "GUI draw buffer": packed, registered at a fake bus address.
    let addr = 0x2400_0000;
    let mem = SharedStore::new(LAYOUT.byte_len());
    let mut engine = LoopbackEngine::new(mem.clone());
    engine.register_external(addr, data);
    let mut async_fm =
        FrameManager::new(mem.clone(), engine, &gate_b, LAYOUT, BufferMode::Single).unwrap();

    async_fm
        .fill_data_async(rect, CopySource::External(addr), FlushNotify::None)
        .unwrap();
    gate_b.complete();

    assert_eq!(sync_mem.snapshot(), mem.snapshot());
}

#[test]
fn async_present_matches_sync_present() {
    let gate_a = FlushGate::new();
    let gate_b = FlushGate::new();
    let (mut sync_fm, sync_mem) = manager(&gate_a, BufferMode::Double);
    let (mut async_fm, async_mem) = manager(&gate_b, BufferMode::Double);

    for fm in [&mut sync_fm, &mut async_fm] {
        fm.fill_color_sync(Rect::new(0, 0, W, H / 2), rgb565(0x001F))
            .unwrap();
        fm.fill_color_sync(Rect::new(0, H / 2, W, H / 2), rgb565(0xFFFF))
            .unwrap();
    }
    sync_fm.present_back_sync().unwrap();
    async_fm.present_back_async().unwrap();
    gate_b.complete();

    assert_eq!(sync_mem.snapshot(), async_mem.snapshot());
}

// ── Flush event delivery ────────────────────────────────────────────────────

#[test]
fn notified_copy_delivers_the_event_exactly_once() {
    let gate = FlushGate::new();
    let mem = SharedStore::new(LAYOUT.byte_len());
    let mut engine = LoopbackEngine::new(mem.clone());
    engine.register_external(0x2400_0000, vec![0x1234; 4]);
    let mut fm = FrameManager::new(mem, engine, &gate, LAYOUT, BufferMode::Single).unwrap();

    fm.fill_data_async(
        Rect::new(0, 0, 2, 2),
        CopySource::External(0x2400_0000),
        FlushNotify::Event,
    )
    .unwrap();
    assert!(!gate.take_flush_event(), "event visible before completion");
    gate.complete();
    assert!(gate.take_flush_event());
    assert!(!gate.take_flush_event());

    // An un-notified transfer afterwards stays silent.
    fm.fill_color_async(Rect::new(0, 0, 2, 2), rgb565(0))
        .unwrap();
    gate.complete();
    assert!(!gate.take_flush_event());
}

// ── Boot scenario: full-panel repaints leave no residue ─────────────────────

#[test]
fn full_panel_blue_then_red_leaves_no_residual_blue() {
    let gate = FlushGate::new();
    let layout = FrameLayout::PANEL;
    let mem = SharedStore::new(layout.byte_len());
    let engine = LoopbackEngine::new(mem.clone());
    let mut fm =
        FrameManager::new(mem.clone(), engine, &gate, layout, BufferMode::Single).unwrap();
    let full = Rect::full(layout.width, layout.height);

    fm.fill_color_sync(full, rgb565(0x001F)).unwrap();
    let snap = mem.snapshot();
    assert!(snap
        .chunks_exact(2)
        .all(|p| u16::from_le_bytes([p[0], p[1]]) == 0x001F));
    assert_eq!(snap.len() / 2, 1_024_000);

    fm.fill_color_async(full, rgb565(0xF800)).unwrap();
    gate.complete();
    assert!(mem
        .snapshot()
        .chunks_exact(2)
        .all(|p| u16::from_le_bytes([p[0], p[1]]) == 0xF800));
}

// ── Property tests ──────────────────────────────────────────────────────────

fn arb_rect() -> impl Strategy<Value = Rect> {
    (0..W, 0..H).prop_flat_map(|(x, y)| {
        (1..=W - x, 1..=H - y).prop_map(move |(w, h)| Rect::new(x, y, w, h))
    })
}

proptest! {
    #[test]
    fn sync_fill_paints_inside_and_only_inside(rect in arb_rect(), raw in any::<u16>()) {
        let gate = FlushGate::new();
        let (mut fm, mem) = manager(&gate, BufferMode::Single);
        fm.fill_color_sync(rect, rgb565(raw)).unwrap();
        let snap = mem.snapshot();
        // Rgb565 storage round-trips the raw value.
        for y in 0..H {
            for x in 0..W {
                let inside = x >= rect.x
                    && x < rect.x + rect.width
                    && y >= rect.y
                    && y < rect.y + rect.height;
                let expected = if inside { raw } else { 0 };
                prop_assert_eq!(pixel_at(&snap, 0, x, y), expected);
            }
        }
    }

    #[test]
    fn async_fill_is_equivalent_to_sync_fill(rect in arb_rect(), raw in any::<u16>()) {
        let gate_a = FlushGate::new();
        let gate_b = FlushGate::new();
        let (mut sync_fm, sync_mem) = manager(&gate_a, BufferMode::Single);
        let (mut async_fm, async_mem) = manager(&gate_b, BufferMode::Single);
        sync_fm.fill_color_sync(rect, rgb565(raw)).unwrap();
        async_fm.fill_color_async(rect, rgb565(raw)).unwrap();
        gate_b.complete();
        prop_assert_eq!(sync_mem.snapshot(), async_mem.snapshot());
    }

    #[test]
    fn sync_data_fill_reads_back_exactly(rect in arb_rect()) {
        let gate = FlushGate::new();
        let (mut fm, mem) = manager(&gate, BufferMode::Single);
        let data: Vec<u16> = (0..rect.pixel_count() as u16).map(|i| i.wrapping_mul(31)).collect();
        fm.fill_data_sync(rect, &data).unwrap();
        let snap = mem.snapshot();
        for row in 0..rect.height {
            for col in 0..rect.width {
                let expected = data[row as usize * rect.width as usize + col as usize];
                prop_assert_eq!(pixel_at(&snap, 0, rect.x + col, rect.y + row), expected);
            }
        }
    }
}
