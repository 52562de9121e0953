//! Frame buffer manager: rectangle-validated fills, copies and presents.
//!
//! The manager owns a [`PixelStore`] (the SDRAM window on hardware) and a
//! [`BlitEngine`] (DMA2D on hardware), shares a [`FlushGate`] with the
//! transfer-complete interrupt, and exposes the drawing surface the rest of
//! the firmware talks to. Every operation validates its rectangle against
//! the surface first — an out-of-bounds request is reported, never clamped
//! and never allowed to scribble past the frame.
//!
//! Two flavours of each bulk operation:
//!
//! - **sync** — the CPU writes through the store row by row. Complete when
//!   the call returns. Used at boot and whenever simplicity beats
//!   throughput.
//! - **async** — the gate is claimed, an op descriptor is handed to the
//!   engine, and the call returns with the transfer in flight. Completion
//!   arrives through the gate. The two flavours are pixel-for-pixel
//!   equivalent once the async transfer has completed.
//!
//! In double-buffer mode all drawing lands in the back buffer and
//! [`FrameManager::present_back_sync`] / [`FrameManager::present_back_async`]
//! publish it to the front (scanned-out) buffer in one full-frame copy.
//!
//! Before handing a region to the engine the manager runs the store's cache
//! hooks over it (clean the source, clean+invalidate the destination), so
//! CPU-composed pixels are visible to the engine and engine-written pixels
//! to the CPU. On the host those hooks are no-ops.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::IntoStorage;
use thiserror_no_std::Error;

use crate::blit::{BlitEngine, CopyOp, CopySource, FillOp};
use crate::config::{BYTES_PER_PIXEL, PANEL_HEIGHT, PANEL_WIDTH};
use crate::flush::{FlushError, FlushGate};
use crate::rect::{Rect, Rotation};
use crate::store::{PixelStore, StoreError};

/// Frame-level errors. `E` is the blit engine's submit error.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError<E> {
    /// The rectangle is empty or extends past the surface.
    #[error("rectangle out of bounds")]
    OutOfBounds {
        /// The offending rectangle.
        rect: Rect,
    },
    /// Pixel data length does not match the rectangle's pixel count.
    #[error("source has {actual} pixels, rectangle needs {expected}")]
    SourceSizeMismatch {
        /// Pixels the rectangle covers.
        expected: usize,
        /// Pixels supplied.
        actual: usize,
    },
    /// A present was requested but the manager has no back buffer.
    #[error("present requires double buffering")]
    SingleBuffered,
    /// The flush gate rejected the request.
    #[error("flush gate: {0}")]
    Gate(#[from] FlushError),
    /// The store rejected an access.
    #[error("store: {0}")]
    Store(#[from] StoreError),
    /// The engine rejected the submitted operation.
    #[error("blit engine rejected the operation")]
    Engine(E),
}

/// Geometry of one frame buffer: row-major RGB565, stride = `width`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameLayout {
    /// Surface width in pixels.
    pub width: u16,
    /// Surface height in pixels.
    pub height: u16,
}

impl FrameLayout {
    /// The board's panel: 800×1280 portrait.
    pub const PANEL: Self = Self {
        width: PANEL_WIDTH,
        height: PANEL_HEIGHT,
    };

    /// Pixels in one frame.
    #[allow(clippy::arithmetic_side_effects)] // u16 operands widened to usize
    pub const fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Bytes in one frame.
    #[allow(clippy::arithmetic_side_effects)] // pixel count times 2 fits usize
    pub const fn byte_len(&self) -> usize {
        self.pixel_count() * BYTES_PER_PIXEL
    }

    /// Byte offset of pixel `(x, y)` from the buffer origin.
    ///
    /// Caller guarantees `x < width` and `y < height`.
    #[allow(clippy::arithmetic_side_effects)] // x < width, y < height by contract
    pub const fn byte_offset(&self, x: u16, y: u16) -> usize {
        (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL
    }
}

/// How many frame buffers the manager lays out in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BufferMode {
    /// One buffer; drawing and scan-out share it.
    Single,
    /// Front buffer scanned out, back buffer drawn into, explicit present.
    Double,
}

/// Whether an asynchronous operation arms the one-shot flush event.
///
/// GUI flushes pass [`FlushNotify::Event`] so the main loop can acknowledge
/// the toolkit after completion; internal transfers pass
/// [`FlushNotify::None`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlushNotify {
    /// Complete silently.
    None,
    /// Latch the flush event on completion.
    Event,
}

/// The drawing surface: store + engine + gate behind a validated rect API.
pub struct FrameManager<'g, S, B> {
    store: S,
    engine: B,
    gate: &'g FlushGate,
    layout: FrameLayout,
    mode: BufferMode,
    front_offset: usize,
    back_offset: usize,
}

impl<'g, S, B> FrameManager<'g, S, B>
where
    S: PixelStore,
    B: BlitEngine,
{
    /// Lay the frame buffer(s) out at the bottom of `store` and validate
    /// they fit: one `layout`-sized buffer for [`BufferMode::Single`], two
    /// back-to-back for [`BufferMode::Double`].
    pub fn new(
        store: S,
        engine: B,
        gate: &'g FlushGate,
        layout: FrameLayout,
        mode: BufferMode,
    ) -> Result<Self, FrameError<B::Error>> {
        let frame_bytes = layout.byte_len();
        let needed = match mode {
            BufferMode::Single => frame_bytes,
            BufferMode::Double => frame_bytes.checked_mul(2).ok_or(StoreError::OutOfRange {
                offset: 0,
                len: usize::MAX,
                capacity: store.capacity(),
            })?,
        };
        if needed > store.capacity() {
            return Err(FrameError::Store(StoreError::OutOfRange {
                offset: 0,
                len: needed,
                capacity: store.capacity(),
            }));
        }
        let back_offset = match mode {
            BufferMode::Single => 0,
            BufferMode::Double => frame_bytes,
        };
        Ok(Self {
            store,
            engine,
            gate,
            layout,
            mode,
            front_offset: 0,
            back_offset,
        })
    }

    /// Surface geometry.
    pub fn layout(&self) -> FrameLayout {
        self.layout
    }

    /// Byte offset of the scanned-out buffer in the store.
    pub fn front_offset(&self) -> usize {
        self.front_offset
    }

    /// Byte offset of the drawing buffer in the store. Equals
    /// [`Self::front_offset`] in single-buffer mode.
    pub fn back_offset(&self) -> usize {
        self.back_offset
    }

    /// The shared flush gate (for draining the flush event in the main
    /// loop).
    pub fn gate(&self) -> &'g FlushGate {
        self.gate
    }

    /// The underlying store, for read-back and diagnostics.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mutable store access (boot-time cover fills, self-test).
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Wait for any in-flight transfer to finish, bounded by `timeout`.
    pub async fn wait_idle(
        &self,
        timeout: embassy_time::Duration,
    ) -> Result<(), FlushError> {
        self.gate.wait_idle(timeout).await
    }

    fn check_rect(&self, rect: Rect) -> Result<(), FrameError<B::Error>> {
        if rect.fits(self.layout.width, self.layout.height) {
            Ok(())
        } else {
            Err(FrameError::OutOfBounds { rect })
        }
    }

    /// Byte offset of the rectangle's top-left pixel in the drawing buffer.
    /// `rect` must already be validated.
    #[allow(clippy::arithmetic_side_effects)] // rect fits, buffers fit the store
    fn draw_offset(&self, rect: Rect) -> usize {
        self.back_offset + self.layout.byte_offset(rect.x, rect.y)
    }

    /// Pixels between the end of one rectangle line and the start of the
    /// next (the DMA2D line-offset value).
    #[allow(clippy::arithmetic_side_effects)] // rect.width <= layout.width, validated
    fn line_skip(&self, rect: Rect) -> u16 {
        self.layout.width - rect.width
    }

    /// Byte span an engine op touches inside a frame: first pixel of the
    /// first line through last pixel of the last line.
    #[allow(clippy::arithmetic_side_effects)] // rect validated, height >= 1
    fn rect_span_bytes(&self, rect: Rect) -> usize {
        ((rect.height as usize - 1) * self.layout.width as usize + rect.width as usize)
            * BYTES_PER_PIXEL
    }

    /// Make a region the engine will write safe against the D-cache: flush
    /// dirty CPU lines out, then drop them so later reads hit memory.
    fn prepare_engine_dst(&mut self, offset: usize, len: usize) {
        self.store.clean_cache(offset, len);
        self.store.invalidate_cache(offset, len);
    }

    // ── Solid fills ─────────────────────────────────────────────────────

    /// Fill `rect` with `color`, CPU path. Complete on return.
    pub fn fill_color_sync(
        &mut self,
        rect: Rect,
        color: Rgb565,
    ) -> Result<(), FrameError<B::Error>> {
        self.check_rect(rect)?;
        let raw = color.into_storage();
        #[allow(clippy::arithmetic_side_effects)] // u16 width widened to usize
        let stride = self.layout.width as usize * BYTES_PER_PIXEL;
        let mut offset = self.draw_offset(rect);
        for _ in 0..rect.height {
            self.store.fill_u16(offset, raw, rect.width as usize)?;
            #[allow(clippy::arithmetic_side_effects)] // rows stay inside a validated frame
            {
                offset += stride;
            }
        }
        Ok(())
    }

    /// Fill `rect` with `color` through the blit engine. Returns with the
    /// transfer in flight; rejected with [`FlushError::Busy`] if one
    /// already is.
    pub fn fill_color_async(
        &mut self,
        rect: Rect,
        color: Rgb565,
    ) -> Result<(), FrameError<B::Error>> {
        self.check_rect(rect)?;
        let op = FillOp {
            dst_offset: self.draw_offset(rect),
            color: color.into_storage(),
            width: rect.width,
            height: rect.height,
            dst_skip: self.line_skip(rect),
        };
        self.gate.try_begin()?;
        self.prepare_engine_dst(op.dst_offset, self.rect_span_bytes(rect));
        if let Err(e) = self.engine.submit_fill(&op) {
            self.gate.cancel();
            return Err(FrameError::Engine(e));
        }
        Ok(())
    }

    // ── Pixel-data fills ────────────────────────────────────────────────

    /// Write `data` (row-major, exactly `rect.pixel_count()` RGB565 values)
    /// into `rect`, CPU path with stride correction.
    pub fn fill_data_sync(
        &mut self,
        rect: Rect,
        data: &[u16],
    ) -> Result<(), FrameError<B::Error>> {
        self.check_rect(rect)?;
        if data.len() != rect.pixel_count() {
            return Err(FrameError::SourceSizeMismatch {
                expected: rect.pixel_count(),
                actual: data.len(),
            });
        }
        #[allow(clippy::arithmetic_side_effects)] // u16 width widened to usize
        let stride = self.layout.width as usize * BYTES_PER_PIXEL;
        let mut offset = self.draw_offset(rect);
        for row in data.chunks_exact(rect.width as usize) {
            self.store.write_u16_stream(offset, row)?;
            #[allow(clippy::arithmetic_side_effects)] // rows stay inside a validated frame
            {
                offset += stride;
            }
        }
        Ok(())
    }

    /// Copy a rectangle of pixel data into `rect` through the blit engine.
    ///
    /// For [`CopySource::External`] the source is a packed buffer outside
    /// the store; the caller is responsible for its lifetime until
    /// completion and, on hardware, for cleaning the data cache over it
    /// first. With [`FlushNotify::Event`] the completion interrupt latches
    /// the one-shot flush event for the main loop.
    pub fn fill_data_async(
        &mut self,
        rect: Rect,
        src: CopySource,
        notify: FlushNotify,
    ) -> Result<(), FrameError<B::Error>> {
        self.check_rect(rect)?;
        let src_skip = match src {
            CopySource::External(_) => 0,
            CopySource::Frame(_) => self.line_skip(rect),
        };
        let op = CopyOp {
            src,
            src_skip,
            dst_offset: self.draw_offset(rect),
            width: rect.width,
            height: rect.height,
            dst_skip: self.line_skip(rect),
        };
        match notify {
            FlushNotify::None => self.gate.try_begin()?,
            FlushNotify::Event => self.gate.try_begin_notified()?,
        }
        if let CopySource::Frame(src_offset) = op.src {
            let span = self.rect_span_bytes(rect);
            self.store.clean_cache(src_offset, span);
        }
        self.prepare_engine_dst(op.dst_offset, self.rect_span_bytes(rect));
        if let Err(e) = self.engine.submit_copy(&op) {
            self.gate.cancel();
            return Err(FrameError::Engine(e));
        }
        Ok(())
    }

    /// Write `data` rendered for a rotated mounting: `rect` and `data` are
    /// in *logical* coordinates (the orientation the GUI composes in); each
    /// pixel is remapped through `rotation` onto the physical panel before
    /// its destination offset is computed. CPU path, per-pixel.
    pub fn fill_rotated_sync(
        &mut self,
        rect: Rect,
        data: &[u16],
        rotation: Rotation,
    ) -> Result<(), FrameError<B::Error>> {
        // The logical surface is the panel seen through the rotation.
        let (lw, lh) = rotation.physical_size(self.layout.width, self.layout.height);
        if !rect.fits(lw, lh) {
            return Err(FrameError::OutOfBounds { rect });
        }
        if data.len() != rect.pixel_count() {
            return Err(FrameError::SourceSizeMismatch {
                expected: rect.pixel_count(),
                actual: data.len(),
            });
        }
        for (row, line) in data.chunks_exact(rect.width as usize).enumerate() {
            for (col, &value) in line.iter().enumerate() {
                #[allow(clippy::arithmetic_side_effects)] // rect fits the logical surface
                let (lx, ly) = (rect.x + col as u16, rect.y + row as u16);
                let (px, py) = rotation.map(lx, ly, lw, lh);
                #[allow(clippy::arithmetic_side_effects)] // map() lands inside the panel
                let offset = self.back_offset + self.layout.byte_offset(px, py);
                self.store.write_u16(offset, value)?;
            }
        }
        Ok(())
    }

    // ── Double-buffer present ───────────────────────────────────────────

    /// Copy the whole back buffer to the front buffer, CPU path.
    pub fn present_back_sync(&mut self) -> Result<(), FrameError<B::Error>> {
        if self.mode != BufferMode::Double {
            return Err(FrameError::SingleBuffered);
        }
        self.store
            .copy_within(self.back_offset, self.front_offset, self.layout.byte_len())?;
        // The scan-out side reads physical memory; push the copy out.
        self.store.clean_cache(self.front_offset, self.layout.byte_len());
        Ok(())
    }

    /// Copy the whole back buffer to the front buffer through the blit
    /// engine. Returns with the transfer in flight.
    pub fn present_back_async(&mut self) -> Result<(), FrameError<B::Error>> {
        if self.mode != BufferMode::Double {
            return Err(FrameError::SingleBuffered);
        }
        let op = CopyOp {
            src: CopySource::Frame(self.back_offset),
            src_skip: 0,
            dst_offset: self.front_offset,
            width: self.layout.width,
            height: self.layout.height,
            dst_skip: 0,
        };
        self.gate.try_begin()?;
        self.store.clean_cache(self.back_offset, self.layout.byte_len());
        self.prepare_engine_dst(self.front_offset, self.layout.byte_len());
        if let Err(e) = self.engine.submit_copy(&op) {
            self.gate.cancel();
            return Err(FrameError::Engine(e));
        }
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
//
// Engine-backed equivalence and the full-panel scenarios live in
// tests/fill_properties.rs; this module covers validation and the sync paths
// on small surfaces where every pixel can be inspected.

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]
mod tests {
    use super::*;
    use crate::store::SliceStore;

    /// Engine for tests that never reach submission.
    struct NullEngine;

    impl BlitEngine for NullEngine {
        type Error = ();
        fn submit_fill(&mut self, _op: &FillOp) -> Result<(), ()> {
            Ok(())
        }
        fn submit_copy(&mut self, _op: &CopyOp) -> Result<(), ()> {
            Ok(())
        }
    }

    const W: u16 = 8;
    const H: u16 = 6;
    const LAYOUT: FrameLayout = FrameLayout { width: W, height: H };

    fn pixel_at(mem: &[u8], buffer_offset: usize, x: u16, y: u16) -> u16 {
        let o = buffer_offset + LAYOUT.byte_offset(x, y);
        u16::from_le_bytes([mem[o], mem[o + 1]])
    }

    #[test]
    fn construction_rejects_store_too_small_for_two_buffers() {
        let mut mem = vec![0u8; LAYOUT.byte_len()];
        let gate = FlushGate::new();
        let result = FrameManager::new(
            SliceStore::new(&mut mem),
            NullEngine,
            &gate,
            LAYOUT,
            BufferMode::Double,
        );
        assert!(matches!(result, Err(FrameError::Store(_))));
    }

    #[test]
    fn fill_color_sync_touches_only_the_rectangle() {
        let mut mem = vec![0u8; 2 * LAYOUT.byte_len()];
        let gate = FlushGate::new();
        let mut fm = FrameManager::new(
            SliceStore::new(&mut mem),
            NullEngine,
            &gate,
            LAYOUT,
            BufferMode::Double,
        )
        .unwrap();
        let rect = Rect::new(2, 1, 3, 4);
        fm.fill_color_sync(rect, Rgb565::new(0x1F, 0, 0)).unwrap();
        let back = fm.back_offset();
        drop(fm);
        for y in 0..H {
            for x in 0..W {
                let inside =
                    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height;
                let expected = if inside { 0xF800 } else { 0x0000 };
                assert_eq!(pixel_at(&mem, back, x, y), expected, "pixel ({x},{y})");
            }
        }
        // The front buffer stays untouched until a present.
        assert!(mem[..LAYOUT.byte_len()].iter().all(|&b| b == 0));
    }

    #[test]
    fn fill_data_sync_applies_stride_correction() {
        let mut mem = vec![0u8; LAYOUT.byte_len()];
        let gate = FlushGate::new();
        let mut fm = FrameManager::new(
            SliceStore::new(&mut mem),
            NullEngine,
            &gate,
            LAYOUT,
            BufferMode::Single,
        )
        .unwrap();
        // 2×3 rectangle of distinct values.
        let rect = Rect::new(5, 2, 2, 3);
        let data = [1u16, 2, 3, 4, 5, 6];
        fm.fill_data_sync(rect, &data).unwrap();
        drop(fm);
        assert_eq!(pixel_at(&mem, 0, 5, 2), 1);
        assert_eq!(pixel_at(&mem, 0, 6, 2), 2);
        assert_eq!(pixel_at(&mem, 0, 5, 3), 3);
        assert_eq!(pixel_at(&mem, 0, 6, 4), 6);
        // Neighbour just right of the rectangle is untouched.
        assert_eq!(pixel_at(&mem, 0, 7, 2), 0);
    }

    #[test]
    fn out_of_bounds_rectangles_are_rejected_not_clamped() {
        let mut mem = vec![0u8; LAYOUT.byte_len()];
        let gate = FlushGate::new();
        let mut fm = FrameManager::new(
            SliceStore::new(&mut mem),
            NullEngine,
            &gate,
            LAYOUT,
            BufferMode::Single,
        )
        .unwrap();
        let over = Rect::new(4, 0, W, 1);
        assert!(matches!(
            fm.fill_color_sync(over, Rgb565::new(0, 0, 0)),
            Err(FrameError::OutOfBounds { .. })
        ));
        let empty = Rect::new(0, 0, 0, 5);
        assert!(matches!(
            fm.fill_color_sync(empty, Rgb565::new(0, 0, 0)),
            Err(FrameError::OutOfBounds { .. })
        ));
        drop(fm);
        assert!(mem.iter().all(|&b| b == 0), "rejected fill wrote pixels");
    }

    #[test]
    fn fill_data_sync_rejects_wrong_source_length() {
        let mut mem = vec![0u8; LAYOUT.byte_len()];
        let gate = FlushGate::new();
        let mut fm = FrameManager::new(
            SliceStore::new(&mut mem),
            NullEngine,
            &gate,
            LAYOUT,
            BufferMode::Single,
        )
        .unwrap();
        let rect = Rect::new(0, 0, 2, 2);
        let err = fm.fill_data_sync(rect, &[0u16; 3]).unwrap_err();
        assert_eq!(
            err,
            FrameError::SourceSizeMismatch {
                expected: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn present_back_sync_copies_back_to_front() {
        let mut mem = vec![0u8; 2 * LAYOUT.byte_len()];
        let gate = FlushGate::new();
        let mut fm = FrameManager::new(
            SliceStore::new(&mut mem),
            NullEngine,
            &gate,
            LAYOUT,
            BufferMode::Double,
        )
        .unwrap();
        fm.fill_color_sync(Rect::full(W, H), Rgb565::new(0, 0x3F, 0))
            .unwrap();
        fm.present_back_sync().unwrap();
        drop(fm);
        for y in 0..H {
            for x in 0..W {
                assert_eq!(pixel_at(&mem, 0, x, y), 0x07E0);
            }
        }
    }

    #[test]
    fn present_requires_double_buffering() {
        let mut mem = vec![0u8; LAYOUT.byte_len()];
        let gate = FlushGate::new();
        let mut fm = FrameManager::new(
            SliceStore::new(&mut mem),
            NullEngine,
            &gate,
            LAYOUT,
            BufferMode::Single,
        )
        .unwrap();
        assert!(matches!(
            fm.present_back_sync(),
            Err(FrameError::SingleBuffered)
        ));
        assert!(matches!(
            fm.present_back_async(),
            Err(FrameError::SingleBuffered)
        ));
        // The failed async present must not have claimed the gate.
        assert!(gate.is_idle());
    }

    #[test]
    fn single_buffer_draws_land_in_the_front_buffer() {
        let mut mem = vec![0u8; LAYOUT.byte_len()];
        let gate = FlushGate::new();
        let mut fm = FrameManager::new(
            SliceStore::new(&mut mem),
            NullEngine,
            &gate,
            LAYOUT,
            BufferMode::Single,
        )
        .unwrap();
        assert_eq!(fm.front_offset(), fm.back_offset());
        fm.fill_color_sync(Rect::new(0, 0, 1, 1), Rgb565::new(0x1F, 0x3F, 0x1F))
            .unwrap();
        drop(fm);
        assert_eq!(pixel_at(&mem, 0, 0, 0), 0xFFFF);
    }

    #[test]
    fn fill_rotated_sync_lands_pixels_per_mapping() {
        let mut mem = vec![0u8; LAYOUT.byte_len()];
        let gate = FlushGate::new();
        let mut fm = FrameManager::new(
            SliceStore::new(&mut mem),
            NullEngine,
            &gate,
            LAYOUT,
            BufferMode::Single,
        )
        .unwrap();
        // Logical surface under CW90 is H×W (6 wide, 8 tall). A 2×1 logical
        // rectangle at (0, 0) lands in the physical top-right corner area.
        let rect = Rect::new(0, 0, 2, 1);
        fm.fill_rotated_sync(rect, &[0xAAAA, 0xBBBB], Rotation::Cw90)
            .unwrap();
        drop(fm);
        // map(0,0,6,8) = (7,0); map(1,0,6,8) = (7,1).
        assert_eq!(pixel_at(&mem, 0, 7, 0), 0xAAAA);
        assert_eq!(pixel_at(&mem, 0, 7, 1), 0xBBBB);
    }

    #[test]
    fn fill_rotated_sync_validates_against_the_logical_surface() {
        let mut mem = vec![0u8; LAYOUT.byte_len()];
        let gate = FlushGate::new();
        let mut fm = FrameManager::new(
            SliceStore::new(&mut mem),
            NullEngine,
            &gate,
            LAYOUT,
            BufferMode::Single,
        )
        .unwrap();
        // 8 wide fits the physical surface but not the 6-wide logical one.
        let rect = Rect::new(0, 0, W, 1);
        assert!(matches!(
            fm.fill_rotated_sync(rect, &[0u16; W as usize], Rotation::Cw90),
            Err(FrameError::OutOfBounds { .. })
        ));
        // The same rectangle is fine unrotated.
        assert!(fm
            .fill_rotated_sync(rect, &[0u16; W as usize], Rotation::None)
            .is_ok());
    }
}
