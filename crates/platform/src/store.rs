//! Bounds-checked memory store underneath the frame buffers.
//!
//! On hardware this is the FMC SDRAM window at `0xC000_0000`; in tests it is
//! a heap-allocated `Vec<u8>`. Every primitive checks that the addressed
//! range lies inside the store and reports [`StoreError::OutOfRange`]
//! otherwise, in release builds as well as debug. An unchecked write past a
//! frame buffer corrupts whatever the GUI placed next to it.
//!
//! 16-bit values cross the bus as little-endian byte pairs, matching the
//! RGB565 layout the panel scans out.
//!
//! # Cache maintenance
//!
//! The Cortex-M7 D-cache sits between CPU writes and DMA2D reads. The store
//! exposes [`PixelStore::clean_cache`]/[`PixelStore::invalidate_cache`] hooks
//! (no-ops off hardware) so the boot self-test and the async blit paths can
//! sequence CPU stores against DMA-visible memory; the hardware store maps
//! them to `SCB` clean/invalidate by address.

use thiserror_no_std::Error;

/// Store-level errors.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// The addressed range does not lie inside `[0, capacity)`.
    #[error("range {offset}+{len} exceeds store capacity {capacity}")]
    OutOfRange {
        /// Requested start offset in bytes.
        offset: usize,
        /// Requested length in bytes.
        len: usize,
        /// Store capacity in bytes.
        capacity: usize,
    },
}

/// Byte-addressable pixel memory with checked access.
pub trait PixelStore {
    /// Total capacity in bytes.
    fn capacity(&self) -> usize;

    /// Read `buf.len()` bytes starting at `offset`.
    fn read(&self, offset: usize, buf: &mut [u8]) -> Result<(), StoreError>;

    /// Write `data` starting at `offset`.
    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), StoreError>;

    /// Fill `len` bytes starting at `offset` with `value`.
    fn fill_u8(&mut self, offset: usize, value: u8, len: usize) -> Result<(), StoreError>;

    /// Flush CPU-cached writes in the range out to memory. No-op off hardware.
    fn clean_cache(&mut self, offset: usize, len: usize) {
        let _ = (offset, len);
    }

    /// Drop CPU-cached lines in the range so the next read hits memory.
    /// No-op off hardware.
    fn invalidate_cache(&mut self, offset: usize, len: usize) {
        let _ = (offset, len);
    }

    /// Write one 16-bit value at `offset` (little-endian).
    fn write_u16(&mut self, offset: usize, value: u16) -> Result<(), StoreError> {
        self.write(offset, &value.to_le_bytes())
    }

    /// Read one 16-bit value at `offset` (little-endian).
    fn read_u16(&self, offset: usize) -> Result<u16, StoreError> {
        let mut buf = [0u8; 2];
        self.read(offset, &mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    /// Fill `count` consecutive 16-bit slots starting at `offset` with
    /// `value`. One row of a solid-color rectangle is one such call.
    fn fill_u16(&mut self, offset: usize, value: u16, count: usize) -> Result<(), StoreError> {
        check_range(offset, byte_len_of_words(count, self.capacity())?, self.capacity())?;
        let bytes = value.to_le_bytes();
        for slot in 0..count {
            // Range checked above; per-slot offsets cannot overflow.
            #[allow(clippy::arithmetic_side_effects)]
            self.write(offset + slot * 2, &bytes)?;
        }
        Ok(())
    }

    /// Write a stream of 16-bit values starting at `offset`. One row of a
    /// pixel-data rectangle is one such call.
    fn write_u16_stream(&mut self, offset: usize, data: &[u16]) -> Result<(), StoreError> {
        check_range(
            offset,
            byte_len_of_words(data.len(), self.capacity())?,
            self.capacity(),
        )?;
        for (slot, value) in data.iter().enumerate() {
            #[allow(clippy::arithmetic_side_effects)]
            self.write(offset + slot * 2, &value.to_le_bytes())?;
        }
        Ok(())
    }

    /// Copy `len` bytes from `src_offset` to `dst_offset` within the store.
    /// Regions are assumed disjoint (front/back buffers never overlap).
    fn copy_within(
        &mut self,
        src_offset: usize,
        dst_offset: usize,
        len: usize,
    ) -> Result<(), StoreError> {
        check_range(src_offset, len, self.capacity())?;
        check_range(dst_offset, len, self.capacity())?;
        let mut scratch = [0u8; 256];
        let mut moved = 0usize;
        while moved < len {
            #[allow(clippy::arithmetic_side_effects)] // moved < len <= capacity
            let chunk = (len - moved).min(scratch.len());
            #[allow(clippy::indexing_slicing)] // chunk <= scratch.len()
            let window = &mut scratch[..chunk];
            #[allow(clippy::arithmetic_side_effects)] // ranges checked above
            {
                self.read(src_offset + moved, window)?;
                self.write(dst_offset + moved, window)?;
                moved += chunk;
            }
        }
        Ok(())
    }
}

#[inline]
fn check_range(offset: usize, len: usize, capacity: usize) -> Result<(), StoreError> {
    let oob = StoreError::OutOfRange {
        offset,
        len,
        capacity,
    };
    let end = offset.checked_add(len).ok_or(oob)?;
    if end > capacity {
        return Err(oob);
    }
    Ok(())
}

#[inline]
fn byte_len_of_words(count: usize, capacity: usize) -> Result<usize, StoreError> {
    count.checked_mul(2).ok_or(StoreError::OutOfRange {
        offset: 0,
        len: usize::MAX,
        capacity,
    })
}

/// [`PixelStore`] over any byte slice.
///
/// The firmware wraps the raw FMC window
/// (`slice::from_raw_parts_mut(0xC000_0000 as *mut u8, 32 MB)`); host tests
/// wrap a `Vec<u8>`.
pub struct SliceStore<'a> {
    bytes: &'a mut [u8],
}

impl<'a> SliceStore<'a> {
    /// Wrap `bytes` as a store.
    pub fn new(bytes: &'a mut [u8]) -> Self {
        Self { bytes }
    }

    fn range_mut(&mut self, offset: usize, len: usize) -> Result<&mut [u8], StoreError> {
        let capacity = self.bytes.len();
        check_range(offset, len, capacity)?;
        #[allow(clippy::arithmetic_side_effects, clippy::indexing_slicing)] // checked above
        let window = &mut self.bytes[offset..offset + len];
        Ok(window)
    }
}

impl PixelStore for SliceStore<'_> {
    fn capacity(&self) -> usize {
        self.bytes.len()
    }

    fn read(&self, offset: usize, buf: &mut [u8]) -> Result<(), StoreError> {
        check_range(offset, buf.len(), self.bytes.len())?;
        #[allow(clippy::arithmetic_side_effects, clippy::indexing_slicing)] // checked above
        buf.copy_from_slice(&self.bytes[offset..offset + buf.len()]);
        Ok(())
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), StoreError> {
        self.range_mut(offset, data.len())?.copy_from_slice(data);
        Ok(())
    }

    fn fill_u8(&mut self, offset: usize, value: u8, len: usize) -> Result<(), StoreError> {
        self.range_mut(offset, len)?.fill(value);
        Ok(())
    }

    fn fill_u16(&mut self, offset: usize, value: u16, count: usize) -> Result<(), StoreError> {
        let len = byte_len_of_words(count, self.bytes.len())?;
        let bytes = value.to_le_bytes();
        for pair in self.range_mut(offset, len)?.chunks_exact_mut(2) {
            pair.copy_from_slice(&bytes);
        }
        Ok(())
    }

    fn write_u16_stream(&mut self, offset: usize, data: &[u16]) -> Result<(), StoreError> {
        let len = byte_len_of_words(data.len(), self.bytes.len())?;
        for (pair, value) in self.range_mut(offset, len)?.chunks_exact_mut(2).zip(data) {
            pair.copy_from_slice(&value.to_le_bytes());
        }
        Ok(())
    }

    fn copy_within(
        &mut self,
        src_offset: usize,
        dst_offset: usize,
        len: usize,
    ) -> Result<(), StoreError> {
        let capacity = self.bytes.len();
        check_range(src_offset, len, capacity)?;
        check_range(dst_offset, len, capacity)?;
        #[allow(clippy::arithmetic_side_effects)] // checked above
        let src = src_offset..src_offset + len;
        self.bytes.copy_within(src, dst_offset);
        Ok(())
    }
}

// ─── Boot self-test ──────────────────────────────────────────────────────────

/// Bytes verified per phase of the boot self-test.
pub const SELF_TEST_WINDOW_BYTES: usize = 256;

/// 16-bit words verified per phase of the boot self-test.
pub const SELF_TEST_WINDOW_WORDS: usize = 128;

/// Boot self-test result, one variant per verification phase.
///
/// [`SelfTestFault::code`] yields the serial-console discriminant: 0 means
/// pass, 1–6 name the failing phase, 7 means the store rejected an access
/// before any pattern could be verified. Diagnostic only, not a stable API.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SelfTestFault {
    /// Byte cover pattern (0x00 over the region) did not read back.
    #[error("byte cover pattern mismatch")]
    ByteCover,
    /// Counting byte pattern did not read back.
    #[error("byte pattern mismatch")]
    BytePattern,
    /// Streamed byte sequence did not read back.
    #[error("byte stream mismatch")]
    ByteStream,
    /// 16-bit cover pattern (0x0000) did not read back.
    #[error("word cover pattern mismatch")]
    WordCover,
    /// Counting 16-bit pattern did not read back.
    #[error("word pattern mismatch")]
    WordPattern,
    /// Streamed 16-bit sequence did not read back.
    #[error("word stream mismatch")]
    WordStream,
    /// The store rejected an access (region smaller than the test window).
    #[error("self-test store access failed: {0}")]
    Store(#[from] StoreError),
}

impl SelfTestFault {
    /// Serial-console discriminant (1–6 mismatch kinds, 7 access failure).
    pub const fn code(&self) -> u8 {
        match self {
            Self::ByteCover => 1,
            Self::BytePattern => 2,
            Self::ByteStream => 3,
            Self::WordCover => 4,
            Self::WordPattern => 5,
            Self::WordStream => 6,
            Self::Store(_) => 7,
        }
    }
}

/// Cover/pattern/stream round-trip verification over a bounded sample window.
///
/// Six phases: byte cover, counting bytes, streamed bytes, then the same
/// three again as 16-bit words. The
/// cover phases fill the *whole* store; read-back sampling is bounded to
/// [`SELF_TEST_WINDOW_BYTES`]/[`SELF_TEST_WINDOW_WORDS`]. Cache hooks are
/// invoked between each write and its read-back so the CPU observes what the
/// memory actually holds. Boot-time only — not a hot-path operation.
#[allow(clippy::arithmetic_side_effects)] // window offsets bounded by the range checks inside each store op
pub fn self_test<S: PixelStore>(store: &mut S) -> Result<(), SelfTestFault> {
    let capacity = store.capacity();

    // Phase 1 — byte cover: 0x00 everywhere, sample the window.
    store.fill_u8(0, 0x00, capacity)?;
    store.clean_cache(0, capacity);
    store.invalidate_cache(0, SELF_TEST_WINDOW_BYTES);
    let mut window = [0xFFu8; SELF_TEST_WINDOW_BYTES];
    store.read(0, &mut window)?;
    if window.iter().any(|&b| b != 0x00) {
        return Err(SelfTestFault::ByteCover);
    }

    // Phase 2 — counting bytes, written one at a time.
    for i in 0..SELF_TEST_WINDOW_BYTES {
        store.write(i, &[i as u8])?;
    }
    store.clean_cache(0, SELF_TEST_WINDOW_BYTES);
    store.invalidate_cache(0, SELF_TEST_WINDOW_BYTES);
    store.read(0, &mut window)?;
    for (i, &b) in window.iter().enumerate() {
        if b != i as u8 {
            return Err(SelfTestFault::BytePattern);
        }
    }

    // Phase 3 — reversed byte stream, written in one call.
    let mut stream = [0u8; SELF_TEST_WINDOW_BYTES];
    for (i, slot) in stream.iter_mut().enumerate() {
        *slot = (SELF_TEST_WINDOW_BYTES - 1 - i) as u8;
    }
    store.write(0, &stream)?;
    store.clean_cache(0, SELF_TEST_WINDOW_BYTES);
    store.invalidate_cache(0, SELF_TEST_WINDOW_BYTES);
    store.read(0, &mut window)?;
    if window != stream {
        return Err(SelfTestFault::ByteStream);
    }

    // Phase 4 — word cover: 0x0000 everywhere, sample the window.
    store.fill_u16(0, 0x0000, capacity / 2)?;
    store.clean_cache(0, capacity);
    store.invalidate_cache(0, SELF_TEST_WINDOW_WORDS * 2);
    for i in 0..SELF_TEST_WINDOW_WORDS {
        if store.read_u16(i * 2)? != 0x0000 {
            return Err(SelfTestFault::WordCover);
        }
    }

    // Phase 5 — counting words, written one at a time.
    for i in 0..SELF_TEST_WINDOW_WORDS {
        store.write_u16(i * 2, i as u16)?;
    }
    store.clean_cache(0, SELF_TEST_WINDOW_WORDS * 2);
    store.invalidate_cache(0, SELF_TEST_WINDOW_WORDS * 2);
    for i in 0..SELF_TEST_WINDOW_WORDS {
        if store.read_u16(i * 2)? != i as u16 {
            return Err(SelfTestFault::WordPattern);
        }
    }

    // Phase 6 — reversed word stream, written in one call.
    let mut words = [0u16; SELF_TEST_WINDOW_WORDS];
    for (i, slot) in words.iter_mut().enumerate() {
        *slot = (SELF_TEST_WINDOW_WORDS - 1 - i) as u16;
    }
    store.write_u16_stream(0, &words)?;
    store.clean_cache(0, SELF_TEST_WINDOW_WORDS * 2);
    store.invalidate_cache(0, SELF_TEST_WINDOW_WORDS * 2);
    for (i, &expected) in words.iter().enumerate() {
        if store.read_u16(i * 2)? != expected {
            return Err(SelfTestFault::WordStream);
        }
    }

    Ok(())
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    fn store_of(len: usize) -> Vec<u8> {
        vec![0u8; len]
    }

    #[test]
    fn write_and_read_round_trip() {
        let mut mem = store_of(64);
        let mut store = SliceStore::new(&mut mem);
        store.write(10, &[1, 2, 3]).unwrap();
        let mut buf = [0u8; 3];
        store.read(10, &mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3]);
    }

    #[test]
    fn out_of_range_write_is_rejected() {
        let mut mem = store_of(64);
        let mut store = SliceStore::new(&mut mem);
        let err = store.write(62, &[0; 4]).unwrap_err();
        assert_eq!(
            err,
            StoreError::OutOfRange {
                offset: 62,
                len: 4,
                capacity: 64
            }
        );
        // One-past-the-end with zero length is fine; one byte is not.
        assert!(store.write(64, &[]).is_ok());
        assert!(store.write(64, &[0]).is_err());
    }

    #[test]
    fn offset_overflow_is_rejected_not_wrapped() {
        let mut mem = store_of(64);
        let mut store = SliceStore::new(&mut mem);
        assert!(store.fill_u8(usize::MAX, 0xAA, 2).is_err());
    }

    #[test]
    fn u16_values_are_little_endian() {
        let mut mem = store_of(8);
        let mut store = SliceStore::new(&mut mem);
        store.write_u16(0, 0xF800).unwrap();
        drop(store);
        assert_eq!(&mem[..2], &[0x00, 0xF8]);
    }

    #[test]
    fn fill_u16_covers_exactly_count_words() {
        let mut mem = store_of(16);
        let mut store = SliceStore::new(&mut mem);
        store.fill_u16(2, 0x001F, 3).unwrap();
        drop(store);
        assert_eq!(mem, [0, 0, 0x1F, 0, 0x1F, 0, 0x1F, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn write_u16_stream_preserves_order() {
        let mut mem = store_of(8);
        let mut store = SliceStore::new(&mut mem);
        store.write_u16_stream(0, &[0x1122, 0x3344]).unwrap();
        let a = store.read_u16(0).unwrap();
        let b = store.read_u16(2).unwrap();
        assert_eq!((a, b), (0x1122, 0x3344));
    }

    #[test]
    fn copy_within_moves_disjoint_regions() {
        let mut mem = store_of(1024);
        let mut store = SliceStore::new(&mut mem);
        store.write(0, &[7u8; 300]).unwrap();
        store.copy_within(0, 512, 300).unwrap();
        let mut buf = [0u8; 300];
        store.read(512, &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 7));
    }

    #[test]
    fn self_test_passes_on_healthy_store() {
        let mut mem = store_of(4096);
        let mut store = SliceStore::new(&mut mem);
        assert!(self_test(&mut store).is_ok());
    }

    #[test]
    fn self_test_rejects_store_smaller_than_window() {
        let mut mem = store_of(32);
        let mut store = SliceStore::new(&mut mem);
        let fault = self_test(&mut store).unwrap_err();
        assert_eq!(fault.code(), 7);
    }

    /// Store that silently corrupts multi-byte stream writes — the fault an
    /// SDRAM with a broken burst path shows. The single-byte phases pass, so
    /// the first reported failure must be the byte-stream phase (code 3).
    struct BrokenBurstStore<'a>(SliceStore<'a>);

    impl PixelStore for BrokenBurstStore<'_> {
        fn capacity(&self) -> usize {
            self.0.capacity()
        }
        fn read(&self, offset: usize, buf: &mut [u8]) -> Result<(), StoreError> {
            self.0.read(offset, buf)
        }
        fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), StoreError> {
            self.0.write(offset, data)?;
            if data.len() > 2 {
                // Flip one byte after the fact.
                self.0.write(offset, &[!data[0]])?;
            }
            Ok(())
        }
        fn fill_u8(&mut self, offset: usize, value: u8, len: usize) -> Result<(), StoreError> {
            self.0.fill_u8(offset, value, len)
        }
        fn fill_u16(&mut self, offset: usize, value: u16, count: usize) -> Result<(), StoreError> {
            self.0.fill_u16(offset, value, count)
        }
    }

    #[test]
    fn self_test_reports_stream_fault_code() {
        let mut mem = store_of(4096);
        let mut store = BrokenBurstStore(SliceStore::new(&mut mem));
        let fault = self_test(&mut store).unwrap_err();
        assert_eq!(fault, SelfTestFault::ByteStream);
        assert_eq!(fault.code(), 3);
    }
}
