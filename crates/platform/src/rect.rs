//! Rectangle and rotation math for the frame buffer.
//!
//! Coordinates are panel pixels, origin top-left, no clipping: a rectangle
//! that does not fit its surface is a reported precondition failure at the
//! [`crate::FrameManager`] boundary, never silently clamped.

/// Axis-aligned rectangle in pixels, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rect {
    /// Left edge (inclusive).
    pub x: u16,
    /// Top edge (inclusive).
    pub y: u16,
    /// Width in pixels.
    pub width: u16,
    /// Height in pixels (number of lines).
    pub height: u16,
}

impl Rect {
    /// Construct a rectangle. No validation happens here; surfaces validate
    /// on use.
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle covering a whole `width`×`height` surface.
    pub const fn full(width: u16, height: u16) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Number of pixels covered.
    #[allow(clippy::arithmetic_side_effects)] // u16 operands widened to usize
    pub const fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Whether the rectangle is non-empty and lies fully inside a
    /// `width`×`height` surface. Widened to u32 so `x + width` cannot wrap.
    #[allow(clippy::arithmetic_side_effects)] // u16 sums widened to u32
    pub const fn fits(&self, width: u16, height: u16) -> bool {
        self.width > 0
            && self.height > 0
            && (self.x as u32 + self.width as u32) <= width as u32
            && (self.y as u32 + self.height as u32) <= height as u32
    }
}

/// Mounting rotation between the logical drawing surface and the physical
/// panel scan order.
///
/// The panel scans portrait (800 wide, 1280 tall); a landscape GUI renders
/// onto a 1280×800 logical surface and each pixel is remapped through the
/// rotation before the destination offset is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rotation {
    /// Logical and physical coordinates coincide.
    #[default]
    None,
    /// Logical surface rotated 90° clockwise onto the panel.
    Cw90,
    /// Upside-down mounting.
    Rotate180,
    /// Logical surface rotated 90° counter-clockwise onto the panel.
    Ccw90,
}

impl Rotation {
    /// Physical surface size for a `width`×`height` logical surface.
    pub const fn physical_size(self, width: u16, height: u16) -> (u16, u16) {
        match self {
            Self::None | Self::Rotate180 => (width, height),
            Self::Cw90 | Self::Ccw90 => (height, width),
        }
    }

    /// Map a logical pixel `(x, y)` on a `width`×`height` logical surface to
    /// physical panel coordinates.
    ///
    /// Caller guarantees `x < width` and `y < height`; under that premise the
    /// result lies inside [`Self::physical_size`] and the mapping is a
    /// bijection.
    #[allow(clippy::arithmetic_side_effects)] // x < width, y < height by contract
    pub const fn map(self, x: u16, y: u16, width: u16, height: u16) -> (u16, u16) {
        match self {
            Self::None => (x, y),
            Self::Cw90 => (height - 1 - y, x),
            Self::Rotate180 => (width - 1 - x, height - 1 - y),
            Self::Ccw90 => (y, width - 1 - x),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::indexing_slicing, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    #[test]
    fn rect_fits_inside_surface() {
        assert!(Rect::new(0, 0, 800, 1280).fits(800, 1280));
        assert!(Rect::new(799, 1279, 1, 1).fits(800, 1280));
        assert!(Rect::new(0, 960, 800, 320).fits(800, 1280));
    }

    #[test]
    fn rect_exceeding_surface_is_rejected() {
        assert!(!Rect::new(1, 0, 800, 1280).fits(800, 1280));
        assert!(!Rect::new(0, 1, 800, 1280).fits(800, 1280));
        assert!(!Rect::new(0, 0, 801, 1).fits(800, 1280));
    }

    #[test]
    fn empty_rect_is_rejected() {
        assert!(!Rect::new(0, 0, 0, 10).fits(800, 1280));
        assert!(!Rect::new(0, 0, 10, 0).fits(800, 1280));
    }

    #[test]
    fn rect_coordinates_near_u16_max_do_not_wrap() {
        // x + width would wrap in u16 arithmetic; must still be rejected.
        assert!(!Rect::new(u16::MAX, 0, 2, 2).fits(800, 1280));
    }

    #[test]
    fn pixel_count_full_panel() {
        assert_eq!(Rect::full(800, 1280).pixel_count(), 1_024_000);
    }

    #[test]
    fn rotation_maps_corners() {
        // 4×3 logical surface.
        let (w, h) = (4, 3);
        assert_eq!(Rotation::None.map(0, 0, w, h), (0, 0));
        // CW90: top-left of the logical image lands at the physical top-right.
        assert_eq!(Rotation::Cw90.map(0, 0, w, h), (2, 0));
        assert_eq!(Rotation::Cw90.map(3, 2, w, h), (0, 3));
        assert_eq!(Rotation::Rotate180.map(0, 0, w, h), (3, 2));
        assert_eq!(Rotation::Ccw90.map(0, 0, w, h), (0, 3));
        assert_eq!(Rotation::Ccw90.map(3, 0, w, h), (0, 0));
    }

    #[test]
    fn rotation_physical_size_swaps_for_quarter_turns() {
        assert_eq!(Rotation::None.physical_size(1280, 800), (1280, 800));
        assert_eq!(Rotation::Cw90.physical_size(1280, 800), (800, 1280));
        assert_eq!(Rotation::Ccw90.physical_size(1280, 800), (800, 1280));
        assert_eq!(Rotation::Rotate180.physical_size(1280, 800), (1280, 800));
    }

    #[test]
    fn rotation_is_a_bijection_on_a_small_surface() {
        let (w, h) = (5, 7);
        for rotation in [
            Rotation::None,
            Rotation::Cw90,
            Rotation::Rotate180,
            Rotation::Ccw90,
        ] {
            let (pw, ph) = rotation.physical_size(w, h);
            let mut seen = vec![false; pw as usize * ph as usize];
            for y in 0..h {
                for x in 0..w {
                    let (px, py) = rotation.map(x, y, w, h);
                    assert!(px < pw && py < ph, "{rotation:?} mapped outside");
                    let idx = py as usize * pw as usize + px as usize;
                    assert!(!seen[idx], "{rotation:?} mapped two pixels to one");
                    seen[idx] = true;
                }
            }
            assert!(seen.iter().all(|&s| s), "{rotation:?} left holes");
        }
    }
}
