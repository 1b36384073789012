//! Pixel geometry for canvas layout.

/// A 2D size in pixel units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SizePx {
    pub width: u32,
    pub height: u32,
}

impl SizePx {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A square of the given edge length.
    pub fn square(size: u32) -> Self {
        Self::new(size, size)
    }

    /// Returns true if `other` fits inside this size.
    pub fn contains(&self, other: SizePx) -> bool {
        other.width <= self.width && other.height <= self.height
    }
}

/// A rectangle defined in pixel coordinates.
///
/// Describes where an icon lands on a larger canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RectPx {
    /// X offset from the left edge of the canvas
    pub x: u32,
    /// Y offset from the top edge of the canvas
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl RectPx {
    /// Places `inner` in the middle of `outer`.
    ///
    /// Offsets are `round((outer - inner) / 2)` per axis, so odd leftovers put
    /// the extra pixel before the content. An `inner` larger than `outer`
    /// along an axis is pinned to offset 0 on that axis.
    pub fn centered(inner: SizePx, outer: SizePx) -> Self {
        Self {
            x: outer.width.saturating_sub(inner.width).div_ceil(2),
            y: outer.height.saturating_sub(inner.height).div_ceil(2),
            width: inner.width,
            height: inner.height,
        }
    }
}
