/// Integer pixel rectangle with exclusive right/bottom edges.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IRect {
    /// Left edge in pixels.
    pub left: i32,
    /// Top edge in pixels.
    pub top: i32,
    /// Exclusive right edge.
    pub right: i32,
    /// Exclusive bottom edge.
    pub bottom: i32,
}

impl IRect {
    /// Build a rectangle from an origin point and a size.
    pub fn from_pt_size(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            left: x,
            top: y,
            right: x.saturating_add_unsigned(width),
            bottom: y.saturating_add_unsigned(height),
        }
    }

    /// Width in pixels (zero for inverted rectangles).
    pub fn width(self) -> u32 {
        self.right.saturating_sub(self.left).max(0) as u32
    }

    /// Height in pixels (zero for inverted rectangles).
    pub fn height(self) -> u32 {
        self.bottom.saturating_sub(self.top).max(0) as u32
    }

    /// Whether the rectangle covers no pixels.
    pub fn is_empty(self) -> bool {
        self.left >= self.right || self.top >= self.bottom
    }

    /// Whether `other` lies fully inside `self`. Empty rectangles contain
    /// nothing and are contained by nothing.
    pub fn contains(self, other: IRect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.left <= other.left
            && self.top <= other.top
            && self.right >= other.right
            && self.bottom >= other.bottom
    }
}

/// Identifier of the single-threaded recording context that owns a cache
/// instance. Used to filter shared invalidation traffic down to one consumer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RecorderId(u32);

impl RecorderId {
    /// Wrap a raw recorder id.
    ///
    /// Zero is reserved as the invalid id; passing it is a caller bug and
    /// panics rather than being reported as a recoverable error.
    pub fn new(raw: u32) -> Self {
        assert!(raw != 0, "recorder id 0 is reserved as invalid");
        Self(raw)
    }

    /// Raw `u32` value.
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
