#![forbid(unsafe_code)]

//! Geometric primitives in CSS pixels.

use serde::Serialize;

/// A length in CSS pixels.
pub type Px = f64;

/// Natural size of a measured element.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Size {
    pub width: Px,
    pub height: Px,
}

impl Size {
    pub const ZERO: Self = Self::new(0.0, 0.0);

    #[inline]
    #[must_use]
    pub const fn new(width: Px, height: Px) -> Self {
        Self { width, height }
    }
}

/// A positioned rectangle (origin at top-left).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rect {
    pub x: Px,
    pub y: Px,
    pub width: Px,
    pub height: Px,
}

impl Rect {
    #[inline]
    #[must_use]
    pub const fn new(x: Px, y: Px, width: Px, height: Px) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge (exclusive).
    #[inline]
    #[must_use]
    pub fn right(&self) -> Px {
        self.x + self.width
    }

    /// Bottom edge (exclusive).
    #[inline]
    #[must_use]
    pub fn bottom(&self) -> Px {
        self.y + self.height
    }

    /// Check if a point is inside the rectangle.
    #[inline]
    #[must_use]
    pub fn contains(&self, x: Px, y: Px) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_is_half_open() {
        let r = Rect::new(10.0, 5.0, 20.0, 10.0);
        assert!(r.contains(10.0, 5.0));
        assert!(r.contains(29.9, 14.9));
        assert!(!r.contains(30.0, 5.0));
        assert!(!r.contains(10.0, 15.0));
        assert!(!r.contains(9.9, 6.0));
    }
}
