#![forbid(unsafe_code)]

//! Geometric primitives.
//!
//! Two coordinate spaces coexist: the *relative* space of a split tree, where
//! the whole docking surface is the unit square, and the *pixel* space the host
//! paints into. [`Rect`] lives in the former, [`PixelRect`] in the latter.

/// A rectangle in relative surface coordinates.
///
/// Values are nominally within `[0, 1]` but are not clamped; drag feedback may
/// transiently push them outside.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// The whole surface.
    pub const UNIT: Self = Self::new(0.0, 0.0, 1.0, 1.0);

    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge.
    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge.
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Centroid of the rectangle.
    #[inline]
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Check if the rectangle has no area (or is not a finite rectangle at all).
    #[inline]
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// All four components are finite numbers.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    /// Check if a point is inside the rectangle (edges inclusive).
    #[inline]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }

    /// The smallest rectangle that contains both.
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(x, y, right - x, bottom - y)
    }

    /// Compute the intersection with another rectangle, returning `None` if no overlap.
    pub fn intersection_opt(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if x < right && y < bottom {
            Some(Rect::new(x, y, right - x, bottom - y))
        } else {
            None
        }
    }
}

/// A pixel position on the host surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

impl PixelPoint {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A rectangle in host pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct PixelRect {
    /// Left edge (inclusive).
    pub x: i32,
    /// Top edge (inclusive).
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl PixelRect {
    #[inline]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge (exclusive).
    #[inline]
    pub const fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    #[inline]
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Check if a point is inside the rectangle.
    #[inline]
    pub const fn contains(&self, point: PixelPoint) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    /// Grow the rectangle by `amount` pixels on every side.
    pub fn inflate(&self, amount: i32) -> PixelRect {
        PixelRect::new(
            self.x.saturating_sub(amount),
            self.y.saturating_sub(amount),
            self.width.saturating_add(amount.saturating_mul(2)),
            self.height.saturating_add(amount.saturating_mul(2)),
        )
    }
}

/// A pixel size (minimum, preferred or current extent of an element).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    #[inline]
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub const ZERO: Self = Self::new(0, 0);
}

/// Insets reserved around the area a split tree may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Insets {
    pub top: i32,
    pub left: i32,
    pub bottom: i32,
    pub right: i32,
}

impl Insets {
    /// Equal insets on every side.
    pub const fn all(val: i32) -> Self {
        Self {
            top: val,
            left: val,
            bottom: val,
            right: val,
        }
    }

    pub const fn new(top: i32, left: i32, bottom: i32, right: i32) -> Self {
        Self {
            top,
            left,
            bottom,
            right,
        }
    }

    /// Sum of left and right.
    #[inline]
    pub const fn horizontal_sum(&self) -> i32 {
        self.left.saturating_add(self.right)
    }

    /// Sum of top and bottom.
    #[inline]
    pub const fn vertical_sum(&self) -> i32 {
        self.top.saturating_add(self.bottom)
    }
}

#[cfg(test)]
mod tests {
    use super::{Insets, PixelPoint, PixelRect, Rect};

    #[test]
    fn rect_contains_edges() {
        let rect = Rect::new(0.25, 0.5, 0.5, 0.25);
        assert!(rect.contains(0.25, 0.5));
        assert!(rect.contains(0.75, 0.75));
        assert!(!rect.contains(0.8, 0.6));
        assert!(!rect.contains(0.3, 0.4));
    }

    #[test]
    fn rect_union_and_intersection() {
        let a = Rect::new(0.0, 0.0, 0.4, 1.0);
        let b = Rect::new(0.4, 0.0, 0.6, 0.3);
        assert_eq!(a.union(&b), Rect::UNIT);
        assert_eq!(a.intersection_opt(&b), None);

        let c = Rect::new(0.2, 0.2, 0.4, 0.4);
        let overlap = a.intersection_opt(&c).expect("rectangles overlap");
        assert!((overlap.width - 0.2).abs() < 1e-12);
        assert!((overlap.height - 0.4).abs() < 1e-12);
    }

    #[test]
    fn rect_empty_detects_degenerate() {
        assert!(Rect::new(0.0, 0.0, 0.0, 1.0).is_empty());
        assert!(Rect::new(0.0, 0.0, f64::NAN, 1.0).is_empty());
        assert!(!Rect::UNIT.is_empty());
        assert!(!Rect::new(0.0, f64::INFINITY, 1.0, 1.0).is_finite());
    }

    #[test]
    fn pixel_rect_contains_is_half_open() {
        let rect = PixelRect::new(10, 20, 30, 40);
        assert!(rect.contains(PixelPoint::new(10, 20)));
        assert!(rect.contains(PixelPoint::new(39, 59)));
        assert!(!rect.contains(PixelPoint::new(40, 20)));
        assert!(!rect.contains(PixelPoint::new(10, 60)));
    }

    #[test]
    fn pixel_rect_inflate_grows_every_side() {
        let rect = PixelRect::new(10, 10, 20, 20).inflate(5);
        assert_eq!(rect, PixelRect::new(5, 5, 30, 30));
    }

    #[test]
    fn insets_sums() {
        let insets = Insets::new(1, 2, 3, 4);
        assert_eq!(insets.horizontal_sum(), 6);
        assert_eq!(insets.vertical_sum(), 4);
        assert_eq!(Insets::all(2).horizontal_sum(), 4);
    }
}
