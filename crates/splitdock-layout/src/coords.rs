//! Relative-to-pixel coordinate mapping.
//!
//! A split tree stores every bound as a fraction of the docking surface. The
//! surface's pixel size minus its insets yields two stretch factors; a relative
//! coordinate times its factor plus the leading inset is a pixel coordinate.

use splitdock_core::{Insets, PixelPoint, PixelRect, Rect, Size};

/// Multipliers from relative coordinates to pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StretchFactors {
    pub width: f64,
    pub height: f64,
}

impl StretchFactors {
    /// Factors for a surface of `size` pixels with `insets` reserved.
    ///
    /// Surfaces smaller than their insets collapse to zero factors.
    #[must_use]
    pub fn from_surface(size: Size, insets: Insets) -> Self {
        Self {
            width: f64::from(size.width.saturating_sub(insets.horizontal_sum()).max(0)),
            height: f64::from(size.height.saturating_sub(insets.vertical_sum()).max(0)),
        }
    }

    /// Relative width of a divider of `divider_size` pixels.
    #[must_use]
    pub fn divider_width(&self, divider_size: i32) -> f64 {
        relative_thickness(divider_size, self.width)
    }

    /// Relative height of a divider of `divider_size` pixels.
    #[must_use]
    pub fn divider_height(&self, divider_size: i32) -> f64 {
        relative_thickness(divider_size, self.height)
    }
}

fn relative_thickness(divider_size: i32, factor: f64) -> f64 {
    if factor > 0.0 {
        (f64::from(divider_size) / factor).max(0.0)
    } else {
        0.0
    }
}

/// Stretch factors together with the inset offset.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CoordinateSpace {
    pub factors: StretchFactors,
    pub insets: Insets,
}

impl CoordinateSpace {
    #[must_use]
    pub fn new(size: Size, insets: Insets) -> Self {
        Self {
            factors: StretchFactors::from_surface(size, insets),
            insets,
        }
    }

    /// Map a relative rectangle to pixels.
    ///
    /// Both edges are rounded independently so that adjacent rectangles
    /// sharing an edge also share the rounded pixel edge.
    #[must_use]
    pub fn to_pixels(&self, rect: Rect) -> PixelRect {
        let left = self.pixel_x(rect.x);
        let top = self.pixel_y(rect.y);
        let right = self.pixel_x(rect.right());
        let bottom = self.pixel_y(rect.bottom());
        PixelRect::new(
            left,
            top,
            right.saturating_sub(left).max(0),
            bottom.saturating_sub(top).max(0),
        )
    }

    /// Map a pixel point into relative coordinates.
    ///
    /// Axes with a zero factor map to `0.0`.
    #[must_use]
    pub fn to_relative(&self, point: PixelPoint) -> (f64, f64) {
        let x = f64::from(point.x.saturating_sub(self.insets.left));
        let y = f64::from(point.y.saturating_sub(self.insets.top));
        (
            ratio(x, self.factors.width),
            ratio(y, self.factors.height),
        )
    }

    /// Pixel area available to the tree (the surface minus insets).
    #[must_use]
    pub fn surface(&self) -> PixelRect {
        self.to_pixels(Rect::UNIT)
    }

    fn pixel_x(&self, relative: f64) -> i32 {
        to_pixel(relative, self.factors.width).saturating_add(self.insets.left)
    }

    fn pixel_y(&self, relative: f64) -> i32 {
        to_pixel(relative, self.factors.height).saturating_add(self.insets.top)
    }
}

fn to_pixel(relative: f64, factor: f64) -> i32 {
    // `as` saturates and maps NaN to 0.
    (relative * factor).round() as i32
}

fn ratio(value: f64, factor: f64) -> f64 {
    if factor > 0.0 { value / factor } else { 0.0 }
}
