#![forbid(unsafe_code)]

//! Geometric primitives in viewport units.
//!
//! Coordinates are canvas units with the origin at the top-left corner.
//! Unlike cell grids these are fractional, so every type here can report
//! whether it is finite before anything downstream trusts it.

/// A point in viewport units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// Horizontal offset from the left edge.
    pub x: f32,
    /// Vertical offset from the top edge.
    pub y: f32,
}

impl Point {
    /// Create a new point.
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Both coordinates are finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Point lies inside `[0, width] x [0, height]` (edges inclusive).
    #[inline]
    pub fn is_within(&self, size: Size) -> bool {
        self.is_finite()
            && self.x >= 0.0
            && self.y >= 0.0
            && self.x <= size.width
            && self.y <= size.height
    }

    /// Clamp the point into `[0, width] x [0, height]`.
    ///
    /// Non-finite coordinates collapse to the origin on that axis.
    pub fn clamp_to(&self, size: Size) -> Self {
        let clamp_axis = |v: f32, max: f32| {
            if v.is_finite() {
                v.clamp(0.0, max.max(0.0))
            } else {
                0.0
            }
        };
        Self::new(clamp_axis(self.x, size.width), clamp_axis(self.y, size.height))
    }
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    /// Horizontal extent.
    pub width: f32,
    /// Vertical extent.
    pub height: f32,
}

impl Size {
    /// Create a new size.
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Both extents are finite and non-negative.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width >= 0.0 && self.height >= 0.0
    }

    /// Ratio of width to height. Zero height yields `f32::INFINITY`.
    #[inline]
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0.0 {
            f32::INFINITY
        } else {
            self.width / self.height
        }
    }
}

/// An axis-aligned rectangle in viewport units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle from origin with given size.
    #[inline]
    pub const fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }

    /// Rectangle of the given size centered on `center`.
    #[inline]
    pub fn centered_on(center: Point, size: Size) -> Self {
        Self::new(
            center.x - size.width / 2.0,
            center.y - size.height / 2.0,
            size.width,
            size.height,
        )
    }

    /// Right edge.
    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Top-left corner.
    #[inline]
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Center point.
    #[inline]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Extent of the rectangle.
    #[inline]
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Every field is finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    /// Rectangle lies entirely inside `[0, width] x [0, height]`.
    pub fn fits_within(&self, size: Size) -> bool {
        self.is_finite()
            && self.width >= 0.0
            && self.height >= 0.0
            && self.x >= 0.0
            && self.y >= 0.0
            && self.right() <= size.width
            && self.bottom() <= size.height
    }

    /// Shrink then shift the rectangle so it fits inside `size`.
    ///
    /// Extents are capped at the container first, then the origin is moved
    /// so the far edges stay inside. Non-finite fields become zero.
    pub fn fit_within(&self, size: Size) -> Self {
        let sanitize = |v: f32| if v.is_finite() { v } else { 0.0 };
        let max_w = sanitize(size.width).max(0.0);
        let max_h = sanitize(size.height).max(0.0);
        let width = sanitize(self.width).clamp(0.0, max_w);
        let height = sanitize(self.height).clamp(0.0, max_h);
        let x = sanitize(self.x).clamp(0.0, max_w - width);
        let y = sanitize(self.y).clamp(0.0, max_h - height);
        Self::new(x, y, width, height)
    }

    /// Check if a point is inside the rectangle (edges inclusive).
    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }
}
