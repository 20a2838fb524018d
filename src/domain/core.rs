//! Core domain types and operations
//!
//! This module defines pure geometry that works exclusively with
//! real pixels and has no knowledge of Win32 or DPI concepts.

use crate::domain::grid::GridError;

/// A point in real pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in real pixel coordinates
///
/// Bounds are half-open: `left..right` horizontally and `top..bottom`
/// vertically. A region built through [`Region::new`] always has a positive
/// extent on both axes. Regions are never mutated; navigation produces new
/// ones through [`Region::subdivide`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region {
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
}

impl Region {
    /// Creates a new region, rejecting zero, negative or overflowing extents
    ///
    /// # Example
    /// ```rust
    /// use numgrid::domain::core::Region;
    ///
    /// let screen = Region::new(0, 0, 1920, 1080).unwrap();
    /// assert_eq!(screen.width(), 1920);
    /// assert!(Region::new(10, 0, 10, 5).is_err());
    /// ```
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Result<Self, GridError> {
        // Extents must be positive and fit in an i32
        let width = right.checked_sub(left).filter(|w| *w > 0);
        let height = bottom.checked_sub(top).filter(|h| *h > 0);
        if width.is_none() || height.is_none() {
            return Err(GridError::InvalidRegion {
                left,
                top,
                right,
                bottom,
            });
        }

        Ok(Self {
            left,
            top,
            right,
            bottom,
        })
    }

    /// Creates a region from an origin and a size
    pub fn from_origin_size(x: i32, y: i32, width: i32, height: i32) -> Result<Self, GridError> {
        Self::new(x, y, x.saturating_add(width), y.saturating_add(height))
    }

    pub fn left(&self) -> i32 {
        self.left
    }

    pub fn top(&self) -> i32 {
        self.top
    }

    pub fn right(&self) -> i32 {
        self.right
    }

    pub fn bottom(&self) -> i32 {
        self.bottom
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Returns the center, rounding toward the top-left pixel
    pub fn center(&self) -> Point {
        Point::new(
            self.left + self.width() / 2,
            self.top + self.height() / 2,
        )
    }

    /// Returns the area in square pixels
    pub fn area(&self) -> i64 {
        i64::from(self.width()) * i64::from(self.height())
    }

    /// True when one of the extents collapsed to zero
    ///
    /// Only cells produced by subdividing a region narrower or shorter
    /// than three pixels can be degenerate.
    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// Splits the region into a 3x3 grid
    ///
    /// Cells are returned row-major from the top-left, which is numpad
    /// order 7 8 9 / 4 5 6 / 1 2 3. The first two columns (rows) are
    /// `extent / 3` wide (tall) and the last one takes the remainder, so
    /// the cells tile the parent exactly.
    pub fn subdivide(&self) -> [Region; 9] {
        let cols = split_thirds(self.left, self.width());
        let rows = split_thirds(self.top, self.height());

        std::array::from_fn(|index| {
            let (top, bottom) = rows[index / 3];
            let (left, right) = cols[index % 3];
            Region {
                left,
                top,
                right,
                bottom,
            }
        })
    }

    /// Returns true if this region contains the given point
    pub fn contains_point(&self, point: Point) -> bool {
        point.x >= self.left && point.x < self.right && point.y >= self.top && point.y < self.bottom
    }

    /// Returns true if `other` lies entirely inside this region
    pub fn contains(&self, other: &Region) -> bool {
        other.left >= self.left
            && other.right <= self.right
            && other.top >= self.top
            && other.bottom <= self.bottom
    }

    /// Returns the intersection of two regions, or None if they don't overlap
    pub fn intersection(&self, other: &Region) -> Option<Region> {
        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right = self.right.min(other.right);
        let bottom = self.bottom.min(other.bottom);

        Region::new(left, top, right, bottom).ok()
    }
}

fn split_thirds(start: i32, extent: i32) -> [(i32, i32); 3] {
    let third = extent / 3;
    let first = start + third;
    let second = first + third;
    [(start, first), (first, second), (second, start + extent)]
}
