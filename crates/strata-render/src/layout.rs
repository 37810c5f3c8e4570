//! Column layout shared by every pass that needs to know which district
//! owns a column.
//!
//! Districts are laid out left to right in upstream order. Each gets
//! `floor(width / n)` columns and the last one absorbs the remainder.
//! Boundary columns sit at every multiple of the district width except 0.
//! The heightmap and the agent overlay both derive their geometry from
//! this one type, so agents can never be placed on a column the terrain
//! treats as a boundary.

/// Column geometry for `count` districts across a `width` x `height` grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistrictLayout {
    width: usize,
    height: usize,
    count: usize,
    district_width: usize,
}

impl DistrictLayout {
    /// Derive the layout. A zero district count yields a layout with no
    /// owners and no boundaries.
    pub fn new(width: usize, height: usize, count: usize) -> Self {
        let district_width = if count == 0 {
            width.max(1)
        } else {
            (width / count).max(1)
        };
        Self {
            width,
            height,
            count,
            district_width,
        }
    }

    /// Grid width.
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Grid height.
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Number of districts.
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Columns per district (before the last district's remainder).
    pub const fn district_width(&self) -> usize {
        self.district_width
    }

    /// Index of the district owning column `x`.
    pub fn district_at(&self, x: usize) -> Option<usize> {
        if self.count == 0 || x >= self.width {
            return None;
        }
        Some((x / self.district_width).min(self.count.saturating_sub(1)))
    }

    /// Whether column `x` is a district boundary.
    pub fn is_boundary(&self, x: usize) -> bool {
        if self.count < 2 || x == 0 || x >= self.width {
            return false;
        }
        x % self.district_width == 0 && x / self.district_width < self.count
    }

    /// All boundary columns, ascending.
    pub fn boundaries(&self) -> Vec<usize> {
        (1..self.count)
            .map(|i| i.saturating_mul(self.district_width))
            .filter(|&x| x > 0 && x < self.width)
            .collect()
    }

    /// Half-open column range `[start, end)` owned by district `index`.
    pub fn band(&self, index: usize) -> (usize, usize) {
        let start = index.saturating_mul(self.district_width).min(self.width);
        let end = if index.saturating_add(1) >= self.count {
            self.width
        } else {
            index
                .saturating_add(1)
                .saturating_mul(self.district_width)
                .min(self.width)
        };
        (start, end.max(start))
    }

    /// Centre column of district `index`.
    pub fn center(&self, index: usize) -> usize {
        let (start, end) = self.band(index);
        start.saturating_add(end.saturating_sub(start) / 2)
    }

    /// Inclusive column range agents of district `index` may occupy,
    /// inset by one column from each boundary.
    pub fn interior(&self, index: usize) -> (usize, usize) {
        let last = self.width.saturating_sub(1);
        let start = index
            .saturating_mul(self.district_width)
            .saturating_add(1)
            .min(last);
        let end = index
            .saturating_add(1)
            .saturating_mul(self.district_width)
            .saturating_sub(1)
            .min(last);
        (start, end.max(start))
    }
}
