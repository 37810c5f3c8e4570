//! Heightmap generation: the per-cell scalar field behind the terrain.
//!
//! Each cell's value is its district's intensity plus two octaves of hash
//! noise, a linear depth gradient (front rows brighter) and a quadratic
//! falloff towards the edges of the district band, clamped to `[0, 1]`.
//! Without districts the field is low-level noise only.

use strata_types::District;

use crate::layout::DistrictLayout;
use crate::noise;

/// Swing of the fine noise octave.
const FINE_NOISE: f64 = 0.1;
/// Swing of the coarse noise octave.
const COARSE_NOISE: f64 = 0.15;
/// Swing of the back-to-front depth gradient.
const DEPTH_SWING: f64 = 0.2;
/// Maximum edge falloff at a band edge.
const EDGE_FALLOFF: f64 = 0.1;

/// One derived grid cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCell {
    /// Column.
    pub x: usize,
    /// Row.
    pub y: usize,
    /// Scalar intensity in `[0, 1]`.
    pub value: f64,
    /// Owning district, `None` when there are no districts.
    pub district: Option<usize>,
    /// Whether this column separates two districts.
    pub boundary: bool,
}

/// The scalar field for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Heightmap {
    layout: DistrictLayout,
    cells: Vec<Vec<GridCell>>,
    boundaries: Vec<usize>,
}

impl Heightmap {
    /// Geometry used to build the field.
    pub const fn layout(&self) -> &DistrictLayout {
        &self.layout
    }

    /// Rows of cells, top (far) to bottom (near).
    pub fn rows(&self) -> &[Vec<GridCell>] {
        &self.cells
    }

    /// Cell at `(x, y)`.
    pub fn cell(&self, x: usize, y: usize) -> Option<&GridCell> {
        self.cells.get(y).and_then(|row| row.get(x))
    }

    /// Boundary columns, ascending.
    pub fn boundaries(&self) -> &[usize] {
        &self.boundaries
    }
}

/// Build the heightmap for `districts` on a `width` x `height` grid.
pub fn generate(districts: &[District], width: usize, height: usize) -> Heightmap {
    let layout = DistrictLayout::new(width, height, districts.len());
    let metrics: Vec<f64> = districts.iter().map(District::intensity).collect();

    let cells = (0..height)
        .map(|y| {
            (0..width)
                .map(|x| {
                    let district = layout.district_at(x);
                    let value = match district {
                        Some(index) => district_value(&layout, &metrics, index, x, y),
                        None => 0.2f64.mul_add(noise::unit(x, y, 0), 0.1),
                    };
                    GridCell {
                        x,
                        y,
                        value,
                        district,
                        boundary: layout.is_boundary(x),
                    }
                })
                .collect()
        })
        .collect();

    Heightmap {
        boundaries: layout.boundaries(),
        layout,
        cells,
    }
}

fn district_value(
    layout: &DistrictLayout,
    metrics: &[f64],
    index: usize,
    x: usize,
    y: usize,
) -> f64 {
    let metric = metrics.get(index).copied().unwrap_or(0.0);
    let raw = metric + noise_term(x, y, index) + depth_gradient(y, layout.height())
        - edge_falloff(layout, index, x);
    if raw.is_finite() {
        raw.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn noise_term(x: usize, y: usize, district: usize) -> f64 {
    let seed = (district as u64).wrapping_mul(2);
    let fine = noise::unit(x, y, seed.wrapping_add(1)) - 0.5;
    let coarse = noise::unit(x / 4, y / 2, seed.wrapping_add(2)) - 0.5;
    fine.mul_add(FINE_NOISE, coarse * COARSE_NOISE)
}

fn depth_gradient(y: usize, height: usize) -> f64 {
    let denom = height.saturating_sub(1).max(1) as f64;
    (y as f64 / denom - 0.5) * DEPTH_SWING
}

fn edge_falloff(layout: &DistrictLayout, index: usize, x: usize) -> f64 {
    let (start, end) = layout.band(index);
    let span = end.saturating_sub(start);
    if span < 2 {
        return 0.0;
    }
    let half = (span - 1) as f64 / 2.0;
    let local = x.saturating_sub(start) as f64;
    let distance = ((local - half).abs() / half).min(1.0);
    distance * distance * EDGE_FALLOFF
}
