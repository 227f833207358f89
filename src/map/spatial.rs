use super::geometry::Bounds;
use glam::DVec2;
use std::collections::HashMap;

/// Spatial index for shapes using conservative approximation.
/// Each shape's bounding box is indexed into every cell it overlaps,
/// guaranteeing no false negatives while allowing false positives
/// (eliminated by the exact containment test of the caller).
pub struct FeatureGrid {
    cells: HashMap<(i32, i32), Vec<usize>>,
    /// Cell size in surface units
    cell_size: f64,
}

impl FeatureGrid {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cells: HashMap::new(),
            cell_size,
        }
    }

    #[inline(always)]
    fn to_cell(&self, p: DVec2) -> (i32, i32) {
        let x = (p.x / self.cell_size).floor() as i32;
        let y = (p.y / self.cell_size).floor() as i32;
        (x, y)
    }

    /// Build from shape bounds; `None` entries (empty shapes) are skipped but
    /// still consume their index
    pub fn build<'a>(bounds: impl Iterator<Item = Option<&'a Bounds>>, cell_size: f64) -> Self {
        let mut grid = Self::new(cell_size);
        for (idx, b) in bounds.enumerate() {
            let Some(b) = b else { continue };
            let min_cell = grid.to_cell(b.min);
            let max_cell = grid.to_cell(b.max);
            for y in min_cell.1..=max_cell.1 {
                for x in min_cell.0..=max_cell.0 {
                    grid.cells.entry((x, y)).or_default().push(idx);
                }
            }
        }
        grid
    }

    /// Candidate shape indices whose bounds may contain `p`
    pub fn query_point(&self, p: DVec2) -> &[usize] {
        self.cells
            .get(&self.to_cell(p))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
