use std::collections::HashMap;

/// Spatial hash grid for O(1) region queries
/// Divides the map into cells for fast neighbor lookups
pub struct SpatialGrid<T> {
    /// Grid cells indexed by (cell_x, cell_y)
    cells: HashMap<(i64, i64), Vec<usize>>,
    /// All items (indices into this vec stored in cells)
    items: Vec<T>,
    /// Cell size in degrees
    cell_size: f64,
}

impl<T> SpatialGrid<T> {
    /// Create a new spatial grid with given cell size in degrees
    pub fn new(cell_size: f64) -> Self {
        Self {
            cells: HashMap::new(),
            items: Vec::new(),
            cell_size: if cell_size > 0.0 { cell_size } else { f64::MIN_POSITIVE },
        }
    }

    /// Convert lon/lat to cell coordinates
    #[inline(always)]
    fn to_cell(&self, lon: f64, lat: f64) -> (i64, i64) {
        let x = (lon / self.cell_size).floor() as i64;
        let y = (lat / self.cell_size).floor() as i64;
        (x, y)
    }

    /// Insert an item at a geographic position, returning its index
    pub fn insert(&mut self, lon: f64, lat: f64, item: T) -> usize {
        let idx = self.items.len();
        self.items.push(item);

        let cell = self.to_cell(lon, lat);
        self.cells.entry(cell).or_default().push(idx);
        idx
    }

    /// Query items in a radius around a point (returns candidate indices,
    /// callers do the exact distance check)
    pub fn query_radius(&self, lon: f64, lat: f64, radius_degrees: f64) -> Vec<usize> {
        let center_cell = self.to_cell(lon, lat);

        // Calculate cell radius to check (round up), capped so huge radii
        // do not walk millions of empty cells
        let cell_radius = ((radius_degrees / self.cell_size).ceil() as i64).clamp(0, 64);

        let mut results = Vec::new();

        for dy in -cell_radius..=cell_radius {
            for dx in -cell_radius..=cell_radius {
                let cell = (center_cell.0 + dx, center_cell.1 + dy);

                if let Some(indices) = self.cells.get(&cell) {
                    results.extend_from_slice(indices);
                }
            }
        }

        results
    }

    /// Get item by index
    #[inline(always)]
    pub fn get(&self, idx: usize) -> Option<&T> {
        self.items.get(idx)
    }

    /// Number of items
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if empty
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_finds_neighbors() {
        let mut grid = SpatialGrid::new(0.01);
        let a = grid.insert(15.970, 45.810, "a");
        let b = grid.insert(15.975, 45.812, "b");
        let far = grid.insert(16.500, 45.810, "far");

        let found = grid.query_radius(15.971, 45.811, 0.01);
        assert!(found.contains(&a));
        assert!(found.contains(&b));
        assert!(!found.contains(&far));
        assert_eq!(grid.get(far), Some(&"far"));
        assert_eq!(grid.len(), 3);
    }

    #[test]
    fn test_zero_radius_checks_own_cell() {
        let mut grid = SpatialGrid::new(1.0);
        let idx = grid.insert(0.5, 0.5, ());
        assert_eq!(grid.query_radius(0.1, 0.9, 0.0), vec![idx]);
    }
}
