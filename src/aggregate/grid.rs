use std::collections::HashMap;

use crate::error::RenderError;
use crate::geo::GeoBounds;
use crate::record::{EventKind, EventRecord};

/// Quantized cell coordinates: `floor(lat / step)`, `floor(lon / step)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellIndex {
    pub lat: i64,
    pub lon: i64,
}

impl CellIndex {
    #[inline(always)]
    pub fn of(lat: f64, lon: f64, step: f64) -> Self {
        Self {
            lat: (lat / step).floor() as i64,
            lon: (lon / step).floor() as i64,
        }
    }

    pub fn bounds(&self, step: f64) -> GeoBounds {
        let min_lat = self.lat as f64 * step;
        let min_lon = self.lon as f64 * step;
        GeoBounds::new(min_lat, min_lat + step, min_lon, min_lon + step)
    }

    /// Stable textual id
    pub fn id(&self) -> String {
        format!("{}_{}", self.lat, self.lon)
    }
}

/// Running count for one category inside a cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CategoryTally {
    /// First-seen record kind, kept for icon and level display
    pub representative: EventKind,
    pub count: u64,
}

#[derive(Clone, Debug)]
pub struct Cell {
    pub index: CellIndex,
    pub bounds: GeoBounds,
    pub total_count: u64,
    /// Category key → tally, in first-seen order
    pub per_category: Vec<(String, CategoryTally)>,
    lookup: HashMap<String, usize>,
}

/// Top categories of a cell plus how many were collapsed.
#[derive(Clone, Debug, PartialEq)]
pub struct RankedCategories<'c> {
    pub top: Vec<(&'c str, &'c CategoryTally)>,
    pub more: usize,
}

impl Cell {
    fn new(index: CellIndex, step: f64) -> Self {
        Self {
            index,
            bounds: index.bounds(step),
            total_count: 0,
            per_category: Vec::new(),
            lookup: HashMap::new(),
        }
    }

    fn add(&mut self, record: &EventRecord) -> Result<(), RenderError> {
        self.total_count = self
            .total_count
            .checked_add(record.count)
            .ok_or_else(|| RenderError::CountOverflow(format!("cell {}", self.index.id())))?;
        let key = record.category_key();
        match self.lookup.get(&key) {
            // bounded by the cell total checked above
            Some(&i) => self.per_category[i].1.count += record.count,
            None => {
                self.lookup.insert(key.clone(), self.per_category.len());
                self.per_category.push((
                    key,
                    CategoryTally {
                        representative: record.kind,
                        count: record.count,
                    },
                ));
            }
        }
        Ok(())
    }

    /// Categories by count descending (ties keep first-seen order); the
    /// first `top` are kept, the rest counted in `more`.
    pub fn ranked(&self, top: usize) -> RankedCategories<'_> {
        let mut all: Vec<(&str, &CategoryTally)> =
            self.per_category.iter().map(|(k, t)| (k.as_str(), t)).collect();
        all.sort_by(|a, b| b.1.count.cmp(&a.1.count));
        let more = all.len().saturating_sub(top);
        all.truncate(top);
        RankedCategories { top: all, more }
    }
}

#[derive(Clone, Debug)]
pub struct GridSummary {
    pub cells: Vec<Cell>,
    /// Largest cell total, floored to 1
    pub max_grid_count: u64,
    pub step: f64,
}

impl GridSummary {
    pub fn total_count(&self) -> u64 {
        self.cells.iter().map(|c| c.total_count).sum()
    }
}

/// Bin records into `step`-degree cells.
pub fn bin_records<'a, I>(records: I, step: f64) -> Result<GridSummary, RenderError>
where
    I: IntoIterator<Item = &'a EventRecord>,
{
    if !step.is_finite() || step <= 0.0 {
        return Err(RenderError::InvalidGridStep(step));
    }

    let mut index: HashMap<CellIndex, usize> = HashMap::new();
    let mut cells: Vec<Cell> = Vec::new();

    for record in records {
        let idx = CellIndex::of(record.lat, record.lon, step);
        let slot = *index.entry(idx).or_insert_with(|| {
            cells.push(Cell::new(idx, step));
            cells.len() - 1
        });
        cells[slot].add(record)?;
    }

    let mut max_grid_count = 0;
    for cell in &cells {
        max_grid_count = max_grid_count.max(cell.total_count);
    }

    Ok(GridSummary {
        cells,
        max_grid_count: max_grid_count.max(1),
        step,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn(lat: f64, lon: f64, count: u64, species: u32) -> EventRecord {
        EventRecord::new(lat, lon, count, EventKind::Spawn { species, form: 0, iv: None })
    }

    #[test]
    fn test_nearby_points_share_a_cell() {
        let records = vec![spawn(10.0, 10.0, 5, 1), spawn(10.00001, 10.00001, 3, 1)];
        let grid = bin_records(&records, 0.0005).unwrap();
        assert_eq!(grid.cells.len(), 1);
        assert_eq!(grid.cells[0].total_count, 8);
        assert_eq!(grid.max_grid_count, 8);
        assert!(grid.cells[0].bounds.contains(10.00001, 10.00001));
    }

    #[test]
    fn test_partition_preserves_mass_for_any_step() {
        let records: Vec<EventRecord> = (0..2_000)
            .map(|i| {
                let f = i as f64;
                spawn(45.0 + (f * 0.37).sin() * 0.01, 15.0 + (f * 0.11).cos() * 0.01, i % 17, (i % 9) as u32)
            })
            .collect();
        let expected: u64 = records.iter().map(|r| r.count).sum();
        for step in [0.0001, 0.0005, 0.001, 0.01, 1.0] {
            let grid = bin_records(&records, step).unwrap();
            assert_eq!(grid.total_count(), expected, "step {step}");
            for cell in &grid.cells {
                let per_cat: u64 = cell.per_category.iter().map(|(_, t)| t.count).sum();
                assert_eq!(per_cat, cell.total_count);
            }
        }
    }

    #[test]
    fn test_negative_coordinates_floor_down() {
        let idx = CellIndex::of(-0.0001, -0.0001, 0.0005);
        assert_eq!(idx, CellIndex { lat: -1, lon: -1 });
    }

    #[test]
    fn test_ranking_collapses_remainder() {
        let mut records = Vec::new();
        for species in 1..=8u32 {
            records.push(spawn(1.0, 1.0, species as u64 * 10, species));
        }
        let grid = bin_records(&records, 0.0005).unwrap();
        let ranked = grid.cells[0].ranked(5);
        assert_eq!(ranked.top.len(), 5);
        assert_eq!(ranked.more, 3);
        assert_eq!(ranked.top[0].0, "8:0");
        assert_eq!(ranked.top[0].1.count, 80);
    }

    #[test]
    fn test_first_seen_representative() {
        let records = vec![
            EventRecord::new(1.0, 1.0, 1, EventKind::Raid { species: 150, form: 0, level: 5 }),
            EventRecord::new(1.0, 1.0, 1, EventKind::Raid { species: 150, form: 0, level: 3 }),
        ];
        let grid = bin_records(&records, 0.0005).unwrap();
        let (_, tally) = &grid.cells[0].per_category[0];
        assert_eq!(tally.representative.level(), Some(5));
        assert_eq!(tally.count, 2);
    }

    #[test]
    fn test_count_overflow_is_an_error() {
        let half = u64::MAX / 2 + 1;
        let records = vec![spawn(10.0, 10.0, half, 1), spawn(10.0, 10.0, half, 2)];
        assert!(matches!(bin_records(&records, 0.0005), Err(RenderError::CountOverflow(_))));

        let apart = vec![spawn(10.0, 10.0, half, 1), spawn(20.0, 20.0, half, 1)];
        assert_eq!(bin_records(&apart, 0.0005).unwrap().cells.len(), 2);
    }

    #[test]
    fn test_invalid_step() {
        let records = vec![spawn(1.0, 1.0, 1, 1)];
        assert!(matches!(bin_records(&records, 0.0), Err(RenderError::InvalidGridStep(_))));
        assert!(matches!(bin_records(&records, f64::NAN), Err(RenderError::InvalidGridStep(_))));
    }

    #[test]
    fn test_empty_grid_max_is_floored() {
        let records: Vec<EventRecord> = Vec::new();
        let grid = bin_records(&records, 0.0005).unwrap();
        assert_eq!(grid.max_grid_count, 1);
    }
}
