use glam::DVec2;

use crate::record::EventRecord;

/// Geographic rectangle. `x` is longitude, `y` is latitude.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoBounds {
    pub min: DVec2,
    pub max: DVec2,
}

impl GeoBounds {
    pub fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Self {
        Self {
            min: DVec2::new(min_lon, min_lat),
            max: DVec2::new(max_lon, max_lat),
        }
    }

    pub fn min_lat(&self) -> f64 {
        self.min.y
    }

    pub fn max_lat(&self) -> f64 {
        self.max.y
    }

    pub fn min_lon(&self) -> f64 {
        self.min.x
    }

    pub fn max_lon(&self) -> f64 {
        self.max.x
    }

    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min.x && lon <= self.max.x && lat >= self.min.y && lat <= self.max.y
    }
}

/// Bounding box of a record set, or `None` when empty.
///
/// Plain loop with running min/max so inputs of tens of thousands of points
/// never go through a whole-collection reduction.
pub fn compute_bounds<'a, I>(records: I) -> Option<GeoBounds>
where
    I: IntoIterator<Item = &'a EventRecord>,
{
    let mut iter = records.into_iter();
    let first = iter.next()?;

    let mut min_lat = first.lat;
    let mut max_lat = first.lat;
    let mut min_lon = first.lon;
    let mut max_lon = first.lon;

    for record in iter {
        if record.lat < min_lat {
            min_lat = record.lat;
        }
        if record.lat > max_lat {
            max_lat = record.lat;
        }
        if record.lon < min_lon {
            min_lon = record.lon;
        }
        if record.lon > max_lon {
            max_lon = record.lon;
        }
    }

    Some(GeoBounds::new(min_lat, max_lat, min_lon, max_lon))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::EventKind;

    fn at(lat: f64, lon: f64) -> EventRecord {
        EventRecord::new(lat, lon, 1, EventKind::Invasion { display_type: 1, character: 4 })
    }

    #[test]
    fn test_empty_has_no_bounds() {
        let records: Vec<EventRecord> = Vec::new();
        assert!(compute_bounds(&records).is_none());
    }

    #[test]
    fn test_bounds_cover_all_points() {
        let records = vec![at(10.0, 20.0), at(-5.0, 30.0), at(12.5, -3.0)];
        let b = compute_bounds(&records).unwrap();
        assert_eq!(b.min_lat(), -5.0);
        assert_eq!(b.max_lat(), 12.5);
        assert_eq!(b.min_lon(), -3.0);
        assert_eq!(b.max_lon(), 30.0);
        assert!(records.iter().all(|r| b.contains(r.lon, r.lat)));
    }

    #[test]
    fn test_large_input() {
        let records: Vec<EventRecord> = (0..50_000)
            .map(|i| at((i % 180) as f64 - 89.0, (i % 360) as f64 - 179.0))
            .collect();
        let b = compute_bounds(&records).unwrap();
        assert_eq!(b.min_lat(), -89.0);
        assert_eq!(b.max_lon(), 180.0);
    }
}
