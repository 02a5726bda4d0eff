//! Aggregation strategies. All three consume the filtered record set; the
//! mode string picks one.

pub mod density;
pub mod grid;
pub mod markers;

use std::fmt;
use std::str::FromStr;

use crate::config::MapConfig;
use crate::error::RenderError;
use crate::record::EventRecord;

pub use density::{density_params, normalize, DensityField, DensityParams, HeatPoint};
pub use grid::{bin_records, CategoryTally, Cell, CellIndex, GridSummary, RankedCategories};
pub use markers::{group_by_location, LocationGroup, LocationKey};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    Markers,
    Density,
    Grid,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Markers => "markers",
            Mode::Density => "density",
            Mode::Grid => "grid",
        }
    }
}

impl FromStr for Mode {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "markers" => Ok(Mode::Markers),
            "density" => Ok(Mode::Density),
            "grid" => Ok(Mode::Grid),
            other => Err(RenderError::UnknownMode(other.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of one strategy run. Borrows the records it was built from.
pub enum Aggregation<'a> {
    Markers(Vec<LocationGroup<'a>>),
    Density(DensityField),
    Grid(GridSummary),
}

impl Aggregation<'_> {
    pub fn mode(&self) -> Mode {
        match self {
            Aggregation::Markers(_) => Mode::Markers,
            Aggregation::Density(_) => Mode::Density,
            Aggregation::Grid(_) => Mode::Grid,
        }
    }

    /// Number of drawable entities produced
    pub fn len(&self) -> usize {
        match self {
            Aggregation::Markers(groups) => groups.len(),
            Aggregation::Density(field) => field.points.len(),
            Aggregation::Grid(summary) => summary.cells.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Run the strategy for `mode` over already-filtered records.
pub fn aggregate<'a>(
    mode: Mode,
    records: &[&'a EventRecord],
    config: &MapConfig,
) -> Result<Aggregation<'a>, RenderError> {
    let aggregation = match mode {
        Mode::Markers => Aggregation::Markers(group_by_location(records.iter().copied())?),
        Mode::Density => Aggregation::Density(normalize(records.iter().copied(), &config.density)),
        Mode::Grid => Aggregation::Grid(bin_records(records.iter().copied(), config.grid.step)?),
    };
    Ok(aggregation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing() {
        assert_eq!("markers".parse::<Mode>().unwrap(), Mode::Markers);
        assert_eq!("density".parse::<Mode>().unwrap(), Mode::Density);
        assert_eq!("grid".parse::<Mode>().unwrap(), Mode::Grid);
        assert!(matches!("heat".parse::<Mode>(), Err(RenderError::UnknownMode(m)) if m == "heat"));
    }

    #[test]
    fn test_aggregate_dispatches_on_mode() {
        use crate::record::EventKind;

        let records = vec![
            EventRecord::new(1.0, 1.0, 2, EventKind::Invasion { display_type: 1, character: 41 }),
            EventRecord::new(1.0, 1.0, 3, EventKind::Invasion { display_type: 1, character: 4 }),
        ];
        let refs: Vec<&EventRecord> = records.iter().collect();
        let config = MapConfig::default();
        for mode in [Mode::Markers, Mode::Density, Mode::Grid] {
            let aggregation = aggregate(mode, &refs, &config).unwrap();
            assert_eq!(aggregation.mode(), mode);
        }
        assert_eq!(aggregate(Mode::Markers, &refs, &config).unwrap().len(), 1);
        assert_eq!(aggregate(Mode::Density, &refs, &config).unwrap().len(), 2);
    }
}
