use crate::aggregate::Aggregation;
use crate::sizing::{hue_color, Rgb};

/// Legend shown in the corner of a container.
#[derive(Clone, Debug, PartialEq)]
pub struct Legend {
    pub title: String,
    pub min_label: String,
    pub max_label: String,
}

impl Legend {
    /// Cold → hot swatches for the gradient bar
    pub fn gradient(&self, steps: usize) -> Vec<Rgb> {
        let steps = steps.max(2);
        (0..steps)
            .map(|i| hue_color(i as f64 / (steps - 1) as f64))
            .collect()
    }
}

/// Legend for the given aggregation; markers mode has none.
pub fn legend_for(aggregation: &Aggregation<'_>) -> Option<Legend> {
    match aggregation {
        Aggregation::Markers(_) => None,
        Aggregation::Density(_) => Some(Legend {
            title: "Density".to_string(),
            min_label: "Low".to_string(),
            max_label: "High".to_string(),
        }),
        Aggregation::Grid(summary) => {
            let min = if summary.cells.iter().any(|c| c.total_count == 0) { 0 } else { 1 };
            Some(Legend {
                title: "Events per cell".to_string(),
                min_label: min.to_string(),
                max_label: summary.max_grid_count.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{bin_records, group_by_location, normalize};
    use crate::config::DensityConfig;
    use crate::record::{EventKind, EventRecord};

    fn records() -> Vec<EventRecord> {
        vec![
            EventRecord::new(1.0, 1.0, 7, EventKind::Invasion { display_type: 1, character: 41 }),
            EventRecord::new(2.0, 2.0, 12, EventKind::Invasion { display_type: 1, character: 4 }),
        ]
    }

    #[test]
    fn test_markers_have_no_legend() {
        let records = records();
        assert!(legend_for(&Aggregation::Markers(group_by_location(&records).unwrap())).is_none());
    }

    #[test]
    fn test_density_legend_is_qualitative() {
        let records = records();
        let legend = legend_for(&Aggregation::Density(normalize(&records, &DensityConfig::default()))).unwrap();
        assert_eq!((legend.min_label.as_str(), legend.max_label.as_str()), ("Low", "High"));
    }

    #[test]
    fn test_grid_legend_is_numeric() {
        let mut records = records();
        let legend = legend_for(&Aggregation::Grid(bin_records(&records, 0.0005).unwrap())).unwrap();
        assert_eq!(legend.min_label, "1");
        assert_eq!(legend.max_label, "12");

        records.push(EventRecord::new(5.0, 5.0, 0, EventKind::Invasion { display_type: 1, character: 5 }));
        let legend = legend_for(&Aggregation::Grid(bin_records(&records, 0.0005).unwrap())).unwrap();
        assert_eq!(legend.min_label, "0");
    }

    #[test]
    fn test_gradient_runs_cold_to_hot() {
        let legend = Legend {
            title: String::new(),
            min_label: String::new(),
            max_label: String::new(),
        };
        let g = legend.gradient(5);
        assert_eq!(g.len(), 5);
        assert_eq!(g[0], (0, 0, 255));
        assert_eq!(g[4], (255, 0, 0));
    }
}
