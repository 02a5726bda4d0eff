use crate::config::DensityConfig;
use crate::record::EventRecord;

/// Rendering parameters derived from the point count.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DensityParams {
    /// Value treated as fully hot
    pub saturation_threshold: f64,
    pub neighborhood_radius: f64,
    pub blur_radius: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeatPoint {
    pub lat: f64,
    pub lon: f64,
    pub intensity: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DensityField {
    pub points: Vec<HeatPoint>,
    pub params: DensityParams,
    /// Largest single-record count, floored to 1
    pub max_single_count: u64,
}

/// Tiered parameters for `n` points. A fixed cap would wash out small sets
/// or clip large ones, so the cap grows with `n`.
pub fn density_params(n: usize, config: &DensityConfig) -> DensityParams {
    let mut tiers = config.tiers.clone();
    tiers.sort_by(|a, b| b.above.cmp(&a.above));

    let saturation_threshold = tiers
        .iter()
        .find(|t| n > t.above)
        .map(|t| t.saturation)
        .unwrap_or(config.base_saturation);

    let neighborhood_radius = if n > config.radius_split {
        config.small_radius
    } else {
        config.large_radius
    };

    DensityParams {
        saturation_threshold,
        neighborhood_radius,
        blur_radius: neighborhood_radius * config.blur_factor,
    }
}

/// Scale every record's count by the batch maximum.
pub fn normalize<'a, I>(records: I, config: &DensityConfig) -> DensityField
where
    I: IntoIterator<Item = &'a EventRecord>,
{
    let records: Vec<&EventRecord> = records.into_iter().collect();

    let mut max_single_count = 0;
    for r in &records {
        max_single_count = max_single_count.max(r.count);
    }
    let max_single_count = max_single_count.max(1);

    let points = records
        .iter()
        .map(|r| HeatPoint {
            lat: r.lat,
            lon: r.lon,
            intensity: r.count as f64 / max_single_count as f64,
        })
        .collect();

    DensityField {
        points,
        params: density_params(records.len(), config),
        max_single_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::EventKind;

    #[test]
    fn test_tier_boundaries() {
        let config = DensityConfig::default();
        let cases = [
            (0, 1.0, 25.0),
            (200, 1.0, 25.0),
            (201, 1.5, 25.0),
            (1000, 1.5, 25.0),
            (1001, 3.0, 25.0),
            (5000, 3.0, 25.0),
            (5001, 5.0, 15.0),
            (15000, 5.0, 15.0),
            (15001, 8.0, 15.0),
        ];
        for (n, saturation, radius) in cases {
            let p = density_params(n, &config);
            assert_eq!(p.saturation_threshold, saturation, "saturation at n={n}");
            assert_eq!(p.neighborhood_radius, radius, "radius at n={n}");
            assert!((p.blur_radius - 0.7 * radius).abs() < 1e-12);
        }
    }

    #[test]
    fn test_intensity_in_unit_interval() {
        let records: Vec<EventRecord> = (1..=50)
            .map(|i| EventRecord::new(1.0, 1.0, i, EventKind::Spawn { species: 1, form: 0, iv: None }))
            .collect();
        let field = normalize(&records, &DensityConfig::default());
        assert_eq!(field.max_single_count, 50);
        assert!(field.points.iter().all(|p| p.intensity > 0.0 && p.intensity <= 1.0));
        assert_eq!(field.points.last().unwrap().intensity, 1.0);
    }

    #[test]
    fn test_all_zero_counts_do_not_divide_by_zero() {
        let records = vec![EventRecord::new(1.0, 1.0, 0, EventKind::Spawn { species: 1, form: 0, iv: None })];
        let field = normalize(&records, &DensityConfig::default());
        assert_eq!(field.max_single_count, 1);
        assert_eq!(field.points[0].intensity, 0.0);
    }
}
