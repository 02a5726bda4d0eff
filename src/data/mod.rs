use crate::record::{Domain, EventKind, EventRecord};
use anyhow::{Context, Result};
use geojson::{GeoJson, JsonObject, Value};
use rayon::prelude::*;
use simd_json::prelude::*;
use simd_json::OwnedValue;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

const LATITUDE: &[&str] = &["latitude", "spawnpoint__latitude", "lat"];
const LONGITUDE: &[&str] = &["longitude", "spawnpoint__longitude", "lon"];
const COUNT: &[&str] = &["count", "total_count", "cnt"];

/// Field access shared by JSON rows and GeoJSON feature properties
trait Row {
    fn number(&self, key: &str) -> Option<f64>;
    fn text(&self, key: &str) -> Option<&str>;

    fn first_number(&self, keys: &[&str]) -> Option<f64> {
        keys.iter().find_map(|k| self.number(k))
    }

    fn position(&self) -> Option<(f64, f64)> {
        Some((self.first_number(LATITUDE)?, self.first_number(LONGITUDE)?))
    }
}

impl Row for OwnedValue {
    fn number(&self, key: &str) -> Option<f64> {
        let value = self.get(key)?;
        value
            .cast_f64()
            .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
    }

    fn text(&self, key: &str) -> Option<&str> {
        self.get(key)?.as_str()
    }
}

/// A Point feature: coordinates from the geometry, fields from properties
struct FeatureRow<'a> {
    lon: f64,
    lat: f64,
    properties: Option<&'a JsonObject>,
}

impl Row for FeatureRow<'_> {
    fn number(&self, key: &str) -> Option<f64> {
        let value = self.properties?.get(key)?;
        value
            .as_f64()
            .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
    }

    fn text(&self, key: &str) -> Option<&str> {
        self.properties?.get(key)?.as_str()
    }

    fn position(&self) -> Option<(f64, f64)> {
        Some((self.lat, self.lon))
    }
}

/// Non-negative whole number, accepting `3` and `3.0`
fn whole(value: f64) -> Option<u64> {
    (value.is_finite() && value >= 0.0 && value.fract() == 0.0).then_some(value as u64)
}

fn id(row: &impl Row, key: &str) -> Option<u32> {
    row.number(key).and_then(whole).and_then(|v| u32::try_from(v).ok())
}

fn id_or_zero(row: &impl Row, key: &str) -> Option<u32> {
    match row.number(key) {
        None => Some(0),
        Some(v) => whole(v).and_then(|v| u32::try_from(v).ok()),
    }
}

/// Convert one row, or `None` when it cannot become a record
fn record_from_row(row: &impl Row, domain: Domain) -> Option<EventRecord> {
    let (lat, lon) = row.position()?;
    let count = match row.first_number(COUNT) {
        Some(v) => whole(v)?,
        None => 1,
    };

    let (kind, group) = match domain {
        Domain::Spawns => {
            let iv = row
                .number("iv")
                .filter(|v| (0.0..=100.0).contains(v))
                .map(|v| v.round() as u8);
            let kind = EventKind::Spawn {
                species: id(row, "pokemon_id")?,
                form: id_or_zero(row, "form")?,
                iv,
            };
            (kind, None)
        }
        Domain::Raids => {
            let level = id_or_zero(row, "raid_level")?;
            let kind = EventKind::Raid {
                species: id(row, "raid_pokemon")?,
                form: id_or_zero(row, "raid_form")?,
                level: u8::try_from(level).ok()?,
            };
            (kind, row.text("gym_name"))
        }
        Domain::Invasions => {
            let kind = EventKind::Invasion {
                display_type: id_or_zero(row, "display_type")?,
                character: id(row, "character")?,
            };
            (kind, row.text("pokestop_name"))
        }
    };

    let mut record = EventRecord::new(lat, lon, count, kind);
    if let Some(name) = group.filter(|name| !name.is_empty()) {
        record = record.with_group(name);
    }
    record.has_valid_position().then_some(record)
}

/// Parse a backend JSON payload. `Ok(None)` when the top level is not an
/// array of rows; rows that cannot be converted are skipped.
pub fn parse_records(bytes: &mut [u8], domain: Domain) -> Result<Option<Vec<EventRecord>>> {
    let value = simd_json::to_owned_value(bytes).context("payload is not valid JSON")?;
    let Some(rows) = value.as_array() else {
        return Ok(None);
    };

    let converted: Vec<Option<EventRecord>> = rows
        .par_iter()
        .map(|row| record_from_row(row, domain))
        .collect();

    Ok(Some(keep_valid(converted, domain)))
}

/// Parse a GeoJSON FeatureCollection of Point features. `Ok(None)` for
/// any other GeoJSON object.
pub fn parse_geojson(content: &str, domain: Domain) -> Result<Option<Vec<EventRecord>>> {
    let geojson: GeoJson = content.parse().context("payload is not valid GeoJSON")?;
    let GeoJson::FeatureCollection(fc) = geojson else {
        return Ok(None);
    };

    let converted: Vec<Option<EventRecord>> = fc
        .features
        .par_iter()
        .map(|feature| {
            let geometry = feature.geometry.as_ref()?;
            let Value::Point(coords) = &geometry.value else {
                return None;
            };
            if coords.len() < 2 {
                return None;
            }
            let row = FeatureRow {
                lon: coords[0],
                lat: coords[1],
                properties: feature.properties.as_ref(),
            };
            record_from_row(&row, domain)
        })
        .collect();

    Ok(Some(keep_valid(converted, domain)))
}

fn keep_valid(converted: Vec<Option<EventRecord>>, domain: Domain) -> Vec<EventRecord> {
    let total = converted.len();
    let records: Vec<EventRecord> = converted.into_iter().flatten().collect();
    let skipped = total - records.len();
    if skipped > 0 {
        warn!(%domain, skipped, total, "skipped rows without a usable position or id");
    }
    records
}

/// Load records from a `.json` or `.geojson` file
pub fn load_records(path: &Path, domain: Domain) -> Result<Option<Vec<EventRecord>>> {
    let is_geojson = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("geojson"));

    let parsed = if is_geojson {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        parse_geojson(&content, domain)
    } else {
        let mut bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        parse_records(&mut bytes, domain)
    };
    let records = parsed.with_context(|| format!("failed to load {}", path.display()))?;

    match &records {
        Some(records) => info!(path = %path.display(), %domain, records = records.len(), "records loaded"),
        None => warn!(path = %path.display(), "top-level value is not a record list"),
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str, domain: Domain) -> Option<Vec<EventRecord>> {
        let mut bytes = json.as_bytes().to_vec();
        parse_records(&mut bytes, domain).unwrap()
    }

    #[test]
    fn test_spawn_rows_with_aliases() {
        let records = parse(
            r#"[
                {"spawnpoint__latitude": 45.81, "spawnpoint__longitude": 15.97, "total_count": 3, "pokemon_id": 25, "form": 598, "iv": 100},
                {"latitude": 45.82, "longitude": 15.98, "cnt": 2.0, "pokemon_id": 1}
            ]"#,
            Domain::Spawns,
        )
        .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind, EventKind::Spawn { species: 25, form: 598, iv: Some(100) });
        assert_eq!(records[0].count, 3);
        assert_eq!(records[1].kind, EventKind::Spawn { species: 1, form: 0, iv: None });
        assert_eq!(records[1].count, 2);
    }

    #[test]
    fn test_raid_and_invasion_groups() {
        let raids = parse(
            r#"[{"latitude": 1.0, "longitude": 2.0, "count": 4, "raid_pokemon": 150, "raid_level": 5, "gym_name": "Fountain"}]"#,
            Domain::Raids,
        )
        .unwrap();
        assert_eq!(raids[0].kind, EventKind::Raid { species: 150, form: 0, level: 5 });
        assert_eq!(raids[0].group.as_deref(), Some("Fountain"));

        let invasions = parse(
            r#"[{"latitude": 1.0, "longitude": 2.0, "count": 1, "character": 41, "display_type": 1, "pokestop_name": ""}]"#,
            Domain::Invasions,
        )
        .unwrap();
        assert_eq!(invasions[0].kind, EventKind::Invasion { display_type: 1, character: 41 });
        assert_eq!(invasions[0].group, None);
    }

    #[test]
    fn test_invalid_rows_are_skipped() {
        let records = parse(
            r#"[
                {"latitude": 95.0, "longitude": 2.0, "pokemon_id": 1},
                {"longitude": 2.0, "pokemon_id": 1},
                {"latitude": 1.0, "longitude": 2.0},
                {"latitude": 1.0, "longitude": 2.0, "count": -3, "pokemon_id": 1},
                "not a row",
                {"latitude": "1.5", "longitude": 2.0, "pokemon_id": 7}
            ]"#,
            Domain::Spawns,
        )
        .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].lat, 1.5);
    }

    #[test]
    fn test_non_array_is_not_a_sequence() {
        assert!(parse(r#"{"data": []}"#, Domain::Spawns).is_none());
        assert_eq!(parse("[]", Domain::Spawns), Some(Vec::new()));
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let mut bytes = b"[{".to_vec();
        assert!(parse_records(&mut bytes, Domain::Spawns).is_err());
    }

    #[test]
    fn test_geojson_points() {
        let content = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [15.97, 45.81]},
                 "properties": {"character": 41, "count": 2, "pokestop_name": "Statue"}},
                {"type": "Feature", "geometry": {"type": "LineString", "coordinates": [[0, 0], [1, 1]]},
                 "properties": {"character": 41}}
            ]
        }"#;
        let records = parse_geojson(content, Domain::Invasions).unwrap().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!((records[0].lat, records[0].lon), (45.81, 15.97));
        assert_eq!(records[0].count, 2);
        assert_eq!(records[0].group.as_deref(), Some("Statue"));
    }
}
