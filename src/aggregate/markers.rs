use std::collections::HashMap;

use crate::error::RenderError;
use crate::record::EventRecord;

/// What a marker groups on: a named place, or the exact coordinate bits.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum LocationKey {
    Named(String),
    Coordinate { lat_bits: u64, lon_bits: u64 },
}

impl LocationKey {
    pub fn for_record(record: &EventRecord) -> Self {
        match &record.group {
            Some(name) => LocationKey::Named(name.clone()),
            None => LocationKey::Coordinate {
                lat_bits: record.lat.to_bits(),
                lon_bits: record.lon.to_bits(),
            },
        }
    }
}

/// Records that share a location.
#[derive(Clone, Debug)]
pub struct LocationGroup<'a> {
    pub key: LocationKey,
    /// Position of the first member
    pub lat: f64,
    pub lon: f64,
    pub members: Vec<&'a EventRecord>,
    pub total_count: u64,
}

impl LocationGroup<'_> {
    pub fn name(&self) -> Option<&str> {
        match &self.key {
            LocationKey::Named(name) => Some(name),
            LocationKey::Coordinate { .. } => None,
        }
    }
}

/// Group records by named place, else by exact coordinate. Groups come out
/// in first-seen order. Fails when a group total overflows.
pub fn group_by_location<'a, I>(records: I) -> Result<Vec<LocationGroup<'a>>, RenderError>
where
    I: IntoIterator<Item = &'a EventRecord>,
{
    let mut index: HashMap<LocationKey, usize> = HashMap::new();
    let mut groups: Vec<LocationGroup<'a>> = Vec::new();

    for record in records {
        let key = LocationKey::for_record(record);
        match index.get(&key) {
            Some(&i) => {
                let group = &mut groups[i];
                group.total_count = group
                    .total_count
                    .checked_add(record.count)
                    .ok_or_else(|| RenderError::CountOverflow(format!("location {:?}", group.key)))?;
                group.members.push(record);
            }
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(LocationGroup {
                    key,
                    lat: record.lat,
                    lon: record.lon,
                    members: vec![record],
                    total_count: record.count,
                });
            }
        }
    }

    Ok(groups)
}
