use std::fmt;

/// Telemetry domain. Each domain renders into its own well-known container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Domain {
    Spawns,
    Raids,
    Invasions,
}

impl Domain {
    /// Id of the visual region this domain draws into
    pub fn container_id(self) -> &'static str {
        match self {
            Domain::Spawns => "pokemon-heatmap",
            Domain::Raids => "raids-heatmap",
            Domain::Invasions => "invasions-heatmap",
        }
    }

    /// Icon directory under the icon base url
    pub fn icon_dir(self) -> &'static str {
        match self {
            Domain::Spawns | Domain::Raids => "pokemon",
            Domain::Invasions => "invasion",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Domain::Spawns => "Spawns",
            Domain::Raids => "Raids",
            Domain::Invasions => "Invasions",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Domain-specific category of a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Spawn { species: u32, form: u32, iv: Option<u8> },
    Raid { species: u32, form: u32, level: u8 },
    Invasion { display_type: u32, character: u32 },
}

impl EventKind {
    pub fn domain(&self) -> Domain {
        match self {
            EventKind::Spawn { .. } => Domain::Spawns,
            EventKind::Raid { .. } => Domain::Raids,
            EventKind::Invasion { .. } => Domain::Invasions,
        }
    }

    /// Blocklist key: `species:form` for spawns and raids, `character` for invasions
    pub fn category_key(&self) -> String {
        match *self {
            EventKind::Spawn { species, form, .. } | EventKind::Raid { species, form, .. } => {
                format!("{species}:{form}")
            }
            EventKind::Invasion { character, .. } => character.to_string(),
        }
    }

    /// Numeric id the icon file is named after
    pub fn category_id(&self) -> u32 {
        match *self {
            EventKind::Spawn { species, .. } | EventKind::Raid { species, .. } => species,
            EventKind::Invasion { character, .. } => character,
        }
    }

    /// Form used as icon suffix, if any
    pub fn form(&self) -> Option<u32> {
        match *self {
            EventKind::Spawn { form, .. } | EventKind::Raid { form, .. } if form != 0 => Some(form),
            _ => None,
        }
    }

    pub fn level(&self) -> Option<u8> {
        match *self {
            EventKind::Raid { level, .. } => Some(level),
            _ => None,
        }
    }
}

/// One geolocated telemetry item.
#[derive(Clone, Debug, PartialEq)]
pub struct EventRecord {
    pub lat: f64,
    pub lon: f64,
    pub count: u64,
    pub kind: EventKind,
    /// Named place (gym or pokestop) the event happened at
    pub group: Option<String>,
}

impl EventRecord {
    pub fn new(lat: f64, lon: f64, count: u64, kind: EventKind) -> Self {
        Self {
            lat,
            lon,
            count,
            kind,
            group: None,
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn category_key(&self) -> String {
        self.kind.category_key()
    }

    /// True when both coordinates are finite and inside the WGS84 ranges
    pub fn has_valid_position(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_keys() {
        let spawn = EventKind::Spawn { species: 25, form: 598, iv: Some(100) };
        let raid = EventKind::Raid { species: 150, form: 0, level: 5 };
        let invasion = EventKind::Invasion { display_type: 1, character: 41 };
        assert_eq!(spawn.category_key(), "25:598");
        assert_eq!(raid.category_key(), "150:0");
        assert_eq!(invasion.category_key(), "41");
    }

    #[test]
    fn test_zero_form_has_no_suffix() {
        let raid = EventKind::Raid { species: 150, form: 0, level: 5 };
        assert_eq!(raid.form(), None);
        assert_eq!(raid.level(), Some(5));
    }

    #[test]
    fn test_position_validation() {
        let kind = EventKind::Invasion { display_type: 1, character: 4 };
        assert!(EventRecord::new(45.0, 15.0, 1, kind).has_valid_position());
        assert!(!EventRecord::new(95.0, 15.0, 1, kind).has_valid_position());
        assert!(!EventRecord::new(f64::NAN, 15.0, 1, kind).has_valid_position());
    }
}
