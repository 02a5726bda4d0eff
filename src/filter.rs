use std::collections::HashSet;

use crate::record::EventRecord;

/// Category keys excluded from a render.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Blocklist {
    keys: HashSet<String>,
}

impl Blocklist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn insert(&mut self, key: impl Into<String>) -> bool {
        self.keys.insert(key.into())
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Blocklist {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Drop records whose category key is blocklisted. Single pass, order preserved.
pub fn filter_records<'a>(records: &'a [EventRecord], blocklist: &Blocklist) -> Vec<&'a EventRecord> {
    if blocklist.is_empty() {
        return records.iter().collect();
    }
    records
        .iter()
        .filter(|r| !blocklist.contains(&r.category_key()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::EventKind;

    fn sample() -> Vec<EventRecord> {
        vec![
            EventRecord::new(1.0, 1.0, 3, EventKind::Spawn { species: 1, form: 0, iv: None }),
            EventRecord::new(1.0, 2.0, 4, EventKind::Spawn { species: 1, form: 2, iv: None }),
            EventRecord::new(2.0, 2.0, 5, EventKind::Raid { species: 1, form: 0, level: 3 }),
            EventRecord::new(3.0, 2.0, 6, EventKind::Invasion { display_type: 1, character: 41 }),
        ]
    }

    #[test]
    fn test_empty_blocklist_keeps_everything() {
        let records = sample();
        let kept = filter_records(&records, &Blocklist::new());
        assert_eq!(kept.len(), records.len());
        assert!(kept.iter().zip(&records).all(|(a, b)| *a == b));
    }

    #[test]
    fn test_blocked_keys_are_removed() {
        let records = sample();
        let blocklist: Blocklist = ["1:0", "41"].into_iter().collect();
        let kept = filter_records(&records, &blocklist);
        assert_eq!(kept.len(), 1);
        assert!(kept.iter().all(|r| !blocklist.contains(&r.category_key())));
        assert_eq!(kept[0].count, 4);
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let records = sample();
        let blocklist: Blocklist = ["999:9"].into_iter().collect();
        assert_eq!(filter_records(&records, &blocklist).len(), 4);
    }
}
