//! Per-entity summaries (tooltip content) for markers and grid cells.
//!
//! Building summaries for thousands of aggregates is done in batches with a
//! short pause between batches. The pause is bounded and runs on the calling
//! thread; input events queue up until the render returns.

use std::thread;
use std::time::Duration;

use crate::aggregate::{Cell, LocationGroup};
use crate::config::SummaryConfig;
use crate::icons::{IconResolver, PLACEHOLDER_ICON};
use crate::names::GruntNames;
use crate::record::{EventKind, EventRecord};

/// Splits work into batches and yields between them.
#[derive(Clone, Copy, Debug)]
pub struct Batcher {
    batch_size: usize,
    pause: Duration,
}

impl Batcher {
    pub fn new(batch_size: usize, pause: Duration) -> Self {
        Self {
            batch_size: batch_size.max(1),
            pause,
        }
    }

    pub fn from_config(config: &SummaryConfig) -> Self {
        Self::new(config.batch_size, Duration::from_micros(config.pause_micros))
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Apply `f` to every item, batch by batch, preserving order.
    pub fn map<T, R>(&self, items: &[T], mut f: impl FnMut(&T) -> R) -> Vec<R> {
        let mut out = Vec::with_capacity(items.len());
        for (i, chunk) in items.chunks(self.batch_size).enumerate() {
            if i > 0 {
                self.yield_now();
            }
            out.extend(chunk.iter().map(&mut f));
        }
        out
    }

    fn yield_now(&self) {
        if self.pause.is_zero() {
            thread::yield_now();
        } else {
            thread::sleep(self.pause);
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SummaryLine {
    pub label: String,
    pub count: u64,
    pub icon_url: String,
}

impl SummaryLine {
    /// File name of the resolved icon, `None` when the placeholder is used
    pub fn icon_name(&self) -> Option<&str> {
        if self.icon_url == PLACEHOLDER_ICON {
            return None;
        }
        self.icon_url.rsplit('/').next()
    }
}

/// Tooltip content for one entity.
#[derive(Clone, Debug, PartialEq)]
pub struct Summary {
    pub title: String,
    pub total: u64,
    pub lines: Vec<SummaryLine>,
    /// Categories collapsed into "+N more"
    pub more: usize,
}

impl Summary {
    pub fn to_lines(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.lines.len() + 3);
        out.push(self.title.clone());
        out.push(format!("Total: {}", self.total));
        for line in &self.lines {
            let icon = line.icon_name().unwrap_or("no icon");
            out.push(format!("{} ×{} [{}]", line.label, line.count, icon));
        }
        if self.more > 0 {
            out.push(format!("+{} more", self.more));
        }
        out
    }
}

/// Resolves labels and icons for record kinds.
pub struct Labeler<'a> {
    pub names: &'a GruntNames,
    pub icons: &'a mut IconResolver,
}

impl Labeler<'_> {
    pub fn label(&self, kind: &EventKind) -> String {
        match *kind {
            EventKind::Spawn { species, form, iv } => {
                let mut label = format!("Pokémon #{species}");
                if form != 0 {
                    label.push_str(&format!(" (form {form})"));
                }
                if let Some(iv) = iv {
                    label.push_str(&format!(" {iv}%"));
                }
                label
            }
            EventKind::Raid { species, form, level } => {
                if form != 0 {
                    format!("L{level} raid #{species} (form {form})")
                } else {
                    format!("L{level} raid #{species}")
                }
            }
            EventKind::Invasion { character, .. } => self.names.display_name(character),
        }
    }

    fn line(&mut self, kind: &EventKind, count: u64) -> SummaryLine {
        SummaryLine {
            label: self.label(kind),
            count,
            icon_url: self.icons.url_for(kind),
        }
    }

    /// Members merged by category, largest first
    pub fn group_summary(&mut self, group: &LocationGroup<'_>, top: usize) -> Summary {
        let mut merged: Vec<(String, EventKind, u64)> = Vec::new();
        for member in &group.members {
            add_member(&mut merged, member);
        }
        merged.sort_by(|a, b| b.2.cmp(&a.2));
        let more = merged.len().saturating_sub(top);
        merged.truncate(top);

        let title = match group.name() {
            Some(name) => name.to_string(),
            None => format!("{:.5}, {:.5}", group.lat, group.lon),
        };
        let lines = merged.iter().map(|(_, kind, count)| self.line(kind, *count)).collect();

        Summary {
            title,
            total: group.total_count,
            lines,
            more,
        }
    }

    pub fn cell_summary(&mut self, cell: &Cell, top: usize) -> Summary {
        let ranked = cell.ranked(top);
        let lines = ranked
            .top
            .iter()
            .map(|(_, tally)| self.line(&tally.representative, tally.count))
            .collect();
        Summary {
            title: format!("Cell {}", cell.index.id()),
            total: cell.total_count,
            lines,
            more: ranked.more,
        }
    }
}

fn add_member(merged: &mut Vec<(String, EventKind, u64)>, member: &EventRecord) {
    let key = member.category_key();
    match merged.iter_mut().find(|(k, _, _)| *k == key) {
        Some(entry) => entry.2 += member.count,
        None => merged.push((key, member.kind, member.count)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{bin_records, group_by_location};
    use crate::icons::AssumeAvailable;
    use crate::names::NoNames;

    #[test]
    fn test_batcher_preserves_order_and_length() {
        let items: Vec<u32> = (0..1_003).collect();
        let batcher = Batcher::new(100, Duration::ZERO);
        let mut calls = 0;
        let out = batcher.map(&items, |x| {
            calls += 1;
            x * 2
        });
        assert_eq!(calls, 1_003);
        assert_eq!(out.len(), items.len());
        assert!(out.iter().enumerate().all(|(i, v)| *v == i as u32 * 2));
    }

    #[test]
    fn test_zero_batch_size_is_clamped() {
        let batcher = Batcher::new(0, Duration::ZERO);
        assert_eq!(batcher.batch_size(), 1);
        assert_eq!(batcher.map(&[1, 2, 3], |x| *x), vec![1, 2, 3]);
    }

    fn labeler_parts() -> (GruntNames, IconResolver) {
        (
            GruntNames::new(NoNames),
            IconResolver::new("https://icons.example", Box::new(AssumeAvailable)),
        )
    }

    #[test]
    fn test_group_summary_merges_categories() {
        let records = vec![
            EventRecord::new(1.0, 1.0, 2, EventKind::Invasion { display_type: 1, character: 41 }).with_group("Stop"),
            EventRecord::new(1.0, 1.0, 5, EventKind::Invasion { display_type: 1, character: 4 }).with_group("Stop"),
            EventRecord::new(1.0, 1.0, 1, EventKind::Invasion { display_type: 1, character: 41 }).with_group("Stop"),
        ];
        let groups = group_by_location(&records).unwrap();
        let (names, mut icons) = labeler_parts();
        let mut labeler = Labeler { names: &names, icons: &mut icons };
        let summary = labeler.group_summary(&groups[0], 5);

        assert_eq!(summary.title, "Stop");
        assert_eq!(summary.total, 8);
        assert_eq!(summary.lines.len(), 2);
        assert_eq!(summary.lines[0].count, 5);
        assert_eq!(summary.lines[1].label, "Grunt #41");
        assert_eq!(summary.lines[1].count, 3);
        assert_eq!(summary.lines[1].icon_url, "https://icons.example/invasion/41.webp");
        assert_eq!(summary.to_lines()[3], "Grunt #41 ×3 [41.webp]");

        let placeholder = SummaryLine {
            label: "Grunt #7".to_string(),
            count: 1,
            icon_url: PLACEHOLDER_ICON.to_string(),
        };
        assert_eq!(placeholder.icon_name(), None);
    }

    #[test]
    fn test_cell_summary_collapses_tail() {
        let records: Vec<EventRecord> = (1..=7u32)
            .map(|s| EventRecord::new(1.0, 1.0, s as u64, EventKind::Raid { species: s, form: 0, level: 1 }))
            .collect();
        let grid = bin_records(&records, 0.0005).unwrap();
        let (names, mut icons) = labeler_parts();
        let mut labeler = Labeler { names: &names, icons: &mut icons };
        let summary = labeler.cell_summary(&grid.cells[0], 5);

        assert_eq!(summary.lines.len(), 5);
        assert_eq!(summary.more, 2);
        assert_eq!(summary.lines[0].label, "L1 raid #7");
        assert_eq!(summary.to_lines().last().unwrap(), "+2 more");
    }
}
