use criterion::{black_box, criterion_group, criterion_main, Criterion};
use spawnmap::aggregate::{bin_records, density_params, group_by_location, normalize};
use spawnmap::config::MapConfig;
use spawnmap::filter::{filter_records, Blocklist};
use spawnmap::icons::{AssumeAvailable, IconResolver};
use spawnmap::map;
use spawnmap::names::{GruntNames, NoNames};
use spawnmap::orchestrator::Orchestrator;
use spawnmap::record::{EventKind, EventRecord};
use std::sync::Arc;

const N: usize = 20_000;

/// Deterministic spread of spawns over a few square kilometres
fn records() -> Vec<EventRecord> {
    (0..N)
        .map(|i| {
            let lat = 45.80 + (i % 137) as f64 * 0.0002;
            let lon = 15.95 + (i % 211) as f64 * 0.0002;
            let kind = EventKind::Spawn {
                species: (i % 40) as u32 + 1,
                form: (i % 3) as u32,
                iv: Some((i % 101) as u8),
            };
            EventRecord::new(lat, lon, (i % 9) as u64 + 1, kind)
        })
        .collect()
}

fn bench_filter(c: &mut Criterion) {
    let data = records();
    let blocklist: Blocklist = (1..20).map(|s| format!("{s}:0")).collect();
    c.bench_function("filter_20k", |b| {
        b.iter(|| filter_records(black_box(&data), black_box(&blocklist)))
    });
}

fn bench_aggregate(c: &mut Criterion) {
    let data = records();
    let config = MapConfig::default();
    c.bench_function("grid_bin_20k", |b| {
        b.iter(|| bin_records(black_box(&data), config.grid.step))
    });
    c.bench_function("density_normalize_20k", |b| {
        b.iter(|| normalize(black_box(&data), &config.density))
    });
    c.bench_function("marker_group_20k", |b| {
        b.iter(|| group_by_location(black_box(&data)))
    });
}

fn bench_raster(c: &mut Criterion) {
    let data = records();
    let id = "pokemon-heatmap";
    // offline names and icons keep setup off the network
    let config = MapConfig::default();
    let icons = IconResolver::new(config.assets.icon_base_url.clone(), Box::new(AssumeAvailable));
    let mut orchestrator = Orchestrator::new(config, Arc::new(GruntNames::new(NoNames)), icons);
    let sizing = orchestrator.config().sizing.clone();

    for mode in ["density", "grid", "markers"] {
        orchestrator.render(id, Some(data.as_slice()), &Blocklist::new(), mode);
        let Some(state) = orchestrator.surfaces().state(id) else {
            continue;
        };
        c.bench_function(&format!("raster_{mode}_20k"), |b| {
            b.iter(|| map::render(black_box(state), 80, 24, &sizing))
        });
    }
}

fn bench_params(c: &mut Criterion) {
    let config = MapConfig::default();
    c.bench_function("density_params", |b| {
        b.iter(|| density_params(black_box(N), &config.density))
    });
}

criterion_group!(benches, bench_filter, bench_aggregate, bench_raster, bench_params);
criterion_main!(benches);
