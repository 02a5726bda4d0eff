//! The render entry point.
//!
//! `render` never returns an error: empty input and fully filtered input
//! become notices, and any failure while fitting, aggregating or mounting is
//! logged and replaced by a generic error notice. Every path tears down
//! what the previous render mounted before creating anything new.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::aggregate::{aggregate, Aggregation, Mode};
use crate::config::MapConfig;
use crate::error::RenderError;
use crate::filter::{filter_records, Blocklist};
use crate::geo::{compute_bounds, GeoBounds};
use crate::icons::{AssumeAvailable, HttpIconProbe, IconProbe, IconResolver};
use crate::legend::legend_for;
use crate::map::Viewport;
use crate::names::GruntNames;
use crate::record::EventRecord;
use crate::summary::{Batcher, Labeler};
use crate::surface::{GridLayer, GridTile, HeatLayer, Marker, MarkerLayer, Notice, Overlay, SurfaceManager};

pub struct Orchestrator {
    surfaces: SurfaceManager,
    config: MapConfig,
    names: Arc<GruntNames>,
    icons: IconResolver,
}

impl Orchestrator {
    pub fn new(config: MapConfig, names: Arc<GruntNames>, icons: IconResolver) -> Self {
        let surfaces = SurfaceManager::new(config.surface.default_width, config.surface.default_height);
        Self {
            surfaces,
            config,
            names,
            icons,
        }
    }

    /// Process-wide grunt names; icons are checked against the icon server
    pub fn from_config(config: MapConfig) -> Self {
        let names = GruntNames::shared(&config.assets.asset_base_url);
        let timeout = Duration::from_millis(config.assets.icon_timeout_ms);
        let probe: Box<dyn IconProbe> = match HttpIconProbe::new(timeout) {
            Ok(probe) => Box::new(probe),
            Err(err) => {
                warn!("icon probe unavailable, assuming icons exist: {err}");
                Box::new(AssumeAvailable)
            }
        };
        let icons = IconResolver::new(config.assets.icon_base_url.clone(), probe);
        Self::new(config, names, icons)
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn surfaces(&self) -> &SurfaceManager {
        &self.surfaces
    }

    pub fn surfaces_mut(&mut self) -> &mut SurfaceManager {
        &mut self.surfaces
    }

    /// Redraw `container_id` from scratch. `None` stands for input that was
    /// not a record sequence at all.
    pub fn render(
        &mut self,
        container_id: &str,
        records: Option<&[EventRecord]>,
        blocklist: &Blocklist,
        mode: &str,
    ) {
        let records = match records {
            Some(records) if !records.is_empty() => records,
            _ => {
                self.surfaces.destroy_surface(container_id);
                self.surfaces.show_notice(container_id, Notice::NoData);
                return;
            }
        };

        let filtered = filter_records(records, blocklist);
        if filtered.is_empty() {
            self.surfaces.destroy_surface(container_id);
            self.surfaces.show_notice(container_id, Notice::AllFiltered);
            return;
        }

        if let Err(err) = self.try_render(container_id, &filtered, mode) {
            error!(container = container_id, mode, "render failed: {err}");
            if let Some(state) = self.surfaces.state_mut(container_id) {
                state.teardown_layers();
                state.install_legend(None);
            }
            self.surfaces.show_notice(container_id, Notice::RenderFailed);
        }
    }

    fn try_render(
        &mut self,
        container_id: &str,
        filtered: &[&EventRecord],
        mode: &str,
    ) -> Result<(), RenderError> {
        let bounds = fit_bounds(filtered)?;
        let (width, height) = self.surfaces.dimensions(container_id);
        let surface = &self.config.surface;
        let fitted = Viewport::fit_bounds(&bounds, width, height, surface.fit_padding, surface.max_fit_zoom);

        let state = self
            .surfaces
            .ensure_surface(container_id, (fitted.center_lon, fitted.center_lat), fitted.zoom)?;
        state.teardown_layers();

        let mode: Mode = mode.parse()?;
        let aggregation = aggregate(mode, filtered, &self.config)?;
        let legend = legend_for(&aggregation);
        let entities = aggregation.len();
        let overlay = build_overlay(aggregation, &self.config, &self.names, &mut self.icons);

        if let Some(state) = self.surfaces.state_mut(container_id) {
            if let Some(overlay) = overlay {
                state.mount(overlay);
            }
            state.install_legend(legend);
        }
        self.surfaces.clear_notice(container_id);

        debug!(
            container = container_id,
            %mode,
            records = filtered.len(),
            entities,
            "render complete"
        );
        Ok(())
    }
}

/// Bounds of the filtered records. Any non-finite coordinate fails the
/// render, wherever it sits in the input.
fn fit_bounds(filtered: &[&EventRecord]) -> Result<GeoBounds, RenderError> {
    if let Some(bad) = filtered.iter().find(|r| !r.lat.is_finite() || !r.lon.is_finite()) {
        return Err(RenderError::NonFiniteCoordinate { lat: bad.lat, lon: bad.lon });
    }
    let bounds = compute_bounds(filtered.iter().copied())
        .unwrap_or_else(|| GeoBounds::new(f64::NAN, f64::NAN, f64::NAN, f64::NAN));
    if bounds.is_finite() {
        Ok(bounds)
    } else {
        Err(RenderError::InvalidBounds {
            min_lat: bounds.min_lat(),
            min_lon: bounds.min_lon(),
            max_lat: bounds.max_lat(),
            max_lon: bounds.max_lon(),
        })
    }
}

/// Turn an aggregation into the overlay that draws it. `None` when the
/// visual needs a capability this surface lacks.
fn build_overlay(
    aggregation: Aggregation<'_>,
    config: &MapConfig,
    names: &GruntNames,
    icons: &mut IconResolver,
) -> Option<Overlay> {
    let batcher = Batcher::from_config(&config.summaries);
    let capabilities = &config.surface.capabilities;
    let top = config.grid.top_categories;
    let mut labeler = Labeler { names, icons };

    match aggregation {
        Aggregation::Markers(groups) => {
            if !capabilities.cluster_layer {
                warn!("cluster layer unavailable, drawing markers unclustered");
            }
            let markers = batcher.map(&groups, |group| Marker {
                lat: group.lat,
                lon: group.lon,
                total: group.total_count,
                summary: labeler.group_summary(group, top),
            });
            let max_total = markers.iter().map(|m| m.total).max().unwrap_or(1).max(1);
            Some(Overlay::Markers(MarkerLayer {
                markers,
                max_total,
                clustered: capabilities.cluster_layer,
            }))
        }
        Aggregation::Density(field) => {
            if !capabilities.heat_layer {
                warn!("heat layer unavailable, skipping density overlay");
                return None;
            }
            let radius_px = field.params.neighborhood_radius * config.density.pixel_scale;
            Some(Overlay::Heat(HeatLayer {
                points: field.points,
                params: field.params,
                radius_px,
            }))
        }
        Aggregation::Grid(summary) => {
            let tiles = batcher.map(&summary.cells, |cell| GridTile {
                bounds: cell.bounds,
                total: cell.total_count,
                summary: labeler.cell_summary(cell, top),
            });
            Some(Overlay::Grid(GridLayer {
                tiles,
                max_grid_count: summary.max_grid_count,
            }))
        }
    }
}
