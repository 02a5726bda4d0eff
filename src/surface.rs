//! Per-container render state.
//!
//! A container is a named region of the terminal. It holds at most one
//! surface (viewport plus mounted overlays and legend) and at most one
//! notice. Surfaces are created on the first successful render, refit on
//! every later one and destroyed when a render has nothing to show.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::aggregate::{DensityParams, HeatPoint};
use crate::error::RenderError;
use crate::geo::GeoBounds;
use crate::legend::Legend;
use crate::map::Viewport;
use crate::summary::Summary;

/// Inline message shown in place of a map.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Notice {
    /// Input was missing or empty
    NoData,
    /// Input had rows but the blocklist removed all of them
    AllFiltered,
    /// Rendering failed; details are in the log
    RenderFailed,
}

impl Notice {
    pub fn message(self) -> &'static str {
        match self {
            Notice::NoData => "No data available",
            Notice::AllFiltered => "All results filtered out",
            Notice::RenderFailed => "Map could not be rendered",
        }
    }
}

/// One location (or gym / pokestop) in markers mode.
#[derive(Clone, Debug, PartialEq)]
pub struct Marker {
    pub lat: f64,
    pub lon: f64,
    pub total: u64,
    pub summary: Summary,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MarkerLayer {
    pub markers: Vec<Marker>,
    pub max_total: u64,
    /// Merge nearby markers into count badges
    pub clustered: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HeatLayer {
    pub points: Vec<HeatPoint>,
    pub params: DensityParams,
    /// Neighborhood radius in canvas pixels
    pub radius_px: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GridTile {
    pub bounds: GeoBounds,
    pub total: u64,
    pub summary: Summary,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GridLayer {
    pub tiles: Vec<GridTile>,
    pub max_grid_count: u64,
}

/// Mode-specific drawable content.
#[derive(Clone, Debug, PartialEq)]
pub enum Overlay {
    Markers(MarkerLayer),
    Heat(HeatLayer),
    Grid(GridLayer),
}

impl Overlay {
    pub fn kind(&self) -> &'static str {
        match self {
            Overlay::Markers(_) => "markers",
            Overlay::Heat(_) => "heat",
            Overlay::Grid(_) => "grid",
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Overlay::Markers(layer) => layer.markers.len(),
            Overlay::Heat(layer) => layer.points.len(),
            Overlay::Grid(layer) => layer.tiles.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MountedOverlay {
    pub id: u64,
    pub overlay: Overlay,
}

/// The live surface of one container.
#[derive(Debug)]
pub struct RenderState {
    surface_id: u64,
    viewport: Viewport,
    overlays: Vec<MountedOverlay>,
    legend: Option<Legend>,
    next_overlay_id: u64,
}

impl RenderState {
    fn new(surface_id: u64, viewport: Viewport) -> Self {
        Self {
            surface_id,
            viewport,
            overlays: Vec::new(),
            legend: None,
            next_overlay_id: 0,
        }
    }

    /// Stable for the lifetime of the surface
    pub fn surface_id(&self) -> u64 {
        self.surface_id
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn overlays(&self) -> &[MountedOverlay] {
        &self.overlays
    }

    pub fn legend(&self) -> Option<&Legend> {
        self.legend.as_ref()
    }

    /// Remove every overlay, leaving the surface itself. Safe to call when
    /// nothing is mounted. Returns how many overlays were removed.
    pub fn teardown_layers(&mut self) -> usize {
        let removed = self.overlays.len();
        self.overlays.clear();
        if removed > 0 {
            debug!(surface = self.surface_id, removed, "overlays removed");
        }
        removed
    }

    pub fn mount(&mut self, overlay: Overlay) -> u64 {
        let id = self.next_overlay_id;
        self.next_overlay_id += 1;
        self.overlays.push(MountedOverlay { id, overlay });
        id
    }

    /// Replace the legend; at most one is ever installed.
    pub fn install_legend(&mut self, legend: Option<Legend>) {
        self.legend = legend;
    }

    /// Summary of the entity under (or nearest to, within `radius` pixels) a
    /// canvas pixel. Density overlays carry no summaries.
    pub fn summary_near(&self, px: i32, py: i32, radius: i32) -> Option<&Summary> {
        let mut best: Option<(i64, &Summary)> = None;

        for mounted in &self.overlays {
            match &mounted.overlay {
                Overlay::Markers(layer) => {
                    for marker in &layer.markers {
                        let (mx, my) = self.viewport.project(marker.lon, marker.lat);
                        let (dx, dy) = ((mx - px) as i64, (my - py) as i64);
                        let d2 = dx * dx + dy * dy;
                        if d2 <= (radius as i64).pow(2) && best.map_or(true, |(b, _)| d2 < b) {
                            best = Some((d2, &marker.summary));
                        }
                    }
                }
                Overlay::Grid(layer) => {
                    for tile in &layer.tiles {
                        let (x0, y0) = self.viewport.project(tile.bounds.min_lon(), tile.bounds.max_lat());
                        let (x1, y1) = self.viewport.project(tile.bounds.max_lon(), tile.bounds.min_lat());
                        if (x0..=x1).contains(&px) && (y0..=y1).contains(&py) {
                            return Some(&tile.summary);
                        }
                    }
                }
                Overlay::Heat(_) => {}
            }
        }

        best.map(|(_, summary)| summary)
    }
}

/// A named region: its pixel size, its surface and its notice.
#[derive(Debug)]
pub struct Container {
    width: usize,
    height: usize,
    state: Option<RenderState>,
    notice: Option<Notice>,
}

impl Container {
    fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            state: None,
            notice: None,
        }
    }

    /// Canvas size in pixels
    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn state(&self) -> Option<&RenderState> {
        self.state.as_ref()
    }

    pub fn notice(&self) -> Option<Notice> {
        self.notice
    }
}

/// Owns every container's surface.
pub struct SurfaceManager {
    containers: HashMap<String, Container>,
    default_width: usize,
    default_height: usize,
    next_surface_id: u64,
}

impl SurfaceManager {
    pub fn new(default_width: usize, default_height: usize) -> Self {
        Self {
            containers: HashMap::new(),
            default_width,
            default_height,
            next_surface_id: 1,
        }
    }

    pub fn container(&self, id: &str) -> Option<&Container> {
        self.containers.get(id)
    }

    pub fn state(&self, id: &str) -> Option<&RenderState> {
        self.containers.get(id).and_then(|c| c.state.as_ref())
    }

    pub fn state_mut(&mut self, id: &str) -> Option<&mut RenderState> {
        self.containers.get_mut(id).and_then(|c| c.state.as_mut())
    }

    /// Pixel size of a container, or the default for unknown ones
    pub fn dimensions(&self, id: &str) -> (usize, usize) {
        self.containers
            .get(id)
            .map(Container::size)
            .unwrap_or((self.default_width, self.default_height))
    }

    fn entry(&mut self, id: &str) -> &mut Container {
        let (w, h) = (self.default_width, self.default_height);
        self.containers
            .entry(id.to_string())
            .or_insert_with(|| Container::new(w, h))
    }

    /// Set a container's canvas size in pixels. A live surface keeps its
    /// center and zoom.
    pub fn resize(&mut self, id: &str, width: usize, height: usize) {
        let container = self.entry(id);
        container.width = width;
        container.height = height;
        if let Some(state) = container.state.as_mut() {
            state.viewport.width = width;
            state.viewport.height = height;
        }
    }

    /// Create the container's surface on first use, otherwise refit the
    /// existing one to `center` and `zoom`.
    pub fn ensure_surface(
        &mut self,
        id: &str,
        center: (f64, f64),
        zoom: f64,
    ) -> Result<&mut RenderState, RenderError> {
        let (width, height) = self.dimensions(id);
        if width == 0 || height == 0 {
            return Err(RenderError::SurfaceTooSmall {
                container: id.to_string(),
                width,
                height,
            });
        }

        let (lon, lat) = center;
        let viewport = Viewport::new(lon, lat, zoom, width, height);

        let surface_id = self.next_surface_id;
        if self.state(id).is_none() {
            self.next_surface_id += 1;
            info!(container = id, surface = surface_id, "surface created");
        }

        let container = self.entry(id);
        let state = container
            .state
            .get_or_insert_with(|| RenderState::new(surface_id, viewport.clone()));
        state.viewport = viewport;
        Ok(state)
    }

    /// Drop the surface with everything mounted on it. Returns whether
    /// there was one.
    pub fn destroy_surface(&mut self, id: &str) -> bool {
        let destroyed = self
            .containers
            .get_mut(id)
            .and_then(|c| c.state.take())
            .is_some();
        if destroyed {
            info!(container = id, "surface destroyed");
        }
        destroyed
    }

    pub fn show_notice(&mut self, id: &str, notice: Notice) {
        self.entry(id).notice = Some(notice);
    }

    pub fn clear_notice(&mut self, id: &str) {
        if let Some(container) = self.containers.get_mut(id) {
            container.notice = None;
        }
    }
}
