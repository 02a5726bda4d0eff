use std::collections::HashMap;

use spawnmap::aggregate::Mode;
use spawnmap::filter::{filter_records, Blocklist};
use spawnmap::orchestrator::Orchestrator;
use spawnmap::record::{Domain, EventRecord};
use spawnmap::summary::Summary;
use spawnmap::surface::{Container, RenderState};
use tracing::info;

/// Hover distance for tooltips, in braille pixels
const HOVER_RADIUS: i32 = 6;

/// Application state
pub struct App {
    pub orchestrator: Orchestrator,
    /// `None` when the data file did not hold a record list
    pub records: Option<Vec<EventRecord>>,
    pub domain: Domain,
    /// Mode string as given; unknown values surface as an error notice
    pub mode: String,
    pub blocklist: Blocklist,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Current mouse position for cursor marker
    pub mouse_pos: Option<(u16, u16)>,
    /// Last user-facing action, shown in the status bar
    pub message: Option<String>,
}

impl App {
    pub fn new(
        orchestrator: Orchestrator,
        records: Option<Vec<EventRecord>>,
        domain: Domain,
        mode: String,
        blocklist: Blocklist,
        width: usize,
        height: usize,
    ) -> Self {
        let mut app = Self {
            orchestrator,
            records,
            domain,
            mode,
            blocklist,
            should_quit: false,
            last_mouse: None,
            mouse_pos: None,
            message: None,
        };
        app.resize(width, height);
        app.notify_data_changed();
        app
    }

    pub fn container_id(&self) -> &'static str {
        self.domain.container_id()
    }

    pub fn container(&self) -> Option<&Container> {
        self.orchestrator.surfaces().container(self.container_id())
    }

    fn state(&self) -> Option<&RenderState> {
        self.orchestrator.surfaces().state(self.container_id())
    }

    /// Re-run the render pipeline. Called after every change to records,
    /// blocklist or mode.
    pub fn notify_data_changed(&mut self) {
        let id = self.domain.container_id();
        self.orchestrator
            .render(id, self.records.as_deref(), &self.blocklist, &self.mode);
    }

    /// Update container size when terminal resizes
    pub fn resize(&mut self, width: usize, height: usize) {
        // Account for border (2 chars horizontal, 2 chars vertical including status bar)
        let inner_width = width.saturating_sub(2);
        let inner_height = height.saturating_sub(3);
        // Braille gives 2x4 resolution per character
        let id = self.container_id();
        self.orchestrator
            .surfaces_mut()
            .resize(id, inner_width * 2, inner_height * 4);
    }

    pub fn set_mode(&mut self, mode: Mode) {
        if self.mode != mode.as_str() {
            self.mode = mode.as_str().to_string();
            self.message = Some(format!("mode: {mode}"));
            self.notify_data_changed();
        }
    }

    /// Hide the category with the largest visible total
    pub fn block_busiest_visible(&mut self) {
        let Some(key) = self.busiest_visible_category() else {
            return;
        };
        info!(key = %key, "category blocked");
        self.message = Some(format!("blocked {key}"));
        self.blocklist.insert(key);
        self.notify_data_changed();
    }

    fn busiest_visible_category(&self) -> Option<String> {
        let records = self.records.as_deref()?;
        let viewport = self.state()?.viewport();

        let mut totals: HashMap<String, u64> = HashMap::new();
        for record in filter_records(records, &self.blocklist) {
            let (px, py) = viewport.project(record.lon, record.lat);
            if viewport.is_visible(px, py) {
                let total = totals.entry(record.category_key()).or_default();
                *total = total.saturating_add(record.count);
            }
        }

        totals
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
            .map(|(key, _)| key)
    }

    pub fn clear_blocklist(&mut self) {
        if !self.blocklist.is_empty() {
            self.blocklist.clear();
            self.message = Some("blocklist cleared".to_string());
            self.notify_data_changed();
        }
    }

    /// Pan the map
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let id = self.container_id();
        if let Some(state) = self.orchestrator.surfaces_mut().state_mut(id) {
            state.viewport_mut().pan(dx, dy);
        }
    }

    /// Zoom in
    pub fn zoom_in(&mut self) {
        let id = self.container_id();
        if let Some(state) = self.orchestrator.surfaces_mut().state_mut(id) {
            state.viewport_mut().zoom_in();
        }
    }

    /// Zoom out
    pub fn zoom_out(&mut self) {
        let id = self.container_id();
        if let Some(state) = self.orchestrator.surfaces_mut().state_mut(id) {
            state.viewport_mut().zoom_out();
        }
    }

    /// Zoom in towards a screen position (terminal column/row)
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        let (px, py) = to_pixel(col, row);
        let id = self.container_id();
        if let Some(state) = self.orchestrator.surfaces_mut().state_mut(id) {
            state.viewport_mut().zoom_in_at(px, py);
        }
    }

    /// Zoom out from a screen position (terminal column/row)
    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        let (px, py) = to_pixel(col, row);
        let id = self.container_id();
        if let Some(state) = self.orchestrator.surfaces_mut().state_mut(id) {
            state.viewport_mut().zoom_out_at(px, py);
        }
    }

    /// Request quit
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Get current zoom level as a string
    pub fn zoom_level(&self) -> String {
        match self.state() {
            Some(state) => format!("{:.0}x", state.viewport().zoom),
            None => "-".to_string(),
        }
    }

    /// Get current center coordinates as a string
    pub fn center_coords(&self) -> String {
        let Some(state) = self.state() else {
            return String::new();
        };
        let vp = state.viewport();
        format!(
            "{:.4}°{}, {:.4}°{}",
            vp.center_lat.abs(),
            if vp.center_lat >= 0.0 { "N" } else { "S" },
            vp.center_lon.abs(),
            if vp.center_lon >= 0.0 { "E" } else { "W" }
        )
    }

    /// Handle mouse drag
    pub fn handle_drag(&mut self, x: u16, y: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = last_x as i32 - x as i32;
            let dy = last_y as i32 - y as i32;
            // One terminal cell is 2x4 braille pixels
            self.pan(dx * 2, dy * 4);
        }
        self.last_mouse = Some((x, y));
    }

    /// Reset drag state when mouse button released
    pub fn end_drag(&mut self) {
        self.last_mouse = None;
    }

    /// Update mouse cursor position
    pub fn set_mouse_pos(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));
    }

    /// Get mouse position in braille pixel coordinates (for rendering marker)
    pub fn mouse_pixel_pos(&self) -> Option<(i32, i32)> {
        self.mouse_pos.map(|(col, row)| to_pixel(col, row))
    }

    /// Summary of the marker or cell under the mouse
    pub fn hovered_summary(&self) -> Option<&Summary> {
        let (px, py) = self.mouse_pixel_pos()?;
        self.state()?.summary_near(px, py, HOVER_RADIUS)
    }
}

/// Convert terminal coords to braille pixel coords. Each terminal cell is 2
/// braille pixels wide, 4 tall; the border takes one cell.
fn to_pixel(col: u16, row: u16) -> (i32, i32) {
    let px = (col.saturating_sub(1) as i32) * 2;
    let py = (row.saturating_sub(1) as i32) * 4;
    (px, py)
}
