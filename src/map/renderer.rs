use crate::braille::BrailleCanvas;
use crate::config::SizingConfig;
use crate::map::geometry::{draw_circle, draw_line, fill_rect};
use crate::map::projection::Viewport;
use crate::map::spatial::SpatialGrid;
use crate::sizing::{hue_color, log_intensity, visual_size, ColorTier, Rgb};
use crate::surface::{GridLayer, HeatLayer, MarkerLayer, Overlay, RenderState};

/// Text drawn on top of the canvases, in character coordinates
#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    pub x: u16,
    pub y: u16,
    pub text: String,
    pub color: Rgb,
}

/// Rasterized layers of one surface, back to front
pub struct MapLayers {
    /// Graticule
    pub base: BrailleCanvas,
    /// Tinted overlay dots
    pub overlay: BrailleCanvas,
    pub labels: Vec<Label>,
}

/// Pixels below this fraction of saturation stay blank in heat layers
const HEAT_FLOOR: f64 = 0.05;

/// Target spacing of graticule lines in pixels
const GRATICULE_SPACING: f64 = 48.0;

/// Rasterize `state` into canvases of `width` x `height` characters
pub fn render(state: &RenderState, width: usize, height: usize, sizing: &SizingConfig) -> MapLayers {
    let mut viewport = state.viewport().clone();
    // Braille gives 2x4 resolution per character
    viewport.width = width * 2;
    viewport.height = height * 4;

    let mut layers = MapLayers {
        base: BrailleCanvas::new(width, height),
        overlay: BrailleCanvas::new(width, height),
        labels: Vec::new(),
    };

    draw_graticule(&mut layers.base, &viewport);

    for mounted in state.overlays() {
        match &mounted.overlay {
            Overlay::Markers(layer) => {
                draw_markers(&mut layers.overlay, &mut layers.labels, layer, &viewport, sizing)
            }
            Overlay::Heat(layer) => draw_heat(&mut layers.overlay, layer, &viewport),
            Overlay::Grid(layer) => draw_grid(&mut layers.overlay, layer, &viewport),
        }
    }

    layers
}

/// Round a degree interval up to 1, 2 or 5 times a power of ten
fn nice_step(raw: f64) -> f64 {
    let magnitude = 10f64.powf(raw.log10().floor());
    let residual = raw / magnitude;
    let nice = if residual <= 1.0 {
        1.0
    } else if residual <= 2.0 {
        2.0
    } else if residual <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

/// Evenly spaced latitude and longitude lines
fn draw_graticule(canvas: &mut BrailleCanvas, viewport: &Viewport) {
    let (w, h) = (viewport.width as i32, viewport.height as i32);
    if w == 0 || h == 0 {
        return;
    }

    let step = nice_step(viewport.degrees_per_pixel() * GRATICULE_SPACING);
    if !step.is_finite() || step <= 0.0 {
        return;
    }

    let (west, north) = viewport.unproject(0, 0);
    let (east, south) = viewport.unproject(w, h);

    let mut lon = (west / step).ceil() * step;
    while lon <= east {
        let (x, _) = viewport.project(lon, north);
        draw_line(canvas, x, 0, x, h - 1);
        lon += step;
    }

    let mut lat = (south / step).ceil() * step;
    while lat <= north {
        let (_, y) = viewport.project(west, lat);
        draw_line(canvas, 0, y, w - 1, y);
        lat += step;
    }
}

/// Markers, merged into count badges when they sit within the cluster
/// radius of each other at the current zoom
fn draw_markers(
    canvas: &mut BrailleCanvas,
    labels: &mut Vec<Label>,
    layer: &MarkerLayer,
    viewport: &Viewport,
    sizing: &SizingConfig,
) {
    let projected: Vec<(i32, i32)> = layer
        .markers
        .iter()
        .map(|m| viewport.project(m.lon, m.lat))
        .collect();

    let clusters = if layer.clustered {
        cluster_markers(layer, &projected, viewport, sizing.cluster_radius)
    } else {
        (0..layer.markers.len()).map(|i| (i, layer.markers[i].total, 1)).collect()
    };

    for (seed, total, members) in clusters {
        let (px, py) = projected[seed];
        if !viewport.is_visible(px, py) {
            continue;
        }

        let radius = visual_size(total, sizing).round() as i32;
        let tint = if members > 1 {
            ColorTier::for_count(total, sizing).color()
        } else {
            hue_color(log_intensity(total, layer.max_total))
        };
        draw_circle(canvas, px, py, radius, tint);

        // Badge text for clusters (convert braille coords to char coords)
        if members > 1 && px >= 0 && py >= 0 {
            let char_x = ((px + radius) / 2) as u16;
            let char_y = (py / 4) as u16;
            if let Some(label_x) = char_x.checked_add(1) {
                labels.push(Label {
                    x: label_x,
                    y: char_y,
                    text: total.to_string(),
                    color: tint,
                });
            }
        }
    }
}

/// Greedy clustering, heaviest marker first. Returns (seed index, summed
/// total, member count) per cluster.
fn cluster_markers(
    layer: &MarkerLayer,
    projected: &[(i32, i32)],
    viewport: &Viewport,
    radius_px: f64,
) -> Vec<(usize, u64, usize)> {
    let radius_deg = radius_px.max(0.0) * viewport.degrees_per_pixel();
    let mut grid = SpatialGrid::new(radius_deg);
    for (i, marker) in layer.markers.iter().enumerate() {
        grid.insert(marker.lon, marker.lat, i);
    }

    let mut order: Vec<usize> = (0..layer.markers.len()).collect();
    order.sort_by(|&a, &b| layer.markers[b].total.cmp(&layer.markers[a].total));

    let mut assigned = vec![false; layer.markers.len()];
    let mut clusters = Vec::new();
    let r2 = (radius_px * radius_px) as i64;

    for seed in order {
        if assigned[seed] {
            continue;
        }
        assigned[seed] = true;
        let (sx, sy) = projected[seed];
        let seed_marker = &layer.markers[seed];
        let mut total = seed_marker.total;
        let mut members = 1;

        for candidate in grid.query_radius(seed_marker.lon, seed_marker.lat, radius_deg) {
            let Some(&i) = grid.get(candidate) else { continue };
            if assigned[i] {
                continue;
            }
            let (cx, cy) = projected[i];
            let (dx, dy) = ((cx - sx) as i64, (cy - sy) as i64);
            if dx * dx + dy * dy <= r2 {
                assigned[i] = true;
                total = total.saturating_add(layer.markers[i].total);
                members += 1;
            }
        }

        clusters.push((seed, total, members));
    }

    clusters
}

/// Additive heat: each point spreads its intensity over a disc whose outer
/// blur band fades linearly. The sum is scaled by the saturation threshold
/// and each character cell takes the color of its hottest pixel
fn draw_heat(canvas: &mut BrailleCanvas, layer: &HeatLayer, viewport: &Viewport) {
    let (w, h) = (viewport.width, viewport.height);
    if w == 0 || h == 0 {
        return;
    }

    let radius = layer.radius_px.max(1.0);
    let reach = radius.ceil() as i32;
    let params = &layer.params;
    let blur = (radius * params.blur_radius / params.neighborhood_radius.max(f64::EPSILON)).clamp(0.0, radius);
    let core = radius - blur;
    let mut heat = vec![0.0f64; w * h];

    for point in &layer.points {
        let (px, py) = viewport.project(point.lon, point.lat);
        if px < -reach || py < -reach || px >= w as i32 + reach || py >= h as i32 + reach {
            continue;
        }
        for dy in -reach..=reach {
            let y = py + dy;
            if y < 0 || y >= h as i32 {
                continue;
            }
            for dx in -reach..=reach {
                let x = px + dx;
                if x < 0 || x >= w as i32 {
                    continue;
                }
                let d = ((dx * dx + dy * dy) as f64).sqrt();
                if d <= radius {
                    let falloff = if d <= core { 1.0 } else { 1.0 - (d - core) / (blur + 1.0) };
                    heat[y as usize * w + x as usize] += point.intensity * falloff;
                }
            }
        }
    }

    let saturation = layer.params.saturation_threshold.max(f64::EPSILON);
    let (cw, ch) = (canvas.width(), canvas.height());
    let mut hottest = vec![0.0f64; cw * ch];
    for (i, value) in heat.iter_mut().enumerate() {
        *value = (*value / saturation).min(1.0);
        let (cx, cy) = ((i % w) / 2, (i / w) / 4);
        if cx < cw && cy < ch {
            let cell = &mut hottest[cy * cw + cx];
            *cell = cell.max(*value);
        }
    }

    for (i, &value) in heat.iter().enumerate() {
        if value < HEAT_FLOOR {
            continue;
        }
        let (x, y) = (i % w, i / w);
        let (cx, cy) = (x / 2, y / 4);
        if cx < cw && cy < ch {
            canvas.set_pixel_tinted(x as i32, y as i32, hue_color(hottest[cy * cw + cx]));
        }
    }
}

/// One filled rectangle per cell, colored on a log scale of its total
fn draw_grid(canvas: &mut BrailleCanvas, layer: &GridLayer, viewport: &Viewport) {
    for tile in &layer.tiles {
        let (x0, y0) = viewport.project(tile.bounds.min_lon(), tile.bounds.max_lat());
        let (x1, y1) = viewport.project(tile.bounds.max_lon(), tile.bounds.min_lat());
        if !viewport.line_might_be_visible((x0, y0), (x1, y1)) {
            continue;
        }
        let tint = hue_color(log_intensity(tile.total, layer.max_grid_count));
        fill_rect(canvas, x0, y0, x1, y1, tint);
    }
}
