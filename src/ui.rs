use crate::app::App;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
    Frame,
};
use spawnmap::braille::BrailleCanvas;
use spawnmap::legend::Legend;
use spawnmap::map::{self, MapLayers};
use spawnmap::sizing::Rgb;
use spawnmap::summary::Summary;

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Split into map area and status bar
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    render_map(frame, app, chunks[0]);
    render_status_bar(frame, app, chunks[1]);
}

fn rgb(color: Rgb) -> Color {
    Color::Rgb(color.0, color.1, color.2)
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    // Create a block with border
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" {} · {} ", app.domain.title(), app.mode),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(container) = app.container() else {
        return;
    };

    if let Some(state) = container.state() {
        let layers = map::render(
            state,
            inner.width as usize,
            inner.height as usize,
            &app.orchestrator.config().sizing,
        );

        // Get mouse cursor position for marker
        let cursor_pos = app.mouse_pixel_pos().and_then(|(px, py)| {
            // Convert braille pixels to character position
            let cx = (px / 2) as u16;
            let cy = (py / 4) as u16;
            if cx < inner.width && cy < inner.height {
                Some((cx, cy))
            } else {
                None
            }
        });

        frame.render_widget(MapWidget { layers, cursor_pos }, inner);

        if let Some(legend) = state.legend() {
            render_legend(frame, legend, inner);
        }
        if let (Some(summary), Some((col, row))) = (app.hovered_summary(), app.mouse_pos) {
            render_tooltip(frame, summary, col, row, inner);
        }
    }

    if let Some(notice) = container.notice() {
        let text = Paragraph::new(notice.message())
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
        let y = inner.y + inner.height / 2;
        frame.render_widget(text, Rect::new(inner.x, y, inner.width, 1.min(inner.height)));
    }
}

/// Custom widget that renders the braille layers with text labels overlaid
struct MapWidget {
    layers: MapLayers,
    cursor_pos: Option<(u16, u16)>,
}

impl MapWidget {
    /// Render a braille canvas layer, using per-cell tints where present
    fn render_layer(&self, canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
        for (row_idx, row_str) in canvas.rows().enumerate() {
            if row_idx >= area.height as usize {
                break;
            }
            let y = area.y + row_idx as u16;

            for (col_idx, ch) in row_str.chars().enumerate() {
                if col_idx >= area.width as usize {
                    break;
                }
                // Skip empty braille characters (U+2800)
                if ch == '\u{2800}' {
                    continue;
                }
                let x = area.x + col_idx as u16;
                let fg = canvas.tint(col_idx, row_idx).map(rgb).unwrap_or(color);
                buf[(x, y)].set_char(ch).set_fg(fg);
            }
        }
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Graticule at the back, overlays on top
        self.render_layer(&self.layers.base, Color::DarkGray, area, buf);
        self.render_layer(&self.layers.overlay, Color::White, area, buf);

        for label in &self.layers.labels {
            if label.y >= area.height || label.x >= area.width {
                continue;
            }
            let x = area.x + label.x;
            let y = area.y + label.y;
            let max_len = (area.width - label.x) as usize;
            let style = Style::default().fg(rgb(label.color)).add_modifier(Modifier::BOLD);
            for (i, ch) in label.text.chars().take(max_len).enumerate() {
                buf[(x + i as u16, y)].set_char(ch).set_style(style);
            }
        }

        // Render cursor marker
        if let Some((cx, cy)) = self.cursor_pos {
            let x = area.x + cx;
            let y = area.y + cy;
            if x < area.x + area.width && y < area.y + area.height {
                buf[(x, y)].set_char('╋').set_fg(Color::Red);
            }
        }
    }
}

/// Title, gradient bar and min/max labels in the bottom-right corner
fn render_legend(frame: &mut Frame, legend: &Legend, area: Rect) {
    const WIDTH: u16 = 24;
    const HEIGHT: u16 = 4;
    if area.width < WIDTH || area.height < HEIGHT {
        return;
    }
    let rect = Rect::new(
        area.x + area.width - WIDTH,
        area.y + area.height - HEIGHT,
        WIDTH,
        HEIGHT,
    );

    let bar_len = (WIDTH - 2) as usize;
    let bar: Vec<Span> = legend
        .gradient(bar_len)
        .into_iter()
        .map(|c| Span::styled("█", Style::default().fg(rgb(c))))
        .collect();
    let gap = bar_len.saturating_sub(legend.min_label.chars().count() + legend.max_label.chars().count());
    let labels = Line::from(format!("{}{}{}", legend.min_label, " ".repeat(gap), legend.max_label));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(format!(" {} ", legend.title), Style::default().fg(Color::White)));
    frame.render_widget(Clear, rect);
    frame.render_widget(Paragraph::new(vec![Line::from(bar), labels]).block(block), rect);
}

/// Summary popup next to the mouse, kept inside the map area
fn render_tooltip(frame: &mut Frame, summary: &Summary, col: u16, row: u16, area: Rect) {
    let lines = summary.to_lines();
    let width = lines
        .iter()
        .map(|l| l.chars().count() as u16)
        .max()
        .unwrap_or(0)
        .saturating_add(2)
        .min(area.width);
    let height = (lines.len() as u16).saturating_add(2).min(area.height);
    if width < 3 || height < 3 {
        return;
    }

    let x = col.saturating_add(2).min(area.x + area.width - width).max(area.x);
    let y = row.saturating_add(1).min(area.y + area.height - height).max(area.y);
    let rect = Rect::new(x, y, width, height);

    let text: Vec<Line> = lines
        .into_iter()
        .enumerate()
        .map(|(i, l)| {
            if i == 0 {
                Line::from(Span::styled(l, Style::default().add_modifier(Modifier::BOLD)))
            } else {
                Line::from(l)
            }
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    frame.render_widget(Clear, rect);
    frame.render_widget(Paragraph::new(text).wrap(Wrap { trim: true }).block(block), rect);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![
        Span::styled(" Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
        Span::styled(" | blocked: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.blocklist.len().to_string(), Style::default().fg(Color::Magenta)),
    ];
    if let Some(message) = &app.message {
        spans.push(Span::styled(" | ", Style::default().fg(Color::DarkGray)));
        spans.push(Span::styled(message.clone(), Style::default().fg(Color::Green)));
    }
    spans.push(Span::styled(
        " | hjkl:pan +/-:zoom m/d/g:mode x:block u:unblock r:refit q:quit",
        Style::default().fg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
