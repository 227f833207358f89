use crate::app::App;
use crate::interaction::Tooltip;
use crate::legend::Legend;
use crate::map::renderer::{MapLayers, MapRenderer};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
    Frame,
};

const BORDER_COLOR: Color = Color::White;

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

    let inner = render_map(frame, app, chunks[0]);
    if let Some(legend) = app.legend() {
        frame.render_widget(LegendWidget { legend }, inner);
    }
    render_tooltip(frame, &app.interaction.tooltip, area);
    render_status_bar(frame, app, chunks[1]);
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) -> Rect {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " United States Educational Attainment ",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let layers = MapRenderer::render(
        app.scene(),
        &app.transform(),
        inner.width as usize,
        inner.height as usize,
    );
    frame.render_widget(MapWidget { layers }, inner);
    inner
}

/// County fills as cell backgrounds with state borders drawn over them
struct MapWidget {
    layers: MapLayers,
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let rows = self.layers.height.min(area.height as usize);
        let cols = self.layers.width.min(area.width as usize);

        for row in 0..rows {
            for col in 0..cols {
                if let Some(fill) = self.layers.fill(col, row) {
                    buf[(area.x + col as u16, area.y + row as u16)].set_bg(fill.into());
                }
            }
        }

        for (col, row, ch) in self.layers.borders.glyphs() {
            if col >= cols || row >= rows {
                continue;
            }
            buf[(area.x + col as u16, area.y + row as u16)]
                .set_char(ch)
                .set_fg(BORDER_COLOR);
        }
    }
}

/// Bottom-right legend: labels on the left, one two-cell swatch per color
struct LegendWidget<'a> {
    legend: &'a Legend,
}

impl Widget for LegendWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let rows = self.legend.rows();
        let label_width = self.legend.label_width() as u16;
        let width = label_width + 3;
        let height = rows.len() as u16;
        if area.width < width + 1 || area.height < height + 1 {
            return;
        }

        let x0 = area.right() - width - 1;
        let y0 = area.bottom() - height - 1;
        let label_style = Style::default().fg(Color::Gray).bg(Color::Black);

        for (i, row) in rows.iter().enumerate() {
            let y = y0 + i as u16;
            let label = row.label.as_deref().unwrap_or("");
            let text = format!("{label:>w$} ", w = label_width as usize);
            buf.set_string(x0, y, &text, label_style);

            let swatch_x = x0 + label_width + 1;
            for dx in 0..2 {
                let cell = &mut buf[(swatch_x + dx, y)];
                cell.set_char(' ');
                match row.color {
                    Some(color) => cell.set_bg(color.into()),
                    None => cell.set_bg(Color::Black),
                };
            }
        }
    }
}

fn render_tooltip(frame: &mut Frame, tooltip: &Tooltip, area: Rect) {
    if tooltip.hidden || tooltip.text.is_empty() {
        return;
    }

    let width = (tooltip.text.chars().count() as u16 + 2).min(area.width);
    let height = 3u16.min(area.height);
    // Keep the popup on screen near the right and bottom edges
    let x = (tooltip.position.x.max(0.0) as u16).min(area.right().saturating_sub(width));
    let y = (tooltip.position.y.max(0.0) as u16).min(area.bottom().saturating_sub(height));
    let popup = Rect::new(x, y, width, height);

    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(tooltip.text.as_str())
            .style(Style::default().fg(Color::White))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Green)),
            ),
        popup,
    );
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let tooltip = &app.interaction.tooltip;
    let education = if tooltip.hidden { "-" } else { tooltip.data_education.as_str() };

    let status = Line::from(vec![
        Span::styled(" Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.load_status(), Style::default().fg(Color::Cyan)),
        Span::styled(" | education: ", Style::default().fg(Color::DarkGray)),
        Span::styled(education.to_string(), Style::default().fg(Color::Green)),
        Span::styled(
            " | hjkl:pan +/-:zoom r:reset q:quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let paragraph = Paragraph::new(status);
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfig;
    use crate::scale::{greens, QuantizeScale};

    #[test]
    fn test_legend_widget_layout() {
        let scale = QuantizeScale::new((2.0, 82.0), greens(8).unwrap());
        let legend = Legend::new(&scale, &MapConfig::default());
        let area = Rect::new(0, 0, 20, 12);
        let mut buf = Buffer::empty(area);
        LegendWidget { legend: &legend }.render(area, &mut buf);

        // 9 rows ending one row above the bottom, 6 cells wide ending one
        // column before the right edge
        let (x0, y0) = (13u16, 2u16);
        assert_eq!(buf[(x0, y0)].symbol(), "8");
        assert_eq!(buf[(x0 + 2, y0)].symbol(), "%");
        assert_eq!(buf[(x0 + 4, y0 + 1)].bg, Color::from(greens(8).unwrap()[7]));
        assert_eq!(buf[(x0 + 4, y0 + 8)].bg, Color::from(greens(8).unwrap()[0]));
        assert_eq!(buf[(x0 + 1, y0 + 8)].symbol(), "2");
    }

    #[test]
    fn test_legend_skipped_when_area_too_small() {
        let scale = QuantizeScale::new((2.0, 82.0), greens(8).unwrap());
        let legend = Legend::new(&scale, &MapConfig::default());
        let area = Rect::new(0, 0, 5, 5);
        let mut buf = Buffer::empty(area);
        LegendWidget { legend: &legend }.render(area, &mut buf);
        assert_eq!(buf, Buffer::empty(area));
    }
}
