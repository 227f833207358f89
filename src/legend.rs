//! Legend: one swatch per palette color stacked bottom to top, with a left
//! axis labelling the bin boundaries.

use crate::config::MapConfig;
use crate::scale::{ticks_with_max, LinearScale, QuantizeScale, Rgb};
use glam::DVec2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Swatch {
    /// Top-left corner in surface units
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AxisTick {
    pub value: f64,
    /// Offset from the axis origin
    pub y: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Legend {
    pub swatches: Vec<Swatch>,
    /// Axis origin; the `max` tick sits here and `min` sits `height` below
    pub axis_translate: DVec2,
    pub ticks: Vec<AxisTick>,
    pub height: f64,
}

/// One line of the terminal legend, top to bottom
#[derive(Debug, Clone, PartialEq)]
pub struct LegendRow {
    pub label: Option<String>,
    pub color: Option<Rgb>,
}

/// Rounds halves up, as browsers do
fn round_half_up(v: f64) -> f64 {
    (v + 0.5).floor()
}

pub fn tick_label(value: f64) -> String {
    format!("{}%", round_half_up(value))
}

impl Legend {
    pub fn new(scale: &QuantizeScale, config: &MapConfig) -> Self {
        let cell = config.legend.cell_size;
        let plot = &config.plot;
        let colors = scale.range();
        let count = colors.len();
        let height = cell * count as f64;

        let x = plot.width - plot.padding;
        let swatches = colors
            .iter()
            .enumerate()
            .map(|(i, &color)| Swatch {
                x,
                y: plot.height - plot.padding - cell * i as f64,
                size: cell,
                color,
            })
            .collect();

        let (min, max) = scale.domain();
        let axis = LinearScale::new((min, max), (height, 0.0));
        let ticks = ticks_with_max(min, max, count)
            .into_iter()
            .map(|value| AxisTick {
                value,
                y: axis.apply(value),
                label: tick_label(value),
            })
            .collect();

        Self {
            swatches,
            axis_translate: DVec2::new(x, plot.height - plot.padding - height + cell),
            ticks,
            height,
        }
    }

    /// Terminal layout: the `max` label on top, then one row per swatch from
    /// the darkest down to palette entry 0, each labelled with its bin's
    /// lower bound when one is ticked
    pub fn rows(&self) -> Vec<LegendRow> {
        let count = self.swatches.len();
        let lower_bounds = if self.ticks.len() > count { &self.ticks[..count] } else { &[][..] };

        let mut rows = Vec::with_capacity(count + 1);
        rows.push(LegendRow {
            label: self.ticks.last().map(|t| t.label.clone()),
            color: None,
        });
        for (i, swatch) in self.swatches.iter().enumerate().rev() {
            rows.push(LegendRow {
                label: lower_bounds.get(i).map(|t| t.label.clone()),
                color: Some(swatch.color),
            });
        }
        rows
    }

    pub fn label_width(&self) -> usize {
        self.ticks.iter().map(|t| t.label.chars().count()).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale::greens;

    fn legend(min: f64, max: f64) -> Legend {
        let scale = QuantizeScale::new((min, max), greens(8).unwrap());
        Legend::new(&scale, &MapConfig::default())
    }

    #[test]
    fn test_swatches_stack_upwards() {
        let legend = legend(2.0, 82.0);
        assert_eq!(legend.swatches.len(), 8);
        assert_eq!(legend.swatches[0].x, 940.0);
        assert_eq!(legend.swatches[0].y, 540.0);
        assert_eq!(legend.swatches[7].y, 365.0);
        assert_eq!(legend.swatches[0].color, greens(8).unwrap()[0]);
        assert_eq!(legend.axis_translate, DVec2::new(940.0, 365.0));
        assert_eq!(legend.height, 200.0);
    }

    #[test]
    fn test_ticks_cover_domain() {
        let legend = legend(2.0, 82.0);
        let labels: Vec<&str> = legend.ticks.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, ["2%", "12%", "22%", "32%", "42%", "52%", "62%", "72%", "82%"]);
        assert_eq!(legend.ticks[0].y, 200.0);
        assert_eq!(legend.ticks[8].y, 0.0);
        assert_eq!(legend.ticks[4].y, 100.0);
    }

    #[test]
    fn test_degenerate_domain_keeps_all_swatches() {
        let legend = legend(40.0, 40.0);
        assert_eq!(legend.swatches.len(), 8);
        assert_eq!(legend.ticks.len(), 1);
        assert_eq!(legend.ticks[0].label, "40%");

        let rows = legend.rows();
        assert_eq!(rows.len(), 9);
        assert_eq!(rows[0].label.as_deref(), Some("40%"));
        assert!(rows[1..].iter().all(|r| r.label.is_none() && r.color.is_some()));
    }

    #[test]
    fn test_rows_put_palette_start_at_bottom() {
        let legend = legend(2.0, 82.0);
        let rows = legend.rows();
        let palette = greens(8).unwrap();
        assert_eq!(rows[0], LegendRow { label: Some("82%".into()), color: None });
        assert_eq!(rows[1].color, Some(palette[7]));
        assert_eq!(rows[1].label.as_deref(), Some("72%"));
        assert_eq!(rows[8].color, Some(palette[0]));
        assert_eq!(rows[8].label.as_deref(), Some("2%"));
        assert_eq!(legend.label_width(), 3);
    }

    #[test]
    fn test_labels_round_half_up() {
        assert_eq!(tick_label(12.5), "13%");
        assert_eq!(tick_label(12.49), "12%");
        assert_eq!(tick_label(0.0), "0%");
    }
}
