use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const COUNTY_URL: &str =
    "https://cdn.freecodecamp.org/testable-projects-fcc/data/choropleth_map/counties.json";
pub const EDUCATION_URL: &str =
    "https://cdn.freecodecamp.org/testable-projects-fcc/data/choropleth_map/for_user_education.json";

pub const PLOT_WIDTH: f64 = 1000.0;
pub const PLOT_HEIGHT: f64 = 600.0;
pub const PLOT_PADDING: f64 = 60.0;
pub const GRADES_COUNT: usize = 8;
pub const LEGEND_CELL_SIZE: f64 = 25.0;
pub const TOOLTIP_OFFSET: f64 = 10.0;
pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 12.0;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("plot dimensions must be positive, got {width}x{height}")]
    PlotSize { width: f64, height: f64 },
    #[error("plot padding {padding} does not fit a {width}x{height} plot")]
    Padding { padding: f64, width: f64, height: f64 },
    #[error("zoom extent [{min}, {max}] must satisfy 1 <= min <= max")]
    ZoomExtent { min: f64, max: f64 },
    #[error("color scheme has {grades} classes, supported range is 3..=9")]
    Grades { grades: usize },
    #[error("legend cell size must be positive, got {0}")]
    LegendCell(f64),
    #[error("zoom step must be greater than 1, got {0}")]
    ZoomStep(f64),
}

/// Everything a map instance needs; nothing is read from globals.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct MapConfig {
    pub sources: SourceConfig,
    pub plot: PlotConfig,
    pub legend: LegendConfig,
    pub zoom: ZoomConfig,
    pub tooltip: TooltipConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SourceConfig {
    /// URL or local path of the TopoJSON counties document
    pub topology: String,
    /// URL or local path of the education statistics array
    pub education: String,
    /// Optional HTTP connect timeout; the pipeline itself never times out
    pub connect_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct PlotConfig {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LegendConfig {
    pub grades: usize,
    pub cell_size: f64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ZoomConfig {
    pub min: f64,
    pub max: f64,
    /// Scale multiplier applied per wheel notch or key press
    pub step: f64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct TooltipConfig {
    /// Offset from the pointer in surface units
    pub offset: f64,
    /// Offset from the pointer in terminal cells
    pub cell_offset: u16,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            topology: COUNTY_URL.to_string(),
            education: EDUCATION_URL.to_string(),
            connect_timeout_secs: None,
        }
    }
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: PLOT_WIDTH,
            height: PLOT_HEIGHT,
            padding: PLOT_PADDING,
        }
    }
}

impl Default for LegendConfig {
    fn default() -> Self {
        Self {
            grades: GRADES_COUNT,
            cell_size: LEGEND_CELL_SIZE,
        }
    }
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            min: MIN_ZOOM,
            max: MAX_ZOOM,
            step: 1.5,
        }
    }
}

impl Default for TooltipConfig {
    fn default() -> Self {
        Self {
            offset: TOOLTIP_OFFSET,
            cell_offset: 1,
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            sources: SourceConfig::default(),
            plot: PlotConfig::default(),
            legend: LegendConfig::default(),
            zoom: ZoomConfig::default(),
            tooltip: TooltipConfig::default(),
        }
    }
}

impl MapConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: MapConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let PlotConfig { width, height, padding } = self.plot;
        if !(width > 0.0 && height > 0.0) {
            return Err(ConfigError::PlotSize { width, height });
        }
        if !(padding >= 0.0 && padding < width && padding < height) {
            return Err(ConfigError::Padding { padding, width, height });
        }
        if !(self.zoom.min >= 1.0 && self.zoom.min <= self.zoom.max) {
            return Err(ConfigError::ZoomExtent {
                min: self.zoom.min,
                max: self.zoom.max,
            });
        }
        if !(3..=9).contains(&self.legend.grades) {
            return Err(ConfigError::Grades {
                grades: self.legend.grades,
            });
        }
        if !(self.legend.cell_size > 0.0) {
            return Err(ConfigError::LegendCell(self.legend.cell_size));
        }
        if !(self.zoom.step > 1.0) {
            return Err(ConfigError::ZoomStep(self.zoom.step));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = MapConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.plot.width, 1000.0);
        assert_eq!(config.plot.height, 600.0);
        assert_eq!(config.plot.padding, 60.0);
        assert_eq!(config.legend.grades, 8);
        assert_eq!((config.zoom.min, config.zoom.max), (1.0, 12.0));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: MapConfig = toml::from_str(
            r#"
            [sources]
            education = "data/education.json"

            [legend]
            grades = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.sources.education, "data/education.json");
        assert_eq!(config.sources.topology, COUNTY_URL);
        assert_eq!(config.legend.grades, 5);
        assert_eq!(config.legend.cell_size, LEGEND_CELL_SIZE);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = MapConfig::default();
        config.legend.grades = 12;
        assert_eq!(config.validate(), Err(ConfigError::Grades { grades: 12 }));

        let mut config = MapConfig::default();
        config.zoom.min = 0.5;
        assert!(matches!(config.validate(), Err(ConfigError::ZoomExtent { .. })));

        let mut config = MapConfig::default();
        config.plot.padding = 700.0;
        assert!(matches!(config.validate(), Err(ConfigError::Padding { .. })));

        let mut config = MapConfig::default();
        config.legend.cell_size = -25.0;
        assert_eq!(config.validate(), Err(ConfigError::LegendCell(-25.0)));

        let mut config = MapConfig::default();
        config.zoom.step = 0.0;
        assert_eq!(config.validate(), Err(ConfigError::ZoomStep(0.0)));
    }
}
