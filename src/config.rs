//! Typed configuration for the render core.
//!
//! Every field has a default matching the values the map was tuned with, so
//! an empty YAML file (or no file at all) yields a working setup. Grid step
//! and density tiers are plain parameters; nothing derives them.

use std::path::Path;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml { source: serde_yml::Error },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MapConfig {
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub density: DensityConfig,
    #[serde(default)]
    pub sizing: SizingConfig,
    #[serde(default)]
    pub summaries: SummaryConfig,
    #[serde(default)]
    pub surface: SurfaceConfig,
    #[serde(default)]
    pub assets: AssetConfig,
}

impl MapConfig {
    /// Load from a YAML file, then apply environment overrides.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse from a YAML string, then apply environment overrides.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.assets.apply_env_overrides();
        Ok(config)
    }
}

/// Grid binning parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Cell edge in degrees
    pub step: f64,
    /// Categories listed verbatim in a cell summary before "+N more"
    pub top_categories: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            step: 0.0005,
            top_categories: 5,
        }
    }
}

/// One saturation tier: applies when the point count exceeds `above`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SaturationTier {
    pub above: usize,
    pub saturation: f64,
}

/// Density normalization parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DensityConfig {
    /// Checked from the largest `above` down; first match wins
    pub tiers: Vec<SaturationTier>,
    /// Saturation when no tier matches
    pub base_saturation: f64,
    /// Point count above which the small radius is used
    pub radius_split: usize,
    pub large_radius: f64,
    pub small_radius: f64,
    /// blur = radius * blur_factor
    pub blur_factor: f64,
    /// Braille pixels per unit of radius
    pub pixel_scale: f64,
}

impl Default for DensityConfig {
    fn default() -> Self {
        Self {
            tiers: vec![
                SaturationTier { above: 15_000, saturation: 8.0 },
                SaturationTier { above: 5_000, saturation: 5.0 },
                SaturationTier { above: 1_000, saturation: 3.0 },
                SaturationTier { above: 200, saturation: 1.5 },
            ],
            base_saturation: 1.0,
            radius_split: 5_000,
            large_radius: 25.0,
            small_radius: 15.0,
            blur_factor: 0.7,
            pixel_scale: 0.2,
        }
    }
}

/// Logarithmic sizing and color tiers for markers and cluster badges.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SizingConfig {
    pub base: f64,
    pub scale_factor: f64,
    pub min: f64,
    pub max: f64,
    /// Counts above this use the high-alert color
    pub high_threshold: u64,
    /// Counts above this use the mid color
    pub mid_threshold: u64,
    /// Screen distance in braille pixels under which markers merge into a badge
    pub cluster_radius: f64,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            base: 1.0,
            scale_factor: 1.2,
            min: 1.0,
            max: 5.0,
            high_threshold: 500,
            mid_threshold: 100,
            cluster_radius: 6.0,
        }
    }
}

/// Incremental summary construction.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    /// Entities summarized per batch
    pub batch_size: usize,
    /// Pause between batches; zero only yields the thread
    pub pause_micros: u64,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            batch_size: 250,
            pause_micros: 200,
        }
    }
}

/// Optional rendering capabilities of the surface.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    /// Heat rasterization for density mode
    pub heat_layer: bool,
    /// Screen-space clustering of markers
    pub cluster_layer: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            heat_layer: true,
            cluster_layer: true,
        }
    }
}

/// Surface and viewport fitting.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Fraction of the surface left empty around fitted bounds
    pub fit_padding: f64,
    /// Zoom used when the bounds collapse to a point, and the fit ceiling
    pub max_fit_zoom: f64,
    /// Pixel size used for containers that were never resized
    pub default_width: usize,
    pub default_height: usize,
    pub capabilities: Capabilities,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            fit_padding: 0.1,
            max_fit_zoom: 50_000.0,
            default_width: 160,
            default_height: 96,
            capabilities: Capabilities::default(),
        }
    }
}

/// Remote assets: grunt name table and icons.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Base url the fixed `assets/grunts.json` path is joined to
    pub asset_base_url: String,
    pub icon_base_url: String,
    /// Per-request timeout when checking that an icon exists
    pub icon_timeout_ms: u64,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            asset_base_url: "http://127.0.0.1:8050/".to_string(),
            icon_base_url: "https://raw.githubusercontent.com/WatWowMap/wwm-uicons-webp/main".to_string(),
            icon_timeout_ms: 1_500,
        }
    }
}

impl AssetConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("SPAWNMAP_ASSET_BASE_URL") {
            self.asset_base_url = url;
        }
        if let Ok(url) = std::env::var("SPAWNMAP_ICON_BASE_URL") {
            self.icon_base_url = url;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_is_default() {
        let config = MapConfig::from_yaml("").unwrap();
        assert_eq!(config.grid, GridConfig::default());
        assert_eq!(config.density.tiers.len(), 4);
        assert_eq!(config.summaries.batch_size, 250);
        assert_eq!(config.summaries.pause_micros, 200);
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let yaml = "grid:\n  step: 0.001\nsurface:\n  capabilities:\n    heat_layer: false\n";
        let config = MapConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.grid.step, 0.001);
        assert_eq!(config.grid.top_categories, 5);
        assert!(!config.surface.capabilities.heat_layer);
        assert!(config.surface.capabilities.cluster_layer);
    }

    #[test]
    fn test_env_overrides_asset_urls() {
        std::env::set_var("SPAWNMAP_ASSET_BASE_URL", "http://assets.test/");
        std::env::set_var("SPAWNMAP_ICON_BASE_URL", "http://icons.test");
        let config = MapConfig::from_yaml("");
        std::env::remove_var("SPAWNMAP_ASSET_BASE_URL");
        std::env::remove_var("SPAWNMAP_ICON_BASE_URL");

        let assets = config.unwrap().assets;
        assert_eq!(assets.asset_base_url, "http://assets.test/");
        assert_eq!(assets.icon_base_url, "http://icons.test");
        assert_eq!(assets.icon_timeout_ms, 1_500);
    }

    #[test]
    fn test_bad_yaml_is_an_error() {
        assert!(matches!(
            MapConfig::from_yaml("grid: [1, 2"),
            Err(ConfigError::Yaml { .. })
        ));
    }
}
