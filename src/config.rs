use crate::raster::ImageFormat;
use crate::theme::Theme;
use crate::ir::Rgb;
use crate::viewport::{
    MAX_IMAGE_SIZE, MAX_UNCLAMPED_SIZE, MAX_ZOOM_STEPS, MIN_IMAGE_SIZE, PAN_STEP, ZOOM_FACTOR,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewConfig {
    pub width: u32,
    pub height: u32,
}

impl ViewConfig {
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Limits {
    pub min_image_size: u32,
    pub max_image_size: u32,
    pub max_unclamped_size: u32,
    pub zoom_factor: f64,
    pub max_zoom_steps: i32,
    pub pan_step: f64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            min_image_size: MIN_IMAGE_SIZE,
            max_image_size: MAX_IMAGE_SIZE,
            max_unclamped_size: MAX_UNCLAMPED_SIZE,
            zoom_factor: ZOOM_FACTOR,
            max_zoom_steps: MAX_ZOOM_STEPS,
            pan_step: PAN_STEP,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlConfig {
    pub page: String,
    pub render: String,
    pub viewport: String,
    pub covbar: String,
}

impl Default for UrlConfig {
    fn default() -> Self {
        Self {
            page: "diagram".to_string(),
            render: "drender".to_string(),
            viewport: "dviewport".to_string(),
            covbar: "covbar".to_string(),
        }
    }
}

/// What the renderer does when a scene breaks its own contract: a color
/// used before being declared, a zero-extent bounding box, or an arrow
/// along a zero-length segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractPolicy {
    /// Fail the render.
    Strict,
    /// Log a warning and skip the offending drawing operation.
    Lenient,
}

impl Default for ContractPolicy {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            ContractPolicy::Strict
        } else {
            ContractPolicy::Lenient
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub diagram: ViewConfig,
    pub thumbnail: ViewConfig,
    pub covbar: ViewConfig,
    pub limits: Limits,
    pub urls: UrlConfig,
    /// Output formats in order of preference.
    pub formats: Vec<ImageFormat>,
    pub policy: ContractPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: Theme::ggcov_default(),
            diagram: ViewConfig {
                width: 450,
                height: 450,
            },
            thumbnail: ViewConfig {
                width: 64,
                height: 64,
            },
            covbar: ViewConfig {
                width: 150,
                height: 25,
            },
            limits: Limits::default(),
            urls: UrlConfig::default(),
            formats: vec![ImageFormat::Gif, ImageFormat::Png],
            policy: ContractPolicy::default(),
        }
    }
}

impl Config {
    pub fn preferred_format(&self) -> ImageFormat {
        self.formats.first().copied().unwrap_or(ImageFormat::Png)
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    diagram: Option<ViewConfigFile>,
    thumbnail: Option<ViewConfigFile>,
    covbar: Option<ViewConfigFile>,
    limits: Option<LimitsFile>,
    urls: Option<UrlConfigFile>,
    formats: Option<Vec<ImageFormat>>,
    policy: Option<ContractPolicy>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    background: Option<String>,
    font_family: Option<String>,
    font_size: Option<f32>,
    font_height: Option<f32>,
    line_leading: Option<f32>,
    line_width: Option<f32>,
    viewport_background: Option<String>,
    viewport_border: Option<String>,
    viewport_highlight: Option<String>,
    coverage_covered: Option<String>,
    coverage_partial: Option<String>,
    coverage_uncovered: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ViewConfigFile {
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LimitsFile {
    min_image_size: Option<u32>,
    max_image_size: Option<u32>,
    max_unclamped_size: Option<u32>,
    zoom_factor: Option<f64>,
    max_zoom_steps: Option<i32>,
    pan_step: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UrlConfigFile {
    page: Option<String>,
    render: Option<String>,
    viewport: Option<String>,
    covbar: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("couldn't read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("couldn't parse config {path}: {reason}")]
    Parse { path: String, reason: String },
}

pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let display = path.display().to_string();
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: display.clone(),
        source,
    })?;
    let parsed = parse_config_file(&contents).map_err(|reason| ConfigError::Parse {
        path: display,
        reason,
    })?;
    Ok(apply_config_file(config, parsed))
}

pub fn parse_config(contents: &str) -> Result<Config, String> {
    parse_config_file(contents).map(|parsed| apply_config_file(Config::default(), parsed))
}

fn parse_config_file(contents: &str) -> Result<ConfigFile, String> {
    match serde_json::from_str::<ConfigFile>(contents) {
        Ok(parsed) => Ok(parsed),
        // Hand-written config files often carry comments or trailing commas.
        Err(strict) => json5::from_str::<ConfigFile>(contents)
            .map_err(|lenient| format!("{strict} (json5: {lenient})")),
    }
}

fn apply_config_file(mut config: Config, parsed: ConfigFile) -> Config {
    if let Some(theme_name) = parsed.theme.as_deref() {
        if theme_name == "modern" {
            config.theme = Theme::modern();
        } else if theme_name == "default" || theme_name == "ggcov" {
            config.theme = Theme::ggcov_default();
        } else {
            log::warn!("unknown theme \"{theme_name}\", keeping default");
        }
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.background {
            apply_color(&mut config.theme.background, v, "background");
        }
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.font_height {
            config.theme.font_height = v;
        }
        if let Some(v) = vars.line_leading {
            config.theme.line_leading = v;
        }
        if let Some(v) = vars.line_width {
            config.theme.line_width = v;
        }
        if let Some(v) = vars.viewport_background {
            apply_color(&mut config.theme.viewport_background, v, "viewport_background");
        }
        if let Some(v) = vars.viewport_border {
            apply_color(&mut config.theme.viewport_border, v, "viewport_border");
        }
        if let Some(v) = vars.viewport_highlight {
            apply_color(&mut config.theme.viewport_highlight, v, "viewport_highlight");
        }
        if let Some(v) = vars.coverage_covered {
            apply_color(&mut config.theme.coverage_covered, v, "coverage_covered");
        }
        if let Some(v) = vars.coverage_partial {
            apply_color(&mut config.theme.coverage_partial, v, "coverage_partial");
        }
        if let Some(v) = vars.coverage_uncovered {
            apply_color(&mut config.theme.coverage_uncovered, v, "coverage_uncovered");
        }
    }

    if let Some(view) = parsed.diagram {
        apply_view(&mut config.diagram, view);
    }
    if let Some(view) = parsed.thumbnail {
        apply_view(&mut config.thumbnail, view);
    }
    if let Some(view) = parsed.covbar {
        apply_view(&mut config.covbar, view);
    }

    if let Some(limits) = parsed.limits {
        if let Some(v) = limits.min_image_size {
            config.limits.min_image_size = v;
        }
        if let Some(v) = limits.max_image_size {
            config.limits.max_image_size = v;
        }
        if let Some(v) = limits.max_unclamped_size.filter(|v| *v > 0) {
            config.limits.max_unclamped_size = v;
        }
        if let Some(v) = limits.zoom_factor.filter(|v| *v > 1.0) {
            config.limits.zoom_factor = v;
        }
        if let Some(v) = limits.max_zoom_steps.filter(|v| *v >= 0) {
            config.limits.max_zoom_steps = v;
        }
        if let Some(v) = limits.pan_step.filter(|v| *v > 0.0) {
            config.limits.pan_step = v;
        }
    }

    if let Some(urls) = parsed.urls {
        if let Some(v) = urls.page {
            config.urls.page = v;
        }
        if let Some(v) = urls.render {
            config.urls.render = v;
        }
        if let Some(v) = urls.viewport {
            config.urls.viewport = v;
        }
        if let Some(v) = urls.covbar {
            config.urls.covbar = v;
        }
    }

    if let Some(formats) = parsed.formats.filter(|f| !f.is_empty()) {
        config.formats = formats;
    }
    if let Some(policy) = parsed.policy {
        config.policy = policy;
    }

    config
}

/// Theme colors are written into hand-built SVG, so only hex colors are
/// accepted; they are stored normalized to `#RRGGBB`.
fn apply_color(slot: &mut String, value: String, name: &str) {
    match Rgb::parse_hex(&value) {
        Some(rgb) => *slot = rgb.to_hex(),
        None => log::warn!("theme color {name} \"{value}\" is not #RGB or #RRGGBB, keeping {slot}"),
    }
}

fn apply_view(view: &mut ViewConfig, file: ViewConfigFile) {
    if let Some(v) = file.width {
        view.width = v;
    }
    if let Some(v) = file.height {
        view.height = v;
    }
}
