//! Viewport state: image size, zoom and normalized pan, clamped so the
//! visible window never leaves the scene.
//!
//! Numeric viewport parameters never fail a request. Missing or
//! malformed values fall back to defaults and everything is clamped.

use crate::config::Limits;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static INTEGER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+$").unwrap());
static FLOATING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9.]+$").unwrap());

pub const MIN_IMAGE_SIZE: u32 = 64;
pub const MAX_IMAGE_SIZE: u32 = 1024;
/// Ceiling for sizes that skip the main-view range (thumbnail, coverage bar).
pub const MAX_UNCLAMPED_SIZE: u32 = 4096;
pub const ZOOM_FACTOR: f64 = 1.5;
pub const MAX_ZOOM_STEPS: i32 = 6;
pub const PAN_STEP: f64 = 0.25;

pub fn max_zoom() -> f64 {
    ZOOM_FACTOR.powi(MAX_ZOOM_STEPS)
}

pub fn clamp_image_size(size: u32) -> u32 {
    size.clamp(MIN_IMAGE_SIZE, MAX_IMAGE_SIZE)
}

pub fn clamp_zoom(zoom: f64) -> f64 {
    clamp_zoom_to(zoom, max_zoom())
}

/// Clamps `pan` so that a window `window` wide stays inside `[0, 1]`.
pub fn clamp_pan(pan: f64, window: f64) -> f64 {
    let upper = (1.0 - window).max(0.0);
    if pan.is_nan() {
        return 0.0;
    }
    pan.clamp(0.0, upper)
}

fn clamp_zoom_to(zoom: f64, max: f64) -> f64 {
    if zoom.is_nan() {
        return 1.0;
    }
    zoom.clamp(1.0, max.max(1.0))
}

/// Raw viewport parameters as they appear on the query string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewportParams {
    pub width: Option<String>,
    pub height: Option<String>,
    pub zoom: Option<String>,
    pub pan_x: Option<String>,
    pub pan_y: Option<String>,
}

impl ViewportParams {
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key {
                "w" => &mut params.width,
                "h" => &mut params.height,
                "z" => &mut params.zoom,
                "px" => &mut params.pan_x,
                "py" => &mut params.pan_y,
                _ => continue,
            };
            *slot = Some(value.to_string());
        }
        params
    }
}

fn get_integer(raw: Option<&str>, default: u32) -> u32 {
    raw.filter(|s| INTEGER_RE.is_match(s))
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(default)
}

fn get_floating(raw: Option<&str>, default: f64) -> f64 {
    raw.filter(|s| FLOATING_RE.is_match(s))
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(default)
}

/// How raw image sizes are treated: the main diagram view clamps them to
/// the configured range, the thumbnail takes them as given apart from
/// replacing zero with the default and capping runaway values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizePolicy {
    Clamped,
    Unclamped,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewportState {
    pub width: u32,
    pub height: u32,
    pub zoom: f64,
    pub pan_x: f64,
    pub pan_y: f64,
}

impl ViewportState {
    pub fn show_all(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            zoom: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
        }
    }

    /// Parses and clamps request parameters. Never fails.
    pub fn from_params(
        params: &ViewportParams,
        default_size: (u32, u32),
        size_policy: SizePolicy,
        limits: &Limits,
    ) -> Self {
        let mut width = get_integer(params.width.as_deref(), default_size.0);
        let mut height = get_integer(params.height.as_deref(), default_size.1);
        match size_policy {
            SizePolicy::Clamped => {
                width = limits.clamp_image_size(width);
                height = limits.clamp_image_size(height);
            }
            SizePolicy::Unclamped => {
                width = limits.sanitize_unclamped_size(width, default_size.0);
                height = limits.sanitize_unclamped_size(height, default_size.1);
            }
        }
        let state = Self {
            width,
            height,
            zoom: get_floating(params.zoom.as_deref(), 1.0),
            pan_x: get_floating(params.pan_x.as_deref(), 0.0),
            pan_y: get_floating(params.pan_y.as_deref(), 0.0),
        };
        state.clamped(limits)
    }

    /// Clamps zoom first, then pan against the resulting window width.
    pub fn clamped(self, limits: &Limits) -> Self {
        let zoomed = Self {
            zoom: limits.clamp_zoom(self.zoom),
            ..self
        };
        let window = zoomed.window();
        Self {
            pan_x: clamp_pan(self.pan_x, window),
            pan_y: clamp_pan(self.pan_y, window),
            ..zoomed
        }
    }

    /// Fraction of the scene visible along each axis.
    pub fn window(&self) -> f64 {
        1.0 / self.zoom
    }

    pub fn pan_step(&self, limits: &Limits) -> f64 {
        limits.pan_step / self.zoom
    }

    pub fn zoom_in(&self, limits: &Limits) -> Self {
        Self {
            zoom: self.zoom * limits.zoom_factor,
            ..*self
        }
        .clamped(limits)
    }

    pub fn zoom_out(&self, limits: &Limits) -> Self {
        Self {
            zoom: self.zoom / limits.zoom_factor,
            ..*self
        }
        .clamped(limits)
    }

    pub fn reset(&self) -> Self {
        Self::show_all(self.width, self.height)
    }

    /// Pans by whole steps along each axis; `dx`, `dy` are -1, 0 or 1.
    pub fn panned(&self, dx: i32, dy: i32, limits: &Limits) -> Self {
        let step = self.pan_step(limits);
        Self {
            pan_x: self.pan_x + f64::from(dx) * step,
            pan_y: self.pan_y + f64::from(dy) * step,
            ..*self
        }
        .clamped(limits)
    }
}

impl Limits {
    pub fn max_zoom(&self) -> f64 {
        self.zoom_factor.powi(self.max_zoom_steps)
    }

    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        clamp_zoom_to(zoom, self.max_zoom())
    }

    pub fn clamp_image_size(&self, size: u32) -> u32 {
        size.clamp(self.min_image_size, self.max_image_size.max(self.min_image_size))
    }

    /// A zero size means "use the default"; anything else is only capped.
    pub fn sanitize_unclamped_size(&self, size: u32, default: u32) -> u32 {
        let size = if size == 0 { default } else { size };
        size.clamp(1, self.max_unclamped_size.max(1))
    }
}
