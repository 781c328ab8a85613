//! Small rectangle-in-rectangle image showing which part of the diagram
//! the current viewport covers. Independent of any scene.

use crate::error::RenderError;
use crate::raster::{self, ImageFormat, RenderedImage};
use crate::render::{escape_xml, svg_open};
use crate::theme::Theme;
use crate::viewport::ViewportState;

/// Pixel-space rectangle; both corners inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

/// The highlight marking the visible window, inset one pixel for the border.
pub fn highlight_rect(viewport: &ViewportState) -> PixelRect {
    let inner_w = f64::from(viewport.width.saturating_sub(2));
    let inner_h = f64::from(viewport.height.saturating_sub(2));
    let x0 = inner_w * viewport.pan_x + 1.0;
    let y0 = inner_h * viewport.pan_y + 1.0;
    PixelRect {
        x0,
        y0,
        x1: x0 + inner_w * viewport.window(),
        y1: y0 + inner_h * viewport.window(),
    }
}

pub fn render_thumbnail_svg(viewport: &ViewportState, theme: &Theme) -> String {
    let (width, height) = (viewport.width, viewport.height);
    let mut svg = svg_open(width, height, &theme.viewport_background);

    let r = highlight_rect(viewport);
    let (x, y) = (r.x0.floor(), r.y0.floor());
    svg.push_str(&format!(
        "<rect x=\"{x}\" y=\"{y}\" width=\"{}\" height=\"{}\" fill=\"{}\"/>",
        r.x1.floor() - x + 1.0,
        r.y1.floor() - y + 1.0,
        escape_xml(&theme.viewport_highlight)
    ));

    // Border goes last so the highlight never covers it.
    svg.push_str(&format!(
        "<rect x=\"0.5\" y=\"0.5\" width=\"{}\" height=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1\"/>",
        width.saturating_sub(1),
        height.saturating_sub(1),
        escape_xml(&theme.viewport_border)
    ));
    svg.push_str("</svg>");
    svg
}

pub fn render_thumbnail(
    viewport: &ViewportState,
    theme: &Theme,
    format: ImageFormat,
) -> Result<RenderedImage, RenderError> {
    let svg = render_thumbnail_svg(viewport, theme);
    raster::svg_to_image(&svg, viewport.width, viewport.height, &theme.font_family, format)
}
