//! Coverage bar: covered, partly covered and uncovered counts drawn as
//! adjoining horizontal segments, each as wide as its share of the total.

use crate::config::Limits;
use crate::error::RenderError;
use crate::raster::{self, ImageFormat, RenderedImage};
use crate::render::{escape_xml, svg_open};
use crate::request::Query;
use crate::theme::Theme;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static LEADING_INT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*([+-]?[0-9]+)").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverageStatus {
    Covered,
    PartCovered,
    Uncovered,
}

impl CoverageStatus {
    pub const ALL: [CoverageStatus; 3] = [
        CoverageStatus::Covered,
        CoverageStatus::PartCovered,
        CoverageStatus::Uncovered,
    ];

    pub fn color(self, theme: &Theme) -> &str {
        match self {
            CoverageStatus::Covered => &theme.coverage_covered,
            CoverageStatus::PartCovered => &theme.coverage_partial,
            CoverageStatus::Uncovered => &theme.coverage_uncovered,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CoverageCounts {
    pub covered: u64,
    pub partial: u64,
    pub uncovered: u64,
}

impl CoverageCounts {
    pub fn get(&self, status: CoverageStatus) -> u64 {
        match status {
            CoverageStatus::Covered => self.covered,
            CoverageStatus::PartCovered => self.partial,
            CoverageStatus::Uncovered => self.uncovered,
        }
    }

    pub fn total(&self) -> u64 {
        self.covered
            .saturating_add(self.partial)
            .saturating_add(self.uncovered)
    }
}

/// One segment's pixel columns, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub status: CoverageStatus,
    pub x0: u32,
    pub x1: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverageBar {
    pub width: u32,
    pub height: u32,
    pub counts: CoverageCounts,
}

impl CoverageBar {
    /// Reads `w`, `h`, `c`, `pc` and `uc`. Values are taken as leading
    /// integers; anything unreadable counts as zero, negative counts are
    /// treated as zero, and a zero size falls back to the default.
    pub fn from_query(query: &Query, default_size: (u32, u32), limits: &Limits) -> Self {
        let size = |key: &str, default: u32| {
            let raw = leading_int(query.get(key)).clamp(0, i64::from(u32::MAX));
            limits.sanitize_unclamped_size(raw as u32, default)
        };
        let count = |key: &str| leading_int(query.get(key)).max(0) as u64;
        Self {
            width: size("w", default_size.0),
            height: size("h", default_size.1),
            counts: CoverageCounts {
                covered: count("c"),
                partial: count("pc"),
                uncovered: count("uc"),
            },
        }
    }

    /// Segments in paint order. Each one runs from the end of the previous
    /// share to the end of its own, so neighbours share their boundary
    /// column and the later segment wins it. Empty when there is nothing
    /// to draw.
    pub fn segments(&self) -> Vec<Segment> {
        let total = self.counts.total();
        if total == 0 || self.width == 0 {
            return Vec::new();
        }
        let width = f64::from(self.width);
        let last = self.width - 1;
        let mut x: f64 = 0.0;
        let mut segments = Vec::with_capacity(CoverageStatus::ALL.len());
        for status in CoverageStatus::ALL {
            let value = self.counts.get(status);
            if value == 0 {
                continue;
            }
            let w = width * value as f64 / total as f64;
            let x0 = (x.floor() as u32).min(last);
            let x1 = ((x + w).floor() as u32).min(last);
            segments.push(Segment { status, x0, x1 });
            x += w;
        }
        segments
    }
}

fn leading_int(raw: Option<&str>) -> i64 {
    let Some(caps) = raw.and_then(|s| LEADING_INT_RE.captures(s)) else {
        return 0;
    };
    let digits = &caps[1];
    digits.parse::<i64>().unwrap_or(if digits.starts_with('-') {
        i64::MIN
    } else {
        i64::MAX
    })
}

/// The bar as a pixel-space SVG document, or `None` when every count is
/// zero.
pub fn coverage_bar_svg(bar: &CoverageBar, theme: &Theme) -> Option<String> {
    let segments = bar.segments();
    if segments.is_empty() {
        return None;
    }
    let mut svg = svg_open(bar.width, bar.height, &theme.background);
    for segment in segments {
        svg.push_str(&format!(
            "<rect x=\"{}\" y=\"0\" width=\"{}\" height=\"{}\" fill=\"{}\"/>",
            segment.x0,
            segment.x1 - segment.x0 + 1,
            bar.height,
            escape_xml(segment.status.color(theme))
        ));
    }
    svg.push_str("</svg>");
    Some(svg)
}

pub fn render_coverage_bar(
    bar: &CoverageBar,
    theme: &Theme,
    format: ImageFormat,
) -> Result<Option<RenderedImage>, RenderError> {
    let Some(svg) = coverage_bar_svg(bar, theme) else {
        return Ok(None);
    };
    raster::svg_to_image(&svg, bar.width, bar.height, &theme.font_family, format).map(Some)
}
