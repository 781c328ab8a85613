use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub background: String,
    pub font_family: String,
    pub font_size: f32,
    /// Height of one text line in pixels, before leading.
    pub font_height: f32,
    pub line_leading: f32,
    pub line_width: f32,
    pub viewport_background: String,
    pub viewport_border: String,
    pub viewport_highlight: String,
    /// Coverage bar segments: covered, partly covered, uncovered.
    pub coverage_covered: String,
    pub coverage_partial: String,
    pub coverage_uncovered: String,
}

impl Theme {
    pub fn ggcov_default() -> Self {
        Self {
            background: "#FFFFFF".to_string(),
            font_family: "DejaVu Sans Mono, Liberation Mono, monospace".to_string(),
            font_size: 11.0,
            font_height: 13.0,
            line_leading: 4.0,
            line_width: 1.0,
            viewport_background: "#FFFFFF".to_string(),
            viewport_border: "#000000".to_string(),
            viewport_highlight: "#7D7D94".to_string(),
            coverage_covered: "#00C000".to_string(),
            coverage_partial: "#A0A000".to_string(),
            coverage_uncovered: "#C00000".to_string(),
        }
    }

    pub fn modern() -> Self {
        Self {
            background: "#FFFFFF".to_string(),
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 12.0,
            font_height: 15.0,
            line_leading: 4.0,
            line_width: 1.2,
            viewport_background: "#F8FAFF".to_string(),
            viewport_border: "#7A8AA6".to_string(),
            viewport_highlight: "#C7D2E5".to_string(),
            coverage_covered: "#2E9E44".to_string(),
            coverage_partial: "#C9A227".to_string(),
            coverage_uncovered: "#C8413B".to_string(),
        }
    }

    /// Vertical distance between consecutive lines of a text block.
    pub fn line_pitch(&self) -> f32 {
        self.font_height + self.line_leading
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::ggcov_default()
    }
}
