//! Streaming scene builder.
//!
//! Mirrors the interface diagram generators use to emit scenes: a current
//! fill and border color, boxes, text boxes, and polylines built point by
//! point. Colors are declared lazily the first time an RGB value is used,
//! so each distinct color appears exactly once in the output.

use crate::ir::{BoundingBox, ColorId, Point, Primitive, Rgb, Scene};

#[derive(Debug)]
pub struct SceneBuilder {
    primitives: Vec<Primitive>,
    colors: Vec<Rgb>,
    fill: Option<ColorId>,
    border: Option<ColorId>,
    arrow_size: f64,
    polyline: Vec<Point>,
    polyline_start_arrow: bool,
}

impl Default for SceneBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneBuilder {
    pub fn new() -> Self {
        Self {
            primitives: Vec::new(),
            colors: Vec::new(),
            fill: None,
            border: None,
            arrow_size: 1.0,
            polyline: Vec::new(),
            polyline_start_arrow: false,
        }
    }

    fn color(&mut self, rgb: Rgb) -> ColorId {
        if let Some(pos) = self.colors.iter().position(|c| *c == rgb) {
            return pos as ColorId;
        }
        let id = self.colors.len() as ColorId;
        self.colors.push(rgb);
        self.primitives.push(Primitive::Color { id, rgb });
        id
    }

    pub fn fill(&mut self, rgb: Rgb) -> &mut Self {
        self.fill = Some(self.color(rgb));
        self
    }

    pub fn no_fill(&mut self) -> &mut Self {
        self.fill = None;
        self
    }

    pub fn border(&mut self, rgb: Rgb) -> &mut Self {
        self.border = Some(self.color(rgb));
        self
    }

    pub fn no_border(&mut self) -> &mut Self {
        self.border = None;
        self
    }

    pub fn arrow_size(&mut self, size: f64) -> &mut Self {
        self.arrow_size = size;
        self
    }

    pub fn rect(&mut self, x: f64, y: f64, w: f64, h: f64) -> &mut Self {
        self.primitives.push(Primitive::Rectangle {
            x0: x,
            y0: y,
            x1: x + w,
            y1: y + h,
            fill: self.fill,
            stroke: self.border,
        });
        self
    }

    /// Text is drawn in the border color, falling back to black when no
    /// border is set.
    pub fn text(&mut self, x: f64, y: f64, text: &str) -> &mut Self {
        let color = match self.border {
            Some(id) => id,
            None => self.color(Rgb::BLACK),
        };
        self.primitives.push(Primitive::Text {
            x,
            y,
            color,
            text: text.to_string(),
        });
        self
    }

    pub fn polyline_begin(&mut self, arrow: bool) -> &mut Self {
        self.polyline.clear();
        self.polyline_start_arrow = arrow;
        self
    }

    pub fn polyline_point(&mut self, x: f64, y: f64) -> &mut Self {
        self.polyline.push(Point::new(x, y));
        self
    }

    /// Emits the pending polyline in the fill color. Polylines with fewer
    /// than two points are dropped.
    pub fn polyline_end(&mut self, arrow: bool) -> &mut Self {
        let points = std::mem::take(&mut self.polyline);
        if points.len() < 2 {
            return self;
        }
        let color = match self.fill {
            Some(id) => id,
            None => self.color(Rgb::BLACK),
        };
        let size = self.arrow_size;
        self.primitives.push(Primitive::Polyline {
            points,
            start_arrow: self.polyline_start_arrow.then_some(size),
            end_arrow: arrow.then_some(size),
            color,
        });
        self
    }

    pub fn polygon(&mut self, points: &[Point]) -> &mut Self {
        if points.len() < 3 {
            return self;
        }
        self.primitives.push(Primitive::Polygon {
            points: points.to_vec(),
            fill: self.fill,
            stroke: self.border,
        });
        self
    }

    pub fn finish(self, bounds: BoundingBox) -> Scene {
        Scene::new(self.primitives, bounds)
    }
}
