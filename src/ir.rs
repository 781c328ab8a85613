use serde_json::{Value, json};

/// Scene-local color identifier, declared by a [`Primitive::Color`].
pub type ColorId = u32;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(0xff, 0xff, 0xff);
    pub const BLACK: Rgb = Rgb::new(0x00, 0x00, 0x00);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Unpacks a `0xRRGGBB` value.
    pub const fn from_packed(rgb: u32) -> Self {
        Self {
            r: ((rgb >> 16) & 0xff) as u8,
            g: ((rgb >> 8) & 0xff) as u8,
            b: (rgb & 0xff) as u8,
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Parses `#RGB` or `#RRGGBB`.
    pub fn parse_hex(input: &str) -> Option<Self> {
        let hex = input.trim().strip_prefix('#')?;
        match hex.len() {
            3 => {
                let mut parts = hex.chars().map(|c| c.to_digit(16).map(|d| (d * 17) as u8));
                Some(Self::new(parts.next()??, parts.next()??, parts.next()??))
            }
            6 => {
                let packed = u32::from_str_radix(hex, 16).ok()?;
                Some(Self::from_packed(packed))
            }
            _ => None,
        }
    }
}

/// Scene-space extent of a diagram, stored as two corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl BoundingBox {
    pub const fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn from_origin_size(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    pub fn is_degenerate(&self) -> bool {
        let (w, h) = (self.width(), self.height());
        w == 0.0 || h == 0.0 || !w.is_finite() || !h.is_finite()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Color {
        id: ColorId,
        rgb: Rgb,
    },
    Rectangle {
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
        fill: Option<ColorId>,
        stroke: Option<ColorId>,
    },
    Text {
        x: f64,
        y: f64,
        color: ColorId,
        text: String,
    },
    Polyline {
        points: Vec<Point>,
        start_arrow: Option<f64>,
        end_arrow: Option<f64>,
        color: ColorId,
    },
    Polygon {
        points: Vec<Point>,
        fill: Option<ColorId>,
        stroke: Option<ColorId>,
    },
}

impl Primitive {
    pub const CODE_BOUNDS: i64 = 0;
    pub const CODE_COLOR: i64 = 1;
    pub const CODE_RECTANGLE: i64 = 2;
    pub const CODE_TEXT: i64 = 3;
    pub const CODE_POLYLINE: i64 = 4;
    pub const CODE_POLYGON: i64 = 5;

    pub fn code(&self) -> i64 {
        match self {
            Primitive::Color { .. } => Self::CODE_COLOR,
            Primitive::Rectangle { .. } => Self::CODE_RECTANGLE,
            Primitive::Text { .. } => Self::CODE_TEXT,
            Primitive::Polyline { .. } => Self::CODE_POLYLINE,
            Primitive::Polygon { .. } => Self::CODE_POLYGON,
        }
    }

    /// Encodes the primitive as a stored scene record.
    pub fn to_record(&self) -> Value {
        match self {
            Primitive::Color { id, rgb } => json!([self.code(), id, rgb.r, rgb.g, rgb.b]),
            Primitive::Rectangle {
                x0,
                y0,
                x1,
                y1,
                fill,
                stroke,
            } => json!([self.code(), x0, y0, x1, y1, fill, stroke]),
            Primitive::Text { x, y, color, text } => json!([self.code(), x, y, text, color]),
            Primitive::Polyline {
                points,
                start_arrow,
                end_arrow,
                color,
            } => json!([
                self.code(),
                flatten_points(points),
                start_arrow,
                end_arrow,
                color
            ]),
            Primitive::Polygon {
                points,
                fill,
                stroke,
            } => json!([self.code(), flatten_points(points), fill, stroke]),
        }
    }
}

fn flatten_points(points: &[Point]) -> Vec<f64> {
    points.iter().flat_map(|p| [p.x, p.y]).collect()
}

/// An ordered list of primitives plus the diagram's bounding box. Later
/// primitives paint over earlier ones.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub primitives: Vec<Primitive>,
    pub bounds: BoundingBox,
}

impl Scene {
    pub fn new(primitives: Vec<Primitive>, bounds: BoundingBox) -> Self {
        Self { primitives, bounds }
    }

    /// Encodes the scene in the stored record format, bounds last.
    pub fn to_records(&self) -> Value {
        let mut records: Vec<Value> = self.primitives.iter().map(Primitive::to_record).collect();
        let b = &self.bounds;
        records.push(json!([
            Primitive::CODE_BOUNDS,
            b.x0,
            b.y0,
            b.width(),
            b.height()
        ]));
        Value::Array(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors() {
        assert_eq!(Rgb::parse_hex("#7D7D94"), Some(Rgb::new(0x7d, 0x7d, 0x94)));
        assert_eq!(Rgb::parse_hex("#fff"), Some(Rgb::WHITE));
        assert_eq!(Rgb::parse_hex("red"), None);
        assert_eq!(Rgb::new(255, 0, 16).to_hex(), "#FF0010");
    }

    #[test]
    fn bounds_record_is_origin_and_extent() {
        let scene = Scene::new(Vec::new(), BoundingBox::new(10.0, 20.0, 110.0, 70.0));
        assert_eq!(scene.to_records(), json!([[0, 10.0, 20.0, 100.0, 50.0]]));
    }
}
