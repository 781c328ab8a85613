use crate::error::SceneError;
use crate::ir::{BoundingBox, ColorId, Point, Primitive, Rgb, Scene};
use serde_json::Value;

/// Decodes a stored scene: an array of code-tagged records with the
/// bounding box record last.
pub fn parse_scene(value: &Value) -> Result<Scene, SceneError> {
    let records = value.as_array().ok_or(SceneError::NotAnArray)?;
    let (last, body) = records.split_last().ok_or(SceneError::MissingBounds)?;
    let bounds = parse_bounds(body.len(), last)?;

    let mut primitives = Vec::with_capacity(body.len());
    for (index, record) in body.iter().enumerate() {
        primitives.push(parse_record(index, record)?);
    }
    Ok(Scene::new(primitives, bounds))
}

fn parse_bounds(index: usize, record: &Value) -> Result<BoundingBox, SceneError> {
    let fields = Fields::new(index, record)?;
    if fields.code()? != Primitive::CODE_BOUNDS {
        return Err(SceneError::MissingBounds);
    }
    fields.expect_len(5)?;
    Ok(BoundingBox::from_origin_size(
        fields.float(1)?,
        fields.float(2)?,
        fields.float(3)?,
        fields.float(4)?,
    ))
}

fn parse_record(index: usize, record: &Value) -> Result<Primitive, SceneError> {
    let fields = Fields::new(index, record)?;
    match fields.code()? {
        Primitive::CODE_COLOR => {
            fields.expect_len(5)?;
            Ok(Primitive::Color {
                id: fields.color(1)?,
                rgb: Rgb::new(fields.channel(2)?, fields.channel(3)?, fields.channel(4)?),
            })
        }
        Primitive::CODE_RECTANGLE => {
            fields.expect_len(7)?;
            Ok(Primitive::Rectangle {
                x0: fields.float(1)?,
                y0: fields.float(2)?,
                x1: fields.float(3)?,
                y1: fields.float(4)?,
                fill: fields.optional_color(5)?,
                stroke: fields.optional_color(6)?,
            })
        }
        Primitive::CODE_TEXT => {
            fields.expect_len(5)?;
            let text = fields
                .get(3)
                .as_str()
                .ok_or_else(|| SceneError::record(index, "text must be a string"))?;
            Ok(Primitive::Text {
                x: fields.float(1)?,
                y: fields.float(2)?,
                text: text.to_string(),
                color: fields.color(4)?,
            })
        }
        Primitive::CODE_POLYLINE => {
            fields.expect_len(5)?;
            let points = fields.points(1, 2)?;
            Ok(Primitive::Polyline {
                points,
                start_arrow: fields.optional_float(2)?,
                end_arrow: fields.optional_float(3)?,
                color: fields.color(4)?,
            })
        }
        Primitive::CODE_POLYGON => {
            fields.expect_len(4)?;
            Ok(Primitive::Polygon {
                points: fields.points(1, 3)?,
                fill: fields.optional_color(2)?,
                stroke: fields.optional_color(3)?,
            })
        }
        Primitive::CODE_BOUNDS => Err(SceneError::record(
            index,
            "bounding box record must be the last record",
        )),
        other => Err(SceneError::record(index, format!("unknown primitive code {other}"))),
    }
}

struct Fields<'a> {
    index: usize,
    items: &'a [Value],
}

impl<'a> Fields<'a> {
    fn new(index: usize, record: &'a Value) -> Result<Self, SceneError> {
        let items = record
            .as_array()
            .ok_or_else(|| SceneError::record(index, "record must be an array"))?;
        if items.is_empty() {
            return Err(SceneError::record(index, "empty record"));
        }
        Ok(Self { index, items })
    }

    fn error(&self, reason: impl Into<String>) -> SceneError {
        SceneError::record(self.index, reason)
    }

    fn get(&self, pos: usize) -> &'a Value {
        &self.items[pos]
    }

    fn code(&self) -> Result<i64, SceneError> {
        self.items[0]
            .as_i64()
            .ok_or_else(|| self.error("primitive code must be an integer"))
    }

    fn expect_len(&self, len: usize) -> Result<(), SceneError> {
        if self.items.len() != len {
            return Err(self.error(format!(
                "expected {len} fields, found {}",
                self.items.len()
            )));
        }
        Ok(())
    }

    fn float(&self, pos: usize) -> Result<f64, SceneError> {
        number(self.get(pos)).ok_or_else(|| self.error(format!("field {pos} must be a number")))
    }

    fn optional_float(&self, pos: usize) -> Result<Option<f64>, SceneError> {
        match self.get(pos) {
            Value::Null => Ok(None),
            _ => self.float(pos).map(Some),
        }
    }

    fn color(&self, pos: usize) -> Result<ColorId, SceneError> {
        self.get(pos)
            .as_u64()
            .and_then(|id| ColorId::try_from(id).ok())
            .ok_or_else(|| self.error(format!("field {pos} must be a color id")))
    }

    fn optional_color(&self, pos: usize) -> Result<Option<ColorId>, SceneError> {
        match self.get(pos) {
            Value::Null => Ok(None),
            _ => self.color(pos).map(Some),
        }
    }

    fn channel(&self, pos: usize) -> Result<u8, SceneError> {
        self.get(pos)
            .as_u64()
            .and_then(|c| u8::try_from(c).ok())
            .ok_or_else(|| self.error(format!("color component {pos} must be in 0..=255")))
    }

    fn points(&self, pos: usize, min_points: usize) -> Result<Vec<Point>, SceneError> {
        let coords = self
            .get(pos)
            .as_array()
            .ok_or_else(|| self.error("coordinates must be an array"))?;
        if coords.len() % 2 != 0 {
            return Err(self.error("odd number of coordinates"));
        }
        let points = coords
            .chunks_exact(2)
            .map(|pair| match (number(&pair[0]), number(&pair[1])) {
                (Some(x), Some(y)) => Ok(Point::new(x, y)),
                _ => Err(self.error("coordinates must be numbers")),
            })
            .collect::<Result<Vec<_>, _>>()?;
        if points.len() < min_points {
            return Err(self.error(format!(
                "need at least {min_points} points, found {}",
                points.len()
            )));
        }
        Ok(points)
    }
}

fn number(value: &Value) -> Option<f64> {
    value.as_f64().filter(|v| v.is_finite())
}
