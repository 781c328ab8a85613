use crate::ir::{BoundingBox, Point};
use crate::viewport::ViewportState;

/// Scene-space to pixel-space mapping for one viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub scale_x: f64,
    pub offset_x: f64,
    pub scale_y: f64,
    pub offset_y: f64,
}

impl Transform {
    /// Returns `None` when the bounding box has zero extent.
    pub fn new(bounds: &BoundingBox, viewport: &ViewportState) -> Option<Self> {
        if bounds.is_degenerate() {
            return None;
        }
        let bw = bounds.width();
        let bh = bounds.height();
        let scale_x = viewport.zoom * f64::from(viewport.width.saturating_sub(1)) / bw;
        let scale_y = viewport.zoom * f64::from(viewport.height.saturating_sub(1)) / bh;
        Some(Self {
            scale_x,
            offset_x: -scale_x * (viewport.pan_x * bw + bounds.x0),
            scale_y,
            offset_y: -scale_y * (viewport.pan_y * bh + bounds.y0),
        })
    }

    pub fn x(&self, sx: f64) -> f64 {
        self.scale_x * sx + self.offset_x
    }

    pub fn y(&self, sy: f64) -> f64 {
        self.scale_y * sy + self.offset_y
    }

    pub fn apply(&self, p: Point) -> Point {
        Point::new(self.x(p.x), self.y(p.y))
    }

    /// Scales a scene-space length along the horizontal axis.
    pub fn length(&self, scene_length: f64) -> f64 {
        self.scale_x * scene_length
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
    }

    #[test]
    fn show_all_fits_bounds_exactly() {
        let bounds = BoundingBox::new(-20.0, 5.0, 380.0, 125.0);
        let viewport = ViewportState::show_all(450, 300);
        let t = Transform::new(&bounds, &viewport).unwrap();
        assert!(close(t.apply(Point::new(-20.0, 5.0)), Point::new(0.0, 0.0)));
        assert!(close(t.apply(Point::new(380.0, 125.0)), Point::new(449.0, 299.0)));
    }

    #[test]
    fn zoom_and_pan_select_a_window() {
        let bounds = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
        let viewport = ViewportState {
            width: 101,
            height: 101,
            zoom: 2.0,
            pan_x: 0.5,
            pan_y: 0.25,
        };
        let t = Transform::new(&bounds, &viewport).unwrap();
        assert!(close(t.apply(Point::new(50.0, 25.0)), Point::new(0.0, 0.0)));
        assert!(close(t.apply(Point::new(100.0, 75.0)), Point::new(100.0, 100.0)));
        assert_eq!(t.length(3.0), 6.0);
    }

    #[test]
    fn zero_extent_has_no_transform() {
        let bounds = BoundingBox::new(1.0, 1.0, 1.0, 9.0);
        assert!(Transform::new(&bounds, &ViewportState::show_all(64, 64)).is_none());
    }
}
