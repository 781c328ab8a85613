use crate::ir::Point;

/// Filled triangle for a directed edge end, tip first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arrowhead {
    pub tip: Point,
    pub barbs: [Point; 2],
}

impl Arrowhead {
    pub fn vertices(&self) -> [Point; 3] {
        [self.tip, self.barbs[0], self.barbs[1]]
    }
}

/// Arrowhead whose point is at `to`, lying along the segment from `from`.
/// The base is `size` back from the tip and `size / 2` wide. Computed in
/// pixel space so non-uniform viewport scaling does not skew it.
///
/// Returns `None` for a zero-length segment.
pub fn arrowhead(from: Point, to: Point, size: f64) -> Option<Arrowhead> {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let len = dx.hypot(dy);
    if len == 0.0 || !len.is_finite() {
        return None;
    }
    let (nx, ny) = (dx / len, dy / len);
    let (bnx, bny) = (-ny, nx);

    let bcx = to.x - size * nx;
    let bcy = to.y - size * ny;
    let half = size / 4.0;
    Some(Arrowhead {
        tip: to,
        barbs: [
            Point::new(bcx + half * bnx, bcy + half * bny),
            Point::new(bcx - half * bnx, bcy - half * bny),
        ],
    })
}
