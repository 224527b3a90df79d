use crate::geometry::{geq_margin, FloatType, WorldPoint, WorldVector, MARGIN_CLOSE};

#[derive(Clone, Debug, PartialEq)]
pub struct Aabb {
    pub min: WorldPoint,
    pub max: WorldPoint,
}

impl Aabb {
    pub fn new(a: WorldPoint, b: WorldPoint) -> Aabb {
        Aabb {
            min: a.coords.inf(&b.coords).into(),
            max: a.coords.sup(&b.coords).into(),
        }
    }

    /// Smallest box enclosing all the points, `None` for an empty iterator.
    pub fn from_points<'a>(mut points: impl Iterator<Item = &'a WorldPoint>) -> Option<Aabb> {
        let first = points.next()?;
        let mut result = Aabb {
            min: *first,
            max: *first,
        };
        for point in points {
            result.min = result.min.coords.inf(&point.coords).into();
            result.max = result.max.coords.sup(&point.coords).into();
        }
        Some(result)
    }

    /// Grow to enclose the other box.
    pub fn merge(&mut self, other: &Aabb) {
        self.min = self.min.coords.inf(&other.min.coords).into();
        self.max = self.max.coords.sup(&other.max.coords).into();
    }

    pub fn size(&self) -> WorldVector {
        self.max - self.min
    }

    pub fn center(&self) -> WorldPoint {
        self.min + self.size() / 2.0
    }

    /// Strict interior test, boundary points are not contained.
    pub fn contains_point(&self, point: &WorldPoint) -> bool {
        (0..3).all(|axis| point[axis] > self.min[axis] && point[axis] < self.max[axis])
    }

    /// Margin-tolerant symmetric overlap test. The tolerance keeps
    /// boundary-touching triangles shared between adjacent octree cells.
    pub fn overlap(a: &Aabb, b: &Aabb) -> bool {
        (0..3).all(|axis| {
            geq_margin(a.max[axis], b.min[axis], MARGIN_CLOSE)
                && geq_margin(b.max[axis], a.min[axis], MARGIN_CLOSE)
        })
    }
}

impl Default for Aabb {
    /// Degenerate zero-extent box at the origin.
    fn default() -> Aabb {
        Aabb {
            min: WorldPoint::origin(),
            max: WorldPoint::origin(),
        }
    }
}
