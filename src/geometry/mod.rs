mod aabb;
mod ray_box_intersection;
mod triangle;

pub use aabb::Aabb;
pub use ray_box_intersection::Face;
pub use triangle::{Triangle, TriangleIdx, TriangleTable, VertexIdx, VertexTable};

use crate::util::{Color, COLOR_WHITE};

pub type FloatType = f32;

pub type ScreenSize = nalgebra::Vector2<u32>;

pub type WorldPoint = nalgebra::Point3<FloatType>;
pub type WorldVector = nalgebra::Vector3<FloatType>;

/// Sentinel depth for a ray that has not hit anything.
pub const RAY_MISS: FloatType = FloatType::MAX;

/// Loose comparison margin for geometric accept/reject tests.
pub const MARGIN_CLOSE: FloatType = 0.01;
/// Tight comparison margin, used by the ray-coherence cache direction match.
pub const MARGIN_PRECISE: FloatType = 0.001;

pub fn geq_margin(x: FloatType, y: FloatType, margin: FloatType) -> bool {
    x + margin >= y
}

pub fn leq_margin(x: FloatType, y: FloatType, margin: FloatType) -> bool {
    x - margin <= y
}

pub fn eq_margin(x: FloatType, y: FloatType, margin: FloatType) -> bool {
    geq_margin(x, y, margin) && leq_margin(x, y, margin)
}

pub fn vector_eq_margin(a: &WorldVector, b: &WorldVector, margin: FloatType) -> bool {
    (0..3).all(|axis| eq_margin(a[axis], b[axis], margin))
}

#[derive(Copy, Clone, Debug)]
pub struct Ray {
    pub origin: WorldPoint,
    /// Normalized direction of the ray
    pub direction: WorldVector,

    /// Componentwise inverse of the ray direction.
    /// Zero direction components turn into signed infinities, which the
    /// slab test relies on instead of special-casing axis-parallel rays.
    pub inv_direction: WorldVector,
}

impl Ray {
    pub fn new(origin: WorldPoint, direction: WorldVector) -> Ray {
        let direction = direction.normalize();
        let inv_direction = direction.map(|x| 1.0 / x);

        Ray {
            origin,
            direction,
            inv_direction,
        }
    }

    pub fn point_at(&self, distance: FloatType) -> WorldPoint {
        self.origin + self.direction * distance
    }

    /// The same ray with its origin offset. Direction (and therefore the
    /// precomputed inverse) is unaffected by translation.
    pub fn translated(&self, offset: &WorldVector) -> Ray {
        Ray {
            origin: self.origin + offset,
            direction: self.direction,
            inv_direction: self.inv_direction,
        }
    }
}

/// Mutable hit state of a single query. Depth only ever decreases while a
/// query is alive; triangle, normal and diffuse always describe the surface
/// at the current depth.
#[derive(Copy, Clone, Debug)]
pub struct SurfaceHit {
    pub depth: FloatType,
    pub triangle: Option<TriangleIdx>,
    pub normal: WorldVector,
    pub diffuse: Color,
}

impl Default for SurfaceHit {
    fn default() -> SurfaceHit {
        SurfaceHit {
            depth: RAY_MISS,
            triangle: None,
            normal: WorldVector::zeros(),
            diffuse: COLOR_WHITE,
        }
    }
}
