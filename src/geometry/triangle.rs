use index_vec::IndexVec;

use crate::geometry::{
    geq_margin, Aabb, FloatType, Ray, SurfaceHit, WorldVector, MARGIN_CLOSE,
};
use crate::util::COLOR_WHITE;

index_vec::define_index_type! {
    pub struct VertexIdx = u32;
}

index_vec::define_index_type! {
    pub struct TriangleIdx = u32;
}

pub type VertexTable = IndexVec<VertexIdx, crate::geometry::WorldPoint>;
pub type TriangleTable = IndexVec<TriangleIdx, Triangle>;

/// A triangle referencing vertices in a shared vertex table, with its unit
/// normal and bounding box precomputed at construction. Immutable afterwards.
#[derive(Clone, Debug)]
pub struct Triangle {
    vertices: [VertexIdx; 3],
    normal: WorldVector,
    bbox: Aabb,
}

impl Triangle {
    pub fn new(vertices: [VertexIdx; 3], table: &VertexTable) -> Triangle {
        let [a, b, c] = vertices.map(|i| table[i]);
        let normal = (b - a).cross(&(c - a)).normalize();
        let bbox = Aabb::from_points([a, b, c].iter())
            .unwrap_or_default();

        Triangle {
            vertices,
            normal,
            bbox,
        }
    }

    pub fn vertices(&self) -> [VertexIdx; 3] {
        self.vertices
    }

    pub fn normal(&self) -> &WorldVector {
        &self.normal
    }

    pub fn bounding_box(&self) -> &Aabb {
        &self.bbox
    }

    /// Plane + same-side edge test against the ray. The hit state is
    /// updated only on a valid hit strictly closer than `hit.depth`;
    /// `index` is this triangle's slot in the model's triangle table.
    pub fn ray_cast(
        &self,
        index: TriangleIdx,
        table: &VertexTable,
        ray: &Ray,
        hit: &mut SurfaceHit,
    ) -> Option<FloatType> {
        self.bbox.ray_cast(ray)?;

        let l_dot_n = ray.direction.dot(&self.normal);
        if l_dot_n == 0.0 {
            // Parallel to the triangle's plane
            return None;
        }

        let [a, b, c] = self.vertices.map(|i| table[i]);
        let depth = (a - ray.origin).dot(&self.normal) / l_dot_n;
        if depth >= hit.depth || depth < 0.0 {
            return None;
        }

        let point = ray.point_at(depth);
        let inside = geq_margin((b - a).cross(&(point - a)).dot(&self.normal), 0.0, MARGIN_CLOSE)
            && geq_margin((c - b).cross(&(point - b)).dot(&self.normal), 0.0, MARGIN_CLOSE)
            && geq_margin((a - c).cross(&(point - c)).dot(&self.normal), 0.0, MARGIN_CLOSE);
        if !inside {
            return None;
        }

        hit.depth = depth;
        hit.triangle = Some(index);
        hit.normal = self.normal;
        hit.diffuse = COLOR_WHITE;
        Some(depth)
    }
}
