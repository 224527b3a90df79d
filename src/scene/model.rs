use std::{fs, path::Path};

use thiserror::Error;

use crate::geometry::{
    Aabb, FloatType, Ray, SurfaceHit, Triangle, TriangleTable, VertexIdx, VertexTable, WorldPoint,
    MARGIN_PRECISE,
};
use crate::scene::octree::Octree;
use crate::scene::ray_cache::{CacheLookup, RayCache};

/// Uniform scale applied to loaded meshes, matching the integer-ish world
/// units the lighting radii are tuned for.
const OBJ_IMPORT_SCALE: FloatType = 100.0;

/// One triangle mesh with its spatial index and optional ray-coherence
/// cache. Immutable after construction, shared by reference between render
/// workers.
pub struct Model {
    vertices: VertexTable,
    triangles: TriangleTable,
    bbox: Aabb,
    octree: Octree,
    cache: Option<RayCache>,
}

impl Model {
    pub fn new(vertices: VertexTable, faces: &[[VertexIdx; 3]], cached: bool) -> Model {
        let triangles: TriangleTable = faces
            .iter()
            .map(|indices| Triangle::new(*indices, &vertices))
            .collect();
        let bbox = Aabb::from_points(vertices.iter()).unwrap_or_default();
        let octree = Octree::build(&bbox, &triangles);
        let cache = cached.then(|| RayCache::new(&bbox));

        log::info!(
            "built model: {} vertices, {} triangles, {} octree nodes",
            vertices.len(),
            triangles.len(),
            octree.node_count(),
        );

        Model {
            vertices,
            triangles,
            bbox,
            octree,
            cache,
        }
    }

    /// Loads a Wavefront OBJ file, scaling it up and flipping the Y axis to
    /// match the world's screen-like orientation.
    pub fn from_obj(p: impl AsRef<Path>, cached: bool) -> Result<Model, ObjOpenError> {
        let content = fs::read_to_string(p)?;
        let parsed = wavefront_obj::obj::parse(content)?;

        let mut vertices = VertexTable::new();
        let mut faces = Vec::new();

        for object in parsed.objects {
            let base = vertices.len();
            vertices.extend(object.vertices.iter().map(|v| {
                WorldPoint::new(
                    v.x as FloatType * OBJ_IMPORT_SCALE,
                    -v.y as FloatType * OBJ_IMPORT_SCALE,
                    v.z as FloatType * OBJ_IMPORT_SCALE,
                )
            }));

            for geometry in object.geometry {
                for shape in geometry.shapes {
                    let wavefront_obj::obj::Primitive::Triangle(a, b, c) = shape.primitive else {
                        log::warn!("skipping non-triangle primitive");
                        continue;
                    };
                    faces.push([a, b, c].map(|(v, _, _)| VertexIdx::from_usize(base + v)));
                }
            }
        }

        Ok(Model::new(vertices, &faces, cached))
    }

    pub fn bbox(&self) -> &Aabb {
        &self.bbox
    }

    /// Casts a ray against this model. Returns the hit depth and fills
    /// `hit` when something closer than `target_depth` is found.
    ///
    /// Shadow rays only need to know whether any occluder sits between the
    /// origin and the target, so they skip the cache and bail out as soon
    /// as even the bounding box lies beyond the target. Primary rays probe
    /// the cache first and record their outcome for neighbouring rays.
    pub fn ray_cast(
        &self,
        ray: &Ray,
        hit: &mut SurfaceHit,
        target_depth: FloatType,
        shadow: bool,
    ) -> Option<FloatType> {
        let (box_entry, face) = self.bbox.ray_cast_face(ray)?;

        if shadow {
            if box_entry > target_depth {
                return None;
            }
            return self
                .octree
                .nearest_hit(ray, &self.vertices, &self.triangles, hit, target_depth, true);
        }

        if let Some(cache) = &self.cache {
            match cache.lookup(
                ray,
                face,
                box_entry,
                MARGIN_PRECISE,
                &self.vertices,
                &self.triangles,
                hit,
            ) {
                CacheLookup::Miss => return None,
                CacheLookup::Hit(depth) => return Some(depth),
                CacheLookup::Invalid => {}
            }
        }

        let result =
            self.octree
                .nearest_hit(ray, &self.vertices, &self.triangles, hit, target_depth, false);

        if let Some(cache) = &self.cache {
            cache.set(ray, face, box_entry, result.and(hit.triangle));
        }

        result
    }
}

#[derive(Debug, Error)]
pub enum ObjOpenError {
    #[error("Failed to read file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse file: {0}")]
    ParseError(#[from] wavefront_obj::ParseError),
}
