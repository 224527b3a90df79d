use std::sync::atomic::{AtomicU32, Ordering};

use crate::geometry::{
    vector_eq_margin, Aabb, Face, FloatType, Ray, SurfaceHit, TriangleIdx, TriangleTable,
    VertexTable, WorldVector,
};

/// Extra cells around the tight bounding box, tolerating rays that enter
/// slightly outside it due to floating-point slack.
const CACHE_MARGIN: FloatType = 1.0;

const STATE_INVALID: u32 = u32::MAX;
const STATE_MISS: u32 = u32::MAX - 1;

/// Per-model ray-coherence cache: one 2-D grid of cells per bounding-box
/// face, addressed by where a ray enters that face. Adjacent primary rays
/// tend to enter through the same cell with nearly the same direction, so
/// the last traversal outcome is usually reusable.
///
/// Cells are plain relaxed atomics with no cross-word consistency; the
/// grids are written lock-free from all render workers and the last writer
/// wins. A torn entry pairs a direction with a foreign outcome, which the
/// lookup's re-validation turns into a fallback to full traversal or an
/// epsilon-level depth difference, never into unsoundness.
pub struct RayCache {
    dims: [usize; 3],
    offset: WorldVector,
    grids: [Vec<CacheCell>; Face::COUNT],
}

struct CacheCell {
    direction: [AtomicU32; 3],
    state: AtomicU32,
}

impl CacheCell {
    fn empty() -> CacheCell {
        CacheCell {
            direction: [AtomicU32::new(0), AtomicU32::new(0), AtomicU32::new(0)],
            state: AtomicU32::new(STATE_INVALID),
        }
    }
}

/// Outcome of a cache probe.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum CacheLookup {
    /// No reusable entry; the caller must run the full traversal.
    Invalid,
    /// Confirmed miss recorded by an earlier identical ray.
    Miss,
    /// Re-validated hit with its exact depth for this ray.
    Hit(FloatType),
}

impl RayCache {
    pub fn new(bbox: &Aabb) -> RayCache {
        let size = bbox.size();
        let dims = std::array::from_fn(|axis| (size[axis] + 2.0 * CACHE_MARGIN) as usize);
        let offset = bbox.min.coords.map(|x| x - CACHE_MARGIN);

        let grids = std::array::from_fn(|face_index| {
            let [a1, a2] = Face::ALL[face_index].tangent_axes();
            (0..dims[a1] * dims[a2]).map(|_| CacheCell::empty()).collect()
        });

        let cells: usize = grids.iter().map(Vec::<CacheCell>::len).sum();
        log::debug!(
            "allocated ray cache of dim ({}, {}, {}) - {:.2} MB",
            dims[0],
            dims[1],
            dims[2],
            (cells * std::mem::size_of::<CacheCell>()) as f64 / 1e6,
        );

        RayCache { dims, offset, grids }
    }

    /// Probes the cell the ray enters through. A valid entry whose stored
    /// direction matches within `tolerance` yields either a confirmed miss
    /// or a re-validated hit depth; anything else is `Invalid`.
    pub fn lookup(
        &self,
        ray: &Ray,
        face: Face,
        box_entry: FloatType,
        tolerance: FloatType,
        vertices: &VertexTable,
        triangles: &TriangleTable,
        hit: &mut SurfaceHit,
    ) -> CacheLookup {
        let cell = self.cell(ray, face, box_entry);

        let state = cell.state.load(Ordering::Relaxed);
        if state == STATE_INVALID {
            return CacheLookup::Invalid;
        }

        let stored = WorldVector::from(
            cell.direction
                .each_ref()
                .map(|bits| FloatType::from_bits(bits.load(Ordering::Relaxed))),
        );
        if !vector_eq_margin(&ray.direction, &stored, tolerance) {
            return CacheLookup::Invalid;
        }

        if state == STATE_MISS {
            return CacheLookup::Miss;
        }

        // Re-run the cheap single-triangle test to get an exact depth for
        // this ray. A stale or torn triangle index that no longer lines up
        // simply fails the test and falls back to full traversal.
        let index = TriangleIdx::from_raw(state);
        match triangles
            .get(index)
            .and_then(|triangle| triangle.ray_cast(index, vertices, ray, hit))
        {
            Some(depth) => CacheLookup::Hit(depth),
            None => CacheLookup::Invalid,
        }
    }

    /// Unconditionally overwrites the cell with this ray's outcome; under
    /// concurrent writers the last one wins.
    pub fn set(&self, ray: &Ray, face: Face, box_entry: FloatType, outcome: Option<TriangleIdx>) {
        let cell = self.cell(ray, face, box_entry);

        for (bits, component) in cell.direction.iter().zip(ray.direction.iter()) {
            bits.store(component.to_bits(), Ordering::Relaxed);
        }
        let state = match outcome {
            Some(index) => index.raw(),
            None => STATE_MISS,
        };
        cell.state.store(state, Ordering::Relaxed);
    }

    /// Finds the cell by extrapolating the ray to its box entry point and
    /// projecting onto the face's tangent axes, clamped to the grid.
    fn cell(&self, ray: &Ray, face: Face, box_entry: FloatType) -> &CacheCell {
        let [a1, a2] = face.tangent_axes();
        let u = FloatType::mul_add(
            ray.direction[a1],
            box_entry,
            ray.origin[a1] - self.offset[a1],
        ) as isize;
        let v = FloatType::mul_add(
            ray.direction[a2],
            box_entry,
            ray.origin[a2] - self.offset[a2],
        ) as isize;

        let width = self.dims[a1];
        let height = self.dims[a2];
        let u = u.clamp(0, width as isize - 1) as usize;
        let v = v.clamp(0, height as isize - 1) as usize;

        &self.grids[face.index()][v * width + u]
    }
}
