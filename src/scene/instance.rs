use std::sync::Arc;

use crate::geometry::{FloatType, Ray, SurfaceHit, WorldVector};
use crate::scene::model::Model;

/// Places a shared model in the world by translation. Rotation and scale
/// are not supported, so rays move into model space by an origin offset
/// alone and every direction-derived quantity of a hit is valid unchanged
/// in world space.
pub struct ModelInstance {
    model: Arc<Model>,
    pub position: WorldVector,
}

impl ModelInstance {
    pub fn new(model: Arc<Model>, position: WorldVector) -> ModelInstance {
        ModelInstance { model, position }
    }

    pub fn ray_cast(
        &self,
        ray: &Ray,
        hit: &mut SurfaceHit,
        target_depth: FloatType,
        shadow: bool,
    ) -> Option<FloatType> {
        let local = ray.translated(&-self.position);
        self.model.ray_cast(&local, hit, target_depth, shadow)
    }
}
