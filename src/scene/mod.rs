mod instance;
mod light;
mod model;
mod octree;
mod ray_cache;

pub use instance::ModelInstance;
pub use light::Light;
pub use model::{Model, ObjOpenError};
pub use octree::Octree;
pub use ray_cache::{CacheLookup, RayCache};

use crate::geometry::{eq_margin, FloatType, Ray, SurfaceHit, MARGIN_CLOSE, RAY_MISS};
use crate::util::Color;

/// Pixel returned for rays that hit nothing, `0xRRGGBB00`.
const BACKGROUND_COLOR: u32 = 0x1F1F_1F00;

/// World contents: model instances and lights. Populated once, then shared
/// read-only between render workers.
#[derive(Default)]
pub struct Scene {
    instances: Vec<ModelInstance>,
    lights: Vec<Light>,
}

impl Scene {
    pub fn new() -> Scene {
        Scene::default()
    }

    pub fn add_model_instance(&mut self, instance: ModelInstance) {
        self.instances.push(instance);
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    /// Nearest hit below `target_depth` over all instances. Shadow queries
    /// return the first occluder found, which need not be the nearest.
    pub fn ray_cast(
        &self,
        ray: &Ray,
        hit: &mut SurfaceHit,
        target_depth: FloatType,
        shadow: bool,
    ) -> Option<FloatType> {
        let mut best = None;
        for instance in &self.instances {
            if let Some(depth) = instance.ray_cast(ray, hit, target_depth, shadow) {
                if depth < best.unwrap_or(target_depth) {
                    best = Some(depth);
                }
                if shadow && best.is_some() {
                    return best;
                }
            }
        }
        best
    }

    /// Shades one primary ray into a packed `0xRRGGBB00` pixel.
    ///
    /// `seed` feeds the per-light inclusion jitter; deriving it from pixel
    /// coordinates keeps repeated renders of a static scene identical
    /// regardless of how rays are distributed over worker threads.
    pub fn render_ray(&self, ray: &Ray, seed: u32) -> u32 {
        let mut hit = SurfaceHit::default();
        let Some(depth) = self.ray_cast(ray, &mut hit, RAY_MISS, false) else {
            return BACKGROUND_COLOR;
        };
        let point = ray.point_at(depth);

        // The surface's own diffuse seeds the accumulator, so it keeps
        // biasing the hue after normalization even under saturated lights.
        let mut color = hit.diffuse;
        let mut luminance: FloatType = 0.0;

        for (index, light) in self.lights.iter().enumerate() {
            if !light.should_cast_to_point(&point, seed.wrapping_add(index as u32)) {
                continue;
            }

            let to_light = light.position - point;
            let len = to_light.norm();

            if light.casts_shadows() {
                let light_ray = Ray::new(light.position, -to_light);
                let mut shadow_hit = SurfaceHit::default();
                match self.ray_cast(&light_ray, &mut shadow_hit, len, true) {
                    // The traversal reaching the shaded point itself means
                    // nothing sits in between.
                    Some(occluder) if !eq_margin(occluder, len, MARGIN_CLOSE) => continue,
                    _ => {}
                }
            }

            let incidence = hit.normal.dot(&(to_light / len)).max(0.0);
            let contribution = incidence * light.intensity(len);
            color += light.color() * contribution;
            luminance += contribution;
        }

        if luminance <= 0.0 {
            return 0;
        }

        let norm = (color.r * color.r + color.g * color.g + color.b * color.b).sqrt();
        pack_color(color / norm * luminance)
    }
}

/// Clamps each channel to [0, 1] and packs into `0xRRGGBB00`.
fn pack_color(color: Color) -> u32 {
    let channel = |x: FloatType| (x.clamp(0.0, 1.0) * 255.0) as u32;
    channel(color.r) << 24 | channel(color.g) << 16 | channel(color.b) << 8
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geometry::{VertexIdx, VertexTable, WorldPoint, WorldVector};
    use assert2::assert;
    use std::sync::Arc;

    /// A quad in the z = 0 plane spanning [0, 10]^2, normal toward -z.
    fn quad_facing_camera(cached: bool) -> Arc<Model> {
        let vertices: VertexTable = [
            WorldPoint::new(0.0, 0.0, 0.0),
            WorldPoint::new(10.0, 0.0, 0.0),
            WorldPoint::new(10.0, 10.0, 0.0),
            WorldPoint::new(0.0, 10.0, 0.0),
        ]
        .into_iter()
        .collect();
        let index = VertexIdx::from_usize;
        let faces = [
            [index(0), index(2), index(1)],
            [index(0), index(3), index(2)],
        ];
        Arc::new(Model::new(vertices, &faces, cached))
    }

    /// A small quad in the z = 0 plane spanning [0, 6] x [-3, 3], normal
    /// toward -z. Positioned via its instance to block a light path.
    fn blocker() -> Arc<Model> {
        let vertices: VertexTable = [
            WorldPoint::new(0.0, -3.0, 0.0),
            WorldPoint::new(6.0, -3.0, 0.0),
            WorldPoint::new(6.0, 3.0, 0.0),
            WorldPoint::new(0.0, 3.0, 0.0),
        ]
        .into_iter()
        .collect();
        let index = VertexIdx::from_usize;
        let faces = [
            [index(0), index(2), index(1)],
            [index(0), index(3), index(2)],
        ];
        Arc::new(Model::new(vertices, &faces, false))
    }

    fn white() -> Color {
        Color {
            r: 1.0,
            g: 1.0,
            b: 1.0,
        }
    }

    fn primary_ray() -> Ray {
        Ray::new(
            WorldPoint::new(5.0, 5.0, -30.0),
            WorldVector::new(0.0, 0.0, 1.0),
        )
    }

    fn lit_scene() -> Scene {
        let mut scene = Scene::new();
        scene.add_model_instance(ModelInstance::new(
            quad_facing_camera(false),
            WorldVector::zeros(),
        ));
        scene.add_light(Light::new(
            white(),
            150_000.0,
            WorldPoint::new(25.0, 5.0, -20.0),
            true,
        ));
        scene
    }

    #[test]
    fn miss_renders_the_background() {
        let scene = lit_scene();
        let ray = Ray::new(
            WorldPoint::new(500.0, 500.0, -30.0),
            WorldVector::new(0.0, 0.0, 1.0),
        );
        assert!(scene.render_ray(&ray, 0) == BACKGROUND_COLOR);
    }

    #[test]
    fn unobstructed_point_is_lit() {
        let scene = lit_scene();
        let pixel = scene.render_ray(&primary_ray(), 0);
        assert!(pixel != BACKGROUND_COLOR);
        assert!(pixel != 0);
    }

    #[test]
    fn occluded_point_is_dark() {
        let mut scene = Scene::new();
        // Between the light at (25, 5, -20) and the shaded point (5, 5, 0),
        // centered on the path's midpoint (15, 5, -10). Listed first so the
        // shadow query cannot stop at the shaded surface itself.
        scene.add_model_instance(ModelInstance::new(
            blocker(),
            WorldVector::new(12.0, 5.0, -10.0),
        ));
        scene.add_model_instance(ModelInstance::new(
            quad_facing_camera(false),
            WorldVector::zeros(),
        ));
        scene.add_light(Light::new(
            white(),
            150_000.0,
            WorldPoint::new(25.0, 5.0, -20.0),
            true,
        ));

        assert!(scene.render_ray(&primary_ray(), 0) == 0);
    }

    #[test]
    fn non_shadow_casting_light_ignores_occluders() {
        let mut scene = Scene::new();
        scene.add_model_instance(ModelInstance::new(
            quad_facing_camera(false),
            WorldVector::zeros(),
        ));
        scene.add_light(Light::new(
            white(),
            150_000.0,
            WorldPoint::new(25.0, 5.0, -20.0),
            false,
        ));
        scene.add_model_instance(ModelInstance::new(
            blocker(),
            WorldVector::new(12.0, 5.0, -10.0),
        ));

        assert!(scene.render_ray(&primary_ray(), 0) != 0);
    }

    #[test]
    fn surface_facing_away_from_the_light_is_dark() {
        let mut scene = Scene::new();
        scene.add_model_instance(ModelInstance::new(
            quad_facing_camera(false),
            WorldVector::zeros(),
        ));
        // Behind the quad relative to its normal
        scene.add_light(Light::new(
            white(),
            150_000.0,
            WorldPoint::new(5.0, 5.0, 20.0),
            false,
        ));

        assert!(scene.render_ray(&primary_ray(), 0) == 0);
    }

    #[test]
    fn diffuse_keeps_biasing_the_hue_under_a_saturated_light() {
        let mut scene = Scene::new();
        scene.add_model_instance(ModelInstance::new(
            quad_facing_camera(false),
            WorldVector::zeros(),
        ));
        // Pure red light straight along the quad's normal, tuned so the
        // contribution stays around 1 and no channel clips to full scale
        scene.add_light(Light::new(
            Color {
                r: 1.0,
                g: 0.0,
                b: 0.0,
            },
            1600.0,
            WorldPoint::new(5.0, 5.0, -40.0),
            false,
        ));

        let pixel = scene.render_ray(&primary_ray(), 0);
        let red = pixel >> 24 & 0xFF;
        let green = pixel >> 16 & 0xFF;
        let blue = pixel >> 8 & 0xFF;

        // The white surface leaves some of every channel in the mix; the
        // red light still dominates.
        assert!(green > 0 && blue > 0);
        assert!(red > green);
        assert!(green == blue);
    }

    #[test]
    fn rendering_is_idempotent() {
        let mut scene = Scene::new();
        scene.add_model_instance(ModelInstance::new(
            quad_facing_camera(true),
            WorldVector::zeros(),
        ));
        scene.add_light(Light::new(
            white(),
            150_000.0,
            WorldPoint::new(25.0, 5.0, -20.0),
            true,
        ));

        // Repeats cover both the cold and the warm cache path
        let first = scene.render_ray(&primary_ray(), 7);
        let second = scene.render_ray(&primary_ray(), 7);
        let third = scene.render_ray(&primary_ray(), 7);
        assert!(first == second);
        assert!(second == third);
    }

    #[test]
    fn packing_layout() {
        assert!(
            pack_color(Color {
                r: 1.0,
                g: 0.0,
                b: 0.0
            }) == 0xFF00_0000
        );
        assert!(
            pack_color(Color {
                r: 0.0,
                g: 1.0,
                b: 1.0
            }) == 0x00FF_FF00
        );
        // Out-of-range channels clamp instead of wrapping
        assert!(
            pack_color(Color {
                r: 7.0,
                g: -1.0,
                b: 0.0
            }) == 0xFF00_0000
        );
    }
}
