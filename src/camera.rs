use bon::bon;

use crate::geometry::{FloatType, Ray, ScreenSize, WorldPoint, WorldVector};
use crate::scene::Scene;
use crate::util::hash_mix;

/// Orthographic camera: one parallel ray per pixel, all sharing a fixed
/// oblique viewing direction. The slight x/y tilt keeps axis-aligned
/// geometry from degenerating into single-pixel-wide silhouettes.
#[derive(Copy, Clone, Debug)]
pub struct Camera {
    pub position: WorldPoint,
    resolution: ScreenSize,
}

#[bon]
impl Camera {
    #[builder]
    pub fn new(position: WorldPoint, resolution: ScreenSize) -> Self {
        Camera { position, resolution }
    }

    pub fn resolution(&self) -> ScreenSize {
        self.resolution
    }

    /// The ray for a pixel starts at the camera position offset by the
    /// screen-centered pixel coordinates. The position is truncated to
    /// whole units first so sub-unit camera drift never shifts the ray
    /// grid, which would invalidate the models' ray-coherence caches on
    /// every frame.
    pub fn primary_ray(&self, x: u32, y: u32) -> Ray {
        let origin = WorldPoint::new(
            self.position.x.trunc() + (x as FloatType) - ((self.resolution.x / 2) as FloatType),
            self.position.y.trunc() + (y as FloatType) - ((self.resolution.y / 2) as FloatType),
            self.position.z,
        );
        Ray::new(origin, WorldVector::new(0.1, -0.2, -1.0))
    }

    pub fn render_pixel(&self, scene: &Scene, x: u32, y: u32) -> u32 {
        scene.render_ray(&self.primary_ray(x, y), pixel_seed(x, y))
    }
}

/// Per-pixel jitter seed. A pure function of the coordinates, so a pixel
/// shades identically no matter which worker thread picks it up.
fn pixel_seed(x: u32, y: u32) -> u32 {
    hash_mix(x ^ hash_mix(y))
}

#[cfg(test)]
mod test {
    use super::*;
    use assert2::assert;

    fn camera_at(x: FloatType, y: FloatType, z: FloatType) -> Camera {
        Camera::builder()
            .position(WorldPoint::new(x, y, z))
            .resolution(ScreenSize::new(640, 480))
            .build()
    }

    #[test]
    fn center_pixel_starts_at_the_camera() {
        let camera = camera_at(100.7, 50.2, 30.0);
        let ray = camera.primary_ray(320, 240);
        assert!(ray.origin == WorldPoint::new(100.0, 50.0, 30.0));
    }

    #[test]
    fn pixel_offsets_are_screen_centered() {
        let camera = camera_at(0.0, 0.0, 0.0);
        let top_left = camera.primary_ray(0, 0);
        let bottom_right = camera.primary_ray(639, 479);
        assert!(top_left.origin == WorldPoint::new(-320.0, -240.0, 0.0));
        assert!(bottom_right.origin == WorldPoint::new(319.0, 239.0, 0.0));
    }

    #[test]
    fn all_rays_share_one_direction() {
        let camera = camera_at(5.0, 5.0, 5.0);
        let a = camera.primary_ray(0, 0);
        let b = camera.primary_ray(600, 400);
        assert!(a.direction == b.direction);
        assert!((a.direction.norm() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn sub_unit_camera_drift_does_not_move_rays() {
        let a = camera_at(100.2, 50.9, 30.0).primary_ray(17, 23);
        let b = camera_at(100.7, 50.1, 30.0).primary_ray(17, 23);
        assert!(a.origin == b.origin);
    }

    #[test]
    fn pixel_seeds_differ_between_neighbours() {
        assert!(pixel_seed(10, 10) != pixel_seed(11, 10));
        assert!(pixel_seed(10, 10) != pixel_seed(10, 11));
        // x and y are not interchangeable
        assert!(pixel_seed(3, 8) != pixel_seed(8, 3));
    }
}
