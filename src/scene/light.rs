use crate::geometry::{FloatType, WorldPoint};
use crate::util::{hash_mix, Color};

/// Intensity below which a light is considered not to reach a point at all.
const CAST_RADIUS_MARGIN: FloatType = 0.0005;
/// Jitter amplitude for the inclusion radius, in distance units. Softens
/// the crisp falloff circle that many identical lights would otherwise
/// produce, without growing the casting radius itself.
const CAST_RAND_ADD: u32 = 16;

/// Point light with inverse-square falloff.
#[derive(Clone, Debug)]
pub struct Light {
    pub position: WorldPoint,
    color: Color,
    luminosity: FloatType,
    shadow_cast: bool,
    /// Distance at which the intensity drops below `CAST_RADIUS_MARGIN`.
    radius: u32,
}

impl Light {
    pub fn new(color: Color, luminosity: FloatType, position: WorldPoint, shadow_cast: bool) -> Light {
        let len = (color.r * color.r + color.g * color.g + color.b * color.b).sqrt();
        let mut light = Light {
            position,
            color: color / len,
            luminosity,
            shadow_cast,
            radius: 0,
        };
        light.radius = light.distance(CAST_RADIUS_MARGIN) as u32;
        light
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn casts_shadows(&self) -> bool {
        self.shadow_cast
    }

    pub fn intensity(&self, distance: FloatType) -> FloatType {
        self.luminosity / (distance * distance)
    }

    /// Distance at which the light's intensity falls to the given value.
    pub fn distance(&self, intensity: FloatType) -> FloatType {
        (self.luminosity / intensity).sqrt()
    }

    /// Decides whether a shadow ray toward `point` is worth casting at all:
    /// the quantized Manhattan distance is compared against the
    /// illumination radius, jittered by a hash of that distance and the
    /// caller's seed so the falloff boundary does not band. The seed is a
    /// fixed function of pixel and light identity, keeping shadow edges
    /// reproducible across runs and thread counts.
    pub fn should_cast_to_point(&self, point: &WorldPoint, seed: u32) -> bool {
        let manhattan: u32 = (0..3)
            .map(|axis| (point[axis] as i32 - self.position[axis] as i32).unsigned_abs())
            .sum();
        let jitter = hash_mix(manhattan) ^ hash_mix(seed);
        manhattan < self.radius + (jitter & CAST_RAND_ADD)
    }
}
