use crate::camera::Camera;
use crate::geometry::ScreenSize;
use crate::parallel_for_each::{parallel_map, WorkerCount};
use crate::scene::Scene;

/// One finished frame of packed `0xRRGGBB00` pixels in row-major order.
pub struct FrameBuffer {
    resolution: ScreenSize,
    pixels: Vec<u32>,
}

impl FrameBuffer {
    pub fn resolution(&self) -> ScreenSize {
        self.resolution
    }

    pub fn pixel(&self, x: u32, y: u32) -> u32 {
        self.pixels[(y * self.resolution.x + x) as usize]
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }
}

/// Renders a full frame, one screen row per work item. Rows are claimed
/// dynamically by the workers, so rows covering dense geometry do not stall
/// the frame behind a static partition.
pub fn render_frame(scene: &Scene, camera: &Camera, worker_count: WorkerCount) -> FrameBuffer {
    let resolution = camera.resolution();

    let start = std::time::Instant::now();
    let rows = parallel_map(resolution.y as usize, worker_count, |y| {
        (0..resolution.x)
            .map(|x| camera.render_pixel(scene, x, y as u32))
            .collect::<Vec<u32>>()
    });
    log::info!(
        "rendered {}x{} frame in {:.1?}",
        resolution.x,
        resolution.y,
        start.elapsed(),
    );

    FrameBuffer {
        resolution,
        pixels: rows.into_iter().flatten().collect(),
    }
}
