use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use indicatif::ProgressBar;

use octoray::geometry::{ScreenSize, VertexIdx, VertexTable, WorldPoint, WorldVector};
use octoray::parallel_for_each::WorkerCount;
use octoray::scene::{Light, Model, ModelInstance};
use octoray::util::Color;
use octoray::{render_frame, Camera, Scene};

const OUTPUT_PATH: &str = "render.png";

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let model = match std::env::args().nth(1) {
        Some(path) => {
            Arc::new(Model::from_obj(&path, true).with_context(|| format!("loading {path}"))?)
        }
        None => {
            log::info!("no model given, rendering the built-in cube scene");
            Arc::new(cube_model(10.0))
        }
    };

    let mut scene = Scene::new();
    scene.add_model_instance(ModelInstance::new(model.clone(), WorldVector::zeros()));
    scene.add_model_instance(ModelInstance::new(
        model.clone(),
        WorldVector::new(-35.0, 0.0, 0.0),
    ));
    scene.add_model_instance(ModelInstance::new(
        model,
        WorldVector::new(40.0, 15.0, -20.0),
    ));
    scene.add_light(Light::new(
        Color {
            r: 1.0,
            g: 1.0,
            b: 1.0,
        },
        200_000.0,
        WorldPoint::new(150.0, -120.0, 100.0),
        true,
    ));
    scene.add_light(Light::new(
        Color {
            r: 1.0,
            g: 0.8,
            b: 0.6,
        },
        100_000.0,
        WorldPoint::new(-200.0, 50.0, 120.0),
        false,
    ));

    let camera = Camera::builder()
        .position(WorldPoint::new(-10.0, 20.0, 100.0))
        .resolution(ScreenSize::new(1024, 768))
        .build();

    let bar = ProgressBar::new_spinner().with_message("rendering");
    bar.enable_steady_tick(Duration::from_millis(100));
    let frame = render_frame(&scene, &camera, WorkerCount::Auto);
    bar.finish_and_clear();

    save_png(&frame, OUTPUT_PATH)?;
    println!("wrote {OUTPUT_PATH}");

    Ok(())
}

/// An axis-aligned cube spanning [-half, half] on every axis, with outward
/// normals.
fn cube_model(half: f32) -> Model {
    let vertices: VertexTable = [
        WorldPoint::new(-half, -half, -half),
        WorldPoint::new(half, -half, -half),
        WorldPoint::new(half, half, -half),
        WorldPoint::new(-half, half, -half),
        WorldPoint::new(-half, -half, half),
        WorldPoint::new(half, -half, half),
        WorldPoint::new(half, half, half),
        WorldPoint::new(-half, half, half),
    ]
    .into_iter()
    .collect();

    let quads: [[usize; 4]; 6] = [
        [4, 5, 6, 7], // +z
        [1, 0, 3, 2], // -z
        [1, 2, 6, 5], // +x
        [0, 4, 7, 3], // -x
        [3, 7, 6, 2], // +y
        [0, 1, 5, 4], // -y
    ];
    let faces: Vec<[VertexIdx; 3]> = quads
        .iter()
        .flat_map(|&[a, b, c, d]| [[a, b, c], [a, c, d]])
        .map(|triangle| triangle.map(VertexIdx::from_usize))
        .collect();

    Model::new(vertices, &faces, true)
}

fn save_png(frame: &octoray::FrameBuffer, path: &str) -> anyhow::Result<()> {
    let resolution = frame.resolution();
    // 0xRRGGBB00 to big-endian RGBA bytes with full alpha
    let rgba: Vec<u32> = frame.pixels().iter().map(|&p| (p | 0xFF).to_be()).collect();
    let bytes: &[u8] = bytemuck::cast_slice(&rgba);

    let image = image::RgbaImage::from_raw(resolution.x, resolution.y, bytes.to_vec())
        .context("pixel buffer does not match the camera resolution")?;
    image.save(path).with_context(|| format!("writing {path}"))?;
    Ok(())
}
