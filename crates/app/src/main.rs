//! Entry point for the flythrough demo.
//! Headless frame driver: loads the model, then runs the camera along the
//! Bézier path for a fixed number of frames and logs what a renderer would
//! consume each frame.

mod config;
mod scene;

use std::fs;

use anyhow::{Context, Result};
use asset::{
    attributes::{AttributeName, VertexAttribute},
    model::Model,
    mtl::Shading,
};
use corelib::{
    Vec3,
    camera::Camera,
    clock::{ClockMode, PathClock},
    path::{BezierPath, ControlPoints},
    transform::Placement,
};

use crate::{config::AppConfig, scene::Arena};

fn load_control_points(config: &AppConfig) -> Result<ControlPoints> {
    match &config.path_file {
        Some(file) => {
            let text = fs::read_to_string(file)
                .with_context(|| format!("Failed to read control points: {}", file.display()))?;
            ControlPoints::parse(&text)
                .with_context(|| format!("Invalid control point table: {}", file.display()))
        }
        None => Ok(scene::balloon_loop()?),
    }
}

fn report_model(model: &Model) -> Placement {
    for part in &model.parts {
        let vertices = match part.attributes.get(&AttributeName::Position) {
            Some(VertexAttribute::Buffer { data, .. }) => data.len() / 3,
            _ => 0,
        };
        let constants = part
            .attributes
            .iter()
            .filter(|(_, attr)| attr.is_constant())
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>();
        log::info!(
            "Part {}: {} vertices, diffuse {:?}, constant attributes {:?}",
            part.name,
            vertices,
            part.material.diffuse,
            constants
        );
    }
    let offset = model.center_offset();
    log::info!("Model extents {:?}, centering offset {:?}", model.extents(), offset);
    Placement::at(Vec3::from_array(offset))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_args(std::env::args().skip(1));
    log::info!(
        "Starting flythrough. duration={}s, frames={}, mode={:?}, policy={:?}, scale={}, size={}x{}",
        config.duration_secs,
        config.frames,
        config.mode,
        config.policy,
        config.scale,
        config.width,
        config.height
    );

    let path = BezierPath::new(load_control_points(&config)?)
        .with_scale(config.scale)
        .with_policy(config.policy);
    log::info!(
        "Camera path: {} segments, ~{:.1} units long",
        path.segment_count(),
        path.approximate_length(256)?
    );

    let world = match &config.obj {
        Some(obj) => report_model(&Model::load(obj, &Shading::default())?),
        None => Placement::identity(),
    };

    let clock = PathClock::new(config.duration_secs, config.mode);
    let dt = clock.duration_secs() / config.frames as f32;
    // A one-shot run also renders the frame at t = 1.
    let frames = match config.mode {
        ClockMode::Looping => config.frames,
        ClockMode::Once => config.frames + 1,
    };
    let shot_every = (config.shots > 0).then(|| (frames / config.shots).max(1));

    let mut camera = Camera::on_path(&path, 0.0, config.aspect())?;
    let mut arena = Arena::balloon_field();
    let mut fired = 0;

    for frame in 0..frames {
        let elapsed = frame as f32 * dt;
        let t = clock.t_at(elapsed);
        camera.follow(&path, t)?;
        let world_view = camera.view() * world.matrix();
        log::info!(
            "frame {:>3} t={:.3} eye={:.2?} target={:.2?} origin_in_view={:.2?}",
            frame,
            t,
            camera.eye.to_array(),
            camera.target.to_array(),
            world_view.transform_point3(Vec3::ZERO).to_array()
        );

        if let Some(every) = shot_every {
            if fired < config.shots && frame % every == 0 && arena.launch(camera.eye, camera.forward()) {
                fired += 1;
            }
        }
        arena.step(dt);
        arena.resolve_collisions();

        if clock.finished(elapsed) {
            log::info!("Path finished at frame {}", frame);
            break;
        }
    }

    for balloon in arena.balloons() {
        log::debug!("balloon world matrix {:?}", balloon.placement().matrix());
    }
    log::info!(
        "Done: {} projectiles fired ({} in flight), {} balloons hit, {} left.",
        fired,
        arena.projectiles().len(),
        arena.hits(),
        arena.balloons().len()
    );
    Ok(())
}
