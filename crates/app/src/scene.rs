//! Balloon scene data and the projectile mini-game: balloons drift on fixed
//! motion curves, projectiles fly from the camera along its look direction.

use corelib::{
    Vec3,
    camera::DEFAULT_Z_FAR,
    path::{ControlPoints, PathError},
    transform::Placement,
    vec3,
};

pub const BALLOON_RADIUS: f32 = 75.0;
pub const PROJECTILE_RADIUS: f32 = 0.5;
pub const DEFAULT_PROJECTILE_SPEED: f32 = 550.0;
/// Projectiles past the far plane are dropped.
pub const PROJECTILE_RANGE: f32 = DEFAULT_Z_FAR;
/// Balloon models are drawn at this scale.
pub const BALLOON_SCALE: f32 = 0.2;

/// Closed camera loop around the balloon field.
pub fn balloon_loop() -> Result<ControlPoints, PathError> {
    ControlPoints::from_named([
        ("P0", vec3(-8.39, -1.3, 14.41)),
        ("P1", vec3(-13.68, -1.3, 31.6)),
        ("P2", vec3(-3.49, -1.3, 26.51)),
        ("P3", vec3(6.75, -1.3, 27.27)),
        ("P4", vec3(15.99, -6.3, 27.93)),
        ("P5", vec3(28.06, -6.3, 28.03)),
        ("P6", vec3(25.48, -6.3, 10.45)),
        ("P7", vec3(22.51, -6.3, -11.47)),
        ("P8", vec3(8.73, -6.3, -51.08)),
        ("P9", vec3(-7.26, -3.3, -39.28)),
        ("P10", vec3(-21.25, -6.3, -22.87)),
        ("P11", vec3(-2.16, -6.3, -1.47)),
        ("P12", vec3(-8.39, -1.3, 14.41)),
    ])
}

/// Balloon position as a function of scene time in seconds.
pub type Motion = fn(f32) -> Vec3;

const OFFSET: f32 = 15.0;

/// Motion curves of the nine balloons.
pub const BALLOON_MOTIONS: [Motion; 9] = [
    |t| vec3(10.0, -30.0 * t.cos(), 100.0) + Vec3::splat(OFFSET),
    |t| vec3(-110.0, 0.0, -90.0 * t.cos()) + Vec3::splat(OFFSET),
    |t| vec3(-200.0 * t.cos(), 50.0, -400.0) + Vec3::splat(OFFSET),
    |t| vec3(80.0 * (t * 0.5).cos(), -70.0, -600.0) + Vec3::splat(OFFSET),
    |t| {
        vec3(
            200.0 * (t / 2.0 * 0.5).cos(),
            50.0,
            -140.0 * t.cos() * (t * 0.5).cos(),
        ) + Vec3::splat(OFFSET)
    },
    |t| vec3(-80.0 * (t * 0.5).cos(), -50.0, -500.0 * (t / 2.0).sin()) + Vec3::splat(OFFSET),
    |t| vec3(300.0, -40.0 * t.cos(), 150.0) + Vec3::splat(OFFSET),
    |t| vec3(120.0, 20.0, -125.0 * t.cos()) + Vec3::splat(OFFSET),
    |t| vec3(160.0 * (t * 0.5).cos(), -80.0, -800.0) + Vec3::splat(OFFSET),
];

#[derive(Clone, Copy, Debug)]
pub struct Balloon {
    pub position: Vec3,
    motion: Motion,
}

impl Balloon {
    pub fn new(motion: Motion) -> Self {
        Self {
            position: motion(0.0),
            motion,
        }
    }

    pub fn placement(&self) -> Placement {
        Placement::at(self.position).with_scale(BALLOON_SCALE)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projectile {
    pub position: Vec3,
    /// Unit direction.
    pub direction: Vec3,
    /// Distance flown since launch.
    pub travelled: f32,
}

#[derive(Debug)]
pub struct Arena {
    balloons: Vec<Balloon>,
    projectiles: Vec<Projectile>,
    speed: f32,
    time: f32,
    hits: usize,
}

impl Arena {
    pub fn new(balloons: Vec<Balloon>, speed: f32) -> Self {
        Self {
            balloons,
            projectiles: Vec::new(),
            speed,
            time: 0.0,
            hits: 0,
        }
    }

    /// The nine-balloon field.
    pub fn balloon_field() -> Self {
        let balloons = BALLOON_MOTIONS.iter().map(|&m| Balloon::new(m)).collect();
        Self::new(balloons, DEFAULT_PROJECTILE_SPEED)
    }

    pub fn balloons(&self) -> &[Balloon] {
        &self.balloons
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    /// Fire from `origin` along `direction`. A zero direction fires nothing.
    pub fn launch(&mut self, origin: Vec3, direction: Vec3) -> bool {
        let direction = direction.normalize_or_zero();
        if direction == Vec3::ZERO {
            log::warn!("Projectile launch with zero direction ignored");
            return false;
        }
        self.projectiles.push(Projectile {
            position: origin,
            direction,
            travelled: 0.0,
        });
        true
    }

    /// Advance scene time by `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        self.time += dt;
        let time = self.time;
        for balloon in &mut self.balloons {
            balloon.position = (balloon.motion)(time);
        }
        let distance = self.speed * dt;
        for projectile in &mut self.projectiles {
            projectile.position += projectile.direction * distance;
            projectile.travelled += distance;
        }
        self.projectiles.retain(|p| p.travelled <= PROJECTILE_RANGE);
    }

    /// Remove every projectile/balloon pair whose spheres overlap. A
    /// projectile pops at most one balloon. Returns the hits of this call.
    pub fn resolve_collisions(&mut self) -> usize {
        let mut popped = 0;
        let balloons = &mut self.balloons;
        self.projectiles.retain(|projectile| {
            let hit = balloons.iter().position(|b| {
                b.position.distance(projectile.position) < BALLOON_RADIUS + PROJECTILE_RADIUS
            });
            match hit {
                Some(index) => {
                    balloons.remove(index);
                    popped += 1;
                    false
                }
                None => true,
            }
        });
        if popped > 0 {
            log::info!(
                "{} balloon(s) popped, {} left",
                popped,
                self.balloons.len()
            );
        }
        self.hits += popped;
        popped
    }
}
