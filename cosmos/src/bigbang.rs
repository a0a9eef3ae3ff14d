//! Looping "Big Bang" sequence: explosion, nebula, star formation and a
//! small solar system, each with its own population.
//!
//! Per-frame constants (speeds, decay rates) are expressed per reference
//! frame at 60 fps and scaled by [`frames`]; lengths were authored for an
//! 800-pixel-tall viewport and are scaled to the mounted surface.

use std::f32::consts::{PI, TAU};

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::canvas::Canvas;
use crate::color::Rgb;
use crate::particle::{frames, Particle};
use crate::view::Scene;

pub const EXPLOSION_PARTICLES: usize = 500;
pub const NEBULA_MOTES: usize = 200;
pub const FORMING_STARS: usize = 150;

const REFERENCE_EXTENT: f32 = 800.0;
const FLASH_SECS: f32 = 0.5;
const EXPLOSION_DECAY: f32 = 0.005;
const NEBULA_PULL: f32 = 0.01;
const NEBULA_PULL_MIN_DIST: f32 = 50.0;
const NEBULA_FADE: f32 = 0.002;
const STAR_RAMP: f32 = 0.01;
const MAX_FORMATION_DELAY: f32 = 2.0;
const SUN_MAX_RADIUS: f32 = 40.0;
const SUN_GROW_SECS: f32 = 2.0;
const PLANETS_APPEAR_SECS: f32 = 1.0;

const BACKDROP: Rgb = Rgb::hex("#05050F");
const BACKDROP_ALPHA: f32 = 0.1;
const HOT: [Rgb; 5] = [
    Rgb::hex("#FFD700"),
    Rgb::hex("#FF6B35"),
    Rgb::hex("#F7931E"),
    Rgb::hex("#FFFFFF"),
    Rgb::hex("#FFA500"),
];
const NEBULA: [Rgb; 4] = [
    Rgb::hex("#9370DB"),
    Rgb::hex("#8A2BE2"),
    Rgb::hex("#4B0082"),
    Rgb::hex("#6A5ACD"),
];
const GOLD: Rgb = Rgb::hex("#FFD700");
const ORBIT: Rgb = Rgb::new(100, 100, 150);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Explosion,
    Nebula,
    StarFormation,
    SolarSystem,
}

impl Phase {
    pub const ALL: [Phase; 4] = [
        Phase::Explosion,
        Phase::Nebula,
        Phase::StarFormation,
        Phase::SolarSystem,
    ];

    /// Seconds.
    pub fn duration(self) -> f32 {
        match self {
            Phase::Explosion => 3.0,
            Phase::Nebula => 4.0,
            Phase::StarFormation => 5.0,
            Phase::SolarSystem => 10.0,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Phase::Explosion => 0,
            Phase::Nebula => 1,
            Phase::StarFormation => 2,
            Phase::SolarSystem => 3,
        }
    }

    pub fn next(self) -> Phase {
        Phase::ALL[(self.index() + 1) % Phase::ALL.len()]
    }

    pub fn name(self) -> &'static str {
        match self {
            Phase::Explosion => "explosion",
            Phase::Nebula => "nebula",
            Phase::StarFormation => "star formation",
            Phase::SolarSystem => "solar system",
        }
    }

    /// Seconds from the start of the cycle to the start of this phase.
    pub fn start(self) -> f32 {
        Phase::ALL[..self.index()].iter().map(|p| p.duration()).sum()
    }
}

pub fn cycle_length() -> f32 {
    Phase::ALL.iter().map(|p| p.duration()).sum()
}

/// Active phase and time into it, `elapsed` seconds after the cycle began.
/// The sequence wraps, so any non-negative time is valid.
pub fn phase_at(elapsed: f32) -> (Phase, f32) {
    let e = elapsed.max(0.0) % cycle_length();
    let mut start = 0.0;
    for p in Phase::ALL {
        let end = start + p.duration();
        if e < end {
            return (p, e - start);
        }
        start = end;
    }
    (Phase::Explosion, 0.0)
}

#[derive(Clone, Copy, Debug)]
pub struct FormingStar {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub color: Rgb,
    pub alpha: f32,
    /// Seconds into star formation before this star starts to shine.
    pub delay: f32,
}

#[derive(Clone, Copy, Debug)]
pub struct Sun {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub max_radius: f32,
}

#[derive(Clone, Copy, Debug)]
pub struct Planet {
    pub angle: f32,
    pub distance: f32,
    pub size: f32,
    pub color: Rgb,
    /// Radians per reference frame.
    pub speed: f32,
}

pub fn default_planets() -> Vec<Planet> {
    let p = |angle: f32, distance: f32, size: f32, hex: &str, speed: f32| Planet {
        angle,
        distance,
        size,
        color: Rgb::hex(hex),
        speed,
    };
    vec![
        p(0.0, 80.0, 8.0, "#8B7355", 0.02),
        p(PI / 3.0, 110.0, 12.0, "#FFA500", 0.015),
        p(PI, 150.0, 14.0, "#4169E1", 0.01),
        p(PI * 1.5, 190.0, 10.0, "#CD5C5C", 0.008),
        p(PI / 6.0, 280.0, 28.0, "#DAA520", 0.005),
        p(PI * 0.8, 350.0, 24.0, "#F4A460", 0.004),
    ]
}

/// Population owned by the active phase.
#[derive(Clone, Debug)]
pub enum Stage {
    Explosion {
        particles: Vec<Particle>,
    },
    Nebula {
        motes: Vec<Particle>,
    },
    StarFormation {
        nebula: Vec<Particle>,
        stars: Vec<FormingStar>,
    },
    SolarSystem {
        stars: Vec<FormingStar>,
        sun: Sun,
        planets: Vec<Planet>,
    },
}

impl Stage {
    pub fn phase(&self) -> Phase {
        match self {
            Stage::Explosion { .. } => Phase::Explosion,
            Stage::Nebula { .. } => Phase::Nebula,
            Stage::StarFormation { .. } => Phase::StarFormation,
            Stage::SolarSystem { .. } => Phase::SolarSystem,
        }
    }

    /// Number of simulated entities.
    pub fn population(&self) -> usize {
        match self {
            Stage::Explosion { particles } => particles.len(),
            Stage::Nebula { motes } => motes.len(),
            Stage::StarFormation { nebula, stars } => nebula.len() + stars.len(),
            Stage::SolarSystem { stars, planets, .. } => stars.len() + planets.len() + 1,
        }
    }
}

pub struct BigBang {
    rng: StdRng,
    width: f32,
    height: f32,
    scale: f32,
    /// Seconds into the current cycle.
    elapsed: f32,
    /// Seconds since the animation started, never reset.
    clock: f32,
    last_frames: f32,
    stage: Stage,
}

impl BigBang {
    pub fn new(seed: u64) -> Self {
        BigBang {
            rng: StdRng::seed_from_u64(seed),
            width: 0.0,
            height: 0.0,
            scale: 1.0,
            elapsed: 0.0,
            clock: 0.0,
            last_frames: 1.0,
            stage: Stage::Explosion { particles: Vec::new() },
        }
    }

    pub fn phase(&self) -> Phase {
        self.stage.phase()
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn phase_elapsed(&self) -> f32 {
        self.elapsed - self.phase().start()
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    /// Surface-to-authoring scale applied to lengths and speeds.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    fn centre(&self) -> (f32, f32) {
        (self.width * 0.5, self.height * 0.5)
    }

    /// Restarts the cycle at the explosion.
    pub fn restart(&mut self) {
        self.elapsed = 0.0;
        self.stage = Stage::Explosion {
            particles: self.explosion_particles(),
        };
    }

    fn explosion_particles(&mut self) -> Vec<Particle> {
        let (cx, cy) = self.centre();
        let s = self.scale;
        (0..EXPLOSION_PARTICLES)
            .map(|_| {
                let angle = self.rng.gen_range(0.0..TAU);
                let speed = self.rng.gen_range(1.0..4.0_f32) * s;
                Particle {
                    x: cx,
                    y: cy,
                    vx: angle.cos() * speed,
                    vy: angle.sin() * speed,
                    size: self.rng.gen_range(1.0..4.0_f32) * s,
                    color: HOT[self.rng.gen_range(0..HOT.len())],
                    alpha: 1.0,
                    life: 1.0,
                }
            })
            .collect()
    }

    fn nebula_motes(&mut self) -> Vec<Particle> {
        let (cx, cy) = self.centre();
        let s = self.scale;
        let reach = self.width.min(self.height) * 0.4;
        (0..NEBULA_MOTES)
            .map(|_| {
                let angle = self.rng.gen_range(0.0..TAU);
                let distance = self.rng.gen::<f32>() * reach;
                Particle {
                    x: cx + angle.cos() * distance,
                    y: cy + angle.sin() * distance,
                    vx: self.rng.gen_range(-0.25..0.25_f32) * s,
                    vy: self.rng.gen_range(-0.25..0.25_f32) * s,
                    size: self.rng.gen_range(10.0..30.0_f32) * s,
                    color: NEBULA[self.rng.gen_range(0..NEBULA.len())],
                    alpha: 0.3,
                    life: 1.0,
                }
            })
            .collect()
    }

    fn forming_stars(&mut self) -> Vec<FormingStar> {
        let (w, h) = (self.width.max(1.0), self.height.max(1.0));
        (0..FORMING_STARS)
            .map(|_| FormingStar {
                x: self.rng.gen_range(0.0..w),
                y: self.rng.gen_range(0.0..h),
                size: self.rng.gen_range(0.5..2.5_f32),
                color: if self.rng.gen::<f32>() > 0.7 { GOLD } else { Rgb::WHITE },
                alpha: 0.0,
                delay: self.rng.gen_range(0.0..MAX_FORMATION_DELAY),
            })
            .collect()
    }

    /// Runs the one-time construction step of the phase after the current one.
    fn enter_next(&mut self) {
        let placeholder = Stage::Explosion { particles: Vec::new() };
        let next = match std::mem::replace(&mut self.stage, placeholder) {
            Stage::Explosion { .. } => Stage::Nebula {
                motes: self.nebula_motes(),
            },
            Stage::Nebula { motes } => Stage::StarFormation {
                nebula: motes,
                stars: self.forming_stars(),
            },
            Stage::StarFormation { stars, .. } => {
                let (cx, cy) = self.centre();
                let s = self.scale;
                let planets = default_planets()
                    .into_iter()
                    .map(|p| Planet {
                        distance: p.distance * s,
                        size: p.size * s,
                        ..p
                    })
                    .collect();
                Stage::SolarSystem {
                    stars,
                    sun: Sun {
                        x: cx,
                        y: cy,
                        radius: 0.0,
                        max_radius: SUN_MAX_RADIUS * s,
                    },
                    planets,
                }
            }
            Stage::SolarSystem { .. } => Stage::Explosion {
                particles: self.explosion_particles(),
            },
        };
        self.stage = next;
        tracing::debug!(phase = self.stage.phase().name(), "big bang phase change");
    }

    fn step(&mut self, f: f32) {
        let (cx, cy) = self.centre();
        let s = self.scale;
        let phase_elapsed = self.phase_elapsed();
        let clock = self.clock;
        match &mut self.stage {
            Stage::Explosion { particles } => {
                for p in particles.iter_mut() {
                    p.integrate(f);
                    p.decay(EXPLOSION_DECAY, f);
                }
            }
            Stage::Nebula { motes } => {
                for p in motes.iter_mut() {
                    p.integrate(f);
                    let dx = cx - p.x;
                    let dy = cy - p.y;
                    let d = (dx * dx + dy * dy).sqrt();
                    if d > NEBULA_PULL_MIN_DIST * s {
                        p.vx += dx / d * NEBULA_PULL * s * f;
                        p.vy += dy / d * NEBULA_PULL * s * f;
                    }
                }
            }
            Stage::StarFormation { nebula, stars } => {
                for p in nebula.iter_mut() {
                    p.alpha = (p.alpha - NEBULA_FADE * f).max(0.0);
                }
                for st in stars.iter_mut() {
                    if phase_elapsed > st.delay {
                        st.alpha = (st.alpha + STAR_RAMP * f).min(1.0);
                    }
                }
            }
            Stage::SolarSystem { stars, sun, planets } => {
                for st in stars.iter_mut() {
                    st.alpha = 0.3 + (clock + st.x).sin() * 0.2;
                }
                sun.radius = (phase_elapsed / SUN_GROW_SECS * sun.max_radius).min(sun.max_radius);
                if phase_elapsed > PLANETS_APPEAR_SECS {
                    for p in planets.iter_mut() {
                        p.angle = (p.angle + p.speed * f) % TAU;
                    }
                }
            }
        }
    }
}

impl Scene for BigBang {
    fn resize(&mut self, width: usize, height: usize) {
        self.width = width as f32;
        self.height = height as f32;
        self.scale = self.width.min(self.height) / REFERENCE_EXTENT;
        tracing::debug!(width, height, scale = self.scale, "big bang resized");
        self.restart();
    }

    fn advance(&mut self, dt: f32) {
        if self.width <= 0.0 || self.height <= 0.0 {
            return;
        }
        let dt = dt.max(0.0);
        self.clock += dt;

        // count thresholds on the unwrapped timeline so a whole-cycle jump
        // still rebuilds the population
        let cycle = cycle_length();
        let len = Phase::ALL.len() as i64;
        let unwrapped = self.elapsed + dt;
        let laps = (unwrapped / cycle).floor() as i64;
        let (target, _) = phase_at(unwrapped);
        let mut crossings =
            (laps * len + target.index() as i64 - self.phase().index() as i64).max(0);
        if crossings > len {
            crossings = (crossings - 1) % len + 1;
        }
        for _ in 0..crossings {
            self.enter_next();
        }
        self.elapsed = (unwrapped - laps as f32 * cycle).max(0.0);

        // a freshly built population only lives through the part of dt
        // spent in its own phase
        let live = if crossings > 0 {
            dt.min(self.phase_elapsed().max(0.0))
        } else {
            dt
        };
        self.last_frames = frames(dt);
        self.step(frames(live));
    }

    fn render(&self, canvas: &mut Canvas) {
        let trail = 1.0 - (1.0 - BACKDROP_ALPHA).powf(self.last_frames.max(0.0));
        canvas.blend(BACKDROP, trail);

        let phase_elapsed = self.phase_elapsed();
        match &self.stage {
            Stage::Explosion { particles } => {
                let flash = (1.0 - phase_elapsed / FLASH_SECS).max(0.0);
                if flash > 0.0 {
                    canvas.blend(Rgb::WHITE, flash);
                }
                for p in particles {
                    p.draw(canvas, 3.0, 0.5);
                }
            }
            Stage::Nebula { motes } => {
                for p in motes {
                    canvas.glow(p.x, p.y, p.size * 2.0, p.color, p.alpha);
                    canvas.disc(p.x, p.y, p.size, p.color, p.alpha);
                }
            }
            Stage::StarFormation { nebula, stars } => {
                for p in nebula.iter().filter(|p| p.alpha > 0.0) {
                    canvas.glow(p.x, p.y, p.size, p.color, p.alpha * 0.5);
                }
                for st in stars.iter().filter(|st| phase_elapsed > st.delay && st.alpha > 0.0) {
                    canvas.glow(st.x, st.y, st.size * 4.0, st.color, st.alpha * 0.3);
                    canvas.disc(st.x, st.y, st.size, st.color, st.alpha);
                }
            }
            Stage::SolarSystem { stars, sun, planets } => {
                for st in stars {
                    canvas.disc(st.x, st.y, st.size * 0.5, st.color, st.alpha);
                }
                if sun.radius > 0.0 {
                    canvas.glow(sun.x, sun.y, sun.radius * 3.0, Rgb::hex("#FFA500"), 0.6);
                    canvas.disc(sun.x, sun.y, sun.radius, Rgb::hex("#FF8C00"), 1.0);
                    canvas.disc(sun.x, sun.y, sun.radius * 0.6, Rgb::hex("#FFD700"), 0.6);
                    canvas.disc(sun.x, sun.y, sun.radius * 0.25, Rgb::hex("#FFF4E6"), 0.6);
                }
                if phase_elapsed > PLANETS_APPEAR_SECS {
                    for p in planets {
                        let px = sun.x + p.angle.cos() * p.distance;
                        let py = sun.y + p.angle.sin() * p.distance;
                        canvas.ring(sun.x, sun.y, p.distance, ORBIT, 0.1);
                        canvas.glow(px, py, p.size * 1.5, p.color, 0.3);
                        canvas.disc(px, py, p.size, p.color, 1.0);
                        canvas.disc(px - p.size * 0.3, py - p.size * 0.3, p.size * 0.3, Rgb::WHITE, 0.3);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: f32 = 1.0 / 60.0;

    fn mounted(seed: u64) -> BigBang {
        let mut b = BigBang::new(seed);
        b.resize(400, 200);
        b
    }

    fn run(b: &mut BigBang, secs: f32) {
        let n = (secs / FRAME).round() as usize;
        for _ in 0..n {
            b.advance(FRAME);
        }
    }

    #[test]
    fn phase_is_first_whose_cumulative_end_exceeds_elapsed() {
        let durations: Vec<f32> = Phase::ALL.iter().map(|p| p.duration()).collect();
        let mut e = 0.0;
        while e < 60.0 {
            let (phase, into) = phase_at(e);
            let wrapped = e % cycle_length();
            let mut acc = 0.0;
            let mut expected = 0;
            for (i, d) in durations.iter().enumerate() {
                acc += d;
                if acc > wrapped {
                    expected = i;
                    break;
                }
            }
            assert_eq!(phase.index(), expected, "e={e}");
            assert!(into >= 0.0 && into < phase.duration() + 1e-4);
            e += 0.25;
        }
        assert_eq!(phase_at(2.999).0, Phase::Explosion);
        assert_eq!(phase_at(3.0).0, Phase::Nebula);
        assert_eq!(phase_at(7.5).0, Phase::StarFormation);
        assert_eq!(phase_at(12.0).0, Phase::SolarSystem);
        assert_eq!(phase_at(22.5).0, Phase::Explosion);
        assert_eq!(cycle_length(), 22.0);
    }

    #[test]
    fn phases_run_in_order_and_loop() {
        let mut b = mounted(1);
        assert_eq!(b.phase(), Phase::Explosion);
        assert_eq!(b.stage().population(), EXPLOSION_PARTICLES);

        let mut seen = vec![b.phase()];
        for _ in 0..(23.0 / FRAME) as usize {
            b.advance(FRAME);
            if *seen.last().unwrap() != b.phase() {
                seen.push(b.phase());
            }
        }
        assert_eq!(
            seen,
            vec![
                Phase::Explosion,
                Phase::Nebula,
                Phase::StarFormation,
                Phase::SolarSystem,
                Phase::Explosion
            ]
        );
        match b.stage() {
            Stage::Explosion { particles } => {
                assert_eq!(particles.len(), EXPLOSION_PARTICLES);
                assert!(particles.iter().all(|p| p.life > 0.0));
            }
            other => panic!("expected a fresh explosion, got {:?}", other.phase()),
        }
    }

    #[test]
    fn large_jumps_still_build_every_phase() {
        let mut b = mounted(2);
        b.advance(8.0);
        match b.stage() {
            Stage::StarFormation { nebula, stars } => {
                assert_eq!(nebula.len(), NEBULA_MOTES);
                assert_eq!(stars.len(), FORMING_STARS);
            }
            other => panic!("unexpected {:?}", other.phase()),
        }
        b.advance(15.0);
        assert_eq!(b.phase(), Phase::Explosion);
        assert_eq!(b.stage().population(), EXPLOSION_PARTICLES);
    }

    #[test]
    fn jump_across_the_cycle_end_rebuilds_the_explosion() {
        let mut b = mounted(8);
        b.advance(1.0);
        b.advance(21.5);
        assert_eq!(b.phase(), Phase::Explosion);
        assert!((b.elapsed() - 0.5).abs() < 1e-4);
        let Stage::Explosion { particles } = b.stage() else {
            panic!("expected explosion");
        };
        assert_eq!(particles.iter().filter(|p| p.is_alive()).count(), EXPLOSION_PARTICLES);
        let expected = 1.0 - 30.0 * EXPLOSION_DECAY;
        assert!(particles.iter().all(|p| (p.life - expected).abs() < 1e-3));
    }

    #[test]
    fn whole_cycles_land_in_the_right_phase() {
        let mut b = mounted(9);
        b.advance(2.0 * cycle_length() + Phase::Nebula.start() + 1.0);
        assert_eq!(b.phase(), Phase::Nebula);
        assert_eq!(b.stage().population(), NEBULA_MOTES);
        assert!((b.phase_elapsed() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn explosion_particles_decay_linearly() {
        let mut b = mounted(3);
        run(&mut b, 1.0);
        let Stage::Explosion { particles } = b.stage() else {
            panic!("still exploding");
        };
        for p in particles {
            assert!((p.life - (1.0 - 60.0 * EXPLOSION_DECAY)).abs() < 1e-3);
            assert_eq!(p.alpha, p.life);
        }
    }

    #[test]
    fn stars_only_brighten_after_their_delay() {
        let mut b = mounted(4);
        run(&mut b, Phase::StarFormation.start() + 0.5);
        assert_eq!(b.phase(), Phase::StarFormation);
        let pe = b.phase_elapsed();
        let Stage::StarFormation { stars, nebula } = b.stage() else {
            panic!("expected star formation");
        };
        for st in stars {
            if st.delay >= pe {
                assert_eq!(st.alpha, 0.0);
            }
        }
        assert!(stars.iter().any(|st| st.alpha > 0.0));
        assert!(nebula.iter().all(|p| p.alpha < 0.3));
    }

    #[test]
    fn sun_grows_then_planets_orbit() {
        let mut b = mounted(5);
        run(&mut b, Phase::SolarSystem.start() + 0.9);
        let Stage::SolarSystem { sun, planets, .. } = b.stage().clone() else {
            panic!("expected solar system");
        };
        assert!(sun.radius > 0.0 && sun.radius < sun.max_radius);
        let before: Vec<f32> = planets.iter().map(|p| p.angle).collect();
        assert_eq!(before, default_planets().iter().map(|p| p.angle).collect::<Vec<_>>());

        run(&mut b, 1.5);
        let Stage::SolarSystem { sun, planets, .. } = b.stage() else {
            panic!("expected solar system");
        };
        assert_eq!(sun.radius, sun.max_radius);
        for (p, a0) in planets.iter().zip(before) {
            assert!(p.angle != a0);
        }
    }

    #[test]
    fn nebula_is_pulled_towards_centre() {
        let mut b = mounted(6);
        run(&mut b, Phase::Nebula.start() + 0.1);
        let (cx, cy) = (200.0, 100.0);
        let far_before: Vec<(f32, f32)> = match b.stage() {
            Stage::Nebula { motes } => motes.iter().map(|p| (p.x, p.y)).collect(),
            _ => panic!("expected nebula"),
        };
        run(&mut b, 2.0);
        let Stage::Nebula { motes } = b.stage() else {
            panic!("expected nebula");
        };
        let mean = |pts: &mut dyn Iterator<Item = (f32, f32)>| {
            let v: Vec<f32> = pts.map(|(x, y)| ((x - cx).powi(2) + (y - cy).powi(2)).sqrt()).collect();
            v.iter().sum::<f32>() / v.len() as f32
        };
        let before = mean(&mut far_before.into_iter());
        let after = mean(&mut motes.iter().map(|p| (p.x, p.y)));
        assert!(after < before, "before={before} after={after}");
    }

    #[test]
    fn flash_fills_the_first_half_second() {
        let mut b = mounted(7);
        let mut c = Canvas::new(400, 200);
        b.advance(FRAME);
        b.render(&mut c);
        assert!(c.luma(0, 0) > 0.8);

        run(&mut b, 1.0);
        for _ in 0..60 {
            b.advance(FRAME);
            b.render(&mut c);
        }
        assert!(c.luma(0, 0) < 0.05);
    }
}
